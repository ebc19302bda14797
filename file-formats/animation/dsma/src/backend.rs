//! Rendering backend interface
//!
//! The core never talks to hardware. Everything it draws goes through a
//! [`RenderBackend`]: a matrix stack, texture binding and a command FIFO
//! that accepts packed display lists verbatim.

use std::cell::Cell;

use log::trace;
use thiserror::Error;

use crate::animation::Mat4x3;
use crate::display_list::DisplayList;
use crate::error::MalformedReason;

/// Opaque texture name owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureHandle(pub u32);

/// Counters reported by the backend for the last submitted frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderStats {
    pub polygons: u32,
    pub vertices: u32,
}

/// Operations the skinning submitter needs from a renderer
pub trait RenderBackend {
    type Error: std::error::Error;

    /// Save the current modelview matrix
    fn push_matrix(&mut self) -> Result<(), Self::Error>;

    /// Restore the most recently saved matrix
    fn pop_matrix(&mut self) -> Result<(), Self::Error>;

    /// Post-multiply the current matrix
    fn multiply_matrix(&mut self, matrix: &Mat4x3) -> Result<(), Self::Error>;

    fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), Self::Error>;

    /// Queue a packed command list as-is
    fn submit(&mut self, commands: &[u32]) -> Result<(), Self::Error>;

    /// Whether all queued geometry has been processed
    fn is_idle(&self) -> bool;

    fn stats(&self) -> RenderStats;
}

/// Spin until `backend` reports idle, giving up after `max_spins` polls
///
/// Returns whether the backend became idle. This is the only place the
/// crate waits, and only when the caller asks it to.
pub fn wait_for_idle<B: RenderBackend + ?Sized>(backend: &B, max_spins: u32) -> bool {
    for _ in 0..max_spins {
        if backend.is_idle() {
            return true;
        }
        std::hint::spin_loop();
    }
    backend.is_idle()
}

/// Matrix stack depth of the target geometry engine
pub const MATRIX_STACK_DEPTH: usize = 31;

/// A call recorded by [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    PushMatrix,
    PopMatrix,
    MultiplyMatrix([i32; 12]),
    BindTexture(TextureHandle),
    Submit { words: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordingError {
    #[error("matrix stack overflow at depth {0}")]
    StackOverflow(usize),

    #[error("matrix stack underflow")]
    StackUnderflow,

    #[error("invalid command list: {0}")]
    InvalidCommands(#[from] MalformedReason),

    #[error("injected failure on submit {0}")]
    Injected(usize),
}

/// Software backend that records calls and emulates the geometry engine's
/// bookkeeping
///
/// Used by tests, benchmarks and the command line tool. It enforces the
/// hardware matrix stack limit, counts vertices and polygons like the
/// engine's RAM counters, and can simulate processing latency and
/// failures.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    events: Vec<BackendEvent>,
    record_events: bool,
    depth: usize,
    max_depth: usize,
    stats: RenderStats,
    submits: usize,
    fail_on_submit: Option<usize>,
    latency: u32,
    busy: Cell<u32>,
}

impl RecordingBackend {
    /// Backend that keeps a full event log
    pub fn new() -> Self {
        Self {
            record_events: true,
            ..Self::default()
        }
    }

    /// Backend that only keeps counters, for long benchmark runs
    pub fn counting() -> Self {
        Self::default()
    }

    /// Report busy for `polls` idle checks after every submit
    pub fn with_latency(mut self, polls: u32) -> Self {
        self.latency = polls;
        self
    }

    /// Fail the `n`th submit (zero based) with [`RecordingError::Injected`]
    pub fn fail_on_submit(mut self, n: usize) -> Self {
        self.fail_on_submit = Some(n);
        self
    }

    pub fn events(&self) -> &[BackendEvent] {
        &self.events
    }

    /// Current matrix stack depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Deepest matrix stack seen so far
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of submits since creation
    pub fn submits(&self) -> usize {
        self.submits
    }

    /// Clear the event log and counters for a new frame
    pub fn begin_frame(&mut self) {
        self.events.clear();
        self.stats = RenderStats::default();
    }

    fn record(&mut self, event: BackendEvent) {
        if self.record_events {
            self.events.push(event);
        }
    }
}

impl RenderBackend for RecordingBackend {
    type Error = RecordingError;

    fn push_matrix(&mut self) -> Result<(), Self::Error> {
        if self.depth >= MATRIX_STACK_DEPTH {
            return Err(RecordingError::StackOverflow(self.depth));
        }
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        self.record(BackendEvent::PushMatrix);
        Ok(())
    }

    fn pop_matrix(&mut self) -> Result<(), Self::Error> {
        if self.depth == 0 {
            return Err(RecordingError::StackUnderflow);
        }
        self.depth -= 1;
        self.record(BackendEvent::PopMatrix);
        Ok(())
    }

    fn multiply_matrix(&mut self, matrix: &Mat4x3) -> Result<(), Self::Error> {
        self.record(BackendEvent::MultiplyMatrix(matrix.to_raw()));
        Ok(())
    }

    fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), Self::Error> {
        self.record(BackendEvent::BindTexture(texture));
        Ok(())
    }

    fn submit(&mut self, commands: &[u32]) -> Result<(), Self::Error> {
        let index = self.submits;
        self.submits += 1;
        if self.fail_on_submit == Some(index) {
            return Err(RecordingError::Injected(index));
        }

        let summary = DisplayList::new(commands).summarize()?;
        self.stats.vertices += summary.vertices;
        self.stats.polygons += summary.polygons;
        self.busy.set(self.latency);
        self.record(BackendEvent::Submit {
            words: commands.len(),
        });

        trace!(
            "Submitted {} words: {} vertices, {} polygons",
            commands.len(),
            summary.vertices,
            summary.polygons
        );
        Ok(())
    }

    fn is_idle(&self) -> bool {
        match self.busy.get() {
            0 => true,
            n => {
                self.busy.set(n - 1);
                false
            }
        }
    }

    fn stats(&self) -> RenderStats {
        self.stats
    }
}
