//! Packed geometry engine command lists
//!
//! Submesh geometry is stored as the command stream the geometry FIFO
//! consumes: a header word holding up to four 8-bit command ids, least
//! significant byte first, followed by the parameter words of those commands
//! in order. Id `0x00` (NOP) takes no parameters and pads partial headers.
//!
//! The submitter sends these words verbatim, but the decoder walks them once
//! at load time to reject malformed blocks and to count primitives.

use crate::error::MalformedReason;

/// Commands understood by the geometry engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GxCommand {
    Nop = 0x00,
    MtxMode = 0x10,
    MtxPush = 0x11,
    MtxPop = 0x12,
    MtxStore = 0x13,
    MtxRestore = 0x14,
    MtxIdentity = 0x15,
    MtxLoad4x4 = 0x16,
    MtxLoad4x3 = 0x17,
    MtxMult4x4 = 0x18,
    MtxMult4x3 = 0x19,
    MtxMult3x3 = 0x1A,
    MtxScale = 0x1B,
    MtxTrans = 0x1C,
    Color = 0x20,
    Normal = 0x21,
    TexCoord = 0x22,
    Vtx16 = 0x23,
    Vtx10 = 0x24,
    VtxXY = 0x25,
    VtxXZ = 0x26,
    VtxYZ = 0x27,
    VtxDiff = 0x28,
    PolygonAttr = 0x29,
    TexImageParam = 0x2A,
    PlttBase = 0x2B,
    DifAmb = 0x30,
    SpeEmi = 0x31,
    LightVector = 0x32,
    LightColor = 0x33,
    Shininess = 0x34,
    BeginVtxs = 0x40,
    EndVtxs = 0x41,
    SwapBuffers = 0x50,
    Viewport = 0x60,
    BoxTest = 0x70,
    PosTest = 0x71,
    VecTest = 0x72,
}

impl GxCommand {
    /// Look up a command by its id
    pub fn from_id(id: u8) -> Option<Self> {
        use GxCommand::*;
        let command = match id {
            0x00 => Nop,
            0x10 => MtxMode,
            0x11 => MtxPush,
            0x12 => MtxPop,
            0x13 => MtxStore,
            0x14 => MtxRestore,
            0x15 => MtxIdentity,
            0x16 => MtxLoad4x4,
            0x17 => MtxLoad4x3,
            0x18 => MtxMult4x4,
            0x19 => MtxMult4x3,
            0x1A => MtxMult3x3,
            0x1B => MtxScale,
            0x1C => MtxTrans,
            0x20 => Color,
            0x21 => Normal,
            0x22 => TexCoord,
            0x23 => Vtx16,
            0x24 => Vtx10,
            0x25 => VtxXY,
            0x26 => VtxXZ,
            0x27 => VtxYZ,
            0x28 => VtxDiff,
            0x29 => PolygonAttr,
            0x2A => TexImageParam,
            0x2B => PlttBase,
            0x30 => DifAmb,
            0x31 => SpeEmi,
            0x32 => LightVector,
            0x33 => LightColor,
            0x34 => Shininess,
            0x40 => BeginVtxs,
            0x41 => EndVtxs,
            0x50 => SwapBuffers,
            0x60 => Viewport,
            0x70 => BoxTest,
            0x71 => PosTest,
            0x72 => VecTest,
            _ => return None,
        };
        Some(command)
    }

    /// Command id as written in a header word
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Number of parameter words following the header
    pub fn parameter_count(self) -> usize {
        use GxCommand::*;
        match self {
            Nop | MtxPush | MtxIdentity | EndVtxs => 0,
            MtxLoad4x4 | MtxMult4x4 => 16,
            MtxLoad4x3 | MtxMult4x3 => 12,
            MtxMult3x3 => 9,
            MtxScale | MtxTrans | BoxTest => 3,
            Vtx16 | PosTest => 2,
            Shininess => 32,
            _ => 1,
        }
    }

    /// Whether the command emits a vertex
    pub fn is_vertex(self) -> bool {
        matches!(
            self,
            Self::Vtx16 | Self::Vtx10 | Self::VtxXY | Self::VtxXZ | Self::VtxYZ | Self::VtxDiff
        )
    }

    /// Whether a submesh block may contain the command
    ///
    /// Each submesh is drawn inside a push/multiply/pop scope for its bone.
    /// Commands that switch matrix mode, touch the stack, replace the current
    /// matrix or end the frame would corrupt that scope.
    pub fn is_allowed_in_submesh(self) -> bool {
        use GxCommand::*;
        !matches!(
            self,
            MtxMode
                | MtxPush
                | MtxPop
                | MtxStore
                | MtxRestore
                | MtxIdentity
                | MtxLoad4x4
                | MtxLoad4x3
                | SwapBuffers
                | Viewport
        )
    }
}

/// Primitive type selected by `BEGIN_VTXS`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangles = 0,
    Quads = 1,
    TriangleStrip = 2,
    QuadStrip = 3,
}

impl Primitive {
    pub fn from_param(param: u32) -> Self {
        match param & 3 {
            0 => Self::Triangles,
            1 => Self::Quads,
            2 => Self::TriangleStrip,
            _ => Self::QuadStrip,
        }
    }

    /// Polygons produced by `vertices` vertices of this primitive
    pub fn polygon_count(self, vertices: u32) -> u32 {
        match self {
            Self::Triangles => vertices / 3,
            Self::Quads => vertices / 4,
            Self::TriangleStrip => vertices.saturating_sub(2),
            Self::QuadStrip => vertices.saturating_sub(2) / 2,
        }
    }
}

/// One decoded command and its parameter words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    pub op: GxCommand,
    pub params: &'a [u32],
    /// Index of the header word that carried the command id
    pub word: usize,
}

/// Iterator over the commands of a packed list
#[derive(Debug, Clone)]
pub struct Commands<'a> {
    words: &'a [u32],
    pos: usize,
    header: u32,
    header_pos: usize,
    slots: u8,
    failed: bool,
}

impl<'a> Iterator for Commands<'a> {
    type Item = Result<Command<'a>, MalformedReason>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            if self.slots == 0 {
                let &header = self.words.get(self.pos)?;
                self.header = header;
                self.header_pos = self.pos;
                self.pos += 1;
                self.slots = 4;
            }

            let id = (self.header & 0xFF) as u8;
            self.header >>= 8;
            self.slots -= 1;

            if id == GxCommand::Nop.id() {
                continue;
            }

            let Some(op) = GxCommand::from_id(id) else {
                self.failed = true;
                return Some(Err(MalformedReason::UnknownCommand {
                    command: id,
                    word: self.header_pos,
                }));
            };

            let needed = op.parameter_count();
            let Some(params) = self.words.get(self.pos..self.pos + needed) else {
                self.failed = true;
                return Some(Err(MalformedReason::TruncatedCommand {
                    command: id,
                    word: self.header_pos,
                    needed,
                }));
            };
            self.pos += needed;

            return Some(Ok(Command {
                op,
                params,
                word: self.header_pos,
            }));
        }
    }
}

/// Primitive and command counts of a list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListSummary {
    pub vertices: u32,
    pub polygons: u32,
    pub commands: u32,
}

/// Borrowed view over a packed command list
#[derive(Debug, Clone, Copy)]
pub struct DisplayList<'a> {
    words: &'a [u32],
}

impl<'a> DisplayList<'a> {
    pub fn new(words: &'a [u32]) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &'a [u32] {
        self.words
    }

    /// Walk the commands without allocating
    pub fn commands(&self) -> Commands<'a> {
        Commands {
            words: self.words,
            pos: 0,
            header: 0,
            header_pos: 0,
            slots: 0,
            failed: false,
        }
    }

    /// Count vertices and polygons, failing on malformed words
    pub fn summarize(&self) -> Result<ListSummary, MalformedReason> {
        self.walk(false)
    }

    /// Like [`summarize`](Self::summarize), also rejecting commands that
    /// would escape the per-bone matrix scope
    pub fn validate(&self) -> Result<ListSummary, MalformedReason> {
        self.walk(true)
    }

    fn walk(&self, submesh_rules: bool) -> Result<ListSummary, MalformedReason> {
        let mut summary = ListSummary::default();
        let mut primitive = None;
        let mut run = 0u32;

        for command in self.commands() {
            let command = command?;
            if submesh_rules && !command.op.is_allowed_in_submesh() {
                return Err(MalformedReason::ForbiddenCommand {
                    command: command.op.id(),
                    word: command.word,
                });
            }
            summary.commands += 1;

            match command.op {
                GxCommand::BeginVtxs => {
                    if let Some(kind) = primitive {
                        summary.polygons += Primitive::polygon_count(kind, run);
                    }
                    primitive = Some(Primitive::from_param(command.params[0]));
                    run = 0;
                }
                GxCommand::EndVtxs => {
                    if let Some(kind) = primitive.take() {
                        summary.polygons += kind.polygon_count(run);
                    }
                    run = 0;
                }
                op if op.is_vertex() => {
                    summary.vertices += 1;
                    run += 1;
                }
                _ => {}
            }
        }

        // END_VTXS is optional
        if let Some(kind) = primitive {
            summary.polygons += kind.polygon_count(run);
        }

        Ok(summary)
    }
}

/// Pack a 4.12 vertex position into `VTX_16` parameters
fn pack_vtx16(x: i16, y: i16, z: i16) -> [u32; 2] {
    [
        u32::from(x as u16) | (u32::from(y as u16) << 16),
        u32::from(z as u16),
    ]
}

/// Builds packed command lists, mostly for tests and tooling
#[derive(Debug, Default, Clone)]
pub struct DisplayListBuilder {
    words: Vec<u32>,
    ids: Vec<u8>,
    params: Vec<u32>,
}

impl DisplayListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command with explicit parameter words
    ///
    /// # Panics
    ///
    /// If `params` does not match the command's parameter count.
    pub fn push(&mut self, op: GxCommand, params: &[u32]) -> &mut Self {
        assert_eq!(
            params.len(),
            op.parameter_count(),
            "{op:?} takes {} parameters",
            op.parameter_count()
        );
        self.ids.push(op.id());
        self.params.extend_from_slice(params);
        if self.ids.len() == 4 {
            self.flush();
        }
        self
    }

    fn flush(&mut self) {
        if self.ids.is_empty() {
            return;
        }
        let header = self
            .ids
            .iter()
            .enumerate()
            .fold(0u32, |acc, (slot, &id)| acc | (u32::from(id) << (slot * 8)));
        self.words.push(header);
        self.words.append(&mut self.params);
        self.ids.clear();
    }

    pub fn begin(&mut self, primitive: Primitive) -> &mut Self {
        self.push(GxCommand::BeginVtxs, &[primitive as u32])
    }

    pub fn end(&mut self) -> &mut Self {
        self.push(GxCommand::EndVtxs, &[])
    }

    /// Vertex from raw 4.12 coordinates
    pub fn vertex(&mut self, x: i16, y: i16, z: i16) -> &mut Self {
        self.push(GxCommand::Vtx16, &pack_vtx16(x, y, z))
    }

    /// Normal from 1.9 components
    pub fn normal(&mut self, x: i16, y: i16, z: i16) -> &mut Self {
        let pack = |v: i16| (v.clamp(-512, 511) as u32) & 0x3FF;
        self.push(
            GxCommand::Normal,
            &[pack(x) | (pack(y) << 10) | (pack(z) << 20)],
        )
    }

    /// Texture coordinate in 12.4 texels
    pub fn texcoord(&mut self, s: i16, t: i16) -> &mut Self {
        self.push(
            GxCommand::TexCoord,
            &[u32::from(s as u16) | (u32::from(t as u16) << 16)],
        )
    }

    /// 15-bit color, five bits per channel
    pub fn color(&mut self, r: u8, g: u8, b: u8) -> &mut Self {
        let rgb = u32::from(r & 31) | (u32::from(g & 31) << 5) | (u32::from(b & 31) << 10);
        self.push(GxCommand::Color, &[rgb])
    }

    /// Packed words, padding the last header with NOPs
    pub fn finish(&mut self) -> Vec<u32> {
        self.flush();
        std::mem::take(&mut self.words)
    }
}
