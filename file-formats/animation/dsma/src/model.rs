use std::io::{self, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;

use crate::animation::Transform;
use crate::backend::TextureHandle;
use crate::display_list::{DisplayList, ListSummary};
use crate::error::{AssetKind, DecodeError, MalformedReason, Result};
use crate::io_ext::{SliceReader, TRANSFORM_SIZE, WriteExt};

/// Magic signature for DSM files
pub const DSM_MAGIC: [u8; 4] = *b"DSMF";

/// The only DSM version this decoder understands
pub const DSM_VERSION: u32 = 1;

/// Size of a serialized bone: parent index followed by the bind transform
pub const BONE_RECORD_SIZE: usize = 4 + TRANSFORM_SIZE;

/// Bones are addressed with 16-bit indices
pub const MAX_BONE_COUNT: u32 = u16::MAX as u32 + 1;

const NO_TEXTURE: u32 = u32::MAX;
const ROOT_PARENT: i32 = -1;

/// A skeleton joint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bone {
    /// Parent bone, always lower than this bone's own index
    pub parent: Option<u16>,
    /// Rest pose relative to the parent
    pub bind: Transform,
}

impl Bone {
    pub fn root(bind: Transform) -> Self {
        Self { parent: None, bind }
    }

    pub fn child(parent: u16, bind: Transform) -> Self {
        Self {
            parent: Some(parent),
            bind,
        }
    }
}

/// Geometry rigidly bound to a single bone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submesh {
    /// Bone whose world matrix positions this geometry
    pub bone: u16,
    /// Texture to bind before drawing, if any
    pub texture: Option<TextureHandle>,
    /// Packed geometry command words, submitted verbatim
    pub commands: Vec<u32>,
    summary: ListSummary,
}

impl Submesh {
    pub fn new(bone: u16, texture: Option<TextureHandle>, commands: Vec<u32>) -> Self {
        Self {
            bone,
            texture,
            commands,
            summary: ListSummary::default(),
        }
    }

    /// Vertex and polygon counts of the command block
    pub fn summary(&self) -> ListSummary {
        self.summary
    }
}

/// Static model: skeleton plus rigidly skinned geometry
///
/// Loaded once and immutable afterwards. Bones are stored in an order where
/// every parent precedes its children, so world transforms can be composed
/// in a single forward pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    bones: Vec<Bone>,
    submeshes: Vec<Submesh>,
}

impl Model {
    /// Build a model from already decoded parts, checking every invariant
    /// the binary decoder checks
    pub fn new(bones: Vec<Bone>, mut submeshes: Vec<Submesh>) -> Result<Self> {
        let malformed = |reason| DecodeError::malformed(AssetKind::Model, reason);

        if bones.is_empty() {
            return Err(malformed(MalformedReason::EmptySkeleton));
        }
        if bones.len() > MAX_BONE_COUNT as usize {
            return Err(malformed(MalformedReason::TooManyBones(bones.len() as u32)));
        }

        for (index, bone) in bones.iter().enumerate() {
            match (index, bone.parent) {
                (0, Some(parent)) => {
                    return Err(malformed(MalformedReason::FirstBoneNotRoot(i32::from(
                        parent,
                    ))));
                }
                (_, Some(parent)) if usize::from(parent) >= index => {
                    return Err(malformed(MalformedReason::ParentOutOfOrder {
                        bone: index as u32,
                        parent: i32::from(parent),
                    }));
                }
                _ => {}
            }
        }

        for (index, submesh) in submeshes.iter_mut().enumerate() {
            if usize::from(submesh.bone) >= bones.len() {
                return Err(malformed(MalformedReason::BoneIndexOutOfRange {
                    submesh: index as u32,
                    bone: u32::from(submesh.bone),
                    bone_count: bones.len() as u32,
                }));
            }
            submesh.summary = DisplayList::new(&submesh.commands)
                .validate()
                .map_err(malformed)?;
        }

        Ok(Self { bones, submeshes })
    }

    /// Decode a DSM asset from memory
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut reader = SliceReader::new(data, AssetKind::Model);

        reader.read_magic(DSM_MAGIC)?;
        let version = reader.read_u32()?;
        if version != DSM_VERSION {
            return Err(reader.malformed(MalformedReason::UnsupportedVersion(version)));
        }

        let bone_count = reader.read_u32()?;
        let submesh_count = reader.read_u32()?;

        if bone_count == 0 {
            return Err(reader.malformed(MalformedReason::EmptySkeleton));
        }
        if bone_count > MAX_BONE_COUNT {
            return Err(reader.malformed(MalformedReason::TooManyBones(bone_count)));
        }
        reader.ensure_records("bones", bone_count, BONE_RECORD_SIZE)?;

        let mut bones = Vec::with_capacity(bone_count as usize);
        for index in 0..bone_count {
            let parent = reader.read_i32()?;
            let bind = reader.read_transform()?;

            let parent = match parent {
                ROOT_PARENT => None,
                p if index == 0 => {
                    return Err(reader.malformed(MalformedReason::FirstBoneNotRoot(p)));
                }
                // Also rejects negative indices other than the root marker
                p if p < 0 || p as u32 >= index => {
                    return Err(reader.malformed(MalformedReason::ParentOutOfOrder {
                        bone: index,
                        parent: p,
                    }));
                }
                p => Some(p as u16),
            };
            bones.push(Bone { parent, bind });
        }

        // Every submesh carries at least its three header words
        reader.ensure_records("submeshes", submesh_count, 12)?;

        let mut submeshes = Vec::with_capacity(submesh_count as usize);
        for index in 0..submesh_count {
            let bone = reader.read_u32()?;
            let texture = reader.read_u32()?;
            let word_count = reader.read_u32()?;

            if bone >= bone_count {
                return Err(reader.malformed(MalformedReason::BoneIndexOutOfRange {
                    submesh: index,
                    bone,
                    bone_count,
                }));
            }

            let commands = reader.read_u32_array(word_count)?;
            let texture = (texture != NO_TEXTURE).then_some(TextureHandle(texture));
            submeshes.push(Submesh::new(bone as u16, texture, commands));
        }

        reader.expect_end()?;

        let model = Self::new(bones, submeshes)?;
        debug!(
            "Loaded DSM model: {} bones, {} submeshes, {} bytes",
            model.bone_count(),
            model.submesh_count(),
            data.len()
        );
        Ok(model)
    }

    /// Read and decode a DSM file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(&data)
    }

    /// Encode in the layout [`load`](Self::load) reads
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&DSM_MAGIC)?;
        writer.write_u32::<LittleEndian>(DSM_VERSION)?;
        writer.write_u32::<LittleEndian>(self.bones.len() as u32)?;
        writer.write_u32::<LittleEndian>(self.submeshes.len() as u32)?;

        for bone in &self.bones {
            let parent = bone.parent.map_or(ROOT_PARENT, i32::from);
            writer.write_i32::<LittleEndian>(parent)?;
            writer.write_transform(&bone.bind)?;
        }

        for submesh in &self.submeshes {
            writer.write_u32::<LittleEndian>(u32::from(submesh.bone))?;
            writer.write_u32::<LittleEndian>(submesh.texture.map_or(NO_TEXTURE, |t| t.0))?;
            writer.write_u32::<LittleEndian>(submesh.commands.len() as u32)?;
            for &word in &submesh.commands {
                writer.write_u32::<LittleEndian>(word)?;
            }
        }

        Ok(())
    }

    /// Encode into a new buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write(&mut out);
        out
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Indices of bones without a parent
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.parent.is_none())
            .map(|(index, _)| index)
    }

    /// Vertex and polygon totals over all submeshes
    pub fn summary(&self) -> ListSummary {
        self.submeshes
            .iter()
            .fold(ListSummary::default(), |acc, submesh| ListSummary {
                vertices: acc.vertices + submesh.summary.vertices,
                polygons: acc.polygons + submesh.summary.polygons,
                commands: acc.commands + submesh.summary.commands,
            })
    }
}
