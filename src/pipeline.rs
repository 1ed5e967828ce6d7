//! The consumed device interface and the pipeline description types the
//! permutation builder fills in.
//!
//! The device owns every object it creates; this crate only ever holds
//! the opaque handles it hands back and checks them for presence.

use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};

use crate::shader::{ShaderDialect, ShaderSource};

/// Fixed vertex buffer slots shared with the renderer's mesh streams.
pub const POSITION_BUFFER_INDEX: u32 = 2;
pub const NORMAL_BUFFER_INDEX: u32 = 3;
pub const TEXCOORD_BUFFER_INDEX: u32 = 4;
pub const TANGENT_BUFFER_INDEX: u32 = 5;
pub const BITANGENT_BUFFER_INDEX: u32 = 6;
pub const BONE_BUFFER_INDEX: u32 = 7;

/// Storage-buffer binding carrying per-draw bone matrices for skinned
/// draws.
pub const BONE_MATRIX_BINDING: u32 = 14;

/// Per-vertex bone influences as laid out in the skinned vertex stream.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BoneVertexData {
    pub ids: [i32; 4],
    pub weights: [f32; 4],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexFormat {
    Float2,
    Float3,
    Float4,
    Int4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexBufferBinding {
    pub buffer: u32,
    pub stride: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub buffer: u32,
    pub location: u32,
    pub offset: u32,
    pub format: VertexFormat,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexLayout {
    pub buffers: Vec<VertexBufferBinding>,
    pub attributes: Vec<VertexAttribute>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
    PushConstant,
    StorageBuffer,
    Texture,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub index: u32,
    pub kind: BindingKind,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DepthMode {
    #[default]
    None,
    Less,
    LessOrEqual,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CullingMode {
    #[default]
    None,
    Backface,
    Frontface,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendFactor {
    One,
    Zero,
    SrcAlpha,
    OneMinusSrcAlpha,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendState {
    pub enabled: bool,
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            src_rgb: BlendFactor::One,
            dst_rgb: BlendFactor::Zero,
        }
    }
}

/// An integer specialization constant supplied at pipeline creation.
/// The scene-contract capacities travel this way; the graph never
/// controls them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpecializationConstant {
    pub index: u32,
    pub value: i32,
}

/// Opaque handle to a render pass owned by the device collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderPassHandle(pub u64);

/// Opaque pipeline token. Draw code hands it back to the device that
/// produced it; nothing here looks inside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineHandle(pub u64);

/// One stage of a pipeline description: the template path plus, once the
/// permutation builder has run, the compiled source handed to the device.
#[derive(Clone, Debug, Default)]
pub struct StageDescriptor {
    pub path: String,
    pub source: Option<ShaderSource>,
    pub constants: Vec<SpecializationConstant>,
}

#[derive(Clone, Debug, Default)]
pub struct GraphicsPipelineDescriptor {
    pub label: String,
    pub vertex: StageDescriptor,
    pub fragment: StageDescriptor,
    pub vertex_layout: VertexLayout,
    pub bindings: Vec<Binding>,
    pub push_constant_size: u32,
    pub blend: BlendState,
    pub depth: DepthMode,
    pub culling: CullingMode,
    pub render_pass: Option<RenderPassHandle>,
}

/// Device pipeline creation, consumed by the permutation builder.
///
/// A `None` result means "material not yet drawable"; callers skip draw
/// submission for it and never abort.
pub trait GraphicsDevice {
    /// The dialect this device's pipeline creation accepts.
    fn accepted_dialect(&self) -> ShaderDialect;

    fn create_graphics_pipeline(
        &mut self,
        descriptor: &GraphicsPipelineDescriptor,
    ) -> Option<PipelineHandle>;
}

const VEC3_STRIDE: u32 = 12;
const VEC2_STRIDE: u32 = 8;

/// Vertex streams for the unskinned mesh layout. Depth-only passes carry
/// positions alone.
pub fn static_vertex_layout(positions_only: bool) -> VertexLayout {
    if positions_only {
        return VertexLayout {
            buffers: vec![VertexBufferBinding {
                buffer: POSITION_BUFFER_INDEX,
                stride: VEC3_STRIDE,
            }],
            attributes: vec![VertexAttribute {
                buffer: POSITION_BUFFER_INDEX,
                location: 0,
                offset: 0,
                format: VertexFormat::Float3,
            }],
        };
    }
    VertexLayout {
        buffers: vec![
            VertexBufferBinding {
                buffer: POSITION_BUFFER_INDEX,
                stride: VEC3_STRIDE,
            },
            VertexBufferBinding {
                buffer: NORMAL_BUFFER_INDEX,
                stride: VEC3_STRIDE,
            },
            VertexBufferBinding {
                buffer: TEXCOORD_BUFFER_INDEX,
                stride: VEC2_STRIDE,
            },
            VertexBufferBinding {
                buffer: TANGENT_BUFFER_INDEX,
                stride: VEC3_STRIDE,
            },
            VertexBufferBinding {
                buffer: BITANGENT_BUFFER_INDEX,
                stride: VEC3_STRIDE,
            },
        ],
        attributes: vec![
            VertexAttribute {
                buffer: POSITION_BUFFER_INDEX,
                location: 0,
                offset: 0,
                format: VertexFormat::Float3,
            },
            VertexAttribute {
                buffer: NORMAL_BUFFER_INDEX,
                location: 1,
                offset: 0,
                format: VertexFormat::Float3,
            },
            VertexAttribute {
                buffer: TEXCOORD_BUFFER_INDEX,
                location: 2,
                offset: 0,
                format: VertexFormat::Float2,
            },
            VertexAttribute {
                buffer: TANGENT_BUFFER_INDEX,
                location: 3,
                offset: 0,
                format: VertexFormat::Float3,
            },
            VertexAttribute {
                buffer: BITANGENT_BUFFER_INDEX,
                location: 4,
                offset: 0,
                format: VertexFormat::Float3,
            },
        ],
    }
}

/// The static layout with bone influences appended. Existing attributes
/// keep their buffers, locations and order; the bone id/weight pair lands
/// at the next free locations.
pub fn skinned_vertex_layout(positions_only: bool) -> VertexLayout {
    let mut layout = static_vertex_layout(positions_only);
    let next_location = layout
        .attributes
        .iter()
        .map(|a| a.location)
        .max()
        .map_or(0, |location| location + 1);

    layout.buffers.push(VertexBufferBinding {
        buffer: BONE_BUFFER_INDEX,
        stride: size_of::<BoneVertexData>() as u32,
    });
    layout.attributes.push(VertexAttribute {
        buffer: BONE_BUFFER_INDEX,
        location: next_location,
        offset: offset_of!(BoneVertexData, ids) as u32,
        format: VertexFormat::Int4,
    });
    layout.attributes.push(VertexAttribute {
        buffer: BONE_BUFFER_INDEX,
        location: next_location + 1,
        offset: offset_of!(BoneVertexData, weights) as u32,
        format: VertexFormat::Float4,
    });
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bone_vertex_data_layout_matches_the_stream() {
        assert_eq!(size_of::<BoneVertexData>(), 32);
        assert_eq!(offset_of!(BoneVertexData, ids), 0);
        assert_eq!(offset_of!(BoneVertexData, weights), 16);
    }

    #[test]
    fn positions_only_layout_is_a_single_stream() {
        let layout = static_vertex_layout(true);
        assert_eq!(layout.buffers.len(), 1);
        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].format, VertexFormat::Float3);
    }
}
