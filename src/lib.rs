//! Material graph compilation and shader cross-compilation.
//!
//! The crate turns an artist-editable node graph ([`graph::Graph`]) into
//! GLSL fragment source ([`codegen::generate_fragment`]), translates shader
//! source through a portable intermediate representation into a device
//! dialect ([`shader::ShaderCompiler`]), and builds the static / skinned /
//! probe-capture pipeline variants a renderer draws with
//! ([`permutation::PermutationBuilder`]). Live shader editing re-enters the
//! build path through [`registry::ShaderRegistry`].
//!
//! GPU resources are owned elsewhere: the device is consumed through the
//! [`pipeline::GraphicsDevice`] trait and only ever hands back opaque
//! handles.

pub mod codegen;
pub mod graph;
pub mod material;
pub mod nodes;
pub mod options;
pub mod permutation;
pub mod pipeline;
pub mod registry;
pub mod shader;

pub use codegen::{GeneratedFragment, generate_fragment};
pub use graph::{Graph, NodeId, ValueKind};
pub use material::{AssetError, Material, load_material, save_material};
pub use nodes::NodeKind;
pub use options::{RenderOptions, ShadowFilter};
pub use permutation::PermutationBuilder;
pub use pipeline::{GraphicsDevice, GraphicsPipelineDescriptor, PipelineHandle};
pub use registry::ShaderRegistry;
pub use shader::{CompileError, CompileOptions, ShaderCompiler, ShaderDialect, ShaderStage};
