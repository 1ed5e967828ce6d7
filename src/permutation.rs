//! Static / skinned / probe-capture pipeline permutations derived from
//! one pipeline description.

use tracing::error;

use crate::codegen::{self, contract};
use crate::material::Material;
use crate::options::RenderOptions;
use crate::pipeline::{
    BONE_MATRIX_BINDING, Binding, BindingKind, BlendFactor, BlendState, CullingMode, DepthMode,
    GraphicsDevice, GraphicsPipelineDescriptor, PipelineHandle, RenderPassHandle,
    SpecializationConstant, StageDescriptor, skinned_vertex_layout, static_vertex_layout,
};
use crate::registry::ShaderRegistry;
use crate::shader::{CompileOptions, ShaderCompiler, ShaderSource, ShaderStage};

/// Builds device pipeline variants. One instance borrows the device, the
/// cross-compiler and the shader registry for the duration of a build;
/// every variant is an independent compile, and one failing never rolls
/// back a sibling.
pub struct PermutationBuilder<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    pub compiler: &'a mut ShaderCompiler,
    pub registry: &'a mut ShaderRegistry,
}

impl<'a> PermutationBuilder<'a> {
    pub fn new(
        device: &'a mut dyn GraphicsDevice,
        compiler: &'a mut ShaderCompiler,
        registry: &'a mut ShaderRegistry,
    ) -> Self {
        Self {
            device,
            compiler,
            registry,
        }
    }

    /// Load one stage through the registry (so live overrides win) and
    /// cross-compile it to the device dialect.
    fn stage_source(&mut self, filename: &str, skinned: bool, cubemap: bool) -> Option<ShaderSource> {
        let text = match self.registry.source_for(filename) {
            Ok(text) => text,
            Err(err) => {
                error!(filename, %err, "failed to open shader file");
                return None;
            }
        };

        let mut options = CompileOptions::default();
        if skinned {
            options.define("BONE");
        }
        if cubemap {
            options.define("CUBEMAP");
        }

        let stage = ShaderStage::from_filename(filename);
        match self
            .compiler
            .compile(stage, &text, self.device.accepted_dialect(), &options)
        {
            Ok(source) => Some(source),
            Err(err) => {
                error!(filename, %err, "shader cross-compilation failed");
                None
            }
        }
    }

    /// Cross-compile already-generated fragment text to the device
    /// dialect.
    fn fragment_source(&mut self, label: &str, text: &str) -> Option<ShaderSource> {
        match self.compiler.compile(
            ShaderStage::Fragment,
            text,
            self.device.accepted_dialect(),
            &CompileOptions::default(),
        ) {
            Ok(source) => Some(source),
            Err(err) => {
                error!(label, %err, "material fragment cross-compilation failed");
                None
            }
        }
    }

    /// The unskinned variant. Vertex inputs are position, normal, uv,
    /// tangent and bitangent, or position alone for depth-only passes.
    pub fn create_static_pipeline(
        &mut self,
        mut descriptor: GraphicsPipelineDescriptor,
        positions_only: bool,
        cubemap: bool,
    ) -> Option<PipelineHandle> {
        if positions_only {
            descriptor.label.push_str(" (Shadow)");
        }
        if cubemap {
            descriptor.label.push_str(" (Cubemap)");
        }

        let vertex_file = format!("{}.glsl", descriptor.vertex.path);
        descriptor.vertex.source = Some(self.stage_source(&vertex_file, false, cubemap)?);
        descriptor.vertex_layout = static_vertex_layout(positions_only);

        self.device.create_graphics_pipeline(&descriptor)
    }

    /// The skinned variant: the static vertex inputs plus bone influences,
    /// a storage-buffer binding for bone matrices, and the vertex stage
    /// recompiled with `BONE` defined.
    pub fn create_skinned_pipeline(
        &mut self,
        mut descriptor: GraphicsPipelineDescriptor,
        positions_only: bool,
    ) -> Option<PipelineHandle> {
        descriptor.label.push_str(" (Skinned)");

        let vertex_file = format!("{}.glsl", descriptor.vertex.path);
        descriptor.vertex.source = Some(self.stage_source(&vertex_file, true, false)?);
        descriptor.bindings.push(Binding {
            index: BONE_MATRIX_BINDING,
            kind: BindingKind::StorageBuffer,
        });
        descriptor.vertex_layout = skinned_vertex_layout(positions_only);

        self.device.create_graphics_pipeline(&descriptor)
    }

    /// Static and skinned variants of one description. Callers must
    /// null-check each result independently.
    pub fn create_pipeline_permutations(
        &mut self,
        descriptor: &GraphicsPipelineDescriptor,
        positions_only: bool,
    ) -> (Option<PipelineHandle>, Option<PipelineHandle>) {
        let static_pipeline = self.create_static_pipeline(descriptor.clone(), positions_only, false);
        let skinned_pipeline = self.create_skinned_pipeline(descriptor.clone(), positions_only);
        (static_pipeline, skinned_pipeline)
    }

    /// Compile a material's fragment graph and build its static, skinned
    /// and probe-capture pipelines.
    ///
    /// The binding map recorded on the material is the one the device
    /// must bind textures by. Every pipeline slot is independently
    /// optional; a `None` slot means that variant is not yet drawable.
    pub fn build_material_pipelines(
        &mut self,
        material: &mut Material,
        options: &RenderOptions,
        scene_pass: Option<RenderPassHandle>,
        capture_pass: Option<RenderPassHandle>,
    ) {
        let mut descriptor = mesh_pipeline_descriptor();
        descriptor.render_pass = scene_pass;

        let fragment = codegen::generate_fragment(&material.graph, options, true);
        material.bound_textures = fragment.bound_textures;

        let (static_pipeline, skinned_pipeline) =
            match self.fragment_source(&descriptor.label, &fragment.source) {
                Some(source) => {
                    descriptor.fragment.source = Some(source);
                    self.create_pipeline_permutations(&descriptor, false)
                }
                None => (None, None),
            };
        material.static_pipeline = static_pipeline;
        material.skinned_pipeline = skinned_pipeline;

        // Probe capture renders without IBL and with per-face layer
        // output selected by the CUBEMAP define.
        descriptor.render_pass = capture_pass;
        let capture = codegen::generate_fragment(&material.graph, options, false);
        material.capture_pipeline = match self.fragment_source(&descriptor.label, &capture.source) {
            Some(source) => {
                descriptor.fragment.source = Some(source);
                self.create_static_pipeline(descriptor, false, true)
            }
            None => None,
        };
    }
}

/// The fixed mesh pipeline description every material build starts from.
pub fn mesh_pipeline_descriptor() -> GraphicsPipelineDescriptor {
    let constants = vec![
        SpecializationConstant {
            index: 0,
            value: contract::MAX_MATERIALS,
        },
        SpecializationConstant {
            index: 1,
            value: contract::MAX_LIGHTS,
        },
        SpecializationConstant {
            index: 2,
            value: contract::MAX_SPOT_LIGHTS,
        },
        SpecializationConstant {
            index: 3,
            value: contract::MAX_PROBES,
        },
    ];

    GraphicsPipelineDescriptor {
        label: "Mesh".to_string(),
        vertex: StageDescriptor {
            path: "mesh.vert".to_string(),
            source: None,
            constants: constants.clone(),
        },
        fragment: StageDescriptor {
            path: String::new(),
            source: None,
            constants,
        },
        bindings: vec![
            Binding {
                index: 1,
                kind: BindingKind::StorageBuffer,
            },
            Binding {
                index: 0,
                kind: BindingKind::PushConstant,
            },
            Binding {
                index: 2,
                kind: BindingKind::Texture,
            },
            Binding {
                index: 3,
                kind: BindingKind::Texture,
            },
            Binding {
                index: 4,
                kind: BindingKind::Texture,
            },
            Binding {
                index: 5,
                kind: BindingKind::Texture,
            },
            Binding {
                index: 6,
                kind: BindingKind::Texture,
            },
            Binding {
                index: 7,
                kind: BindingKind::Texture,
            },
        ],
        // model matrix plus the per-draw material index
        push_constant_size: 68,
        blend: BlendState {
            enabled: false,
            src_rgb: BlendFactor::SrcAlpha,
            dst_rgb: BlendFactor::OneMinusSrcAlpha,
        },
        depth: DepthMode::Less,
        culling: CullingMode::Backface,
        render_pass: None,
        ..GraphicsPipelineDescriptor::default()
    }
}
