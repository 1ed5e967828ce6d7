//! Two-stage shader cross-compilation: a GLSL front end producing a
//! validated portable intermediate representation, and back ends that
//! retarget the IR to a device dialect.
//!
//! Both stages are stateless per call; the context ([`ShaderCompiler`])
//! owns the front end and the include search paths and is constructed
//! once, then passed by reference into every call.

mod preprocess;

use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage a shader is compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl ShaderStage {
    /// Stage selection from a shader filename: `.vert` and `.comp` are
    /// recognized suffixes, everything else compiles as a fragment stage.
    pub fn from_filename(name: &str) -> Self {
        if name.contains(".vert") {
            ShaderStage::Vertex
        } else if name.contains(".comp") {
            ShaderStage::Compute
        } else {
            ShaderStage::Fragment
        }
    }

    fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
            ShaderStage::Compute => naga::ShaderStage::Compute,
        }
    }
}

/// Shading dialect a device consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderDialect {
    /// Binary serialization of the IR, for consumers that accept it
    /// directly.
    SpirV,
    /// Textual Metal retarget, with a mobile/desktop sub-option.
    Msl,
    /// Textual WGSL retarget.
    Wgsl,
}

/// Compiled shader payload, textual or binary depending on the dialect.
#[derive(Clone, Debug, PartialEq)]
pub enum ShaderSource {
    Text(String),
    Binary(Vec<u32>),
}

impl ShaderSource {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ShaderSource::Text(text) => Some(text),
            ShaderSource::Binary(_) => None,
        }
    }

    pub fn as_words(&self) -> Option<&[u32]> {
        match self {
            ShaderSource::Text(_) => None,
            ShaderSource::Binary(words) => Some(words),
        }
    }
}

/// Per-call compilation parameters.
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    /// Preprocessor symbols defined to `1` for this compile.
    pub definitions: Vec<String>,
    /// MSL sub-option: target mobile Metal rather than desktop.
    pub mobile_target: bool,
}

impl CompileOptions {
    pub fn define(&mut self, name: impl Into<String>) {
        self.definitions.push(name.into());
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("shader parse failed: {diagnostic}")]
    Parse { diagnostic: String },
    #[error("shader link failed: {diagnostic}")]
    Link { diagnostic: String },
    #[error("shader translation failed: {diagnostic}")]
    Translate { diagnostic: String },
    #[error("cannot resolve #include \"{path}\"")]
    Include { path: String },
    #[error("include depth limit exceeded at \"{path}\"")]
    IncludeCycle { path: String },
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Validated portable intermediate representation of one shader stage.
///
/// Binding-index decorations recorded here are carried into every
/// retarget verbatim; the scene contract's binding layout depends on
/// that.
#[derive(Debug)]
pub struct ShaderIr {
    module: naga::Module,
    info: naga::valid::ModuleInfo,
}

/// The cross-compiler context.
pub struct ShaderCompiler {
    frontend: naga::front::glsl::Frontend,
    include_paths: Vec<PathBuf>,
}

impl ShaderCompiler {
    pub fn new() -> Self {
        Self {
            frontend: naga::front::glsl::Frontend::default(),
            include_paths: Vec::new(),
        }
    }

    /// Add a directory searched by `#include` directives, lowest priority
    /// last.
    pub fn add_include_path(&mut self, path: impl Into<PathBuf>) {
        self.include_paths.push(path.into());
    }

    /// Front end: include expansion, feature defines, parse and validate.
    /// Returns the IR or a diagnostic-carrying error; there is no partial
    /// artifact.
    pub fn parse(
        &mut self,
        stage: ShaderStage,
        source: &str,
        options: &CompileOptions,
    ) -> Result<ShaderIr, CompileError> {
        let expanded = preprocess::preprocess(source, &self.include_paths)?;

        let mut defines = naga::FastHashMap::default();
        for name in &options.definitions {
            defines.insert(name.clone(), "1".to_string());
        }
        let glsl_options = naga::front::glsl::Options {
            stage: stage.to_naga(),
            defines,
        };

        let module = self
            .frontend
            .parse(&glsl_options, &expanded)
            .map_err(|e| CompileError::Parse {
                diagnostic: format!("{e:?}"),
            })?;

        let info = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .map_err(|e| CompileError::Link {
            diagnostic: format!("{e:?}"),
        })?;

        Ok(ShaderIr { module, info })
    }

    /// Back end: retarget the IR to one device dialect.
    pub fn translate(
        &self,
        ir: &ShaderIr,
        dialect: ShaderDialect,
        options: &CompileOptions,
    ) -> Result<ShaderSource, CompileError> {
        match dialect {
            ShaderDialect::SpirV => {
                let words = naga::back::spv::write_vec(
                    &ir.module,
                    &ir.info,
                    &naga::back::spv::Options::default(),
                    None,
                )
                .map_err(|e| CompileError::Translate {
                    diagnostic: format!("{e:?}"),
                })?;
                Ok(ShaderSource::Binary(words))
            }
            ShaderDialect::Msl => {
                let msl_options = naga::back::msl::Options {
                    lang_version: if options.mobile_target { (2, 0) } else { (2, 2) },
                    fake_missing_bindings: true,
                    ..Default::default()
                };
                let (text, _) = naga::back::msl::write_string(
                    &ir.module,
                    &ir.info,
                    &msl_options,
                    &naga::back::msl::PipelineOptions::default(),
                )
                .map_err(|e| CompileError::Translate {
                    diagnostic: format!("{e:?}"),
                })?;
                Ok(ShaderSource::Text(text))
            }
            ShaderDialect::Wgsl => {
                let text = naga::back::wgsl::write_string(
                    &ir.module,
                    &ir.info,
                    naga::back::wgsl::WriterFlags::EXPLICIT_TYPES,
                )
                .map_err(|e| CompileError::Translate {
                    diagnostic: format!("{e:?}"),
                })?;
                Ok(ShaderSource::Text(text))
            }
        }
    }

    /// Front end and back end chained.
    pub fn compile(
        &mut self,
        stage: ShaderStage,
        source: &str,
        dialect: ShaderDialect,
        options: &CompileOptions,
    ) -> Result<ShaderSource, CompileError> {
        let ir = self.parse(stage, source, options)?;
        self.translate(&ir, dialect, options)
    }
}

impl Default for ShaderCompiler {
    fn default() -> Self {
        Self::new()
    }
}
