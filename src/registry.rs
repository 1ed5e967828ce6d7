//! Filename-keyed shader override table driving hot reload.
//!
//! The registry doubles as the shader source provider for pipeline
//! builds: [`ShaderRegistry::source_for`] returns a live override when
//! one is stored and falls back to the on-disk file under the registry
//! root otherwise. The renderer records one rebuild callback per shader
//! file; [`ShaderRegistry::reload`] stores the edited source and runs
//! that callback under a reentrancy guard.

use std::collections::HashMap;
use std::path::PathBuf;

/// Rebuild hook recorded per shader file. It receives the registry so
/// the rebuild can fetch override sources through it.
pub type RebuildFn = Box<dyn FnMut(&mut ShaderRegistry)>;

#[derive(Default)]
struct ShaderEntry {
    override_source: Option<String>,
    rebuild: Option<RebuildFn>,
}

pub struct ShaderRegistry {
    root: PathBuf,
    entries: HashMap<String, ShaderEntry>,
    reloading: bool,
}

impl ShaderRegistry {
    /// `root` is the directory on-disk shader files are read from.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: HashMap::new(),
            reloading: false,
        }
    }

    /// Record `filename` and return its override source, if any.
    ///
    /// While a reload is in progress this never mutates the table (the
    /// rebuild it runs would otherwise edit the registry it is driven
    /// from); the override is still returned.
    pub fn register(&mut self, filename: &str) -> Option<String> {
        if self.reloading {
            return self
                .entries
                .get(filename)
                .and_then(|e| e.override_source.clone());
        }
        self.entries
            .entry(filename.to_string())
            .or_default()
            .override_source
            .clone()
    }

    /// Record the callback invoked when `filename` is reloaded. A no-op
    /// while a reload is in progress.
    pub fn set_rebuild(&mut self, filename: &str, rebuild: RebuildFn) {
        if self.reloading {
            return;
        }
        self.entries
            .entry(filename.to_string())
            .or_default()
            .rebuild = Some(rebuild);
    }

    /// Current override source for `filename`, if one is stored.
    pub fn override_source(&self, filename: &str) -> Option<&str> {
        self.entries
            .get(filename)
            .and_then(|e| e.override_source.as_deref())
    }

    /// Shader source for a pipeline build: the override if one is stored,
    /// else the on-disk file under the registry root.
    pub fn source_for(&mut self, filename: &str) -> std::io::Result<String> {
        if let Some(text) = self.register(filename) {
            return Ok(text);
        }
        std::fs::read_to_string(self.root.join(filename))
    }

    /// Store a new override source for `filename` and run its recorded
    /// rebuild callback. Registration is suppressed for the duration of
    /// the callback.
    pub fn reload(&mut self, filename: &str, source: &str) {
        let entry = self.entries.entry(filename.to_string()).or_default();
        entry.override_source = Some(source.to_string());
        let Some(mut rebuild) = entry.rebuild.take() else {
            return;
        };

        self.reloading = true;
        rebuild(self);
        self.reloading = false;

        if let Some(entry) = self.entries.get_mut(filename) {
            entry.rebuild = Some(rebuild);
        }
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }
}
