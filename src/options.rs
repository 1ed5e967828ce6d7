//! Render feature configuration consumed by code generation and pipeline
//! builds.

/// Shadow filtering mode, baked into generated fragments as a `#define`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadowFilter {
    None,
    Pcf,
    Pcss,
}

/// Render-affecting feature toggles.
///
/// Passed explicitly into every generation and build call so that
/// generation stays a pure function of (graph, options); there is no
/// ambient global to flip.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub enable_ibl: bool,
    pub enable_normal_mapping: bool,
    pub enable_normal_shadowing: bool,
    pub enable_point_shadows: bool,
    pub shadow_filter: ShadowFilter,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            enable_ibl: true,
            enable_normal_mapping: true,
            enable_normal_shadowing: true,
            enable_point_shadows: true,
            shadow_filter: ShadowFilter::Pcss,
        }
    }
}
