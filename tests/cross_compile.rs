use std::path::PathBuf;

use material_forge::shader::{
    CompileError, CompileOptions, ShaderCompiler, ShaderDialect, ShaderSource, ShaderStage,
};

fn shader_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("shaders")
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(shader_dir().join(name))
        .unwrap_or_else(|e| panic!("read fixture {name}: {e}"))
}

const MINIMAL_VERT: &str = "\
#version 450 core
layout(location = 0) in vec3 in_position;
void main() {
    gl_Position = vec4(in_position, 1.0);
}
";

#[test]
fn vertex_stage_retargets_to_wgsl() {
    let mut compiler = ShaderCompiler::new();
    let out = compiler
        .compile(
            ShaderStage::Vertex,
            MINIMAL_VERT,
            ShaderDialect::Wgsl,
            &CompileOptions::default(),
        )
        .unwrap();
    let text = out.as_text().expect("WGSL is textual");
    assert!(text.contains("fn main"));
    assert!(text.contains("@vertex"));
}

#[test]
fn spirv_output_is_binary_words() {
    let mut compiler = ShaderCompiler::new();
    let out = compiler
        .compile(
            ShaderStage::Vertex,
            MINIMAL_VERT,
            ShaderDialect::SpirV,
            &CompileOptions::default(),
        )
        .unwrap();
    let words = out.as_words().expect("SPIR-V is binary");
    assert_eq!(words[0], 0x0723_0203, "SPIR-V magic number");
}

#[test]
fn msl_output_targets_metal() {
    let mut compiler = ShaderCompiler::new();
    for mobile in [false, true] {
        let options = CompileOptions {
            mobile_target: mobile,
            ..CompileOptions::default()
        };
        let out = compiler
            .compile(ShaderStage::Vertex, MINIMAL_VERT, ShaderDialect::Msl, &options)
            .unwrap();
        let text = out.as_text().expect("MSL is textual");
        assert!(text.contains("metal_stdlib"));
    }
}

#[test]
fn the_ir_can_be_retargeted_more_than_once() {
    let mut compiler = ShaderCompiler::new();
    let ir = compiler
        .parse(ShaderStage::Vertex, MINIMAL_VERT, &CompileOptions::default())
        .unwrap();

    let wgsl = compiler
        .translate(&ir, ShaderDialect::Wgsl, &CompileOptions::default())
        .unwrap();
    let spirv = compiler
        .translate(&ir, ShaderDialect::SpirV, &CompileOptions::default())
        .unwrap();

    assert!(matches!(wgsl, ShaderSource::Text(_)));
    assert!(matches!(spirv, ShaderSource::Binary(_)));
}

#[test]
fn includes_resolve_against_the_search_paths() {
    let mut compiler = ShaderCompiler::new();
    compiler.add_include_path(shader_dir());

    let out = compiler
        .compile(
            ShaderStage::Fragment,
            &fixture("tint.frag.glsl"),
            ShaderDialect::Wgsl,
            &CompileOptions::default(),
        )
        .unwrap();
    let text = out.as_text().unwrap();
    assert!(text.contains("scale_color"));
}

#[test]
fn missing_includes_fail_with_the_offending_path() {
    let mut compiler = ShaderCompiler::new();
    // No include path registered at all.
    let err = compiler
        .compile(
            ShaderStage::Fragment,
            &fixture("tint.frag.glsl"),
            ShaderDialect::Wgsl,
            &CompileOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, CompileError::Include { path } if path == "common.glsl"));
}

#[test]
fn feature_defines_select_preprocessor_branches() {
    let mut compiler = ShaderCompiler::new();
    let source = fixture("mesh.vert.glsl");

    let plain = compiler
        .compile(
            ShaderStage::Vertex,
            &source,
            ShaderDialect::Wgsl,
            &CompileOptions::default(),
        )
        .unwrap();
    assert!(!plain.as_text().unwrap().contains("bone"));

    let mut options = CompileOptions::default();
    options.define("BONE");
    let skinned = compiler
        .compile(ShaderStage::Vertex, &source, ShaderDialect::Wgsl, &options)
        .unwrap();
    assert!(skinned.as_text().unwrap().contains("bone"));
}

#[test]
fn parse_failures_never_yield_a_partial_artifact() {
    let mut compiler = ShaderCompiler::new();
    let result = compiler.compile(
        ShaderStage::Fragment,
        "void main( { broken",
        ShaderDialect::Wgsl,
        &CompileOptions::default(),
    );
    match result {
        Err(CompileError::Parse { diagnostic }) => assert!(!diagnostic.is_empty()),
        other => panic!("expected a parse error, got {other:?}"),
    }
}
