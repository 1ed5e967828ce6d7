use material_forge::codegen::{MATERIAL_SAMPLER_BASE, generate_fragment};
use material_forge::graph::Graph;
use material_forge::nodes::NodeKind;
use material_forge::options::{RenderOptions, ShadowFilter};

#[test]
fn graph_without_an_output_node_gets_the_fallback_body() {
    let graph = Graph::new();
    let fragment = generate_fragment(&graph, &RenderOptions::default(), true);

    assert!(fragment.source.contains("vec3 final_diffuse_color = vec3(1);"));
    assert!(fragment.source.contains("float final_roughness = 0.5;"));
    assert!(fragment.source.contains("float final_metallic = 0.0;"));
    assert!(fragment.source.contains("vec3 final_normal = in_normal;"));
    assert!(fragment.bound_textures.is_empty());
}

#[test]
fn unconnected_inputs_use_type_defaults() {
    let mut graph = Graph::new();
    graph.add(NodeKind::Output);

    let fragment = generate_fragment(&graph, &RenderOptions::default(), true);

    // Opaque white for the color, zero for the scalars, the geometric
    // normal for the normal input.
    assert!(fragment
        .source
        .contains("vec3 final_diffuse_color = from_srgb_to_linear(vec3(1, 1, 1));"));
    assert!(fragment.source.contains("float final_roughness = 0.0;"));
    assert!(fragment.source.contains("float final_metallic = 0.0;"));
    assert!(fragment.source.contains("vec3 final_normal = in_normal;"));

    // No per-material samplers were declared.
    assert!(fragment.bound_textures.is_empty());
    assert!(!fragment
        .source
        .contains(&format!("layout(binding = {MATERIAL_SAMPLER_BASE}")));
}

#[test]
fn constant_output_variable_is_substituted_into_the_consumer() {
    let mut graph = Graph::new();
    let constant = graph.add(NodeKind::Vector3Constant);
    let output = graph.add(NodeKind::Output);
    {
        let node = graph.node_mut(constant).unwrap();
        node.property_mut("Color").unwrap().vector = [1.0, 0.0, 0.0];
    }
    graph.link(constant, "Value", output, "Color").unwrap();

    let fragment = generate_fragment(&graph, &RenderOptions::default(), true);
    let variable = graph.node(constant).unwrap().connector_variable("Value");

    assert!(fragment
        .source
        .contains(&format!("vec3 {variable} = vec3(1.0, 0.0, 0.0);")));
    assert!(fragment
        .source
        .contains(&format!("vec3 final_diffuse_color = from_srgb_to_linear({variable});")));
}

#[test]
fn fan_out_emits_a_node_body_exactly_once() {
    let mut graph = Graph::new();
    let constant = graph.add(NodeKind::FloatConstant);
    let output = graph.add(NodeKind::Output);
    {
        let node = graph.node_mut(constant).unwrap();
        node.property_mut("Data").unwrap().scalar = 0.25;
    }
    graph.link(constant, "Value", output, "Roughness").unwrap();
    graph.link(constant, "Value", output, "Metallic").unwrap();

    let fragment = generate_fragment(&graph, &RenderOptions::default(), true);
    let variable = graph.node(constant).unwrap().connector_variable("Value");

    let declaration = format!("float {variable} = 0.25;");
    assert_eq!(fragment.source.matches(&declaration).count(), 1);
    assert!(fragment
        .source
        .contains(&format!("float final_roughness = {variable};")));
    assert!(fragment
        .source
        .contains(&format!("float final_metallic = {variable};")));
}

#[test]
fn generation_is_deterministic() {
    let mut graph = Graph::new();
    let texture = graph.add(NodeKind::TextureSample);
    let output = graph.add(NodeKind::Output);
    {
        let node = graph.node_mut(texture).unwrap();
        node.property_mut("Texture").unwrap().texture = Some("textures/wood.png".to_string());
    }
    graph.link(texture, "Value", output, "Color").unwrap();

    let options = RenderOptions::default();
    let first = generate_fragment(&graph, &options, true);
    let second = generate_fragment(&graph, &options, true);

    assert_eq!(first.source, second.source);
    assert_eq!(first.bound_textures, second.bound_textures);
}

#[test]
fn texture_properties_bind_after_the_reserved_range() {
    let mut graph = Graph::new();
    let texture = graph.add(NodeKind::TextureSample);
    let output = graph.add(NodeKind::Output);
    {
        let node = graph.node_mut(texture).unwrap();
        node.property_mut("Texture").unwrap().texture = Some("textures/wood.png".to_string());
    }
    graph.link(texture, "Value", output, "Color").unwrap();

    let fragment = generate_fragment(&graph, &RenderOptions::default(), true);
    let sampler = graph.node(texture).unwrap().property_variable("Texture");

    assert_eq!(fragment.bound_textures.len(), 1);
    assert_eq!(
        fragment.bound_textures.get(&MATERIAL_SAMPLER_BASE),
        Some(&Some("textures/wood.png".to_string()))
    );
    assert!(fragment.source.contains(&format!(
        "layout(binding = {MATERIAL_SAMPLER_BASE}) uniform sampler2D {sampler};"
    )));
    assert!(fragment
        .source
        .contains(&format!("texture({sampler}, in_uv).rgb")));
}

#[test]
fn texture_bindings_follow_node_insertion_order() {
    let mut graph = Graph::new();
    let first = graph.add(NodeKind::TextureSample);
    let second = graph.add(NodeKind::TextureSample);
    let output = graph.add(NodeKind::Output);
    graph
        .node_mut(first)
        .unwrap()
        .property_mut("Texture")
        .unwrap()
        .texture = Some("textures/base.png".to_string());
    graph
        .node_mut(second)
        .unwrap()
        .property_mut("Texture")
        .unwrap()
        .texture = Some("textures/detail.png".to_string());
    graph.link(first, "Value", output, "Color").unwrap();
    graph.link(second, "Value", output, "Normals").unwrap();

    let fragment = generate_fragment(&graph, &RenderOptions::default(), true);

    let slots: Vec<_> = fragment.bound_textures.iter().collect();
    assert_eq!(
        slots,
        vec![
            (
                &MATERIAL_SAMPLER_BASE,
                &Some("textures/base.png".to_string())
            ),
            (
                &(MATERIAL_SAMPLER_BASE + 1),
                &Some("textures/detail.png".to_string())
            ),
        ]
    );
}

#[test]
fn mismatched_connector_kinds_read_a_single_component() {
    let mut graph = Graph::new();
    let constant = graph.add(NodeKind::Vector3Constant);
    let output = graph.add(NodeKind::Output);
    // Vector3 output into a scalar input.
    graph.link(constant, "Value", output, "Roughness").unwrap();

    let fragment = generate_fragment(&graph, &RenderOptions::default(), true);
    let variable = graph.node(constant).unwrap().connector_variable("Value");

    assert!(fragment
        .source
        .contains(&format!("float final_roughness = {variable}.r;")));
}

#[test]
fn normal_map_transform_is_gated_by_the_feature_flag() {
    let mut graph = Graph::new();
    let texture = graph.add(NodeKind::TextureSample);
    let output = graph.add(NodeKind::Output);
    graph
        .node_mut(texture)
        .unwrap()
        .property_mut("Texture")
        .unwrap()
        .texture = Some("textures/normal.png".to_string());
    graph.link(texture, "Value", output, "Normals").unwrap();

    let variable = graph.node(texture).unwrap().connector_variable("Value");
    let sampler = graph.node(texture).unwrap().property_variable("Texture");

    let enabled = generate_fragment(&graph, &RenderOptions::default(), true);
    assert!(enabled
        .source
        .contains(&format!("in_tbn * (2.0 * {variable} - 1.0)")));
    // Normal shadowing modulates each light by the normal-map sampler.
    assert!(enabled.source.contains(&format!(
        "calculate_normal_lighting({sampler}, final_normal, light_info.direction)"
    )));

    let options = RenderOptions {
        enable_normal_mapping: false,
        enable_normal_shadowing: false,
        ..RenderOptions::default()
    };
    let disabled = generate_fragment(&graph, &options, true);
    assert!(!disabled.source.contains("in_tbn * (2.0 *"));
    assert!(disabled.source.contains("vec3 final_normal = in_normal;"));
    assert!(!disabled.source.contains("calculate_normal_lighting"));
}

#[test]
fn ibl_declarations_follow_the_toggle() {
    let mut graph = Graph::new();
    graph.add(NodeKind::Output);

    let with_ibl = generate_fragment(&graph, &RenderOptions::default(), true);
    assert!(with_ibl.source.contains("irradianceSampler"));
    assert!(with_ibl.source.contains("vec3 ibl(const int probe"));

    let without = generate_fragment(&graph, &RenderOptions::default(), false);
    assert!(!without.source.contains("irradianceSampler"));
    assert!(without.source.contains("frag_output = vec4(Lo, 1.0);"));

    // A globally disabled IBL wins over the caller asking for it.
    let options = RenderOptions {
        enable_ibl: false,
        ..RenderOptions::default()
    };
    let forced_off = generate_fragment(&graph, &options, true);
    assert!(!forced_off.source.contains("irradianceSampler"));
}

#[test]
fn shadow_filter_selects_the_feature_define() {
    let graph = Graph::new();
    for (filter, define) in [
        (ShadowFilter::None, "#define SHADOW_FILTER_NONE"),
        (ShadowFilter::Pcf, "#define SHADOW_FILTER_PCF"),
        (ShadowFilter::Pcss, "#define SHADOW_FILTER_PCSS"),
    ] {
        let options = RenderOptions {
            shadow_filter: filter,
            ..RenderOptions::default()
        };
        let fragment = generate_fragment(&graph, &options, true);
        assert!(fragment.source.contains(define), "missing {define}");
    }
}

#[test]
fn identical_topology_differs_only_in_literals() {
    let build = |color: [f32; 3]| {
        let mut graph = Graph::new();
        let constant = graph.add(NodeKind::Vector3Constant);
        let output = graph.add(NodeKind::Output);
        graph
            .node_mut(constant)
            .unwrap()
            .property_mut("Color")
            .unwrap()
            .vector = color;
        graph.link(constant, "Value", output, "Color").unwrap();
        generate_fragment(&graph, &RenderOptions::default(), true)
    };

    let red = build([1.0, 0.0, 0.0]);
    let teal = build([0.0, 0.5, 0.5]);

    assert_eq!(red.bound_textures, teal.bound_textures);
    assert_eq!(
        red.source.replace("vec3(1.0, 0.0, 0.0)", "vec3(0.0, 0.5, 0.5)"),
        teal.source
    );
}

#[test]
fn point_shadow_support_follows_the_toggle() {
    let graph = Graph::new();

    let on = generate_fragment(&graph, &RenderOptions::default(), true);
    assert!(on.source.contains("#define POINT_SHADOWS_SUPPORTED"));
    assert!(on.source.contains("point_shadow"));

    let options = RenderOptions {
        enable_point_shadows: false,
        ..RenderOptions::default()
    };
    let off = generate_fragment(&graph, &options, true);
    assert!(!off.source.contains("POINT_SHADOWS_SUPPORTED"));
}

#[test]
fn any_vector_feeding_the_normal_input_goes_through_the_tangent_transform() {
    let mut graph = Graph::new();
    let geometry = graph.add(NodeKind::Geometry);
    let output = graph.add(NodeKind::Output);
    graph.link(geometry, "Normal", output, "Normals").unwrap();

    let fragment = generate_fragment(&graph, &RenderOptions::default(), true);
    let variable = graph.node(geometry).unwrap().connector_variable("Normal");

    assert!(fragment
        .source
        .contains(&format!("vec3 {variable} = normalize(in_normal);")));
    assert!(fragment
        .source
        .contains(&format!("in_tbn * (2.0 * {variable} - 1.0)")));
}
