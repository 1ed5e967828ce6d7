//! Fragment source generation: a dependency-ordered walk of the material
//! graph with placeholder substitution, wrapped in the scene contract.

pub mod contract;

use std::collections::{BTreeMap, HashSet};

use crate::graph::{Graph, InputConnector, Node, NodeId, Property, ValueKind};
use crate::nodes::NodeKind;
use crate::options::RenderOptions;

pub use contract::MATERIAL_SAMPLER_BASE;

/// Result of one generation call: the fragment source plus the sampler
/// binding map the renderer binds textures by.
#[derive(Clone, Debug, Default)]
pub struct GeneratedFragment {
    pub source: String,
    /// Sampler binding index -> texture asset path, in contract order.
    /// Entries exist even for texture properties with no asset assigned
    /// yet, so the slot layout never shifts as the artist fills them in.
    pub bound_textures: BTreeMap<u32, Option<String>>,
}

/// Generate the fragment shader for a material graph.
///
/// A pure function of its arguments: running it twice on an unmodified
/// graph with unmodified options yields byte-identical source and the
/// same binding assignment. `use_ibl` is forced off when the options
/// disable IBL globally.
pub fn generate_fragment(graph: &Graph, options: &RenderOptions, use_ibl: bool) -> GeneratedFragment {
    let use_ibl = use_ibl && options.enable_ibl;

    let mut src = String::new();
    contract::write_prologue(&mut src, options, use_ibl);

    // Per-material samplers, one per texture property in node order,
    // starting right after the contract's reserved range.
    let mut bound_textures = BTreeMap::new();
    let mut sampler_index = contract::MATERIAL_SAMPLER_BASE;
    for node in graph.nodes() {
        for property in &node.properties {
            if property.kind == ValueKind::TextureAsset {
                bound_textures.insert(sampler_index, property.texture.clone());
                src.push_str(&format!(
                    "layout(binding = {sampler_index}) uniform sampler2D {};\n",
                    node.property_variable(property.name)
                ));
                sampler_index += 1;
            }
        }
    }

    contract::write_helpers(&mut src, options, use_ibl);

    src.push_str("void main() {\n");

    let mut visited = HashSet::new();
    let mut emitted_output = false;
    let mut normal_map_sampler = None;
    for node in graph.nodes() {
        if node.kind != NodeKind::Output {
            continue;
        }
        if let Some(sampler) = normal_map_texture(graph, node) {
            normal_map_sampler = Some(sampler);
        }
        walk_node(graph, options, node, &mut visited, &mut src);
        emitted_output = true;
    }

    if !emitted_output {
        src.push_str("vec3 final_diffuse_color = vec3(1);\n");
        src.push_str("float final_roughness = 0.5;\n");
        src.push_str("float final_metallic = 0.0;\n");
        src.push_str("vec3 final_normal = in_normal;\n");
    }

    contract::write_epilogue(&mut src, options, use_ibl, normal_map_sampler.as_deref());

    GeneratedFragment {
        source: src,
        bound_textures,
    }
}

/// Sampler variable of the texture node feeding the output's normal-map
/// input, if that input is connected to a node carrying a texture
/// property.
fn normal_map_texture(graph: &Graph, output: &Node) -> Option<String> {
    let input = output.inputs.iter().find(|i| i.is_normal_map)?;
    let source = graph.node(input.link?.node)?;
    let property = source
        .properties
        .iter()
        .find(|p| p.kind == ValueKind::TextureAsset)?;
    Some(source.property_variable(property.name))
}

/// Emit one node's body after all of its dependencies, each node at most
/// once. The visited set is keyed by node id, so fan-out never duplicates
/// a body and cycles cannot recurse forever.
fn walk_node(
    graph: &Graph,
    options: &RenderOptions,
    node: &Node,
    visited: &mut HashSet<NodeId>,
    src: &mut String,
) {
    if !visited.insert(node.id) {
        return;
    }

    for input in &node.inputs {
        let Some(link) = input.link else {
            continue;
        };
        if let Some(source) = graph.node(link.node) {
            walk_node(graph, options, source, visited, src);
        }
    }

    let mut body = node.kind.body(node);
    for property in &node.properties {
        body = body.replace(property.name, &property_value(node, property));
    }
    for input in &node.inputs {
        body = body.replace(input.name, &connector_value(graph, options, input));
    }
    for output in &node.outputs {
        body = body.replace(output.name, &node.connector_variable(output.name));
    }
    src.push_str(&body);
}

/// The expression an input connector reads from.
fn connector_value(graph: &Graph, options: &RenderOptions, connector: &InputConnector) -> String {
    let linked = connector.link.and_then(|link| {
        let source = graph.node(link.node)?;
        let peer = source.outputs.get(link.connector)?;
        Some((source, peer))
    });
    let Some((source, peer)) = linked else {
        return default_value(connector.kind);
    };

    let variable = source.connector_variable(peer.name);
    if connector.kind != peer.kind {
        // Mismatched kinds degrade to a single-component read instead of
        // rejecting the connection.
        return format!("{variable}.r");
    }
    if connector.is_normal_map {
        if options.enable_normal_mapping {
            return format!("in_tbn * (2.0 * {variable} - 1.0)");
        }
        return "in_normal".to_string();
    }
    variable
}

/// Type default for an unconnected input: zero for scalars, opaque white
/// for vectors.
fn default_value(kind: ValueKind) -> String {
    match kind {
        ValueKind::Scalar => "0.0".to_string(),
        _ => "vec3(1, 1, 1)".to_string(),
    }
}

/// The literal expression substituted for a property placeholder.
fn property_value(node: &Node, property: &Property) -> String {
    match property.kind {
        ValueKind::Vector3 => {
            let [x, y, z] = property.vector;
            format!(
                "vec3({}, {}, {})",
                glsl_float(x),
                glsl_float(y),
                glsl_float(z)
            )
        }
        ValueKind::Scalar => glsl_float(property.scalar),
        ValueKind::TextureAsset => {
            format!("texture({}, in_uv).rgb", node.property_variable(property.name))
        }
    }
}

/// Float literal that always carries a decimal point so the token stays a
/// float under strict GLSL front ends.
fn glsl_float(value: f32) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_literals_keep_a_decimal_point() {
        assert_eq!(glsl_float(0.0), "0.0");
        assert_eq!(glsl_float(1.0), "1.0");
        assert_eq!(glsl_float(-2.0), "-2.0");
        assert_eq!(glsl_float(0.25), "0.25");
    }

    #[test]
    fn unconnected_defaults_by_kind() {
        assert_eq!(default_value(ValueKind::Scalar), "0.0");
        assert_eq!(default_value(ValueKind::Vector3), "vec3(1, 1, 1)");
    }
}
