//! The closed set of material node variants, their port layouts and GLSL
//! body templates.

use crate::graph::{InputConnector, Node, NodeId, OutputConnector, Property, ValueKind};

/// Node variant tag.
///
/// Deserialization maps the stored display name to a variant through
/// [`NodeKind::from_name`]; an unknown name is an explicit error at the
/// call site, never a half-constructed node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Output,
    Vector3Constant,
    FloatConstant,
    TextureSample,
    Geometry,
}

impl NodeKind {
    /// Every variant, in palette order. Editors iterate this to offer
    /// node creation.
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Output,
        NodeKind::Vector3Constant,
        NodeKind::FloatConstant,
        NodeKind::TextureSample,
        NodeKind::Geometry,
    ];

    /// Display name; also the `name` field of the material file format.
    pub fn display_name(self) -> &'static str {
        match self {
            NodeKind::Output => "Material Output",
            NodeKind::Vector3Constant => "Vector3 Constant",
            NodeKind::FloatConstant => "Float Constant",
            NodeKind::TextureSample => "Texture",
            NodeKind::Geometry => "Geometry",
        }
    }

    /// Reverse lookup used by deserialization.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Material Output" => NodeKind::Output,
            "Vector3 Constant" => NodeKind::Vector3Constant,
            "Float Constant" => NodeKind::FloatConstant,
            "Texture" => NodeKind::TextureSample,
            "Geometry" => NodeKind::Geometry,
            _ => return None,
        })
    }

    /// Prefix for generated variable names.
    pub fn prefix(self) -> &'static str {
        match self {
            NodeKind::Output => "material_output",
            NodeKind::Vector3Constant => "vec3const",
            NodeKind::FloatConstant => "floatconst",
            NodeKind::TextureSample => "texture",
            NodeKind::Geometry => "geometry",
        }
    }

    /// Build a fresh node instance of this variant.
    pub(crate) fn instantiate(self, id: NodeId) -> Node {
        let (inputs, outputs, properties) = match self {
            NodeKind::Output => (
                vec![
                    InputConnector::new("Color", ValueKind::Vector3),
                    InputConnector::new("Roughness", ValueKind::Scalar),
                    InputConnector::new("Metallic", ValueKind::Scalar),
                    InputConnector::normal_map("Normals", ValueKind::Vector3),
                ],
                vec![],
                vec![],
            ),
            NodeKind::Vector3Constant => (
                vec![],
                vec![OutputConnector::new("Value", ValueKind::Vector3)],
                vec![Property::new("Color", ValueKind::Vector3)],
            ),
            NodeKind::FloatConstant => (
                vec![],
                vec![OutputConnector::new("Value", ValueKind::Scalar)],
                vec![Property::new("Data", ValueKind::Scalar)],
            ),
            NodeKind::TextureSample => (
                vec![],
                vec![OutputConnector::new("Value", ValueKind::Vector3)],
                vec![Property::new("Texture", ValueKind::TextureAsset)],
            ),
            NodeKind::Geometry => (
                vec![],
                vec![OutputConnector::new("Normal", ValueKind::Vector3)],
                vec![],
            ),
        };
        Node {
            id,
            kind: self,
            position: [0.0, 0.0],
            inputs,
            outputs,
            properties,
        }
    }

    /// GLSL body template for one node. Placeholder tokens are the raw
    /// property and connector names; the generator substitutes them.
    pub(crate) fn body(self, node: &Node) -> String {
        match self {
            NodeKind::Output => {
                let mut glsl = String::from(
                    "vec3 final_diffuse_color = from_srgb_to_linear(Color);\n\
                     float final_roughness = Roughness;\n\
                     float final_metallic = Metallic;\n",
                );
                // An unconnected normal input never goes through the
                // placeholder path; the surface normal is used directly.
                if node.input("Normals").is_some_and(InputConnector::is_connected) {
                    glsl.push_str("vec3 final_normal = Normals;\n");
                } else {
                    glsl.push_str("vec3 final_normal = in_normal;\n");
                }
                glsl
            }
            NodeKind::Vector3Constant => "vec3 Value = Color;\n".to_string(),
            NodeKind::FloatConstant => "float Value = Data;\n".to_string(),
            NodeKind::TextureSample => "vec3 Value = Texture;\n".to_string(),
            NodeKind::Geometry => "vec3 Normal = normalize(in_normal);\n".to_string(),
        }
    }
}
