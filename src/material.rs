//! Material assets: the node graph plus compiled pipeline state, and the
//! versioned JSON file format.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::graph::{Graph, NodeId};
use crate::nodes::NodeKind;
use crate::pipeline::PipelineHandle;

/// Material file format version this crate reads and writes.
pub const MATERIAL_VERSION: u32 = 2;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read material file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt material file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("material failed the version check (found {found}, expected 2)")]
    Version { found: u32 },
    #[error("unknown material node name \"{name}\"")]
    UnknownNode { name: String },
    #[error("duplicate material node id {id}")]
    DuplicateNode { id: NodeId },
}

/// A drawable material: its graph, the sampler binding map recorded at
/// the last generation, and one pipeline slot per permutation.
///
/// Pipeline handles are replaced wholesale on rebuild; the slots going
/// back to `None` is what "not yet compiled" means to the renderer.
#[derive(Debug, Default)]
pub struct Material {
    pub path: String,
    pub graph: Graph,
    /// Sampler binding index -> texture asset path, from the last
    /// fragment generation.
    pub bound_textures: BTreeMap<u32, Option<String>>,
    pub static_pipeline: Option<PipelineHandle>,
    pub skinned_pipeline: Option<PipelineHandle>,
    pub capture_pipeline: Option<PipelineHandle>,
}

impl Material {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop compiled pipelines after a topology or render-option change;
    /// the next build repopulates them.
    pub fn invalidate_pipelines(&mut self) {
        self.static_pipeline = None;
        self.skinned_pipeline = None;
        self.capture_pipeline = None;
    }
}

#[derive(Serialize, Deserialize)]
struct MaterialFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    nodes: Vec<NodeRecord>,
}

#[derive(Serialize, Deserialize)]
struct NodeRecord {
    name: String,
    id: NodeId,
    x: f32,
    y: f32,
    #[serde(default)]
    properties: Vec<PropertyRecord>,
    #[serde(default)]
    connections: Vec<ConnectionRecord>,
}

#[derive(Serialize, Deserialize)]
struct PropertyRecord {
    name: String,
    value: [f32; 3],
    asset_value: String,
    float_value: f32,
}

/// Connections are recorded on output connectors; the input side is
/// reconstructed while wiring.
#[derive(Serialize, Deserialize)]
struct ConnectionRecord {
    name: String,
    connected_connector: String,
    connected_node: NodeId,
    connected_index: usize,
}

pub fn load_material(path: &Path) -> Result<Material, AssetError> {
    let text = fs::read_to_string(path).map_err(|source| AssetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut material = material_from_json(&text).map_err(|err| match err {
        AssetError::Json { source, .. } => AssetError::Json {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })?;
    material.path = path.display().to_string();
    Ok(material)
}

pub fn save_material(material: &Material, path: &Path) -> Result<(), AssetError> {
    let text = material_to_json(material)?;
    fs::write(path, text).map_err(|source| AssetError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Parse a material from its JSON text. The version check is hard: a
/// mismatch never yields a partially populated material.
pub fn material_from_json(text: &str) -> Result<Material, AssetError> {
    let file: MaterialFile = serde_json::from_str(text).map_err(|source| AssetError::Json {
        path: "<inline>".to_string(),
        source,
    })?;
    decode(file)
}

pub fn material_to_json(material: &Material) -> Result<String, AssetError> {
    serde_json::to_string_pretty(&encode(material)).map_err(|source| AssetError::Json {
        path: "<inline>".to_string(),
        source,
    })
}

fn decode(file: MaterialFile) -> Result<Material, AssetError> {
    if file.version != MATERIAL_VERSION {
        return Err(AssetError::Version {
            found: file.version,
        });
    }

    let mut graph = Graph::new();
    for record in &file.nodes {
        let kind = NodeKind::from_name(&record.name).ok_or_else(|| AssetError::UnknownNode {
            name: record.name.clone(),
        })?;
        if graph.add_with_id(kind, record.id).is_none() {
            return Err(AssetError::DuplicateNode { id: record.id });
        }
        let Some(node) = graph.node_mut(record.id) else {
            continue;
        };
        node.position = [record.x, record.y];
        for stored in &record.properties {
            let Some(property) = node.property_mut(&stored.name) else {
                continue;
            };
            property.vector = stored.value;
            property.scalar = stored.float_value;
            property.texture =
                (!stored.asset_value.is_empty()).then(|| stored.asset_value.clone());
        }
    }

    // Wiring runs as a second pass so every endpoint already exists.
    // Records referencing nodes or connectors that are not there are
    // dropped with a warning rather than failing the whole load.
    for record in &file.nodes {
        for connection in &record.connections {
            if graph
                .link(
                    record.id,
                    &connection.name,
                    connection.connected_node,
                    &connection.connected_connector,
                )
                .is_err()
            {
                warn!(
                    node = record.id,
                    connector = %connection.name,
                    target = connection.connected_node,
                    "skipping material connection with a missing endpoint"
                );
            }
        }
    }

    Ok(Material {
        graph,
        ..Material::default()
    })
}

fn encode(material: &Material) -> MaterialFile {
    let nodes = material
        .graph
        .nodes()
        .iter()
        .map(|node| NodeRecord {
            name: node.kind.display_name().to_string(),
            id: node.id,
            x: node.position[0],
            y: node.position[1],
            properties: node
                .properties
                .iter()
                .map(|property| PropertyRecord {
                    name: property.name.to_string(),
                    value: property.vector,
                    asset_value: property.texture.clone().unwrap_or_default(),
                    float_value: property.scalar,
                })
                .collect(),
            connections: node
                .outputs
                .iter()
                .flat_map(|output| {
                    output.links.iter().filter_map(|link| {
                        let peer = material.graph.node(link.node)?;
                        let connector = peer.inputs.get(link.connector)?;
                        Some(ConnectionRecord {
                            name: output.name.to_string(),
                            connected_connector: connector.name.to_string(),
                            connected_node: link.node,
                            connected_index: link.connector,
                        })
                    })
                })
                .collect(),
        })
        .collect();

    MaterialFile {
        version: MATERIAL_VERSION,
        nodes,
    }
}
