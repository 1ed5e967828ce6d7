//! The material node graph: an insertion-ordered arena of typed nodes
//! joined by mutual connector links.
//!
//! Inputs read from at most one source, so they carry a single optional
//! [`Link`]. Outputs can fan out to any number of downstream inputs and
//! carry the full consumer list. Both sides are only ever updated
//! together, through [`Graph::link`] and the unlink operations, so the
//! two views never disagree.

use thiserror::Error;

use crate::nodes::NodeKind;

/// Stable handle of a node within its graph. Ids are assigned
/// monotonically and never reused.
pub type NodeId = u32;

/// Value kind carried by a connector or property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Vector3,
    Scalar,
    TextureAsset,
}

/// One endpoint of a mutual connection.
///
/// `connector` indexes into the peer node's opposite-direction list: a
/// link stored on an input points at an entry of the peer's `outputs`,
/// and a link stored on an output points at an entry of the peer's
/// `inputs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    pub node: NodeId,
    pub connector: usize,
}

/// A typed input port: reads from at most one upstream output.
#[derive(Clone, Debug)]
pub struct InputConnector {
    pub name: &'static str,
    pub kind: ValueKind,
    /// The value is a tangent-space normal map sample.
    pub is_normal_map: bool,
    pub link: Option<Link>,
}

impl InputConnector {
    pub(crate) fn new(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            is_normal_map: false,
            link: None,
        }
    }

    pub(crate) fn normal_map(name: &'static str, kind: ValueKind) -> Self {
        Self {
            is_normal_map: true,
            ..Self::new(name, kind)
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }
}

/// A typed output port: feeds any number of downstream inputs.
#[derive(Clone, Debug)]
pub struct OutputConnector {
    pub name: &'static str,
    pub kind: ValueKind,
    pub links: Vec<Link>,
}

impl OutputConnector {
    pub(crate) fn new(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            links: Vec::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }
}

/// A user-edited literal or asset reference attached to a node.
///
/// The payload slots sit side by side so the asset file format can store
/// them all; `kind` selects the meaningful one.
#[derive(Clone, Debug)]
pub struct Property {
    pub name: &'static str,
    pub kind: ValueKind,
    pub vector: [f32; 3],
    pub scalar: f32,
    /// Weak reference: the asset loader owns the texture, the graph only
    /// keeps the path.
    pub texture: Option<String>,
}

impl Property {
    pub(crate) fn new(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            vector: [0.0; 3],
            scalar: 0.0,
            texture: None,
        }
    }
}

/// A node instance: variant tag plus editor state, ports and properties.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: [f32; 2],
    pub inputs: Vec<InputConnector>,
    pub outputs: Vec<OutputConnector>,
    pub properties: Vec<Property>,
}

impl Node {
    pub fn input(&self, name: &str) -> Option<&InputConnector> {
        self.inputs.iter().find(|c| c.name == name)
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|c| c.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputConnector> {
        self.outputs.iter().find(|c| c.name == name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|c| c.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    /// Unique generated variable name for one of this node's connectors,
    /// `{prefix}_{id}_{connector}`. Uniqueness across nodes sharing a
    /// connector name comes from the id.
    pub fn connector_variable(&self, connector: &str) -> String {
        format!("{}_{}_{}", self.kind.prefix(), self.id, connector)
    }

    /// Unique generated variable name for one of this node's properties.
    pub fn property_variable(&self, property: &str) -> String {
        format!("{}_{}_{}", self.kind.prefix(), self.id, property)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("graph has no node with id {0}")]
    UnknownNode(NodeId),
    #[error("node {node} has no connector named \"{name}\"")]
    UnknownConnector { node: NodeId, name: String },
}

/// Insertion-ordered arena of nodes addressed by stable ids.
///
/// Link creation never checks for cycles; cyclic graphs are representable
/// and the code generator guards itself with a visited set instead.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    next_id: NodeId,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node of the given variant and return its handle.
    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.push(kind.instantiate(id));
        id
    }

    /// Insert a node with an explicit id (deserialization). Returns `None`
    /// if the id is already taken.
    pub fn add_with_id(&mut self, kind: NodeKind, id: NodeId) -> Option<NodeId> {
        if self.node(id).is_some() {
            return None;
        }
        self.next_id = self.next_id.max(id + 1);
        self.nodes.push(kind.instantiate(id));
        Some(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The first Output node, if the graph has one.
    pub fn output_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.kind == NodeKind::Output)
    }

    /// Connect `from`'s output connector to `to`'s input connector.
    ///
    /// The input's previous link, if any, is severed on both of its sides
    /// first; the output keeps its other consumers. Afterwards the two
    /// new endpoints reference each other.
    pub fn link(
        &mut self,
        from: NodeId,
        output: &str,
        to: NodeId,
        input: &str,
    ) -> Result<(), GraphError> {
        let out_idx = self
            .node(from)
            .ok_or(GraphError::UnknownNode(from))?
            .output_index(output)
            .ok_or_else(|| GraphError::UnknownConnector {
                node: from,
                name: output.to_string(),
            })?;
        let in_idx = self
            .node(to)
            .ok_or(GraphError::UnknownNode(to))?
            .input_index(input)
            .ok_or_else(|| GraphError::UnknownConnector {
                node: to,
                name: input.to_string(),
            })?;

        self.unlink_input(to, in_idx);

        if let Some(node) = self.node_mut(from) {
            node.outputs[out_idx].links.push(Link {
                node: to,
                connector: in_idx,
            });
        }
        if let Some(node) = self.node_mut(to) {
            node.inputs[in_idx].link = Some(Link {
                node: from,
                connector: out_idx,
            });
        }
        Ok(())
    }

    /// Clear the link on an input connector, and its mirror entry on the
    /// source output.
    pub fn unlink_input(&mut self, node: NodeId, input: usize) {
        let peer = self
            .node(node)
            .and_then(|n| n.inputs.get(input))
            .and_then(|c| c.link);
        let Some(peer) = peer else {
            return;
        };
        if let Some(source) = self.node_mut(peer.node) {
            if let Some(connector) = source.outputs.get_mut(peer.connector) {
                connector
                    .links
                    .retain(|l| !(l.node == node && l.connector == input));
            }
        }
        if let Some(n) = self.node_mut(node) {
            n.inputs[input].link = None;
        }
    }

    /// Clear every link on an output connector, and their mirrors on the
    /// consumer inputs.
    pub fn unlink_output(&mut self, node: NodeId, output: usize) {
        let consumers = self
            .node(node)
            .and_then(|n| n.outputs.get(output))
            .map(|c| c.links.clone())
            .unwrap_or_default();
        for consumer in consumers {
            if let Some(target) = self.node_mut(consumer.node) {
                if let Some(connector) = target.inputs.get_mut(consumer.connector) {
                    connector.link = None;
                }
            }
        }
        if let Some(n) = self.node_mut(node) {
            if let Some(connector) = n.outputs.get_mut(output) {
                connector.links.clear();
            }
        }
    }

    /// Delete a node, severing both directions of every link touching it.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        let inputs = node.inputs.len();
        let outputs = node.outputs.len();
        for i in 0..inputs {
            self.unlink_input(id, i);
        }
        for o in 0..outputs {
            self.unlink_output(id, o);
        }
        self.nodes.retain(|n| n.id != id);
        true
    }
}
