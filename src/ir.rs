use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::{Point, Rectangle};

/// Position of a node in its diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Position of an edge in its diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Declared kind of a diagram edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Generalization between classes.
    Inheritance,
    /// Generalization from a class to an interface.
    Implementation,
    Aggregation,
    Composition,
    Association,
    Dependency,
    /// Attachment of a note to an element.
    Note,
    /// State machine transition.
    Transition,
    /// Sequence diagram call.
    Call,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub bounds: Rectangle,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub start: NodeId,
    pub end: NodeId,
    pub kind: EdgeKind,
    pub start_label: Option<String>,
    pub end_label: Option<String>,
}

impl Edge {
    pub fn is_self_edge(&self) -> bool {
        self.start == self.end
    }

    /// The node at the opposite end from `node`.
    pub fn other_end(&self, node: NodeId) -> NodeId {
        if self.start == node { self.end } else { self.start }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiagramError {
    #[error("duplicate node '{0}'")]
    DuplicateNode(String),
    #[error("node '{node}' has empty bounds")]
    DegenerateBounds { node: String },
    #[error("node '{node}' references unknown parent '{parent}'")]
    UnknownParent { node: String, parent: String },
    #[error("edge {edge} references unknown node '{node}'")]
    UnknownNode { edge: usize, node: String },
    #[error("invalid diagram document: {0}")]
    Document(String),
}

/// An immutable snapshot of node geometry and edges, ready for routing.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    names: BTreeMap<String, NodeId>,
}

impl Diagram {
    pub fn builder() -> DiagramBuilder {
        DiagramBuilder::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn bounds(&self, id: NodeId) -> Rectangle {
        self.nodes[id.0].bounds
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// The innermost node containing `point`.
    ///
    /// Nested nodes win over their parents; among nodes at the same depth the
    /// one declared last wins, matching paint order.
    pub fn node_at(&self, point: Point) -> Option<NodeId> {
        let mut best: Option<(NodeId, usize)> = None;
        for (idx, node) in self.nodes.iter().enumerate().rev() {
            if !node.bounds.contains(point) {
                continue;
            }
            let depth = self.depth(NodeId(idx));
            if best.is_none_or(|(_, best_depth)| depth > best_depth) {
                best = Some((NodeId(idx), depth));
            }
        }
        best.map(|(id, _)| id)
    }

    fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent.0].parent;
        }
        depth
    }
}

#[derive(Debug, Clone)]
struct PendingNode {
    name: String,
    bounds: Rectangle,
    parent: Option<String>,
}

#[derive(Debug, Clone)]
struct PendingEdge {
    kind: EdgeKind,
    start: String,
    end: String,
    start_label: Option<String>,
    end_label: Option<String>,
}

/// Collects nodes and edges by name and resolves them into a [`Diagram`].
#[derive(Debug, Clone, Default)]
pub struct DiagramBuilder {
    nodes: Vec<PendingNode>,
    edges: Vec<PendingEdge>,
}

impl DiagramBuilder {
    pub fn node(mut self, name: impl Into<String>, bounds: Rectangle) -> Self {
        self.nodes.push(PendingNode {
            name: name.into(),
            bounds,
            parent: None,
        });
        self
    }

    /// Adds a node nested inside `parent`, which must be declared earlier.
    pub fn child(
        mut self,
        name: impl Into<String>,
        parent: impl Into<String>,
        bounds: Rectangle,
    ) -> Self {
        self.nodes.push(PendingNode {
            name: name.into(),
            bounds,
            parent: Some(parent.into()),
        });
        self
    }

    pub fn edge(self, kind: EdgeKind, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.labeled_edge(kind, start, end, None::<String>, None::<String>)
    }

    pub fn labeled_edge(
        mut self,
        kind: EdgeKind,
        start: impl Into<String>,
        end: impl Into<String>,
        start_label: Option<impl Into<String>>,
        end_label: Option<impl Into<String>>,
    ) -> Self {
        self.edges.push(PendingEdge {
            kind,
            start: start.into(),
            end: end.into(),
            start_label: start_label.map(Into::into),
            end_label: end_label.map(Into::into),
        });
        self
    }

    pub fn build(self) -> Result<Diagram, DiagramError> {
        let mut diagram = Diagram::default();
        for pending in self.nodes {
            if diagram.names.contains_key(&pending.name) {
                return Err(DiagramError::DuplicateNode(pending.name));
            }
            if pending.bounds.is_degenerate() {
                return Err(DiagramError::DegenerateBounds { node: pending.name });
            }
            let id = NodeId(diagram.nodes.len());
            let parent = match pending.parent {
                Some(parent) => {
                    let parent_id = diagram.names.get(&parent).copied().ok_or_else(|| {
                        DiagramError::UnknownParent {
                            node: pending.name.clone(),
                            parent: parent.clone(),
                        }
                    })?;
                    diagram.nodes[parent_id.0].children.push(id);
                    Some(parent_id)
                }
                None => None,
            };
            diagram.names.insert(pending.name.clone(), id);
            diagram.nodes.push(Node {
                name: pending.name,
                bounds: pending.bounds,
                parent,
                children: Vec::new(),
            });
        }

        for (idx, pending) in self.edges.into_iter().enumerate() {
            let resolve = |name: &str| {
                diagram
                    .names
                    .get(name)
                    .copied()
                    .ok_or_else(|| DiagramError::UnknownNode {
                        edge: idx,
                        node: name.to_string(),
                    })
            };
            let start = resolve(&pending.start)?;
            let end = resolve(&pending.end)?;
            diagram.edges.push(Edge {
                id: EdgeId(idx),
                start,
                end,
                kind: pending.kind,
                start_label: pending.start_label,
                end_label: pending.end_label,
            });
        }
        Ok(diagram)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDocument {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDocument {
    pub kind: EdgeKind,
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_label: Option<String>,
}

/// Serialized form of a diagram: nodes with resolved bounds and edges by node id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagramDocument {
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    #[serde(default)]
    pub edges: Vec<EdgeDocument>,
}

impl DiagramDocument {
    pub fn into_diagram(self) -> Result<Diagram, DiagramError> {
        let mut builder = Diagram::builder();
        for node in self.nodes {
            let bounds = Rectangle::new(node.x, node.y, node.width, node.height);
            builder = match node.parent {
                Some(parent) => builder.child(node.id, parent, bounds),
                None => builder.node(node.id, bounds),
            };
        }
        for edge in self.edges {
            builder = builder.labeled_edge(
                edge.kind,
                edge.start,
                edge.end,
                edge.start_label,
                edge.end_label,
            );
        }
        builder.build()
    }
}

pub fn parse_diagram(input: &str) -> Result<Diagram, DiagramError> {
    let document: DiagramDocument =
        serde_json::from_str(input).map_err(|err| DiagramError::Document(err.to_string()))?;
    document.into_diagram()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_resolves_names() {
        let diagram = Diagram::builder()
            .node("A", Rectangle::new(0, 0, 100, 60))
            .node("B", Rectangle::new(0, 200, 100, 60))
            .edge(EdgeKind::Inheritance, "A", "B")
            .build()
            .unwrap();
        let edge = &diagram.edges()[0];
        assert_eq!(diagram.node(edge.start).name, "A");
        assert_eq!(diagram.node(edge.end).name, "B");
        assert!(!edge.is_self_edge());
    }

    #[test]
    fn builder_rejects_unknown_node() {
        let err = Diagram::builder()
            .node("A", Rectangle::new(0, 0, 100, 60))
            .edge(EdgeKind::Association, "A", "Z")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DiagramError::UnknownNode {
                edge: 0,
                node: "Z".to_string()
            }
        );
    }

    #[test]
    fn builder_rejects_empty_bounds() {
        let err = Diagram::builder()
            .node("A", Rectangle::new(0, 0, 0, 60))
            .build()
            .unwrap_err();
        assert!(matches!(err, DiagramError::DegenerateBounds { .. }));
    }

    #[test]
    fn node_at_prefers_nested_children() {
        let diagram = Diagram::builder()
            .node("pkg", Rectangle::new(0, 0, 300, 300))
            .child("inner", "pkg", Rectangle::new(50, 50, 100, 60))
            .node("other", Rectangle::new(400, 0, 100, 60))
            .build()
            .unwrap();
        let inner = diagram.node_id("inner");
        assert_eq!(diagram.node_at(Point::new(60, 60)), inner);
        assert_eq!(diagram.node_at(Point::new(10, 10)), diagram.node_id("pkg"));
        assert_eq!(diagram.node_at(Point::new(350, 10)), None);
        assert_eq!(diagram.node(diagram.node_id("pkg").unwrap()).children.len(), 1);
    }

    #[test]
    fn parses_json_document() {
        let diagram = parse_diagram(
            r#"{
                "nodes": [
                    {"id": "A", "x": 0, "y": 0, "width": 100, "height": 60},
                    {"id": "B", "x": 0, "y": 200, "width": 100, "height": 60}
                ],
                "edges": [
                    {"kind": "aggregation", "start": "A", "end": "B", "startLabel": "1"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(diagram.edges()[0].kind, EdgeKind::Aggregation);
        assert_eq!(diagram.edges()[0].start_label.as_deref(), Some("1"));
    }

    #[test]
    fn rejects_malformed_document() {
        assert!(matches!(
            parse_diagram("{\"nodes\": 3}"),
            Err(DiagramError::Document(_))
        ));
    }
}
