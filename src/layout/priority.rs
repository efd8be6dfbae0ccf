use serde::Serialize;

use crate::ir::{Edge, EdgeKind};

/// Ordering category of an edge. Categories are routed in declaration order;
/// later categories route around earlier ones, never the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgePriority {
    Inheritance,
    Implementation,
    Aggregation,
    Composition,
    Association,
    Dependency,
    SelfEdge,
    Other,
}

/// How an edge of a given priority is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingMode {
    /// Multi-bend orthogonal polyline.
    Segmented,
    /// Straight two-point line.
    Direct,
    /// Five-point loop out of one corner.
    SelfLoop,
}

impl EdgePriority {
    /// Segmented priorities in the order they are laid out.
    pub const SEGMENTED: [EdgePriority; 5] = [
        EdgePriority::Inheritance,
        EdgePriority::Implementation,
        EdgePriority::Aggregation,
        EdgePriority::Composition,
        EdgePriority::Association,
    ];

    pub fn routing_mode(self) -> Option<RoutingMode> {
        match self {
            EdgePriority::Inheritance
            | EdgePriority::Implementation
            | EdgePriority::Aggregation
            | EdgePriority::Composition
            | EdgePriority::Association => Some(RoutingMode::Segmented),
            EdgePriority::Dependency => Some(RoutingMode::Direct),
            EdgePriority::SelfEdge => Some(RoutingMode::SelfLoop),
            EdgePriority::Other => None,
        }
    }

    pub fn is_segmented(self) -> bool {
        self.routing_mode() == Some(RoutingMode::Segmented)
    }

    /// Whether the first attachment attempt uses the north/south faces.
    pub fn prefers_north_south(self) -> bool {
        match self {
            EdgePriority::Inheritance
            | EdgePriority::Implementation
            | EdgePriority::Association => true,
            EdgePriority::Aggregation | EdgePriority::Composition => false,
            EdgePriority::Dependency | EdgePriority::SelfEdge | EdgePriority::Other => false,
        }
    }
}

fn kind_priority(kind: EdgeKind) -> EdgePriority {
    match kind {
        EdgeKind::Inheritance => EdgePriority::Inheritance,
        EdgeKind::Implementation => EdgePriority::Implementation,
        EdgeKind::Aggregation => EdgePriority::Aggregation,
        EdgeKind::Composition => EdgePriority::Composition,
        EdgeKind::Association => EdgePriority::Association,
        EdgeKind::Dependency => EdgePriority::Dependency,
        EdgeKind::Note | EdgeKind::Transition | EdgeKind::Call => EdgePriority::Other,
    }
}

/// Classifies an edge. Class-diagram edges whose ends coincide are self-edges.
pub fn priority_of(edge: &Edge) -> EdgePriority {
    let priority = kind_priority(edge.kind);
    if priority != EdgePriority::Other && edge.is_self_edge() {
        EdgePriority::SelfEdge
    } else {
        priority
    }
}

pub fn is_segmented(edge: &Edge) -> bool {
    priority_of(edge).is_segmented()
}

/// Edges of every category but [`EdgePriority::Other`] get a stored path.
pub fn is_stored_edge(edge: &Edge) -> bool {
    priority_of(edge) != EdgePriority::Other
}
