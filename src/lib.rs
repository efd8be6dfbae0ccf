#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{LayoutConfig, load_config};
pub use ir::{Diagram, DiagramError, Edge, EdgeId, EdgeKind, Node, NodeId, parse_diagram};
pub use layout::{EdgePath, Layout, LayoutError, Layouter, compute_layout};
