use crate::ir::{Diagram, EdgeKind};
use crate::layout::{EdgePriority, Layout, Rectangle, priority_of};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: i32,
    pub height: i32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub parent: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub index: usize,
    pub kind: EdgeKind,
    pub priority: EdgePriority,
    pub start: String,
    pub end: String,
    pub points: Vec<[i32; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout, diagram: &Diagram) -> Self {
        // Routed bounds, so every path endpoint lies on a dumped border.
        let node_bounds: Vec<Rectangle> = diagram
            .node_ids()
            .map(|id| layout.node_bounds(id).unwrap_or_else(|| diagram.bounds(id)))
            .collect();
        let nodes: Vec<NodeDump> = diagram
            .nodes()
            .iter()
            .zip(&node_bounds)
            .map(|(node, bounds)| NodeDump {
                id: node.name.clone(),
                x: bounds.x,
                y: bounds.y,
                width: bounds.width,
                height: bounds.height,
                parent: node.parent.map(|parent| diagram.node(parent).name.clone()),
            })
            .collect();

        let edges = layout
            .paths()
            .map(|(id, path)| {
                let edge = diagram.edge(id);
                EdgeDump {
                    index: id.index(),
                    kind: edge.kind,
                    priority: priority_of(edge),
                    start: diagram.node(edge.start).name.clone(),
                    end: diagram.node(edge.end).name.clone(),
                    points: path.points().iter().map(|p| [p.x, p.y]).collect(),
                }
            })
            .collect();

        // Extent from the origin, covering nodes and loops that leave them.
        let extent = node_bounds
            .iter()
            .copied()
            .chain(layout.bounds())
            .reduce(|acc, rect| acc.union(&rect))
            .unwrap_or(Rectangle::new(0, 0, 0, 0));

        LayoutDump {
            width: extent.max_x().max(0),
            height: extent.max_y().max(0),
            nodes,
            edges,
        }
    }
}

pub fn layout_dump_json(layout: &Layout, diagram: &Diagram) -> anyhow::Result<String> {
    let dump = LayoutDump::from_layout(layout, diagram);
    Ok(serde_json::to_string_pretty(&dump)?)
}

pub fn write_layout_dump(path: &Path, layout: &Layout, diagram: &Diagram) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, diagram);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
