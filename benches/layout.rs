use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use uml_edge_router::layout::{Layouter, Rectangle};
use uml_edge_router::{Diagram, EdgeKind, LayoutConfig, parse_diagram};

/// A grid of classes with a generalization tree, associations between
/// neighbours, dependencies across rows and a self-loop on every fifth class.
fn class_grid(columns: usize, rows: usize) -> Diagram {
    let mut builder = Diagram::builder();
    let name = |column: usize, row: usize| format!("C{}_{}", row, column);
    for row in 0..rows {
        for column in 0..columns {
            let x = (column * 200) as i32;
            let y = (row * 200) as i32;
            builder = builder.node(name(column, row), Rectangle::new(x, y, 120, 60));
        }
    }
    for row in 1..rows {
        for column in 0..columns {
            builder = builder.edge(EdgeKind::Inheritance, name(column, row), name(column / 2, row - 1));
        }
    }
    for row in 0..rows {
        for column in 1..columns {
            let kind = if column % 2 == 0 {
                EdgeKind::Association
            } else {
                EdgeKind::Aggregation
            };
            builder = builder.edge(kind, name(column - 1, row), name(column, row));
        }
    }
    for row in 1..rows {
        builder = builder.edge(EdgeKind::Dependency, name(0, row), name(columns - 1, row - 1));
    }
    for index in (0..columns * rows).step_by(5) {
        let (column, row) = (index % columns, index / columns);
        builder = builder.edge(EdgeKind::Composition, name(column, row), name(column, row));
    }
    builder.build().expect("synthetic diagram is valid")
}

fn fixture(name: &str) -> &'static str {
    match name {
        "class_hierarchy" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/class_hierarchy.json"
        )),
        "aggregation_fan" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/aggregation_fan.json"
        )),
        "mixed_kinds" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/mixed_kinds.json"
        )),
        _ => panic!("unknown fixture"),
    }
}

fn bench_fixtures(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let layouter = Layouter::new(LayoutConfig::default()).expect("default config is valid");
    for name in ["class_hierarchy", "aggregation_fan", "mixed_kinds"] {
        let diagram = parse_diagram(fixture(name)).expect("parse failed");
        group.bench_with_input(BenchmarkId::from_parameter(name), &diagram, |b, diagram| {
            b.iter(|| {
                let layout = layouter.layout(black_box(diagram));
                black_box(layout.len());
            });
        });
    }
    group.finish();
}

fn bench_class_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_class_grid");
    let layouter = Layouter::new(LayoutConfig::default()).expect("default config is valid");
    for (columns, rows) in [(6usize, 4usize), (10, 8), (16, 12)] {
        let diagram = class_grid(columns, rows);
        let name = format!("grid_{}x{}", columns, rows);
        group.bench_with_input(BenchmarkId::from_parameter(name), &diagram, |b, diagram| {
            b.iter(|| {
                let layout = layouter.layout(black_box(diagram));
                black_box(layout.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fixtures, bench_class_grid);
criterion_main!(benches);
