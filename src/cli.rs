use crate::config::load_config;
use crate::ir::{Diagram, parse_diagram};
use crate::layout::compute_layout;
use crate::layout_dump::{layout_dump_json, write_layout_dump};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "umlroute", version, about = "Orthogonal edge routing for UML diagrams")]
pub struct Args {
    /// Diagram JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the routed layout. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file (JSON5) with routing constants
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    run_with(Args::parse())
}

pub fn run_with(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())
        .with_context(|| format!("loading config {:?}", args.config))?;
    let diagram = read_diagram(args.input.as_deref())?;
    let layout = compute_layout(&diagram, &config)?;
    tracing::debug!(routed = layout.len(), "layout computed");

    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, &layout, &diagram)?,
        None => println!("{}", layout_dump_json(&layout, &diagram)?),
    }
    Ok(())
}

fn read_diagram(path: Option<&Path>) -> Result<Diagram> {
    let input = read_input(path)?;
    Ok(parse_diagram(&input)?)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
