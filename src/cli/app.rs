//! Main CLI application structure

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fmt::Write as _;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::graph::{Graph, NodeId};
use crate::load::{self, Options, Prepared};
use crate::resource::StatusLevel;

use super::output::{OutputFormat, Printer};

#[derive(Parser)]
#[command(name = "settle")]
#[command(author, version, about = "Declarative configuration management")]
#[command(propagate_version = true)]
pub struct Cli {
    /// How results are printed: human text or one JSON document
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Log pipeline progress to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a module tree and print the validated graph
    Graph {
        /// Root module URL or path
        source: String,
    },

    /// Load a module tree and report whether it validates
    Validate {
        /// Root module URL or path
        source: String,
    },

    /// Load a module tree and check every resource against the machine
    Check {
        /// Root module URL or path
        source: String,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new(cli.format);

    if cli.verbose {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Graph { source } => graph(&source, &printer),
        Commands::Validate { source } => validate(&source, &printer),
        Commands::Check { source } => check(&source, &printer),
    }
}

fn load_graph(source: &str) -> Result<Graph<Prepared>> {
    let options = Options::default();
    load::load(source, &options).with_context(|| format!("Failed to load {}", source))
}

#[derive(Serialize)]
struct GraphListing {
    vertices: Vec<VertexListing>,
    edges: Vec<(NodeId, NodeId)>,
}

#[derive(Serialize)]
struct VertexListing {
    id: NodeId,
    kind: Option<String>,
}

fn graph(source: &str, printer: &Printer) -> Result<()> {
    let graph = load_graph(source)?;

    let mut vertices: Vec<_> = graph
        .vertices()
        .map(|(id, payload)| VertexListing {
            id: id.clone(),
            kind: payload.map(|p| p.resource.kind().to_string()),
        })
        .collect();
    vertices.sort_by(|a, b| a.id.cmp(&b.id));

    let mut edges: Vec<_> = graph
        .edges()
        .map(|(from, to)| (from.clone(), to.clone()))
        .collect();
    edges.sort();

    printer.render(&GraphListing { vertices, edges }, || {
        graph.dot(|prepared| Some(prepared.resource.kind().to_string()))
    });

    Ok(())
}

#[derive(Serialize)]
struct ValidateReport {
    valid: bool,
    resources: usize,
    edges: usize,
}

fn validate(source: &str, printer: &Printer) -> Result<()> {
    let graph = load_graph(source)?;

    let report = ValidateReport {
        valid: true,
        resources: graph.len() - 1,
        edges: graph.edge_count(),
    };
    printer.render(&report, || {
        format!(
            "Graph is valid: {} resources, {} edges\n",
            report.resources, report.edges
        )
    });

    Ok(())
}

#[derive(Serialize)]
struct CheckListing {
    id: NodeId,
    kind: String,
    level: StatusLevel,
    messages: Vec<String>,
}

fn check(source: &str, printer: &Printer) -> Result<()> {
    let graph = load_graph(source)?;
    let order = graph.execution_order().context("Graph is not executable")?;

    let mut listings = Vec::new();
    for id in order {
        let prepared = match graph.get(&id) {
            Some(prepared) => prepared,
            None => continue, // root
        };

        debug!(id = %id, "checking resource");
        let status = prepared
            .resource
            .check()
            .with_context(|| format!("Check failed for {}", id))?;

        listings.push(CheckListing {
            id: id.clone(),
            kind: prepared.resource.kind().to_string(),
            level: status.level,
            messages: status.messages,
        });
    }

    printer.render(&listings, || {
        let mut out = String::new();
        for listing in &listings {
            let marker = match listing.level {
                StatusLevel::NoChange => "ok",
                StatusLevel::WillChange => "would change",
                StatusLevel::Fatal => "fatal",
            };
            let _ = writeln!(out, "{}\t{}\t{}", listing.id, listing.kind, marker);
        }

        let changing = listings
            .iter()
            .filter(|l| l.level == StatusLevel::WillChange)
            .count();
        let _ = writeln!(
            out,
            "{} resources checked, {} would change",
            listings.len(),
            changing
        );
        out
    });

    Ok(())
}
