//! # Settle
//!
//! A declarative configuration-management engine. Modules declare
//! resources (shell tasks, groups, files, systemd units, parameters,
//! sub-modules) together with their dependencies; settle loads the module
//! tree, resolves every reference into a validated DAG, and checks or
//! converges the machine against it.
//!
//! ## Architecture
//!
//! The crate is organized around the load pipeline:
//!
//! - [`fetch`] - resolve module sources and retrieve their bytes
//! - [`parse`] - module documents to ordered, typed parse nodes
//! - [`graph`] - hierarchical IDs and the petgraph-backed resource graph
//! - [`template`] - the `{{ ... }}` scanner used to harvest references
//! - [`load`] - the pipeline: load, hydrate, resolve, validate
//! - [`resource`] - typed descriptors and the open kind registry
//! - [`cli`] - command-line interface and output formatting
//!
//! ## Data Flow
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────────────┐
//! │  Fetch   │───▶│  Parse   │───▶│  parse-node graph │
//! └──────────┘    └──────────┘    └──────────────────┘
//!                                          │
//!                                          ▼
//! ┌──────────────────┐    ┌───────────────────────────┐
//! │   ready graph    │◀───│  hydrate → resolve → validate │
//! └──────────────────┘    └───────────────────────────┘
//! ```
//!
//! ## Example
//!
//! A module is a TOML document; dependencies come from explicit `depends`
//! lists, `{{param "..."}}` references, and `{{lookup "..."}}` calls:
//!
//! ```toml
//! [param.message]
//! default = "hello world"
//!
//! [task.greet]
//! check = "test -f /tmp/greeted"
//! apply = "echo {{param \"message\"}} > /tmp/greeted"
//! ```
//!
//! ```no_run
//! use settle_cli::load::{self, Options};
//!
//! let options = Options::default();
//! let graph = load::load("samples/main.toml", &options)?;
//! println!("{}", graph.dot(|p| Some(p.resource.kind().to_string())));
//! # Ok::<(), settle_cli::load::LoadError>(())
//! ```
//!
//! ## Design Principles
//!
//! 1. **IDs, not pointers**: vertices refer to each other by hierarchical
//!    path only, so the graph owns everything and serializes trivially.
//! 2. **Deterministic loads**: FIFO module discovery and declared-order
//!    vertices make the pipeline reproducible and testable.
//! 3. **Open registries**: resource kinds and template functions are
//!    registered collaborators, not hard-coded switches.

pub mod cli;
pub mod fetch;
pub mod graph;
pub mod load;
pub mod parse;
pub mod resource;
pub mod template;
