//! # Load Pipeline
//!
//! Turns a URL pointing at a root module into a validated execution graph.
//!
//! ```text
//! URL ──▶ Loader ──▶ parse-node graph ──▶ Hydrator ──▶ typed graph
//!                                                        │
//!                     ready graph ◀── Validator ◀── Dep-Resolver
//! ```
//!
//! The stages run in order, single-threaded, each the sole writer of its
//! output:
//!
//! 1. **Loader** ([`nodes`]) - breadth-first module expansion over a FIFO
//!    work queue; vertices in declared order, `parent -> child` edges.
//! 2. **Hydrator** ([`hydrate`]) - kind registry lookup, body decode,
//!    payload becomes a [`Prepared`] descriptor.
//! 3. **Dependency resolver** ([`resolve_dependencies`]) - edges for
//!    explicit `depends` lists, harvested `param` references, and
//!    cross-references (`lookup` calls).
//! 4. **Validator** - cycles and dangling edges are fatal; on success the
//!    graph is frozen.
//!
//! Every stage checks the [`CancelToken`] at coarse boundaries and aborts
//! with [`LoadError::Cancelled`], which is a shutdown signal rather than a
//! fault.

mod hydrate;
mod nodes;
mod resolve;

pub use hydrate::{hydrate, Prepared};
pub use nodes::nodes;
pub use resolve::resolve_dependencies;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::fetch::{FetchError, FetcherSet};
use crate::graph::{Graph, GraphError, NodeId};
use crate::parse::ParseError;
use crate::resource::ResourceRegistry;
use crate::template::TemplateError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },

    #[error("Duplicate node ID: {0}")]
    DuplicateId(NodeId),

    #[error("\"{kind}\" is not a valid resource type in \"{node}\"")]
    UnknownKind { kind: String, node: NodeId },

    #[error("Invalid resource \"{node}\": {reason}")]
    Decode { node: NodeId, reason: String },

    #[error(transparent)]
    TemplateParse(#[from] TemplateError),

    #[error("Unresolvable call to {target} (from {caller})")]
    UnresolvableReference { caller: NodeId, target: String },

    #[error(transparent)]
    Validate(#[from] GraphError),

    #[error("Load cancelled")]
    Cancelled,
}

/// Cooperative cancellation signal shared with the caller.
///
/// Cloning yields a handle onto the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; every stage aborts at its next checkpoint
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn check(&self) -> Result<(), LoadError> {
        if self.is_cancelled() {
            Err(LoadError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Collaborators for a load run
pub struct Options {
    pub fetchers: FetcherSet,
    pub registry: ResourceRegistry,
    pub cancel: CancelToken,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fetchers: FetcherSet::default(),
            registry: ResourceRegistry::with_defaults(),
            cancel: CancelToken::new(),
        }
    }
}

/// Loads, hydrates, resolves and validates the module tree rooted at `url`.
pub fn load(url: &str, options: &Options) -> Result<Graph<Prepared>, LoadError> {
    info!(url, "loading modules");
    let graph = nodes(url, &options.fetchers, &options.cancel)?;

    info!(vertices = graph.len(), "hydrating resources");
    let mut graph = hydrate(graph, &options.registry, &options.cancel)?;

    info!("resolving dependencies");
    resolve_dependencies(&mut graph, &options.cancel)?;

    options.cancel.check()?;
    graph.validate()?;

    info!(
        vertices = graph.len(),
        edges = graph.edge_count(),
        "graph ready"
    );
    Ok(graph)
}
