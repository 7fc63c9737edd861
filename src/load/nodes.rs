//! Loader: breadth-first module expansion
//!
//! Seeds a FIFO work queue with the root URL, then fetches and parses
//! every reachable module, adding one vertex per declared resource and a
//! `parent -> child` edge for each. Sub-module includes re-enter the
//! queue, so discovery order is deterministic.

use std::collections::VecDeque;
use std::fmt;
use tracing::debug;

use crate::fetch::{self, FetcherSet};
use crate::graph::{Graph, GraphError, NodeId};
use crate::parse::{self, ParseNode};

use super::{CancelToken, LoadError};

/// One pending module fetch
struct Source {
    parent: NodeId,
    source: String,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.source, self.parent)
    }
}

/// Loads and parses all resources reachable from the root module URL.
pub fn nodes(
    root_url: &str,
    fetchers: &FetcherSet,
    cancel: &CancelToken,
) -> Result<Graph<ParseNode>, LoadError> {
    let mut queue = VecDeque::from([Source {
        parent: NodeId::root(),
        source: root_url.to_string(),
    }]);

    let mut out = Graph::new();

    while let Some(current) = queue.pop_front() {
        cancel.check()?;
        debug!(module = %current, "loading module");

        let url = fetch::resolve_in_context(&current.source, root_url);
        let content = fetchers.fetch(&url)?;

        let content = String::from_utf8(content).map_err(|source| LoadError::Parse {
            url: url.clone(),
            source: source.into(),
        })?;
        let resources = parse::parse(&content).map_err(|source| LoadError::Parse {
            url: url.clone(),
            source,
        })?;

        for resource in resources {
            let id = current.parent.child(&resource.label());
            let include = resource.is_module().then(|| resource.source().map(str::to_string));

            match out.add(id.clone(), resource) {
                Ok(()) => {}
                Err(GraphError::DuplicateId(id)) => return Err(LoadError::DuplicateId(id)),
                Err(other) => return Err(other.into()),
            }
            out.connect(&current.parent, &id);

            if let Some(source) = include {
                let source = source.ok_or_else(|| LoadError::Decode {
                    node: id.clone(),
                    reason: "module requires a \"source\" field".to_string(),
                })?;
                queue.push_back(Source { parent: id, source });
            }
        }
    }

    Ok(out)
}
