//! Dependency resolver
//!
//! Examines every non-root vertex and adds an edge for each reference it
//! declares or implies. References come from three sources:
//!
//! 1. The explicit `depends` list: sibling-local labels.
//! 2. `param` calls embedded in string fields: each names a parameter of
//!    the enclosing module, so `param.NAME` resolves as a sibling.
//! 3. Cross-reference (`lookup`) calls: dotted paths into any reachable
//!    vertex, resolved by greedy longest-prefix match; the remainder is a
//!    field path and irrelevant for ordering.
//!
//! Harvesting runs each string field as a template whose functions are
//! inert stubs except for a recorder on the function of interest. The
//! rendered output is discarded; only the recorded arguments matter.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::graph::{Graph, NodeId};
use crate::parse::{ParseError, ParseNode};
use crate::template::{remember_calls, Language, Template, PARAM_FUNC_NAME, REF_FUNC_NAME};

use super::hydrate::Prepared;
use super::{CancelToken, LoadError};

/// Adds dependency edges for every declared or implied reference.
///
/// Running this twice on the same graph yields an edge-equal graph:
/// harvested references are deduplicated and edge insertion is idempotent.
pub fn resolve_dependencies(
    graph: &mut Graph<Prepared>,
    cancel: &CancelToken,
) -> Result<(), LoadError> {
    let ids: Vec<NodeId> = graph.ids().filter(|id| !id.is_root()).cloned().collect();

    for id in ids {
        cancel.check()?;

        let (explicit, strings) = match graph.get(&id) {
            Some(prepared) => (
                explicit_depends(&prepared.node, &id)?,
                prepared.node.strings(),
            ),
            None => continue,
        };

        let mut targets: Vec<NodeId> = Vec::new();
        for dep in explicit {
            push_unique(&mut targets, id.sibling(&dep));
        }
        for name in param_refs(&strings)? {
            push_unique(&mut targets, id.sibling(&format!("param.{}", name)));
        }
        for target in xrefs(graph, &id, &strings)? {
            push_unique(&mut targets, target);
        }

        debug!(id = %id, count = targets.len(), "connecting dependencies");
        for target in &targets {
            graph.connect(&id, target);
        }
    }

    Ok(())
}

/// The `depends` list; absence means no dependencies, anything else
/// malformed is fatal.
fn explicit_depends(node: &ParseNode, id: &NodeId) -> Result<Vec<String>, LoadError> {
    match node.get_string_slice("depends") {
        Ok(deps) => Ok(deps),
        Err(ParseError::FieldNotFound(_)) => Ok(Vec::new()),
        Err(err) => Err(LoadError::Decode {
            node: id.clone(),
            reason: err.to_string(),
        }),
    }
}

/// Parameter names invoked by `param` calls across all string fields,
/// deduplicated in first-seen order.
fn param_refs(strings: &[String]) -> Result<Vec<String>, LoadError> {
    Ok(dedupe(harvest(strings, PARAM_FUNC_NAME)?))
}

/// Vertices referenced by `lookup` calls. Every call must resolve to an
/// existing vertex.
fn xrefs(
    graph: &Graph<Prepared>,
    caller: &NodeId,
    strings: &[String],
) -> Result<Vec<NodeId>, LoadError> {
    let mut out = Vec::new();

    for call in dedupe(harvest(strings, REF_FUNC_NAME)?) {
        let target =
            resolve_call(graph, &call).ok_or_else(|| LoadError::UnresolvableReference {
                caller: caller.clone(),
                target: call.clone(),
            })?;
        push_unique(&mut out, target);
    }

    Ok(out)
}

/// Runs every string as a template with a recorder installed on `func`,
/// returning the recorded first arguments in call order.
fn harvest(strings: &[String], func: &str) -> Result<Vec<String>, LoadError> {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut language = Language::default();
    language.on(func, remember_calls(&calls, 0));

    for s in strings {
        Template::parse(s, &language)?.execute(&language);
    }

    let calls = match calls.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    Ok(calls)
}

fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

fn push_unique(targets: &mut Vec<NodeId>, id: NodeId) {
    if !targets.contains(&id) {
        targets.push(id);
    }
}

/// Greedy longest-prefix resolution of a dotted call path against the
/// vertex set. `task.a.status` resolves to the vertex `root/task.a` with
/// `status` left over as a field path.
fn resolve_call<T>(graph: &Graph<T>, call: &str) -> Option<NodeId> {
    let mut path = format!("root/{}", call);

    loop {
        if let Ok(id) = path.parse::<NodeId>() {
            if graph.contains(&id) {
                return Some(id);
            }
        }
        match path.rfind('.') {
            Some(pos) => path.truncate(pos),
            None => return None,
        }
    }
}
