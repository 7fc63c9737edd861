//! Hydrator: parse nodes to typed descriptors
//!
//! Looks up every vertex kind in the resource registry and decodes the
//! body into the registered descriptor. The parse node stays on the
//! vertex: the dependency resolver runs after hydration and still needs
//! the raw string fields.

use crate::graph::Graph;
use crate::parse::ParseNode;
use crate::resource::{RegistryError, Resource, ResourceRegistry};

use super::{CancelToken, LoadError};

/// A hydrated vertex: the original parse node plus its typed descriptor
#[derive(Debug)]
pub struct Prepared {
    pub node: ParseNode,
    pub resource: Box<dyn Resource>,
}

/// Replaces every parse-node payload with a [`Prepared`] descriptor.
/// The root vertex carries no payload and is skipped.
pub fn hydrate(
    graph: Graph<ParseNode>,
    registry: &ResourceRegistry,
    cancel: &CancelToken,
) -> Result<Graph<Prepared>, LoadError> {
    graph.try_map(|id, node| {
        cancel.check()?;

        let resource = registry.prepare(&node).map_err(|err| match err {
            RegistryError::UnknownKind { kind, .. } => LoadError::UnknownKind {
                kind,
                node: id.clone(),
            },
            RegistryError::Decode { source, .. } => LoadError::Decode {
                node: id.clone(),
                reason: source.to_string(),
            },
        })?;

        Ok(Prepared { node, resource })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn parse_graph(doc: &str) -> Graph<ParseNode> {
        let mut graph = Graph::new();
        for node in crate::parse::parse(doc).unwrap() {
            let id = NodeId::root().child(&node.label());
            graph.add(id.clone(), node).unwrap();
            graph.connect(&NodeId::root(), &id);
        }
        graph
    }

    #[test]
    fn hydrates_known_kinds() {
        let graph = parse_graph("[task.hello]\ncheck = \"true\"");
        let hydrated = hydrate(
            graph,
            &ResourceRegistry::with_defaults(),
            &CancelToken::new(),
        )
        .unwrap();

        let id: NodeId = "root/task.hello".parse().unwrap();
        let prepared = hydrated.get(&id).unwrap();
        assert_eq!(prepared.resource.kind(), "task");
        assert_eq!(prepared.node.name(), "hello");
    }

    #[test]
    fn root_is_skipped() {
        let graph = parse_graph("[task.hello]\ncheck = \"true\"");
        let hydrated = hydrate(
            graph,
            &ResourceRegistry::with_defaults(),
            &CancelToken::new(),
        )
        .unwrap();

        assert!(hydrated.get(&NodeId::root()).is_none());
        assert!(hydrated.contains(&NodeId::root()));
    }

    #[test]
    fn unknown_kind_names_the_node() {
        let graph = parse_graph("[docker.app]\nimage = \"x\"");
        let err = hydrate(
            graph,
            &ResourceRegistry::with_defaults(),
            &CancelToken::new(),
        )
        .unwrap_err();

        match err {
            LoadError::UnknownKind { kind, node } => {
                assert_eq!(kind, "docker");
                assert_eq!(node.as_str(), "root/docker.app");
            }
            other => panic!("expected UnknownKind, got {:?}", other),
        }
    }

    #[test]
    fn decode_failure_names_the_node() {
        let graph = parse_graph("[task.bad]\ncheck = 42");
        let err = hydrate(
            graph,
            &ResourceRegistry::with_defaults(),
            &CancelToken::new(),
        )
        .unwrap_err();

        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn cancellation_stops_hydration() {
        let graph = parse_graph("[task.hello]\ncheck = \"true\"");
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = hydrate(graph, &ResourceRegistry::with_defaults(), &cancel).unwrap_err();
        assert!(matches!(err, LoadError::Cancelled));
    }
}
