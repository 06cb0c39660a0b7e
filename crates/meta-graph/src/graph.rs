use tracing::{debug, Span};

use meta_store::{Datastore, Node, Object, Store, StoreError};
use meta_types::Address;

use crate::config::GraphConfig;
use crate::error::{GraphError, GraphResult};

/// Outcome of a path resolution.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved {
    /// The empty path resolves to the root object itself.
    Object(Object),
    /// Any other path resolves to the value found at its end.
    Value(Node),
}

impl Resolved {
    /// The resolved value, if the path was not empty.
    pub fn as_value(&self) -> Option<&Node> {
        match self {
            Self::Value(node) => Some(node),
            Self::Object(_) => None,
        }
    }

    /// The resolved string, if the value is one.
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Node::as_str)
    }

    /// The resolved link, if the value is one.
    pub fn as_link(&self) -> Option<&Address> {
        self.as_value().and_then(Node::as_link)
    }
}

/// Stateless resolver over a root object and a store.
///
/// The structure is acyclic by construction, but a corrupted or hostile
/// store could still present an arbitrarily long chain, so resolution is an
/// iterative loop bounded by [`GraphConfig::max_hops`].
pub struct Graph<'s, D> {
    store: &'s Store<D>,
    root: Object,
    config: GraphConfig,
    span: Span,
}

impl<'s, D: Datastore> Graph<'s, D> {
    /// Create a graph rooted at `root`.
    pub fn new(store: &'s Store<D>, root: Object) -> Self {
        Self {
            store,
            root,
            config: GraphConfig::default(),
            span: Span::current(),
        }
    }

    /// Fetch `address` from the store and root a graph at it.
    pub fn open(store: &'s Store<D>, address: &Address) -> GraphResult<Self> {
        Ok(Self::new(store, store.get(address)?))
    }

    /// Replace the resolution limits.
    pub fn with_config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    /// Emit diagnostics under `span` instead of the span current at
    /// construction.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn root(&self) -> &Object {
        &self.root
    }

    pub fn store(&self) -> &'s Store<D> {
        self.store
    }

    /// Resolve `path` starting at the root.
    ///
    /// An empty path (or a single empty segment) returns the root itself. A
    /// missing segment fails with [`GraphError::PathNotFound`]. A path that
    /// continues past a non-link value fails with
    /// [`GraphError::ExpectedLink`]. Links in the middle of the path are
    /// fetched from the store and followed; a link at the very end of the
    /// path is returned as a value, not fetched.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> GraphResult<Resolved> {
        let _entered = self.span.enter();
        if path.is_empty() || (path.len() == 1 && path[0].as_ref().is_empty()) {
            return Ok(Resolved::Object(self.root.clone()));
        }

        let mut fetched: Option<Object> = None;
        let mut rest = path;
        let mut hops = 0;
        loop {
            let current = fetched.as_ref().unwrap_or(&self.root);
            let (value, remaining) = current.resolve(rest).map_err(|e| match e {
                StoreError::PathNotFound { .. } => GraphError::PathNotFound {
                    path: path.iter().map(|s| s.as_ref().to_owned()).collect(),
                },
                other => GraphError::Store(other),
            })?;

            let Some((next_segment, _)) = remaining.split_first() else {
                return Ok(Resolved::Value(value.clone()));
            };
            let link = match value {
                Node::Link(address) => *address,
                other => {
                    return Err(GraphError::ExpectedLink {
                        segment: next_segment.as_ref().to_owned(),
                        found: other.kind(),
                    })
                }
            };

            hops += 1;
            if hops > self.config.max_hops {
                return Err(GraphError::DepthExceeded {
                    limit: self.config.max_hops,
                });
            }
            debug!(link = %link.short_hex(), remaining = remaining.len(), "following link");
            fetched = Some(self.store.get(&link)?);
            rest = remaining;
        }
    }

    /// Resolve `path` and fetch the object the final link points to.
    ///
    /// An empty path returns the root.
    pub fn get_object<S: AsRef<str>>(&self, path: &[S]) -> GraphResult<Object> {
        match self.get(path)? {
            Resolved::Object(root) => Ok(root),
            Resolved::Value(Node::Link(address)) => Ok(self.store.get(&address)?),
            Resolved::Value(other) => Err(GraphError::ExpectedLink {
                segment: path
                    .last()
                    .map(|s| s.as_ref().to_owned())
                    .unwrap_or_default(),
                found: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use meta_store::InMemoryDatastore;

    /// Datastore wrapper counting reads.
    #[derive(Default)]
    struct CountingDatastore {
        inner: InMemoryDatastore,
        reads: AtomicUsize,
    }

    impl Datastore for CountingDatastore {
        fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &[u8]) -> io::Result<()> {
            self.inner.put(key, value)
        }
    }

    fn map(fields: Vec<(&str, Node)>) -> Node {
        Node::Map(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn put<D: Datastore>(store: &Store<D>, node: Node) -> Object {
        let obj = Object::from_node(node).unwrap();
        store.put(&obj).unwrap();
        obj
    }

    /// root --A--> child { B: "x" }
    fn two_level<D: Datastore>(store: &Store<D>) -> (Object, Object) {
        let child = put(store, map(vec![("B", Node::from("x"))]));
        let root = put(
            store,
            map(vec![
                ("@type", Node::from("Root")),
                ("A", Node::Link(*child.address())),
                ("plain", Node::from("scalar")),
            ]),
        );
        (root, child)
    }

    #[test]
    fn empty_path_returns_root() {
        let store = Store::new(InMemoryDatastore::new());
        let (root, _) = two_level(&store);
        let graph = Graph::new(&store, root.clone());
        let empty: [&str; 0] = [];
        assert_eq!(graph.get(&empty).unwrap(), Resolved::Object(root.clone()));
        assert_eq!(graph.get(&[""]).unwrap(), Resolved::Object(root));
    }

    #[test]
    fn missing_first_segment_is_path_not_found() {
        let store = Store::new(InMemoryDatastore::new());
        let (root, _) = two_level(&store);
        let err = Graph::new(&store, root).get(&["nope"]).unwrap_err();
        assert!(err.is_path_not_found());
        assert!(matches!(err, GraphError::PathNotFound { ref path } if path == &["nope"]));
    }

    #[test]
    fn missing_segment_behind_link_is_path_not_found() {
        let store = Store::new(InMemoryDatastore::new());
        let (root, _) = two_level(&store);
        let err = Graph::new(&store, root).get(&["A", "missing"]).unwrap_err();
        assert!(err.is_path_not_found());
    }

    #[test]
    fn cross_link_fetches_exactly_one_object() {
        let store = Store::new(CountingDatastore::default());
        let (root, _) = two_level(&store);
        let graph = Graph::new(&store, root);

        let before = store.backend().reads.load(Ordering::SeqCst);
        let resolved = graph.get(&["A", "B"]).unwrap();
        let after = store.backend().reads.load(Ordering::SeqCst);

        assert_eq!(resolved.as_str(), Some("x"));
        assert_eq!(after - before, 1);
    }

    #[test]
    fn terminal_link_is_returned_not_fetched() {
        let store = Store::new(CountingDatastore::default());
        let (root, child) = two_level(&store);
        let graph = Graph::new(&store, root);

        let before = store.backend().reads.load(Ordering::SeqCst);
        let resolved = graph.get(&["A"]).unwrap();
        assert_eq!(resolved.as_link(), Some(child.address()));
        assert_eq!(store.backend().reads.load(Ordering::SeqCst), before);
    }

    #[test]
    fn continuing_past_scalar_is_expected_link() {
        let store = Store::new(InMemoryDatastore::new());
        let (root, _) = two_level(&store);
        let err = Graph::new(&store, root).get(&["plain", "more"]).unwrap_err();
        assert!(!err.is_path_not_found());
        assert!(matches!(
            err,
            GraphError::ExpectedLink { ref segment, found: "string" } if segment == "more"
        ));
    }

    #[test]
    fn dangling_link_surfaces_store_error() {
        let store = Store::new(InMemoryDatastore::new());
        let (root, _) = two_level(&store);
        let other_store = Store::new(InMemoryDatastore::new());
        let err = Graph::new(&other_store, root).get(&["A", "B"]).unwrap_err();
        assert!(matches!(err, GraphError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn hop_limit_enforced() {
        let store = Store::new(InMemoryDatastore::new());
        let leaf = put(&store, map(vec![("next", Node::from("end"))]));
        let mut top = leaf;
        for _ in 0..3 {
            top = put(&store, map(vec![("next", Node::Link(*top.address()))]));
        }
        let path = ["next", "next", "next", "next"];

        let graph = Graph::new(&store, top.clone());
        assert_eq!(graph.get(&path).unwrap().as_str(), Some("end"));

        let limited = Graph::new(&store, top).with_config(GraphConfig { max_hops: 2 });
        let err = limited.get(&path).unwrap_err();
        assert!(matches!(err, GraphError::DepthExceeded { limit: 2 }));
    }

    #[test]
    fn list_indices_are_path_segments() {
        let store = Store::new(InMemoryDatastore::new());
        let first = put(&store, map(vec![("v", Node::from("one"))]));
        let second = put(&store, map(vec![("v", Node::from("two"))]));
        let root = put(
            &store,
            map(vec![(
                "Item",
                Node::List(vec![Node::Link(*first.address()), Node::Link(*second.address())]),
            )]),
        );
        let graph = Graph::new(&store, root);
        assert_eq!(graph.get(&["Item", "1", "v"]).unwrap().as_str(), Some("two"));
        assert!(graph.get(&["Item", "5", "v"]).unwrap_err().is_path_not_found());
    }

    #[test]
    fn get_object_fetches_final_link() {
        let store = Store::new(InMemoryDatastore::new());
        let (root, child) = two_level(&store);
        let graph = Graph::open(&store, root.address()).unwrap();
        assert_eq!(graph.get_object(&["A"]).unwrap(), child);
        assert!(matches!(
            graph.get_object(&["plain"]),
            Err(GraphError::ExpectedLink { .. })
        ));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: GraphConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GraphConfig::default());
    }
}
