//! Type-keyed dispatch of root objects to handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn, Span};

use meta_graph::{Graph, GraphConfig};
use meta_store::{Datastore, Object, Store};
use meta_xml::EncodedNode;

use crate::error::{IngestError, IngestResult};
use crate::indexer::Indexer;

/// A handler for one declared type. It receives a graph rooted at the object
/// and the object's decoded shape.
pub type Handler<D> =
    Box<dyn Fn(&Graph<'_, D>, &EncodedNode) -> IngestResult<()> + Send + Sync>;

/// Configuration for [`TypeDispatch`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Skip objects whose type has no handler instead of failing.
    pub skip_unknown: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { skip_unknown: true }
    }
}

/// An [`Indexer`] routing each object to the handler registered for its
/// declared type.
pub struct TypeDispatch<D> {
    store: Arc<Store<D>>,
    handlers: HashMap<String, Handler<D>>,
    config: DispatchConfig,
    graph: GraphConfig,
    span: Span,
}

impl<D: Datastore> TypeDispatch<D> {
    pub fn new(store: Arc<Store<D>>) -> Self {
        Self {
            store,
            handlers: HashMap::new(),
            config: DispatchConfig::default(),
            graph: GraphConfig::default(),
            span: Span::current(),
        }
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Limits for the graphs handed to handlers.
    pub fn with_graph_config(mut self, graph: GraphConfig) -> Self {
        self.graph = graph;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Register `handler` for `type_id`, replacing any previous one.
    pub fn on<F>(mut self, type_id: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Graph<'_, D>, &EncodedNode) -> IngestResult<()> + Send + Sync + 'static,
    {
        self.handlers.insert(type_id.into(), Box::new(handler));
        self
    }

    pub fn handles(&self, type_id: &str) -> bool {
        self.handlers.contains_key(type_id)
    }

    /// Route `object` to its handler. Returns `false` if it was skipped.
    pub fn dispatch(&self, object: Object) -> IngestResult<bool> {
        let _entered = self.span.enter();
        let Some(handler) = self.handlers.get(object.type_name()) else {
            if self.config.skip_unknown {
                warn!(
                    address = %object.address().short_hex(),
                    typ = object.type_name(),
                    "no handler for type, skipping"
                );
                return Ok(false);
            }
            return Err(IngestError::UnhandledType {
                type_id: object.type_name().to_owned(),
                address: *object.address(),
            });
        };

        let node = EncodedNode::decode(&object)?;
        let address = *object.address();
        let graph = Graph::new(self.store.as_ref(), object)
            .with_config(self.graph.clone())
            .with_span(self.span.clone());
        handler(&graph, &node)?;
        debug!(address = %address.short_hex(), typ = node.type_id(), "dispatched");
        Ok(true)
    }
}

impl<D> fmt::Debug for TypeDispatch<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        f.debug_struct("TypeDispatch")
            .field("types", &types)
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl<D: Datastore + 'static> Indexer for TypeDispatch<D> {
    async fn index(&self, object: Object) -> IngestResult<()> {
        self.dispatch(object).map(|_| ())
    }
}
