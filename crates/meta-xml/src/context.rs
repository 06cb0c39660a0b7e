//! Context documents and name resolution.
//!
//! A context document maps document-local names to semantic type
//! identifiers. It is itself a META object:
//!
//! ```text
//! { "@type": "Context", "@context": { "<name>": "<type identifier>", ... } }
//! ```
//!
//! Names are either bare local names (`"ResourceName"`) or
//! namespace-qualified names built by [`qualified_name`]
//! (`"http://ddex.net/xml/ern/382:ResourceName"`).

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use meta_store::{Datastore, Node, Object, Store, StoreResult, TYPE_FIELD};
use meta_types::Address;

use crate::error::{EncodeError, EncodeResult};

/// Field holding a context document's name mappings.
pub const CONTEXT_FIELD: &str = "@context";

/// Declared type of context documents.
pub const CONTEXT_TYPE: &str = "Context";

/// Build the namespace-qualified form of a name.
pub fn qualified_name(namespace: &str, local_name: &str) -> String {
    format!("{namespace}:{local_name}")
}

/// Classifies document names into semantic type identifiers.
///
/// Implementations decide the precedence between multiple sources of
/// mappings. The encoder only ever asks one question: which type identifier
/// does this (optionally namespaced) local name have?
pub trait ContextResolver: Send + Sync {
    /// Resolve an element name. `None` means no mapping exists.
    fn resolve(&self, namespace: Option<&str>, local_name: &str) -> Option<&str>;
}

impl<R: ContextResolver + ?Sized> ContextResolver for &R {
    fn resolve(&self, namespace: Option<&str>, local_name: &str) -> Option<&str> {
        (**self).resolve(namespace, local_name)
    }
}

impl<R: ContextResolver + ?Sized> ContextResolver for Arc<R> {
    fn resolve(&self, namespace: Option<&str>, local_name: &str) -> Option<&str> {
        (**self).resolve(namespace, local_name)
    }
}

/// A single mapping from names to type identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextDocument {
    terms: BTreeMap<String, String>,
}

impl ContextDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from `(name, type identifier)` pairs.
    pub fn from_terms<I, K, V>(terms: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Add or replace a mapping.
    pub fn insert(&mut self, name: impl Into<String>, type_id: impl Into<String>) {
        self.terms.insert(name.into(), type_id.into());
    }

    /// Exact lookup of a name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.terms.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Encode as an object suitable for storing and referencing by address.
    pub fn to_object(&self) -> StoreResult<Object> {
        let terms = self
            .terms
            .iter()
            .map(|(k, v)| (k.clone(), Node::from(v.as_str())))
            .collect::<BTreeMap<_, _>>();
        let mut fields = BTreeMap::new();
        fields.insert(TYPE_FIELD.to_owned(), Node::from(CONTEXT_TYPE));
        fields.insert(CONTEXT_FIELD.to_owned(), Node::Map(terms));
        Object::from_node(Node::Map(fields))
    }

    /// Decode a context object.
    pub fn from_object(object: &Object) -> EncodeResult<Self> {
        let invalid = |reason: String| EncodeError::InvalidContext {
            address: *object.address(),
            reason,
        };
        let terms = object
            .get(CONTEXT_FIELD)
            .ok_or_else(|| invalid(format!("missing {CONTEXT_FIELD} field")))?
            .as_map()
            .ok_or_else(|| invalid(format!("{CONTEXT_FIELD} is not a map")))?;
        let mut doc = Self::new();
        for (name, value) in terms {
            let type_id = value
                .as_str()
                .ok_or_else(|| invalid(format!("term {name:?} is a {}", value.kind())))?;
            doc.insert(name.clone(), type_id);
        }
        Ok(doc)
    }
}

impl ContextResolver for ContextDocument {
    fn resolve(&self, namespace: Option<&str>, local_name: &str) -> Option<&str> {
        namespace
            .and_then(|ns| self.get(&qualified_name(ns, local_name)))
            .or_else(|| self.get(local_name))
    }
}

/// An ordered list of context documents.
///
/// Precedence: documents are consulted in the order supplied. Within each
/// document the namespace-qualified name is tried before the bare local
/// name. The first document with any match wins, so a later document never
/// overrides an earlier one, even with a more specific (qualified) mapping.
#[derive(Clone, Debug, Default)]
pub struct OrderedContexts {
    documents: Vec<ContextDocument>,
}

impl OrderedContexts {
    pub fn new(documents: Vec<ContextDocument>) -> Self {
        Self { documents }
    }

    /// Load context documents from a store, preserving order.
    pub fn load<D: Datastore>(store: &Store<D>, addresses: &[Address]) -> EncodeResult<Self> {
        let mut documents = Vec::with_capacity(addresses.len());
        for address in addresses {
            let object = store
                .get(address)
                .map_err(|source| EncodeError::ContextUnavailable {
                    address: *address,
                    source,
                })?;
            let doc = ContextDocument::from_object(&object)?;
            debug!(context = %address.short_hex(), terms = doc.len(), "loaded context");
            documents.push(doc);
        }
        Ok(Self { documents })
    }

    pub fn documents(&self) -> &[ContextDocument] {
        &self.documents
    }
}

impl ContextResolver for OrderedContexts {
    fn resolve(&self, namespace: Option<&str>, local_name: &str) -> Option<&str> {
        self.documents
            .iter()
            .find_map(|doc| doc.resolve(namespace, local_name))
    }
}
