use std::collections::BTreeMap;
use std::io::BufRead;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, info, Span};

use meta_store::{Datastore, Object, Store, StoreResult};
use meta_types::Address;

use crate::config::EncoderConfig;
use crate::context::{ContextResolver, OrderedContexts};
use crate::document::{parse_document, Element};
use crate::encoded::{CompositeNode, EncodedNode, Field, LeafNode};
use crate::error::{EncodeError, EncodeResult};

/// Decomposes documents into linked objects.
///
/// Encoding is bottom-up: an element's children are encoded and handed to
/// `put` before the element itself is built, and the element's fields link
/// to the children's addresses. The same document and contexts always
/// produce the same root address.
pub struct Encoder<R> {
    resolver: R,
    config: EncoderConfig,
    span: Span,
}

impl<R: ContextResolver> Encoder<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            config: EncoderConfig::default(),
            span: Span::current(),
        }
    }

    pub fn with_config(mut self, config: EncoderConfig) -> Self {
        self.config = config;
        self
    }

    /// Emit diagnostics under `span` instead of the span current at
    /// construction.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Parse an XML document from `input` and encode it.
    pub fn encode_reader<B, P>(&self, input: B, put: P) -> EncodeResult<Address>
    where
        B: BufRead,
        P: Fn(&Object) -> StoreResult<()> + Sync,
    {
        let root = {
            let _entered = self.span.enter();
            parse_document(input, self.config.max_depth)?
        };
        self.encode_document(&root, put)
    }

    /// Encode a parsed document, returning the root object's address.
    pub fn encode_document<P>(&self, root: &Element, put: P) -> EncodeResult<Address>
    where
        P: Fn(&Object) -> StoreResult<()> + Sync,
    {
        let _entered = self.span.enter();
        let objects = AtomicUsize::new(0);
        let counted = |object: &Object| -> StoreResult<()> {
            put(object)?;
            objects.fetch_add(1, Ordering::Relaxed);
            Ok(())
        };
        let address = self.encode_element(root, 1, &counted)?;
        info!(
            root = %address.short_hex(),
            element = %root.display_name(),
            objects = objects.load(Ordering::Relaxed),
            "encoded document"
        );
        Ok(address)
    }

    fn encode_element<P>(&self, element: &Element, depth: usize, put: &P) -> EncodeResult<Address>
    where
        P: Fn(&Object) -> StoreResult<()> + Sync,
    {
        if depth > self.config.max_depth {
            return Err(EncodeError::DepthExceeded {
                limit: self.config.max_depth,
            });
        }
        let encoded = self.build(element, depth, put)?;
        let object = Object::from_node(encoded.into_node())?;
        put(&object)?;
        debug!(
            address = %object.address().short_hex(),
            typ = object.type_name(),
            element = %element.name,
            "encoded element"
        );
        Ok(*object.address())
    }

    fn build<P>(&self, element: &Element, depth: usize, put: &P) -> EncodeResult<EncodedNode>
    where
        P: Fn(&Object) -> StoreResult<()> + Sync,
    {
        let type_id = self.type_of(element)?;
        let attributes = element
            .attributes
            .iter()
            .map(|attr| (attr.field_name(), attr.value.clone()))
            .collect::<BTreeMap<_, _>>();

        if element.is_leaf() {
            let text = element.text();
            let value = if self.config.trim_text {
                text.trim().to_owned()
            } else {
                text
            };
            return Ok(EncodedNode::Leaf(LeafNode {
                type_id,
                value,
                attributes,
            }));
        }

        let children = self.encode_children(&element.children, depth, put)?;
        let mut grouped: BTreeMap<String, Vec<Address>> = BTreeMap::new();
        for (child, address) in element.children.iter().zip(children) {
            let field = element.child_field_name(child);
            if attributes.contains_key(&field) {
                return Err(EncodeError::FieldConflict {
                    element: element.display_name(),
                    field,
                });
            }
            grouped.entry(field).or_default().push(address);
        }
        let fields = grouped
            .into_iter()
            .map(|(name, mut addresses)| {
                let field = if addresses.len() == 1 {
                    Field::Link(addresses.remove(0))
                } else {
                    Field::Links(addresses)
                };
                (name, field)
            })
            .collect();

        // Whitespace-only runs between children are layout, not content.
        let text = element
            .text_runs
            .iter()
            .filter(|run| !run.trim().is_empty())
            .map(|run| {
                if self.config.trim_text {
                    run.trim().to_owned()
                } else {
                    run.clone()
                }
            })
            .collect();
        Ok(EncodedNode::Composite(CompositeNode {
            type_id,
            attributes,
            fields,
            text,
        }))
    }

    /// Encode sibling subtrees, in parallel when configured. Results keep
    /// document order and every child is persisted before this returns.
    fn encode_children<P>(
        &self,
        children: &[Element],
        depth: usize,
        put: &P,
    ) -> EncodeResult<Vec<Address>>
    where
        P: Fn(&Object) -> StoreResult<()> + Sync,
    {
        if self.config.parallel && children.len() > 1 {
            children
                .par_iter()
                .map(|child| {
                    let _entered = self.span.enter();
                    self.encode_element(child, depth + 1, put)
                })
                .collect()
        } else {
            children
                .iter()
                .map(|child| self.encode_element(child, depth + 1, put))
                .collect()
        }
    }

    fn type_of(&self, element: &Element) -> EncodeResult<String> {
        self.resolver
            .resolve(element.namespace.as_deref(), &element.name)
            .map(str::to_owned)
            .ok_or_else(|| EncodeError::MissingContext {
                name: element.display_name(),
            })
    }
}

/// Encode an XML document using context documents loaded from `store`.
///
/// Contexts are consulted in the order given (see [`OrderedContexts`]).
/// Every object is passed to `put` children-first; the root's address is
/// returned. Objects already put when an error aborts the encode are left in
/// place: they are valid and unreferenced.
pub fn encode_xml<B, D, P>(
    input: B,
    contexts: &[Address],
    store: &Store<D>,
    put: P,
) -> EncodeResult<Address>
where
    B: BufRead,
    D: Datastore,
    P: Fn(&Object) -> StoreResult<()> + Sync,
{
    let resolver = OrderedContexts::load(store, contexts)?;
    Encoder::new(resolver).encode_reader(input, put)
}
