use std::io::BufRead;
use std::sync::Arc;

use tracing::{info, Span};

use meta_store::{Datastore, Store};
use meta_types::Address;
use meta_xml::{Encoder, EncoderConfig, OrderedContexts};

use crate::cancel::CancelSignal;
use crate::error::{IngestError, IngestResult};
use crate::stream::AddressSender;

/// Canonicalizes XML documents into a store with a fixed context list.
pub struct XmlConverter<D> {
    store: Arc<Store<D>>,
    contexts: Arc<OrderedContexts>,
    config: EncoderConfig,
    span: Span,
}

impl<D> Clone for XmlConverter<D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            contexts: Arc::clone(&self.contexts),
            config: self.config.clone(),
            span: self.span.clone(),
        }
    }
}

impl<D: Datastore + 'static> XmlConverter<D> {
    /// Load `contexts` from `store`, in order.
    pub fn new(store: Arc<Store<D>>, contexts: &[Address]) -> IngestResult<Self> {
        let contexts = OrderedContexts::load(&*store, contexts)?;
        Ok(Self::with_contexts(store, contexts))
    }

    /// Use already loaded contexts.
    pub fn with_contexts(store: Arc<Store<D>>, contexts: OrderedContexts) -> Self {
        Self {
            store,
            contexts: Arc::new(contexts),
            config: EncoderConfig::default(),
            span: Span::current(),
        }
    }

    pub fn with_config(mut self, config: EncoderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn store(&self) -> &Arc<Store<D>> {
        &self.store
    }

    /// Encode one document into the store and return its root address.
    pub fn convert<B: BufRead>(&self, input: B) -> IngestResult<Address> {
        let store = &self.store;
        let root = Encoder::new(Arc::clone(&self.contexts))
            .with_config(self.config.clone())
            .with_span(self.span.clone())
            .encode_reader(input, |object| store.put(object))?;
        Ok(root)
    }

    /// Encode one document on the blocking pool, then publish its root.
    ///
    /// Nothing is encoded if `signal` has already fired. The root is published
    /// only after the whole document is stored.
    pub async fn convert_into<B>(
        &self,
        input: B,
        sender: &AddressSender,
        signal: &mut CancelSignal,
    ) -> IngestResult<Address>
    where
        B: BufRead + Send + 'static,
    {
        if signal.is_cancelled() {
            return Err(IngestError::Cancelled);
        }
        let converter = self.clone();
        let root = tokio::task::spawn_blocking(move || converter.convert(input))
            .await
            .map_err(|e| IngestError::Task(e.to_string()))??;
        sender.send(root, signal).await?;
        self.span
            .in_scope(|| info!(root = %root.short_hex(), "published document root"));
        Ok(root)
    }
}
