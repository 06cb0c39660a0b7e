use async_trait::async_trait;
use tracing::{debug, info};

use meta_store::{Datastore, Object, Store};

use crate::cancel::CancelSignal;
use crate::error::IngestResult;
use crate::stream::AddressStream;

/// Consumer of ingested root objects.
#[async_trait]
pub trait Indexer: Send + Sync {
    async fn index(&self, object: Object) -> IngestResult<()>;
}

/// Drain `stream`, fetching each root from `store` and passing it to
/// `indexer`.
///
/// Returns the number of objects indexed once the stream closes. Stops at the
/// first fetch or index error, or with [`IngestError::Cancelled`] when
/// `signal` fires.
///
/// [`IngestError::Cancelled`]: crate::IngestError::Cancelled
pub async fn run_indexer<D, I>(
    store: &Store<D>,
    stream: &mut AddressStream,
    signal: &mut CancelSignal,
    indexer: &I,
) -> IngestResult<usize>
where
    D: Datastore,
    I: Indexer + ?Sized,
{
    let mut indexed = 0usize;
    while let Some(address) = stream.recv(signal).await? {
        let object = store.get(&address)?;
        debug!(address = %address.short_hex(), typ = object.type_name(), "indexing");
        indexer.index(object).await?;
        indexed += 1;
    }
    info!(indexed, "address stream drained");
    Ok(indexed)
}
