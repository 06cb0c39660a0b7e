use tokio::sync::mpsc;
use tracing::trace;

use meta_types::Address;

use crate::cancel::CancelSignal;
use crate::error::{IngestError, IngestResult};

/// Create a bounded stream of root addresses.
pub fn address_channel(capacity: usize) -> (AddressSender, AddressStream) {
    let (sender, receiver) = mpsc::channel(capacity);
    (
        AddressSender { inner: sender },
        AddressStream { inner: receiver },
    )
}

/// Publishes addresses onto an [`AddressStream`].
#[derive(Clone, Debug)]
pub struct AddressSender {
    inner: mpsc::Sender<Address>,
}

impl AddressSender {
    /// Send `address`, waiting for capacity.
    ///
    /// Fails with [`IngestError::Cancelled`] if `signal` fires first and with
    /// [`IngestError::StreamClosed`] if the stream was dropped.
    pub async fn send(&self, address: Address, signal: &mut CancelSignal) -> IngestResult<()> {
        tokio::select! {
            biased;
            _ = signal.cancelled() => Err(IngestError::Cancelled),
            sent = self.inner.send(address) => {
                sent.map_err(|_| IngestError::StreamClosed)?;
                trace!(address = %address.short_hex(), "published address");
                Ok(())
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// Receiving end of an address stream.
#[derive(Debug)]
pub struct AddressStream {
    inner: mpsc::Receiver<Address>,
}

impl AddressStream {
    /// Next address. `Ok(None)` once every sender is dropped and the queue is
    /// drained.
    pub async fn recv(&mut self, signal: &mut CancelSignal) -> IngestResult<Option<Address>> {
        tokio::select! {
            biased;
            _ = signal.cancelled() => Err(IngestError::Cancelled),
            next = self.inner.recv() => Ok(next),
        }
    }

    /// Stop accepting addresses. Queued addresses can still be received.
    pub fn close(&mut self) {
        self.inner.close();
    }
}
