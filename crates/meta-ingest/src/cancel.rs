use std::sync::Arc;

use tokio::sync::watch;

/// Create a linked cancel handle and signal.
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (sender, receiver) = watch::channel(false);
    (
        CancelHandle {
            sender: Arc::new(sender),
        },
        CancelSignal { receiver },
    )
}

/// Fires cancellation for every signal created from it.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Cancel. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Another signal observing this handle.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Observes a [`CancelHandle`].
///
/// If every handle is dropped without cancelling, the signal never fires.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal with no handle.
    pub fn never() -> Self {
        cancellation().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Complete once cancellation has fired, immediately if it already has.
    pub async fn cancelled(&mut self) {
        let fired = self.receiver.wait_for(|cancelled| *cancelled).await.is_ok();
        if !fired {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_reaches_every_signal() {
        let (handle, mut first) = cancellation();
        let mut second = handle.signal();
        assert!(!first.is_cancelled());

        handle.cancel();
        assert!(handle.is_cancelled());
        first.cancelled().await;
        second.cancelled().await;
        assert!(second.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let (handle, mut signal) = cancellation();
        handle.cancel();
        handle.cancel();
        signal.cancelled().await;
    }

    #[tokio::test]
    async fn cancel_wakes_waiting_task() {
        let (handle, mut signal) = cancellation();
        let waiter = tokio::spawn(async move {
            signal.cancelled().await;
        });
        tokio::task::yield_now().await;
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter woke")
            .unwrap();
    }

    #[tokio::test]
    async fn dropped_handle_never_fires() {
        let (handle, mut signal) = cancellation();
        drop(handle);
        let waited = tokio::time::timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(waited.is_err());
        assert!(!signal.is_cancelled());

        let mut never = CancelSignal::never();
        let waited = tokio::time::timeout(Duration::from_millis(20), never.cancelled()).await;
        assert!(waited.is_err());
    }
}
