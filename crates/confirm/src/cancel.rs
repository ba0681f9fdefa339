//! Caller-initiated cancellation of confirmation waits.

use std::sync::Arc;
use tokio::sync::watch;

/// Create a linked handle/signal pair.
///
/// Firing the handle wakes every clone of the signal. Dropping the handle
/// without firing leaves the signal pending forever.
pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, Cancellation { rx })
}

/// Fires the cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes the cancellation signal.
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal has fired.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_cancel_wakes_all_clones() {
        let (handle, signal) = cancellation();
        let other = signal.clone();
        assert!(!signal.is_cancelled());

        let waiter = tokio::spawn(async move { other.cancelled().await });
        handle.cancel();

        waiter.await.unwrap();
        assert!(signal.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_resolves_immediately() {
        let (handle, signal) = cancellation();
        handle.cancel();
        drop(handle);

        tokio::time::timeout(Duration::from_millis(1), signal.cancelled())
            .await
            .expect("fired signal should resolve");
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_stays_pending() {
        let signal = Cancellation::never();

        let result = tokio::time::timeout(Duration::from_secs(3600), signal.cancelled()).await;
        assert!(result.is_err());
        assert!(!signal.is_cancelled());
    }
}
