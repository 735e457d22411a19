//! Cooperative cancellation for streaming requests.
//!
//! An [`AbortController`] is owned by whoever started the request; the
//! [`AbortSignal`]s it hands out are passed into the request and the event
//! stream. Aborting is sticky: once fired, every signal stays aborted.

use tokio::sync::watch;

/// Owner side of a cancellation flag.
#[derive(Debug)]
pub struct AbortController {
    tx: watch::Sender<bool>,
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// A new signal observing this controller.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver side of a cancellation flag.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the controller aborts.
    ///
    /// Never resolves if the controller is dropped without aborting.
    pub async fn aborted(&mut self) {
        let closed = self.rx.wait_for(|aborted| *aborted).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_abort_is_visible_to_all_signals() {
        let controller = AbortController::new();
        let first = controller.signal();
        let second = first.clone();

        assert!(!first.is_aborted());
        controller.abort();
        assert!(controller.is_aborted());
        assert!(first.is_aborted());
        assert!(second.is_aborted());
        assert!(controller.signal().is_aborted());
    }

    #[tokio::test]
    async fn test_aborted_resolves() {
        let controller = AbortController::new();
        let mut signal = controller.signal();

        let waiter = tokio::spawn(async move { signal.aborted().await });
        controller.abort();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("signal should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_controller_never_aborts() {
        let controller = AbortController::new();
        let mut signal = controller.signal();
        drop(controller);

        let result = tokio::time::timeout(Duration::from_millis(50), signal.aborted()).await;
        assert!(result.is_err());
        assert!(!signal.is_aborted());
    }
}
