//! Per-event cancellation signal.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::HandlerError;

/// Owner side; cancels every [`CancelSignal`] cloned from it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn pair() -> (Self, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelSignal { rx })
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Cancel after `timeout`; the timer stops early once every signal is dropped.
    pub fn cancel_after(self, timeout: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => self.cancel(),
                _ = self.tx.closed() => {}
            }
        })
    }
}

/// Read-only view of an event's cancellation state.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that is never cancelled.
    pub fn never() -> Self {
        let (_, signal) = CancelHandle::pair();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled; pends forever if the handle is gone.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Fail fast when already cancelled.
    pub fn check(&self) -> Result<(), HandlerError> {
        if self.is_cancelled() {
            Err(HandlerError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Await `fut` unless cancellation wins first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, HandlerError> {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(HandlerError::Cancelled),
            out = fut => Ok(out),
        }
    }
}
