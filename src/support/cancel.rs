//! Cancellation of in-flight fan-outs
//!
//! A cloneable signal shared between the caller and every slot of a
//! fan-out. Slots still waiting when it fires are reported as timed out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

#[derive(Clone)]
pub struct CancelSignal {
    sender: broadcast::Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            info!("Fan-out cancellation requested");
            let _ = self.sender.send(());
        }
    }

    /// Resolves once [`cancel`](Self::cancel) has been called, immediately
    /// if that already happened.
    pub async fn cancelled(&self) {
        // Subscribe before checking the flag so a concurrent cancel is not lost.
        let mut receiver = self.sender.subscribe();
        if self.is_cancelled() {
            return;
        }
        let _ = receiver.recv().await;
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}
