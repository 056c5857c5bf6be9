//! Toast fan-out
//!
//! Store actions report outcomes here; whoever renders the dashboard
//! subscribes. Every toast is logged as well, so a headless run still shows
//! what the user would have seen.

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::models::{ToastKind, ToastMessage};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct Toaster {
    tx: broadcast::Sender<ToastMessage>,
}

impl Default for Toaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Toaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ToastMessage> {
        self.tx.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(ToastKind::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(ToastKind::Error, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(ToastKind::Info, message.into());
    }

    fn push(&self, kind: ToastKind, message: String) {
        match kind {
            ToastKind::Error => warn!(toast = %message, "error toast"),
            _ => info!(toast = %message, "toast"),
        }
        // No subscribers is fine
        let _ = self.tx.send(ToastMessage::new(kind, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_toasts_in_order() {
        let toaster = Toaster::new();
        let mut rx = toaster.subscribe();

        toaster.success("Comment added");
        toaster.error("The requested resource was not found.");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, ToastKind::Success);
        assert_eq!(first.message, "Comment added");

        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, ToastKind::Error);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_push_without_subscribers_does_not_panic() {
        Toaster::new().info("nobody listening");
    }
}
