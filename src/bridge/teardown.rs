//! One-shot completion signal shared by the two relay directions.

use std::sync::Arc;

use tokio::sync::watch;

/// Which way bytes flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// WebSocket client to backend socket.
    ClientToBackend,
    /// Backend socket to WebSocket client.
    BackendToClient,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientToBackend => "client_to_backend",
            Self::BackendToClient => "backend_to_client",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set once by the first direction to finish; every other holder observes it.
#[derive(Debug, Clone)]
pub struct Teardown {
    tx: Arc<watch::Sender<Option<Direction>>>,
}

impl Teardown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Record that `direction` finished. Only the first call has effect;
    /// returns whether this call was it.
    pub fn trigger(&self, direction: Direction) -> bool {
        self.tx.send_if_modified(|first| {
            if first.is_none() {
                *first = Some(direction);
                true
            } else {
                false
            }
        })
    }

    /// Resolves once any direction has triggered.
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(Option::is_some).await;
    }

    /// The direction that finished first, if any.
    pub fn first(&self) -> Option<Direction> {
        *self.tx.borrow()
    }
}

impl Default for Teardown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_trigger_wins() {
        let teardown = Teardown::new();
        assert_eq!(teardown.first(), None);

        assert!(teardown.trigger(Direction::BackendToClient));
        assert!(!teardown.clone().trigger(Direction::ClientToBackend));
        assert_eq!(teardown.first(), Some(Direction::BackendToClient));
    }

    #[tokio::test]
    async fn triggered_wakes_waiter() {
        let teardown = Teardown::new();
        let waiter = {
            let teardown = teardown.clone();
            tokio::spawn(async move { teardown.triggered().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        teardown.trigger(Direction::ClientToBackend);

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn triggered_after_the_fact_returns_immediately() {
        let teardown = Teardown::new();
        teardown.trigger(Direction::ClientToBackend);
        tokio::time::timeout(Duration::from_millis(100), teardown.triggered())
            .await
            .expect("already triggered");
    }
}
