// ABOUTME: Observer connection registry with failure-isolated snapshot fanout
// Serializes each snapshot once and never lets one broken observer affect the rest

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::models::ProjectStatus;

/// Handle to one connected observer.
///
/// Identity is the per-connection id, never a business key; a reconnecting
/// client is admitted as a brand-new observer. The bounded sender is drained
/// by that connection's socket task.
#[derive(Debug)]
pub struct Observer {
    pub id: Uuid,
    sender: mpsc::Sender<Message>,
}

impl Observer {
    pub fn new(sender: mpsc::Sender<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }
}

/// The set of currently-open observer connections.
///
/// Owned exclusively by the status monitor task; all mutation happens there,
/// so the map needs no lock. Entries leave on disconnect or on the first
/// unrecoverable send failure.
#[derive(Debug, Default)]
pub struct Registry {
    observers: HashMap<Uuid, mpsc::Sender<Message>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, observer: Observer) {
        self.observers.insert(observer.id, observer.sender);
    }

    /// Remove an observer. Idempotent: removing an id that already left is
    /// not an error.
    pub fn remove(&mut self, id: Uuid) -> bool {
        self.observers.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Send a snapshot to every registered observer.
    ///
    /// The snapshot is serialized exactly once. A full or closed outbound
    /// buffer drops that observer from the registry after the loop; the
    /// remaining observers are unaffected and nothing is raised.
    pub fn broadcast(&mut self, status: &ProjectStatus) {
        let Some(payload) = encode(status) else {
            return;
        };

        let mut stale = Vec::new();
        for (id, sender) in &self.observers {
            match sender.try_send(Message::Text(payload.clone())) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!("Observer {} fell too far behind, dropping it", id);
                    stale.push(*id);
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Observer {} is gone, dropping it", id);
                    stale.push(*id);
                }
            }
        }

        for id in stale {
            self.observers.remove(&id);
        }
    }

    /// Send a snapshot to a single observer, used for the initial message on
    /// connect. Failures tear that observer down just like a broadcast
    /// failure would.
    pub fn send_to(&mut self, id: Uuid, status: &ProjectStatus) {
        let Some(payload) = encode(status) else {
            return;
        };

        if let Some(sender) = self.observers.get(&id) {
            if let Err(e) = sender.try_send(Message::Text(payload)) {
                warn!("Initial send to observer {} failed: {}", id, e);
                self.observers.remove(&id);
            }
        }
    }
}

fn encode(status: &ProjectStatus) -> Option<String> {
    match serde_json::to_string(status) {
        Ok(payload) => Some(payload),
        Err(e) => {
            error!("Error encoding status snapshot: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContainerInfo, ContainerState, TestSummary};

    fn sample_status() -> ProjectStatus {
        let mut status = ProjectStatus::default();
        status.containers.push(ContainerInfo {
            name: "api".to_string(),
            status: ContainerState::Running,
            id: "ab12".to_string(),
        });
        status
            .tests
            .insert("backend".to_string(), TestSummary::new(9, 1));
        status
    }

    #[tokio::test]
    async fn broadcast_reaches_every_observer() {
        let mut registry = Registry::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        registry.insert(Observer::new(tx_a));
        registry.insert(Observer::new(tx_b));

        registry.broadcast(&sample_status());

        for rx in [&mut rx_a, &mut rx_b] {
            let Some(Message::Text(payload)) = rx.recv().await else {
                panic!("observer did not receive a snapshot");
            };
            let decoded: ProjectStatus = serde_json::from_str(&payload).unwrap();
            assert_eq!(decoded, sample_status());
        }
    }

    #[tokio::test]
    async fn closed_observer_is_removed_without_affecting_others() {
        let mut registry = Registry::new();
        let (tx_dead, rx_dead) = mpsc::channel(4);
        let (tx_live, mut rx_live) = mpsc::channel(4);
        registry.insert(Observer::new(tx_dead));
        registry.insert(Observer::new(tx_live));
        drop(rx_dead);

        registry.broadcast(&sample_status());

        assert_eq!(registry.len(), 1);
        assert!(rx_live.recv().await.is_some());
    }

    #[tokio::test]
    async fn observer_with_full_buffer_is_dropped() {
        let mut registry = Registry::new();
        let (tx, mut rx) = mpsc::channel(1);
        registry.insert(Observer::new(tx));

        registry.broadcast(&sample_status());
        registry.broadcast(&sample_status());

        assert!(registry.is_empty());
        // The one message that fit is still delivered
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let mut registry = Registry::new();
        let (tx, _rx) = mpsc::channel(1);
        let observer = Observer::new(tx);
        let id = observer.id;
        registry.insert(observer);

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
    }

    #[tokio::test]
    async fn send_to_unknown_observer_is_a_no_op() {
        let mut registry = Registry::new();
        registry.send_to(Uuid::new_v4(), &sample_status());
        assert!(registry.is_empty());
    }
}
