// ABOUTME: Status monitor event loop driving aggregation cycles and observer lifecycle
// Single consumer of the service channel; the only task that touches the registry

use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::docker::ContainerSource;
use crate::server::registry::{Observer, Registry};
use crate::status::StatusAggregator;

/// Requests handled by the status monitor.
///
/// Both triggers send `Refresh`; connection tasks send `Connect` and
/// `Disconnect`. Events from the notify callback thread cross into the
/// service context through this channel rather than touching any state
/// directly.
#[derive(Debug)]
pub enum MonitorEvent {
    /// Run one aggregate-and-broadcast cycle.
    Refresh,
    /// Register a new observer and send it one fresh snapshot.
    Connect(Observer),
    /// Remove an observer; safe to send more than once per connection.
    Disconnect(Uuid),
}

/// The service's coordination loop.
///
/// Owns the registry and the aggregator, and processes events strictly one
/// at a time. Two racing triggers therefore produce two whole cycles in
/// arrival order, each an idempotent full replacement.
pub struct StatusMonitor<S> {
    aggregator: StatusAggregator<S>,
    registry: Registry,
    events: mpsc::UnboundedReceiver<MonitorEvent>,
}

impl<S: ContainerSource> StatusMonitor<S> {
    pub fn new(aggregator: StatusAggregator<S>, events: mpsc::UnboundedReceiver<MonitorEvent>) -> Self {
        Self {
            aggregator,
            registry: Registry::new(),
            events,
        }
    }

    /// Process events until every sender is gone.
    pub async fn run(mut self) {
        info!("Status monitor started");
        while let Some(event) = self.events.recv().await {
            self.handle_event(event).await;
        }
        debug!("Event channel closed, status monitor stopping");
    }

    async fn handle_event(&mut self, event: MonitorEvent) {
        match event {
            MonitorEvent::Refresh => {
                let status = self.aggregator.aggregate().await;
                self.registry.broadcast(&status);
            }
            MonitorEvent::Connect(observer) => {
                let id = observer.id;
                self.registry.insert(observer);
                info!("Observer {} connected ({} active)", id, self.registry.len());

                // Computed on demand so the first message is never staler
                // than one aggregation.
                let status = self.aggregator.aggregate().await;
                self.registry.send_to(id, &status);
            }
            MonitorEvent::Disconnect(id) => {
                if self.registry.remove(id) {
                    info!("Observer {} disconnected ({} active)", id, self.registry.len());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::docker::containers::MockContainerSource;
    use crate::models::{ContainerInfo, ContainerState, ProjectStatus};
    use tokio_tungstenite::tungstenite::Message;

    fn monitor_with_stub_source() -> StatusMonitor<MockContainerSource> {
        let mut source = MockContainerSource::new();
        source.expect_list_containers().returning(|_| {
            Ok(vec![ContainerInfo {
                name: "api".to_string(),
                status: ContainerState::Running,
                id: "ab12".to_string(),
            }])
        });

        let config = MonitorConfig {
            subprojects: Vec::new(),
            ..MonitorConfig::default()
        };
        let (_events_tx, events_rx) = mpsc::unbounded_channel();
        StatusMonitor::new(StatusAggregator::new(&config, source), events_rx)
    }

    fn decode(message: Message) -> ProjectStatus {
        let Message::Text(payload) = message else {
            panic!("expected a text frame");
        };
        serde_json::from_str(&payload).unwrap()
    }

    #[tokio::test]
    async fn connect_yields_exactly_one_immediate_snapshot() {
        let mut monitor = monitor_with_stub_source();
        let (tx, mut rx) = mpsc::channel(4);

        monitor.handle_event(MonitorEvent::Connect(Observer::new(tx))).await;

        let first = decode(rx.try_recv().expect("no snapshot on connect"));
        assert_eq!(first.containers[0].name, "api");
        assert!(rx.try_recv().is_err(), "connect must send exactly one snapshot");

        monitor.handle_event(MonitorEvent::Refresh).await;
        let second = decode(rx.try_recv().expect("no snapshot on refresh"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn double_disconnect_is_harmless() {
        let mut monitor = monitor_with_stub_source();
        let (tx, _rx) = mpsc::channel(4);
        let observer = Observer::new(tx);
        let id = observer.id;

        monitor.handle_event(MonitorEvent::Connect(observer)).await;
        monitor.handle_event(MonitorEvent::Disconnect(id)).await;
        monitor.handle_event(MonitorEvent::Disconnect(id)).await;

        assert!(monitor.registry.is_empty());
    }
}
