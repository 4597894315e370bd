// ABOUTME: Fixed-interval poll trigger covering container changes no file event reports

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::server::MonitorEvent;

/// Request a refresh cycle on a fixed interval for the life of the process.
///
/// The first tick fires immediately, and there is no skip-if-busy logic: a
/// cycle still in flight when the next tick lands simply queues another.
/// The task ends on its own once the service channel closes.
pub fn spawn_poll_trigger(
    interval: Duration,
    events: mpsc::UnboundedSender<MonitorEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if events.send(MonitorEvent::Refresh).is_err() {
                debug!("Event channel closed, poll trigger stopping");
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_immediately_then_on_every_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_poll_trigger(Duration::from_secs(5), tx);

        let start = tokio::time::Instant::now();
        for _ in 0..3 {
            assert!(matches!(rx.recv().await, Some(MonitorEvent::Refresh)));
        }

        // First tick is immediate, the next two are one interval apart
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        handle.abort();
    }

    #[tokio::test]
    async fn stops_once_the_service_channel_closes() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = spawn_poll_trigger(Duration::from_millis(1), tx);
        drop(rx);

        // The next tick notices the closed channel and the task finishes
        assert!(handle.await.is_ok());
    }
}
