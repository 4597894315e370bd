// ABOUTME: WebSocket endpoint accepting observer connections on /ws
// One task per connection forwards queued snapshots out and watches for closure

use anyhow::{anyhow, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::server::monitor::MonitorEvent;
use crate::server::registry::Observer;

/// The one path observers connect to.
pub const ENDPOINT_PATH: &str = "/ws";

/// Accept observer connections until the listener fails.
///
/// `observer_buffer` bounds each connection's outbound queue; an observer
/// that cannot drain it in time is dropped by the registry.
pub async fn serve(
    listener: TcpListener,
    events: mpsc::UnboundedSender<MonitorEvent>,
    observer_buffer: usize,
) -> Result<()> {
    info!("Listening for observers on {}", listener.local_addr()?);

    loop {
        let (stream, peer) = listener.accept().await?;
        let events = events.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, events, observer_buffer).await {
                debug!("Connection from {} ended: {}", peer, e);
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    events: mpsc::UnboundedSender<MonitorEvent>,
    observer_buffer: usize,
) -> Result<()> {
    let socket = tokio_tungstenite::accept_hdr_async(stream, require_endpoint_path).await?;
    let (mut sink, mut source) = socket.split();

    let (sender, mut outbound) = mpsc::channel(observer_buffer);
    let observer = Observer::new(sender);
    let id = observer.id;
    events
        .send(MonitorEvent::Connect(observer))
        .map_err(|_| anyhow!("monitor is shutting down"))?;

    loop {
        tokio::select! {
            queued = outbound.recv() => match queued {
                Some(message) => {
                    if let Err(e) = sink.send(message).await {
                        warn!("Write to observer {} failed: {}", id, e);
                        break;
                    }
                }
                // The registry dropped this observer
                None => break,
            },
            incoming = source.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                // Inbound payloads carry no commands; only closure matters
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Read from observer {} failed: {}", id, e);
                    break;
                }
            },
        }
    }

    let _ = events.send(MonitorEvent::Disconnect(id));
    Ok(())
}

fn require_endpoint_path(request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    if request.uri().path() == ENDPOINT_PATH {
        Ok(response)
    } else {
        let mut rejection = ErrorResponse::new(Some(format!(
            "unknown endpoint, connect to {}",
            ENDPOINT_PATH
        )));
        *rejection.status_mut() = StatusCode::NOT_FOUND;
        Err(rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_observer_path() {
        let request = Request::builder().uri("/ws").body(()).unwrap();
        assert!(require_endpoint_path(&request, Response::new(())).is_ok());
    }

    #[test]
    fn rejects_other_paths_with_not_found() {
        let request = Request::builder().uri("/metrics").body(()).unwrap();
        let rejection = require_endpoint_path(&request, Response::new(()))
            .expect_err("unexpected upgrade on a non-observer path");
        assert_eq!(rejection.status(), StatusCode::NOT_FOUND);
    }
}
