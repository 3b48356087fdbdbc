//! WebSocket transport to the Sola orchestrator.
//!
//! Owns the socket lifecycle: connect, automatic reconnect with capped
//! jittered backoff, raw frame dispatch, and the connectivity-change
//! notification dependents key consent/stream resets off of.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use rand::Rng;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use sola_core::protocol::{decode_server_frame, ClientFrame, FrameSink, ServerFrame};

/// Initial reconnect delay.
const BACKOFF_INITIAL: Duration = Duration::from_secs(1);
/// Ceiling for the reconnect delay.
const BACKOFF_MAX: Duration = Duration::from_secs(30);
/// Upper bound of the random jitter added to each delay, in milliseconds.
const BACKOFF_JITTER_MS: u64 = 500;

/// Events surfaced to the session layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The connection opened (`true`) or closed/failed (`false`).
    ///
    /// Every reconnect emits a fresh `true`: consent is per-connection, so
    /// dependents must observe each new connection, not just the first.
    Connectivity { connected: bool },
    /// A decoded inbound frame.
    Frame(ServerFrame),
}

/// A full-duplex connection to the orchestrator's `/ws` endpoint.
///
/// `connect()` is fire-and-forget: connection failures never surface
/// synchronously, only as `Connectivity { connected: false }` events.
pub struct SocketTransport {
    socket_url: String,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    outbound: Arc<Mutex<Option<mpsc::UnboundedSender<ClientFrame>>>>,
    connected: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

impl SocketTransport {
    /// Creates a transport for the given `ws://` / `wss://` URL and hands
    /// back the receiver for its events.
    pub fn new(socket_url: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let transport = Self {
            socket_url: socket_url.into(),
            events_tx,
            outbound: Arc::new(Mutex::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            shutdown: CancellationToken::new(),
        };
        (transport, events_rx)
    }

    /// Starts the connection task. Idempotent; failures are reported
    /// asynchronously through the event channel.
    pub fn connect(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("[Transport] connect() called while already running");
            return;
        }
        let worker = ConnectionWorker {
            socket_url: self.socket_url.clone(),
            events_tx: self.events_tx.clone(),
            outbound: Arc::clone(&self.outbound),
            connected: Arc::clone(&self.connected),
            running: Arc::clone(&self.running),
            shutdown: self.shutdown.clone(),
        };
        tokio::spawn(worker.run());
    }

    /// Tears the connection down and stops reconnecting.
    pub fn disconnect(&self) {
        self.shutdown.cancel();
    }
}

impl FrameSink for SocketTransport {
    fn send_frame(&self, frame: ClientFrame) -> Result<(), String> {
        let guard = self
            .outbound
            .lock()
            .map_err(|_| "transport state poisoned".to_string())?;
        match guard.as_ref() {
            Some(sender) if self.connected.load(Ordering::SeqCst) => sender
                .send(frame)
                .map_err(|_| "connection is closing".to_string()),
            _ => Err("not connected".to_string()),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// State owned by the background connection task.
struct ConnectionWorker {
    socket_url: String,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    outbound: Arc<Mutex<Option<mpsc::UnboundedSender<ClientFrame>>>>,
    connected: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    shutdown: CancellationToken,
}

impl ConnectionWorker {
    async fn run(self) {
        let mut backoff = BACKOFF_INITIAL;
        // Deduplicates consecutive `connected: false` reports while retrying.
        let mut last_reported: Option<bool> = None;

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            match connect_async(&self.socket_url).await {
                Ok((stream, _)) => {
                    tracing::info!("[Transport] Connected to {}", self.socket_url);
                    backoff = BACKOFF_INITIAL;
                    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
                    if let Ok(mut guard) = self.outbound.lock() {
                        *guard = Some(outbound_tx);
                    }
                    self.connected.store(true, Ordering::SeqCst);
                    self.report(&mut last_reported, true, true);

                    self.serve_connection(stream, outbound_rx).await;

                    self.connected.store(false, Ordering::SeqCst);
                    self.clear_outbound_channel();
                    self.report(&mut last_reported, false, true);

                    if self.shutdown.is_cancelled() {
                        break;
                    }
                    tracing::info!("[Transport] Connection lost, scheduling reconnect");
                }
                Err(err) => {
                    tracing::debug!("[Transport] Connect to {} failed: {}", self.socket_url, err);
                    self.report(&mut last_reported, false, false);
                }
            }

            let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..BACKOFF_JITTER_MS));
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(backoff + jitter) => {}
            }
            backoff = (backoff * 2).min(BACKOFF_MAX);
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::debug!("[Transport] Worker stopped");
    }

    /// Pumps one live connection until it closes, errors, or shutdown.
    async fn serve_connection(
        &self,
        stream: tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        mut outbound_rx: mpsc::UnboundedReceiver<ClientFrame>,
    ) {
        let (mut sink, mut source) = stream.split();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
                maybe_frame = outbound_rx.recv() => {
                    let Some(frame) = maybe_frame else { break };
                    let payload = match serde_json::to_string(&frame) {
                        Ok(payload) => payload,
                        Err(err) => {
                            tracing::error!("[Transport] Failed to serialize frame: {}", err);
                            continue;
                        }
                    };
                    if let Err(err) = sink.send(Message::Text(payload)).await {
                        tracing::warn!("[Transport] Send failed: {}", err);
                        break;
                    }
                }
                maybe_message = source.next() => {
                    match maybe_message {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(frame) = decode_server_frame(&text) {
                                let _ = self.events_tx.send(TransportEvent::Frame(frame));
                            }
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            let _ = sink.send(Message::Pong(payload)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::debug!("[Transport] Server closed the connection");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            tracing::warn!("[Transport] Read error: {}", err);
                            break;
                        }
                    }
                }
            }
        }
    }

    fn clear_outbound_channel(&self) {
        if let Ok(mut guard) = self.outbound.lock() {
            *guard = None;
        }
    }

    /// Emits a connectivity event. Repeated `false` reports during a retry
    /// loop are suppressed unless `force` is set.
    fn report(&self, last_reported: &mut Option<bool>, connected: bool, force: bool) {
        if !force && *last_reported == Some(connected) {
            return;
        }
        *last_reported = Some(connected);
        let _ = self
            .events_tx
            .send(TransportEvent::Connectivity { connected });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_on_closed_connection_is_a_failure_signal() {
        let (transport, _events) = SocketTransport::new("ws://127.0.0.1:1/ws");
        assert!(!transport.is_connected());
        let result = transport.send_frame(ClientFrame::Speak {
            text: "hello".to_string(),
            project: None,
        });
        assert!(result.is_err());
    }
}
