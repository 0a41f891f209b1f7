//! WebSocket transport for the active channel.
//!
//! Each connection is one spawned task that owns the socket. It reports
//! [`TransportEvent`]s tagged with its generation and takes outbound text on
//! an unbounded channel. Dropping that channel's sender releases the
//! connection: the task sends a Close frame and exits.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::cookie::Jar;
use reqwest::Url;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, COOKIE, ORIGIN};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::actions::SessionDriver;
use crate::client::{build_ws_url, jar_cookie_header};
use crate::session::{TransportEvent, TransportEventKind};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(12);

/// Everything needed to open `/ws/{channel_id}`.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub url: String,
    pub cookie: Option<String>,
    pub origin: Option<String>,
}

struct Connection {
    generation: u64,
    outbound: mpsc::UnboundedSender<String>,
}

/// Owns at most one live connection at a time.
pub struct TransportManager {
    api_base: String,
    origin: Option<String>,
    cookie_url: Option<Url>,
    jar: Arc<Jar>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    current: Option<Connection>,
}

impl TransportManager {
    /// `jar` is the one the HTTP client uses, so every handshake carries
    /// whatever session the server set last.
    pub fn new(
        api_base: &str,
        origin: Option<String>,
        jar: Arc<Jar>,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                api_base: api_base.to_string(),
                origin,
                cookie_url: Url::parse(api_base).ok(),
                jar,
                events_tx,
                current: None,
            },
            events_rx,
        )
    }

    pub fn request_for(&self, channel_id: u64) -> ConnectRequest {
        ConnectRequest {
            url: build_ws_url(&self.api_base, &format!("/ws/{}", channel_id)),
            cookie: self
                .cookie_url
                .as_ref()
                .and_then(|url| jar_cookie_header(&self.jar, url)),
            origin: self.origin.clone(),
        }
    }

    pub fn current_generation(&self) -> Option<u64> {
        self.current.as_ref().map(|c| c.generation)
    }

    /// Opens a connection, releasing the previous one first.
    pub fn open(&mut self, generation: u64, request: ConnectRequest) {
        if let Some(previous) = self.current.take() {
            debug!(generation = previous.generation, "releasing previous transport");
        }
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_connection(
            generation,
            request,
            outbound_rx,
            self.events_tx.clone(),
        ));
        self.current = Some(Connection {
            generation,
            outbound: outbound_tx,
        });
    }

    pub fn release(&mut self, generation: u64) {
        if self.current_generation() == Some(generation) {
            self.current = None;
            debug!(generation, "transport released");
        }
    }

    /// Queues a text frame. Frames for anything but the current connection
    /// are dropped.
    pub fn queue(&self, generation: u64, content: String) {
        match &self.current {
            Some(conn) if conn.generation == generation => {
                if conn.outbound.send(content).is_err() {
                    warn!(generation, "transport task already gone, frame dropped");
                }
            }
            _ => debug!(generation, "no live transport for frame"),
        }
    }
}

impl SessionDriver for TransportManager {
    fn connect(&mut self, generation: u64, channel_id: u64) {
        let request = self.request_for(channel_id);
        self.open(generation, request);
    }

    fn disconnect(&mut self, generation: u64) {
        self.release(generation);
    }

    fn send(&mut self, generation: u64, content: String) {
        self.queue(generation, content);
    }
}

async fn run_connection(
    generation: u64,
    request: ConnectRequest,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    let emit = |kind: TransportEventKind| {
        let _ = events_tx.send(TransportEvent::new(generation, kind));
    };

    let mut ws_request = match request.url.as_str().into_client_request() {
        Ok(req) => req,
        Err(err) => {
            emit(TransportEventKind::Failed(format!("invalid url: {err}")));
            return;
        }
    };
    let headers = ws_request.headers_mut();
    if let Some(value) = request.cookie.as_deref().and_then(|c| HeaderValue::from_str(c).ok()) {
        headers.insert(COOKIE, value);
    }
    if let Some(value) = request.origin.as_deref().and_then(|o| HeaderValue::from_str(o).ok()) {
        headers.insert(ORIGIN, value);
    }

    info!(generation, url = %request.url, "opening transport");

    // Nothing is queued before the session sees Opened, so anything arriving
    // here means the sender was dropped.
    let connected = tokio::select! {
        result = timeout(CONNECT_TIMEOUT, connect_async(ws_request)) => result,
        _ = outbound_rx.recv() => {
            debug!(generation, "transport released during handshake");
            return;
        }
    };

    let ws_stream = match connected {
        Ok(Ok((stream, _))) => stream,
        Ok(Err(err)) => {
            warn!(generation, "connect failed: {err}");
            emit(TransportEventKind::Failed(err.to_string()));
            return;
        }
        Err(_) => {
            warn!(generation, "connect timed out after {:?}", CONNECT_TIMEOUT);
            emit(TransportEventKind::Failed("connect timed out".to_string()));
            return;
        }
    };

    emit(TransportEventKind::Opened);
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => match outbound {
                Some(text) => {
                    if let Err(err) = write.send(WsMessage::Text(text.into())).await {
                        emit(TransportEventKind::Failed(format!("write failed: {err}")));
                        break;
                    }
                }
                None => {
                    let _ = write.send(WsMessage::Close(None)).await;
                    debug!(generation, "transport closed locally");
                    break;
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(WsMessage::Text(text))) => {
                    emit(TransportEventKind::Frame(text.as_str().to_owned()));
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    emit(TransportEventKind::Frame(String::from_utf8_lossy(&data).into_owned()));
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    emit(TransportEventKind::Closed);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    emit(TransportEventKind::Failed(format!("read failed: {err}")));
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_targets_channel_socket_with_session() {
        let jar = Arc::new(Jar::default());
        let base = "http://localhost:8080/";
        jar.add_cookie_str("auth_token=abc; Path=/", &Url::parse(base).unwrap());
        let (manager, _events) =
            TransportManager::new(base, Some("http://localhost:5173".into()), jar);
        let request = manager.request_for(12);
        assert_eq!(request.url, "ws://localhost:8080/ws/12");
        assert_eq!(request.cookie.as_deref(), Some("auth_token=abc"));
        assert_eq!(request.origin.as_deref(), Some("http://localhost:5173"));
    }

    #[test]
    fn frames_without_live_connection_are_dropped() {
        let (mut manager, _events) =
            TransportManager::new("http://localhost:8080", None, Arc::new(Jar::default()));
        manager.queue(1, "hi".into());
        manager.release(1);
        assert_eq!(manager.current_generation(), None);
    }
}
