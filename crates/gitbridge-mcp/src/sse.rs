//! SSE session manager.
//!
//! One session per streaming connection. The session task pushes JSON-RPC
//! notifications into a bounded channel that the HTTP layer turns into
//! `data:` frames:
//! 1. `notifications/status` (ready) immediately
//! 2. `notifications/tools/list` after the catalog delay
//! 3. `notifications/ping` every keep-alive interval
//!
//! The task ends as soon as the receiving side is dropped.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};
use tracing::{debug, info};

use crate::protocol::{JsonRpcNotification, ServerCapabilities, ServerInfo, MCP_VERSION};

pub const STATUS_METHOD: &str = "notifications/status";
pub const CATALOG_METHOD: &str = "notifications/tools/list";
pub const PING_METHOD: &str = "notifications/ping";

const CHANNEL_CAPACITY: usize = 16;

/// Session timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub catalog_delay: Duration,
    pub keepalive_interval: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            catalog_delay: Duration::from_millis(500),
            keepalive_interval: Duration::from_millis(5000),
        }
    }
}

impl From<&gitbridge_core::config::SseConfig> for SessionTiming {
    fn from(config: &gitbridge_core::config::SseConfig) -> Self {
        Self {
            catalog_delay: Duration::from_millis(config.catalog_delay_ms),
            // A zero period would make the ticker panic.
            keepalive_interval: Duration::from_millis(config.keepalive_interval_ms.max(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Handshake,
    Streaming,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The receiver was dropped while the session was waiting.
    ClientDisconnected,
    /// A frame could not be delivered.
    WriteFailed,
}

/// What a finished session did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames_sent: u64,
    pub pings_sent: u64,
    pub catalog_sent: bool,
    pub close_reason: CloseReason,
}

/// Per-connection streaming state.
pub struct SseSession {
    tx: mpsc::Sender<JsonRpcNotification>,
    timing: SessionTiming,
    state: SessionState,
    ready: Value,
    catalog: Value,
    catalog_sent: bool,
    first_ping_logged: bool,
    frames_sent: u64,
    pings_sent: u64,
}

impl SseSession {
    /// Create a session and the receiver its frames go to.
    pub fn new(
        server_info: &ServerInfo,
        catalog: Value,
        timing: SessionTiming,
    ) -> (Self, mpsc::Receiver<JsonRpcNotification>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let ready = json!({
            "status": "ready",
            "protocolVersion": MCP_VERSION,
            "serverInfo": server_info,
            "capabilities": ServerCapabilities::default(),
        });

        let session = Self {
            tx,
            timing,
            state: SessionState::Handshake,
            ready,
            catalog,
            catalog_sent: false,
            first_ping_logged: false,
            frames_sent: 0,
            pings_sent: 0,
        };
        (session, rx)
    }

    /// Create a session and run it on its own task.
    pub fn spawn(
        server_info: &ServerInfo,
        catalog: Value,
        timing: SessionTiming,
    ) -> (
        mpsc::Receiver<JsonRpcNotification>,
        JoinHandle<SessionSummary>,
    ) {
        let (session, rx) = Self::new(server_info, catalog, timing);
        (rx, tokio::spawn(session.run()))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session until the client goes away.
    pub async fn run(mut self) -> SessionSummary {
        info!("SSE session opened");

        let close_reason = self.stream().await;
        self.state = SessionState::Closed;

        info!(
            frames = self.frames_sent,
            pings = self.pings_sent,
            reason = ?close_reason,
            "SSE session closed"
        );

        SessionSummary {
            frames_sent: self.frames_sent,
            pings_sent: self.pings_sent,
            catalog_sent: self.catalog_sent,
            close_reason,
        }
    }

    async fn stream(&mut self) -> CloseReason {
        let ready = JsonRpcNotification::new(STATUS_METHOD, self.ready.clone());
        if !self.emit(ready).await {
            return CloseReason::WriteFailed;
        }
        self.state = SessionState::Streaming;

        tokio::select! {
            biased;
            _ = self.tx.closed() => return CloseReason::ClientDisconnected,
            _ = sleep(self.timing.catalog_delay) => {}
        }

        let catalog = JsonRpcNotification::new(CATALOG_METHOD, self.catalog.clone());
        if !self.emit(catalog).await {
            return CloseReason::WriteFailed;
        }
        self.catalog_sent = true;

        let period = self.timing.keepalive_interval;
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                biased;
                _ = self.tx.closed() => return CloseReason::ClientDisconnected,
                _ = ticker.tick() => {}
            }

            let ping = JsonRpcNotification::new(PING_METHOD, json!({"seq": self.pings_sent + 1}));
            if !self.emit(ping).await {
                return CloseReason::WriteFailed;
            }
            self.pings_sent += 1;

            if !self.first_ping_logged {
                debug!("First keep-alive ping sent");
                self.first_ping_logged = true;
            }
        }
    }

    /// Send one frame. Returns false once the session can no longer write.
    async fn emit(&mut self, notification: JsonRpcNotification) -> bool {
        if self.state == SessionState::Closed {
            return false;
        }

        match self.tx.send(notification).await {
            Ok(()) => {
                self.frames_sent += 1;
                true
            }
            Err(_) => {
                self.state = SessionState::Closed;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ServerInfo {
        ServerInfo::new("gitbridge", "0.1.0")
    }

    fn catalog() -> Value {
        json!({"tools": [{"name": "get_repository"}]})
    }

    #[test]
    fn test_timing_from_config() {
        let config = gitbridge_core::config::SseConfig {
            catalog_delay_ms: 10,
            keepalive_interval_ms: 0,
        };
        let timing = SessionTiming::from(&config);
        assert_eq!(timing.catalog_delay, Duration::from_millis(10));
        assert_eq!(timing.keepalive_interval, Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_order_and_timing() {
        let (mut rx, handle) = SseSession::spawn(&info(), catalog(), SessionTiming::default());
        let start = Instant::now();

        let status = rx.recv().await.unwrap();
        assert_eq!(status.method, STATUS_METHOD);
        let params = status.params.unwrap();
        assert_eq!(params["status"], "ready");
        assert_eq!(params["protocolVersion"], MCP_VERSION);
        assert_eq!(params["serverInfo"]["name"], "gitbridge");
        assert_eq!(start.elapsed(), Duration::ZERO);

        let tools = rx.recv().await.unwrap();
        assert_eq!(tools.method, CATALOG_METHOD);
        assert_eq!(tools.params.unwrap(), catalog());
        assert_eq!(start.elapsed(), Duration::from_millis(500));

        let ping = rx.recv().await.unwrap();
        assert_eq!(ping.method, PING_METHOD);
        assert_eq!(start.elapsed(), Duration::from_millis(5500));

        let ping = rx.recv().await.unwrap();
        assert_eq!(ping.params.unwrap()["seq"], 2);
        assert_eq!(start.elapsed(), Duration::from_millis(10500));

        drop(rx);
        let summary = handle.await.unwrap();
        assert_eq!(
            summary,
            SessionSummary {
                frames_sent: 4,
                pings_sent: 2,
                catalog_sent: true,
                close_reason: CloseReason::ClientDisconnected,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_before_catalog() {
        let (mut rx, handle) = SseSession::spawn(&info(), catalog(), SessionTiming::default());

        let status = rx.recv().await.unwrap();
        assert_eq!(status.method, STATUS_METHOD);
        drop(rx);

        let summary = handle.await.unwrap();
        assert_eq!(summary.frames_sent, 1);
        assert!(!summary.catalog_sent);
        assert_eq!(summary.pings_sent, 0);
        assert_eq!(summary.close_reason, CloseReason::ClientDisconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receiver_dropped_before_start() {
        let (session, rx) = SseSession::new(&info(), catalog(), SessionTiming::default());
        assert_eq!(session.state(), SessionState::Handshake);
        drop(rx);

        let summary = session.run().await;
        assert_eq!(summary.frames_sent, 0);
        assert_eq!(summary.close_reason, CloseReason::WriteFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_timing() {
        let timing = SessionTiming {
            catalog_delay: Duration::from_millis(50),
            keepalive_interval: Duration::from_millis(100),
        };
        let (mut rx, _handle) = SseSession::spawn(&info(), catalog(), timing);
        let start = Instant::now();

        rx.recv().await.unwrap();
        rx.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(50));
        let ping = rx.recv().await.unwrap();
        assert_eq!(ping.method, PING_METHOD);
        assert_eq!(start.elapsed(), Duration::from_millis(150));
    }
}
