use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::config::ConnectionConfig;
use super::protocol::{Envelope, Message};
use super::stats::{ConnectionStats, StatsCounters};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub type Inbound = mpsc::UnboundedReceiver<Envelope>;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),
    #[error("connection failed: {0}")]
    Failure(#[source] WsError),
    #[error("timed out connecting to {0}")]
    Timeout(String),
    #[error("gave up after {0} reconnect attempts")]
    ExhaustedReconnect(u32),
    #[error("connection driver stopped")]
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    NeverConnected,
    Requested,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected { reason: DisconnectReason },
    Connecting,
    Connected,
    Reconnecting { attempt: u32, delay: Duration },
    GaveUp,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

#[derive(Debug)]
enum Command {
    Connect(String),
    Resume,
    Disconnect,
    Send(String),
    Shutdown,
}

pub fn validate_endpoint(endpoint: &str) -> Result<(), ConnectionError> {
    let invalid = || ConnectionError::InvalidEndpoint(endpoint.to_string());
    let request = endpoint.into_client_request().map_err(|_| invalid())?;
    match request.uri().scheme_str() {
        Some("ws") | Some("wss") => Ok(()),
        _ => Err(invalid()),
    }
}

/// Handle to the single live contest connection. Cheap to clone; the socket itself is owned
/// by a driver task that stops on `shutdown` or once every handle is dropped.
#[derive(Debug, Clone)]
pub struct Connection {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    stats: Arc<StatsCounters>,
}

impl Connection {
    pub fn spawn(config: ConnectionConfig) -> (Self, Inbound) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected {
            reason: DisconnectReason::NeverConnected,
        });
        let stats = Arc::new(StatsCounters::default());

        let driver = Driver {
            config,
            commands: command_rx,
            inbound: inbound_tx,
            state: state_tx,
            stats: Arc::clone(&stats),
            endpoint: None,
            attempts: 0,
            socket: None,
            retry_at: None,
        };
        tokio::spawn(driver.run());

        let connection = Self {
            commands: command_tx,
            state: state_rx,
            stats,
        };
        (connection, inbound_rx)
    }

    fn command(&self, command: Command) -> Result<(), ConnectionError> {
        self.commands
            .send(command)
            .map_err(|_| ConnectionError::Stopped)
    }

    /// Replaces any current connection with one to `endpoint`.
    pub fn connect(&self, endpoint: &str) -> Result<(), ConnectionError> {
        validate_endpoint(endpoint)?;
        self.command(Command::Connect(endpoint.to_string()))
    }

    pub fn disconnect(&self) {
        if self.command(Command::Disconnect).is_err() {
            log::debug!("Disconnect ignored, driver stopped");
        }
    }

    /// App became active: reconnect to the last endpoint with a fresh attempt budget.
    pub fn foreground(&self) {
        if self.command(Command::Resume).is_err() {
            log::debug!("Resume ignored, driver stopped");
        }
    }

    /// App moved to the background: deliberate disconnect, no automatic reconnection.
    pub fn background(&self) {
        self.disconnect();
    }

    pub fn send(&self, message: &Message) {
        match message.encode() {
            Ok(text) => self.send_text(text),
            Err(e) => {
                self.stats.send_failed();
                log::warn!("Not sending {} message: {}", message.kind(), e);
            }
        }
    }

    pub fn send_text(&self, text: String) {
        if self.command(Command::Send(text)).is_err() {
            self.stats.send_failed();
            log::warn!("Dropping outbound message, driver stopped");
        }
    }

    pub fn shutdown(&self) {
        if self.command(Command::Shutdown).is_err() {
            log::debug!("Shutdown ignored, driver stopped");
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats.snapshot()
    }
}

struct Driver {
    config: ConnectionConfig,
    commands: mpsc::UnboundedReceiver<Command>,
    inbound: mpsc::UnboundedSender<Envelope>,
    state: watch::Sender<ConnectionState>,
    stats: Arc<StatsCounters>,
    endpoint: Option<String>,
    attempts: u32,
    socket: Option<WsStream>,
    retry_at: Option<Instant>,
}

async fn next_frame(socket: &mut Option<WsStream>) -> Option<Result<WsMessage, WsError>> {
    match socket.as_mut() {
        Some(ws) => ws.next().await,
        None => std::future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl Driver {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                frame = next_frame(&mut self.socket) => self.handle_frame(frame).await,
                _ = wait_until(self.retry_at) => {
                    self.retry_at = None;
                    self.open().await;
                }
            }
        }

        self.close(DisconnectReason::Shutdown).await;
        log::debug!("Connection driver stopped");
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect(endpoint) => {
                self.endpoint = Some(endpoint);
                self.attempts = 0;
                self.retry_at = None;
                self.open().await;
            }
            Command::Resume => {
                if self.socket.is_some() {
                    log::debug!("Already connected");
                    return;
                }
                self.attempts = 0;
                self.retry_at = None;
                self.open().await;
            }
            Command::Disconnect => self.close(DisconnectReason::Requested).await,
            Command::Send(text) => self.transmit(text).await,
            Command::Shutdown => {}
        }
    }

    async fn handle_frame(&mut self, frame: Option<Result<WsMessage, WsError>>) {
        match frame {
            Some(Ok(WsMessage::Text(text))) => self.dispatch(&text),
            Some(Ok(WsMessage::Binary(data))) => {
                log::debug!("Ignoring {} byte binary frame", data.len());
            }
            Some(Ok(WsMessage::Close(frame))) => {
                log::info!("Server closed the connection: {:?}", frame);
                self.connection_lost();
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                log::warn!("Receive failed: {}", e);
                self.connection_lost();
            }
            None => {
                log::info!("Connection stream ended");
                self.connection_lost();
            }
        }
    }

    fn dispatch(&self, text: &str) {
        match Envelope::decode(text) {
            Ok(envelope) => {
                self.stats.received();
                if self.inbound.send(envelope).is_err() {
                    log::debug!("No inbound consumer, message dropped");
                }
            }
            Err(e) => {
                self.stats.decode_failed();
                log::warn!("Dropping frame: {}", e);
            }
        }
    }

    async fn transmit(&mut self, text: String) {
        let Some(ws) = self.socket.as_mut() else {
            self.stats.send_failed();
            log::warn!("Not connected, dropping outbound message");
            return;
        };
        match ws.send(WsMessage::Text(text)).await {
            Ok(()) => self.stats.sent(),
            Err(e) => {
                self.stats.send_failed();
                log::warn!("Send failed: {}", e);
            }
        }
    }

    async fn open(&mut self) {
        let Some(endpoint) = self.endpoint.clone() else {
            log::warn!("No endpoint configured, staying disconnected");
            return;
        };

        self.release_socket(CloseCode::Normal).await;
        self.set_state(ConnectionState::Connecting);
        log::info!("Connecting to {}", endpoint);

        match tokio::time::timeout(self.config.connect_timeout(), connect_async(endpoint.as_str()))
            .await
        {
            Ok(Ok((ws, _response))) => {
                self.socket = Some(ws);
                self.attempts = 0;
                self.stats.connected();
                self.set_state(ConnectionState::Connected);
                log::info!("Connected to {}", endpoint);
                self.announce().await;
            }
            Ok(Err(e)) => {
                log::warn!("{}", ConnectionError::Failure(e));
                self.schedule_reconnect();
            }
            Err(_) => {
                log::warn!("{}", ConnectionError::Timeout(endpoint));
                self.schedule_reconnect();
            }
        }
    }

    async fn announce(&mut self) {
        let hello = Message::Connect(self.config.device_id.clone());
        match hello.encode() {
            Ok(text) => self.transmit(text).await,
            Err(e) => log::warn!("Could not encode connect message: {}", e),
        }
    }

    fn connection_lost(&mut self) {
        self.socket = None;
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        match self.config.reconnect.delay(self.attempts) {
            Some(delay) => {
                self.attempts += 1;
                self.stats.reconnect_scheduled();
                log::info!(
                    "Reconnecting in {:?} (attempt {}/{})",
                    delay,
                    self.attempts,
                    self.config.reconnect.max_attempts
                );
                self.retry_at = Some(Instant::now() + delay);
                self.set_state(ConnectionState::Reconnecting {
                    attempt: self.attempts,
                    delay,
                });
            }
            None => {
                log::error!("{}", ConnectionError::ExhaustedReconnect(self.attempts));
                self.retry_at = None;
                self.set_state(ConnectionState::GaveUp);
            }
        }
    }

    async fn release_socket(&mut self, code: CloseCode) {
        if let Some(mut ws) = self.socket.take() {
            let frame = CloseFrame {
                code,
                reason: "".into(),
            };
            if let Err(e) = ws.close(Some(frame)).await {
                log::debug!("Close handshake failed: {}", e);
            }
        }
    }

    async fn close(&mut self, reason: DisconnectReason) {
        self.retry_at = None;
        self.release_socket(CloseCode::Away).await;
        self.set_state(ConnectionState::Disconnected { reason });
        log::info!("Disconnected ({:?})", reason);
    }
}
