//! WebSocket client for the real-time event feeds.

use crate::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tracing::{info, warn};
use url::Url;

mod events;
mod handler;
mod protocol;
mod session;


pub use events::*;
pub use handler::SocketHandler;

use session::{Session, SessionCommand, handshake};

/// Settings for a [`WebsocketClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct WebsocketConfig {
    /// Bound on the websocket handshake and on the connect reply.
    pub connect_timeout: Duration,
    /// Bound on the close handshake before the session is aborted.
    pub disconnect_timeout: Duration,
    /// Client name announced in the connect command.
    pub client_name: String,
    /// Client version announced in the connect command.
    pub client_version: String,
}

impl Default for WebsocketConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            disconnect_timeout: Duration::from_secs(5),
            client_name: env!("CARGO_PKG_NAME").to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Lifecycle of a [`WebsocketClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Built, never connected.
    Constructed,
    /// Session running.
    Connected,
    /// Session ended, either by `disconnect` or by the server.
    Disconnected,
}

struct Connection {
    commands: mpsc::Sender<SessionCommand>,
    task: JoinHandle<()>,
}

impl Connection {
    fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Creates a websocket client bound to `url`.
///
/// Returns `None` when `url` is empty or `handler` is `None`; nothing is
/// attempted on the network in that case. The URL is only validated by
/// [`WebsocketClient::connect`].
#[must_use]
pub fn new_websocket_client(
    url: &str,
    handler: Option<Arc<dyn SocketHandler>>,
) -> Option<WebsocketClient> {
    if url.is_empty() {
        return None;
    }
    let handler = handler?;

    Some(WebsocketClient {
        url: url.to_string(),
        channel: channel_from_url(url),
        handler,
        config: WebsocketConfig::default(),
        state: ConnectionState::Constructed,
        connection: None,
    })
}

/// Channel named by the last path segment of the URL (`.../mempool`).
fn channel_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// WebSocket client forwarding server events to a [`SocketHandler`].
///
/// Events are delivered from a background task once [`connect`](Self::connect)
/// returns. Call [`disconnect`](Self::disconnect) on every exit path;
/// dropping a connected client aborts the task without the close handshake.
pub struct WebsocketClient {
    url: String,
    channel: String,
    handler: Arc<dyn SocketHandler>,
    config: WebsocketConfig,
    state: ConnectionState,
    connection: Option<Connection>,
}

impl std::fmt::Debug for WebsocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebsocketClient")
            .field("url", &self.url)
            .field("channel", &self.channel)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl WebsocketClient {
    /// Replaces the client settings.
    #[must_use]
    pub fn with_config(mut self, config: WebsocketConfig) -> Self {
        self.config = config;
        self
    }

    /// Target URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Channel this client is bound to.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Current settings.
    #[must_use]
    pub fn config(&self) -> &WebsocketConfig {
        &self.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        match &self.connection {
            Some(connection) if connection.is_alive() => ConnectionState::Connected,
            Some(_) => ConnectionState::Disconnected,
            None => self.state,
        }
    }

    /// Returns `true` while the session is running.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Opens the connection and starts delivering events.
    ///
    /// Returns once the server accepted the connect command. A no-op when
    /// already connected. On failure the client stays disconnected and
    /// `connect` may be called again.
    ///
    /// # Errors
    /// Returns error if the URL is malformed or not `ws`/`wss`, the host is
    /// unreachable, the handshake times out or the server rejects the client.
    pub async fn connect(&mut self) -> Result<(), Error> {
        if self.is_connected() {
            return Ok(());
        }
        self.connection = None;

        let url = Url::parse(&self.url)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::UnsupportedScheme(url.scheme().to_string()));
        }

        info!(url = %url, channel = %self.channel, "connecting to websocket");
        let (mut stream, _) = timeout(self.config.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| Error::Timeout("websocket handshake".to_string()))?
            .map_err(Box::new)?;

        let reply = timeout(
            self.config.connect_timeout,
            handshake(
                &mut stream,
                &self.config.client_name,
                &self.config.client_version,
            ),
        )
        .await;
        let accepted = match reply {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(err)) => {
                let _ = stream.close(None).await;
                return Err(err);
            }
            Err(_) => {
                let _ = stream.close(None).await;
                return Err(Error::Timeout("connect reply".to_string()));
            }
        };

        let (tx, rx) = mpsc::channel(32);
        let session = Session::new(stream, Arc::clone(&self.handler), rx);
        let task = tokio::spawn(session.run(accepted));

        self.connection = Some(Connection { commands: tx, task });
        self.state = ConnectionState::Connected;
        info!(url = %self.url, "connected to websocket");
        Ok(())
    }

    /// Closes the connection and waits for the session to finish.
    ///
    /// Succeeds when the client was never connected or a previous
    /// `connect` failed. A session that does not stop within the
    /// disconnect timeout is aborted.
    pub async fn disconnect(&mut self) -> Result<(), Error> {
        let Some(mut connection) = self.connection.take() else {
            if self.state == ConnectionState::Connected {
                self.state = ConnectionState::Disconnected;
            }
            return Ok(());
        };

        // the session may already be gone if the server closed first
        let _ = connection.commands.send(SessionCommand::Close).await;

        match timeout(self.config.disconnect_timeout, &mut connection.task).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("websocket session task failed: {}", err),
            Err(_) => {
                warn!(url = %self.url, "websocket session did not stop in time, aborting");
                connection.task.abort();
            }
        }

        self.state = ConnectionState::Disconnected;
        info!(url = %self.url, "disconnected from websocket");
        Ok(())
    }

    /// Subscribes to a channel from the client side.
    ///
    /// The outcome arrives through `on_subscribe_success` or
    /// `on_subscribe_error`.
    ///
    /// # Errors
    /// Returns error if the channel is empty or the client is not connected.
    pub async fn subscribe(&self, channel: &str) -> Result<(), Error> {
        if channel.is_empty() {
            return Err(Error::InvalidRequest("channel cannot be empty".to_string()));
        }
        self.send(SessionCommand::Subscribe(channel.to_string())).await
    }

    /// Ends a client-side subscription.
    ///
    /// # Errors
    /// Returns error if the channel is empty or the client is not connected.
    pub async fn unsubscribe(&self, channel: &str) -> Result<(), Error> {
        if channel.is_empty() {
            return Err(Error::InvalidRequest("channel cannot be empty".to_string()));
        }
        self.send(SessionCommand::Unsubscribe(channel.to_string())).await
    }

    async fn send(&self, command: SessionCommand) -> Result<(), Error> {
        let connection = self
            .connection
            .as_ref()
            .filter(|connection| connection.is_alive())
            .ok_or(Error::NotConnected)?;

        connection
            .commands
            .send(command)
            .await
            .map_err(|_| Error::ConnectionClosed)
    }
}

impl Drop for WebsocketClient {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.task.abort();
        }
    }
}
