//! Integration test support for the WhatsOnChain client.
//!
//! Provides a scripted Centrifuge server on a loopback port and a handler
//! that records every event it receives, so websocket behaviour can be
//! exercised without the real service.

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use whatsonchain_client::{
    ClientOptions, ConnectEvent, DisconnectEvent, ErrorEvent, JoinEvent, LeaveEvent,
    MessageEvent, PublishEvent, ServerJoinEvent, ServerLeaveEvent, ServerPublishEvent,
    ServerSubscribeEvent, ServerUnsubscribeEvent, SocketHandler, SubscribeErrorEvent,
    SubscribeSuccessEvent, Subscription, UnsubscribeEvent,
};

/// How long helpers wait for an expected event.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client options with retries disabled and short timeouts.
#[must_use]
pub fn fast_options() -> ClientOptions {
    ClientOptions {
        request_retry_count: 0,
        request_timeout: Duration::from_secs(2),
        ..ClientOptions::default()
    }
}

// ============================================================================
// Mock Centrifuge server
// ============================================================================

/// Script followed by [`MockCentrifugeServer`] on every connection.
#[derive(Debug, Clone)]
pub struct ServerScript {
    /// Channels reported as server-side subscriptions in the connect reply.
    pub subs: Vec<String>,
    /// Whether the client must answer pings.
    pub pong: bool,
    /// Rejects the connect command with this code and message.
    pub reject_connect: Option<(u32, String)>,
    /// Raw frames sent right after the connect reply.
    pub frames: Vec<String>,
    /// Sends `frames` in the same text frame as the connect reply, one per
    /// line.
    pub batch_with_connect: bool,
    /// Sends a close frame after `frames`.
    pub close_after_frames: bool,
    /// Channels whose client-side subscribe is refused with code 103.
    pub forbidden_channels: HashSet<String>,
    /// Publishes one message into a channel right after subscribing to it.
    pub publish_on_subscribe: bool,
    /// Raw frames sent after every successful client-side subscribe.
    pub after_subscribe: Vec<String>,
}

impl Default for ServerScript {
    fn default() -> Self {
        Self {
            subs: vec!["mempool".to_string()],
            pong: true,
            reject_connect: None,
            frames: Vec::new(),
            batch_with_connect: false,
            close_after_frames: false,
            forbidden_channels: HashSet::new(),
            publish_on_subscribe: false,
            after_subscribe: Vec::new(),
        }
    }
}

/// Loopback websocket server speaking enough Centrifuge for the client.
///
/// Every text frame received from a client is forwarded to the channel
/// returned by [`MockCentrifugeServer::start`].
pub struct MockCentrifugeServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl MockCentrifugeServer {
    /// Binds to an ephemeral port and starts accepting connections.
    ///
    /// # Errors
    /// Returns error if the listener cannot be bound.
    pub async fn start(
        script: ServerScript,
    ) -> std::io::Result<(Self, mpsc::UnboundedReceiver<String>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let script = Arc::new(script);

        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&script), tx.clone()));
            }
        });

        Ok((Self { addr, task }, rx))
    }

    /// URL of a channel on this server, e.g. `ws://127.0.0.1:PORT/mempool`.
    #[must_use]
    pub fn url(&self, channel: &str) -> String {
        format!("ws://{}/{}", self.addr, channel)
    }
}

impl Drop for MockCentrifugeServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn connect_reply(script: &ServerScript, id: u64) -> Value {
    if let Some((code, message)) = &script.reject_connect {
        return json!({"id": id, "error": {"code": code, "message": message}});
    }

    let subs: serde_json::Map<String, Value> = script
        .subs
        .iter()
        .map(|channel| (channel.clone(), json!({})))
        .collect();
    json!({
        "id": id,
        "connect": {
            "client": "mock-client-id",
            "version": "mock",
            "subs": subs,
            "ping": 25,
            "pong": script.pong
        }
    })
}

fn connect_frames(script: &ServerScript, id: u64) -> Vec<String> {
    let reply = connect_reply(script, id).to_string();
    if script.reject_connect.is_some() {
        return vec![reply];
    }

    let frames = std::iter::once(reply).chain(script.frames.iter().cloned());
    if script.batch_with_connect {
        vec![frames.collect::<Vec<_>>().join("\n")]
    } else {
        frames.collect()
    }
}

fn subscribe_frames(script: &ServerScript, id: u64, channel: &str) -> Vec<String> {
    if script.forbidden_channels.contains(channel) {
        return vec![
            json!({"id": id, "error": {"code": 103, "message": "permission denied"}}).to_string(),
        ];
    }

    let mut frames = vec![json!({"id": id, "subscribe": {}}).to_string()];
    if script.publish_on_subscribe {
        frames.push(publication_frame(channel, json!({"subscribed": channel})));
    }
    frames.extend(script.after_subscribe.iter().cloned());
    frames
}

async fn serve(
    stream: TcpStream,
    script: Arc<ServerScript>,
    received: mpsc::UnboundedSender<String>,
) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };

    // keep polling after a close frame so the close reply gets flushed
    while let Some(Ok(message)) = ws.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let _ = received.send(text.as_str().to_string());

        for line in text.as_str().lines().filter(|line| !line.trim().is_empty()) {
            let Ok(command) = serde_json::from_str::<Value>(line) else {
                continue;
            };
            let id = command["id"].as_u64().unwrap_or_default();
            let is_connect = command.get("connect").is_some();

            let frames = if is_connect {
                connect_frames(&script, id)
            } else if let Some(subscribe) = command.get("subscribe") {
                let channel = subscribe["channel"].as_str().unwrap_or_default();
                subscribe_frames(&script, id, channel)
            } else if command.get("unsubscribe").is_some() {
                vec![json!({"id": id, "unsubscribe": {}}).to_string()]
            } else {
                Vec::new()
            };

            for frame in frames {
                if ws.send(Message::Text(frame.into())).await.is_err() {
                    return;
                }
            }

            if is_connect && script.reject_connect.is_none() && script.close_after_frames {
                let _ = ws.close(None).await;
            }
        }
    }
}

/// Frame publishing `data` into `channel`.
#[must_use]
pub fn publication_frame(channel: &str, data: Value) -> String {
    json!({"push": {"channel": channel, "pub": {"data": data}}}).to_string()
}

/// Frame announcing that `client` joined `channel`.
#[must_use]
pub fn join_frame(channel: &str, client: &str) -> String {
    json!({"push": {"channel": channel, "join": {"info": {"client": client}}}}).to_string()
}

/// Frame announcing that `client` left `channel`.
#[must_use]
pub fn leave_frame(channel: &str, client: &str) -> String {
    json!({"push": {"channel": channel, "leave": {"info": {"client": client}}}}).to_string()
}

/// Frame subscribing the connection to `channel` from the server side.
#[must_use]
pub fn subscribe_push_frame(channel: &str) -> String {
    json!({"push": {"channel": channel, "sub": {"recovered": false}}}).to_string()
}

/// Frame ending the connection's subscription to `channel`.
#[must_use]
pub fn unsubscribe_push_frame(channel: &str, code: u32, reason: &str) -> String {
    json!({"push": {"channel": channel, "unsub": {"code": code, "reason": reason}}}).to_string()
}

/// Frame carrying a server disconnect push.
#[must_use]
pub fn disconnect_frame(code: u32, reason: &str, reconnect: bool) -> String {
    json!({"push": {"disconnect": {"code": code, "reason": reason, "reconnect": reconnect}}})
        .to_string()
}

/// Waits up to [`EVENT_TIMEOUT`] for the next frame a client sent.
pub async fn next_frame(received: &mut mpsc::UnboundedReceiver<String>) -> Option<String> {
    tokio::time::timeout(EVENT_TIMEOUT, received.recv())
        .await
        .ok()
        .flatten()
}

// ============================================================================
// Recording handler
// ============================================================================

/// Handler that forwards a short description of each event to a channel.
///
/// Descriptions look like `connect:mock-client-id`,
/// `server_publish:mempool:{"hash":"ff"}` or `disconnect:0`.
#[derive(Debug)]
pub struct RecordingHandler {
    events: mpsc::UnboundedSender<String>,
}

impl RecordingHandler {
    /// Creates a handler and the stream of events it records.
    #[must_use]
    pub fn new() -> (Arc<Self>, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { events: tx }), EventStream { rx })
    }

    fn record(&self, event: String) {
        let _ = self.events.send(event);
    }
}

impl SocketHandler for RecordingHandler {
    fn on_connect(&self, event: &ConnectEvent) {
        self.record(format!("connect:{}", event.client_id));
    }

    fn on_disconnect(&self, event: &DisconnectEvent) {
        self.record(format!("disconnect:{}", event.code));
    }

    fn on_message(&self, event: &MessageEvent) {
        self.record(format!("message:{}", event.data));
    }

    fn on_error(&self, _event: &ErrorEvent) {
        self.record("error".to_string());
    }

    fn on_server_publish(&self, event: &ServerPublishEvent) {
        self.record(format!(
            "server_publish:{}:{}",
            event.channel, event.publication.data
        ));
    }

    fn on_server_join(&self, event: &ServerJoinEvent) {
        self.record(format!("server_join:{}:{}", event.channel, event.info.client));
    }

    fn on_server_leave(&self, event: &ServerLeaveEvent) {
        self.record(format!("server_leave:{}:{}", event.channel, event.info.client));
    }

    fn on_server_subscribe(&self, event: &ServerSubscribeEvent) {
        self.record(format!("server_subscribe:{}", event.channel));
    }

    fn on_server_unsubscribe(&self, event: &ServerUnsubscribeEvent) {
        self.record(format!("server_unsubscribe:{}", event.channel));
    }

    fn on_publish(&self, subscription: &Subscription, event: &PublishEvent) {
        self.record(format!(
            "publish:{}:{}",
            subscription.channel(),
            event.publication.data
        ));
    }

    fn on_join(&self, subscription: &Subscription, event: &JoinEvent) {
        self.record(format!("join:{}:{}", subscription.channel(), event.info.client));
    }

    fn on_leave(&self, subscription: &Subscription, event: &LeaveEvent) {
        self.record(format!("leave:{}:{}", subscription.channel(), event.info.client));
    }

    fn on_subscribe_success(&self, subscription: &Subscription, _event: &SubscribeSuccessEvent) {
        self.record(format!("subscribe_success:{}", subscription.channel()));
    }

    fn on_subscribe_error(&self, subscription: &Subscription, event: &SubscribeErrorEvent) {
        self.record(format!(
            "subscribe_error:{}:{}",
            subscription.channel(),
            event.code
        ));
    }

    fn on_unsubscribe(&self, subscription: &Subscription, _event: &UnsubscribeEvent) {
        self.record(format!("unsubscribe:{}", subscription.channel()));
    }
}

/// Receiving end of a [`RecordingHandler`].
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<String>,
}

impl EventStream {
    /// Waits up to [`EVENT_TIMEOUT`] for the next event.
    pub async fn next(&mut self) -> Option<String> {
        self.next_within(EVENT_TIMEOUT).await
    }

    /// Returns the next event, if one is recorded within `wait`.
    pub async fn next_within(&mut self, wait: Duration) -> Option<String> {
        tokio::time::timeout(wait, self.rx.recv())
            .await
            .ok()
            .flatten()
    }
}
