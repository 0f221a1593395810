//! Background task that owns an established connection.

use super::events::*;
use super::handler::SocketHandler;
use super::protocol::{
    CONNECT_COMMAND_ID, Command, ConnectResult, PONG, Reply, frame_lines, parse_frame,
};
use crate::error::Error;
use futures_util::{SinkExt, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Requests from the owning [`WebsocketClient`](super::WebsocketClient).
#[derive(Debug)]
pub(crate) enum SessionCommand {
    Subscribe(String),
    Unsubscribe(String),
    Close,
}

#[derive(Debug)]
enum Pending {
    Subscribe(String),
    Unsubscribe(String),
}

/// How long a subscribe or unsubscribe command waits for its reply.
pub(crate) const REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Accepted connection, plus the lines that shared a frame with the
/// connect reply.
#[derive(Debug)]
pub(crate) struct Handshake {
    pub connected: ConnectResult,
    pub backlog: Vec<String>,
}

/// Sends the connect command and waits for the server's reply.
pub(crate) async fn handshake(
    stream: &mut WsStream,
    name: &str,
    version: &str,
) -> Result<Handshake, Error> {
    let command = Command::connect(CONNECT_COMMAND_ID, name, version).to_json()?;
    stream
        .send(Message::Text(command.into()))
        .await
        .map_err(Box::new)?;

    let mut backlog = Vec::new();
    while let Some(frame) = stream.next().await {
        let text = match frame.map_err(Box::new)? {
            Message::Text(text) => text,
            Message::Close(_) => return Err(Error::ConnectionClosed),
            _ => continue,
        };

        let mut connected = None;
        for line in frame_lines(text.as_str()) {
            let reply = match connected {
                None => serde_json::from_str::<Reply>(line).ok(),
                Some(_) => None,
            };
            match reply {
                Some(reply) if reply.id == CONNECT_COMMAND_ID => {
                    connected = Some(connect_result(reply)?);
                }
                _ => backlog.push(line.to_string()),
            }
        }
        if let Some(connected) = connected {
            return Ok(Handshake { connected, backlog });
        }
    }

    Err(Error::ConnectionClosed)
}

fn connect_result(reply: Reply) -> Result<ConnectResult, Error> {
    if let Some(error) = reply.error {
        return Err(Error::Protocol {
            code: error.code,
            message: error.message,
        });
    }
    reply.connect.ok_or_else(|| Error::Protocol {
        code: 0,
        message: "connect reply without result".to_string(),
    })
}

#[derive(Debug)]
struct PendingCommand {
    kind: Pending,
    sent_at: Instant,
}

/// Removes the commands that waited longer than [`REPLY_TIMEOUT`], oldest
/// first.
fn take_expired(pending: &mut HashMap<u32, PendingCommand>, now: Instant) -> Vec<Pending> {
    let mut expired: Vec<u32> = pending
        .iter()
        .filter(|(_, command)| now.saturating_duration_since(command.sent_at) >= REPLY_TIMEOUT)
        .map(|(id, _)| *id)
        .collect();
    expired.sort_unstable();

    expired
        .into_iter()
        .filter_map(|id| pending.remove(&id))
        .map(|command| command.kind)
        .collect()
}

pub(crate) struct Session {
    stream: WsStream,
    handler: Arc<dyn SocketHandler>,
    commands: mpsc::Receiver<SessionCommand>,
    next_id: u32,
    answer_pings: bool,
    // entries older than REPLY_TIMEOUT are dropped on the next command
    pending: HashMap<u32, PendingCommand>,
    client_subs: HashSet<String>,
}

impl Session {
    pub(crate) fn new(
        stream: WsStream,
        handler: Arc<dyn SocketHandler>,
        commands: mpsc::Receiver<SessionCommand>,
    ) -> Self {
        Self {
            stream,
            handler,
            commands,
            next_id: CONNECT_COMMAND_ID + 1,
            answer_pings: true,
            pending: HashMap::new(),
            client_subs: HashSet::new(),
        }
    }

    /// Delivers the connect events, then pumps frames and commands until the
    /// connection ends. `on_disconnect` fires exactly once, on exit.
    pub(crate) async fn run(mut self, handshake: Handshake) {
        let Handshake { connected, backlog } = handshake;
        self.answer_pings = connected.pong;
        debug!(
            client = %connected.client,
            ping_interval = ?connected.ping,
            "websocket session started"
        );

        self.handler.on_connect(&ConnectEvent {
            client_id: connected.client,
            version: connected.version,
            data: connected.data,
        });
        for (channel, sub) in connected.subs {
            self.handler.on_server_subscribe(&ServerSubscribeEvent {
                channel,
                recovered: sub.recovered,
                data: sub.data,
            });
        }

        let event = match self.replay(backlog).await {
            Some(event) => event,
            None => self.event_loop().await,
        };
        debug!(code = event.code, reason = %event.reason, "websocket session ended");
        self.handler.on_disconnect(&event);
    }

    /// Dispatches the lines that arrived together with the connect reply.
    async fn replay(&mut self, backlog: Vec<String>) -> Option<DisconnectEvent> {
        for line in backlog {
            if let Some(event) = self.handle_text(&line).await {
                return Some(event);
            }
        }
        None
    }

    async fn event_loop(&mut self) -> DisconnectEvent {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Subscribe(channel)) => {
                        if let Err(err) = self.subscribe(channel).await {
                            return self.transport_error(err);
                        }
                    }
                    Some(SessionCommand::Unsubscribe(channel)) => {
                        if let Err(err) = self.unsubscribe(channel).await {
                            return self.transport_error(err);
                        }
                    }
                    Some(SessionCommand::Close) | None => {
                        if let Err(err) = self.stream.close(None).await {
                            debug!("websocket close handshake failed: {}", err);
                        }
                        return DisconnectEvent::called();
                    }
                },
                frame = self.stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = self.handle_text(text.as_str()).await {
                            return event;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| f.reason.as_str().to_string())
                            .filter(|reason| !reason.is_empty())
                            .unwrap_or_else(|| "connection closed by server".to_string());
                        return DisconnectEvent::transport_closed(reason);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        return self.transport_error(Error::WebSocket(Box::new(err)));
                    }
                    None => return DisconnectEvent::transport_closed("connection closed"),
                },
            }
        }
    }

    async fn handle_text(&mut self, text: &str) -> Option<DisconnectEvent> {
        for reply in parse_frame(text) {
            match reply {
                Ok(reply) if reply.is_ping() => {
                    if !self.answer_pings {
                        continue;
                    }
                    if let Err(err) = self.send_raw(PONG.to_string()).await {
                        return Some(self.transport_error(err));
                    }
                }
                Ok(reply) => {
                    if let Some(event) = self.dispatch(reply) {
                        return Some(event);
                    }
                }
                Err(err) => {
                    warn!("undecodable websocket frame: {}", err);
                    self.handler.on_error(&ErrorEvent {
                        message: format!("undecodable frame: {}", err),
                    });
                }
            }
        }
        None
    }

    fn dispatch(&mut self, reply: Reply) -> Option<DisconnectEvent> {
        if reply.id > 0 {
            self.resolve(reply);
            return None;
        }

        let push = reply.push?;
        let channel = push.channel;
        let client_side = self.client_subs.contains(&channel);

        if let Some(publication) = push.publication {
            if client_side {
                self.handler
                    .on_publish(&Subscription::new(channel), &PublishEvent { publication });
            } else {
                self.handler.on_server_publish(&ServerPublishEvent {
                    channel,
                    publication,
                });
            }
        } else if let Some(join) = push.join {
            if client_side {
                self.handler
                    .on_join(&Subscription::new(channel), &JoinEvent { info: join.info });
            } else {
                self.handler.on_server_join(&ServerJoinEvent {
                    channel,
                    info: join.info,
                });
            }
        } else if let Some(leave) = push.leave {
            if client_side {
                self.handler
                    .on_leave(&Subscription::new(channel), &LeaveEvent { info: leave.info });
            } else {
                self.handler.on_server_leave(&ServerLeaveEvent {
                    channel,
                    info: leave.info,
                });
            }
        } else if let Some(sub) = push.sub {
            self.handler.on_server_subscribe(&ServerSubscribeEvent {
                channel,
                recovered: sub.recovered,
                data: sub.data,
            });
        } else if let Some(unsub) = push.unsub {
            if self.client_subs.remove(&channel) {
                self.handler.on_unsubscribe(
                    &Subscription::new(channel),
                    &UnsubscribeEvent {
                        code: unsub.code,
                        reason: unsub.reason,
                    },
                );
            } else {
                self.handler
                    .on_server_unsubscribe(&ServerUnsubscribeEvent { channel });
            }
        } else if let Some(message) = push.message {
            self.handler.on_message(&MessageEvent { data: message.data });
        } else if let Some(disconnect) = push.disconnect {
            return Some(DisconnectEvent {
                code: disconnect.code,
                reason: disconnect.reason,
                reconnect: disconnect.reconnect,
            });
        }

        None
    }

    fn resolve(&mut self, reply: Reply) {
        match self.pending.remove(&reply.id).map(|command| command.kind) {
            Some(Pending::Subscribe(channel)) => {
                let subscription = Subscription::new(channel.clone());
                if let Some(error) = reply.error {
                    self.handler.on_subscribe_error(
                        &subscription,
                        &SubscribeErrorEvent {
                            code: error.code,
                            message: error.message,
                        },
                    );
                } else {
                    self.client_subs.insert(channel);
                    let result = reply.subscribe.unwrap_or_default();
                    self.handler.on_subscribe_success(
                        &subscription,
                        &SubscribeSuccessEvent {
                            recovered: result.recovered,
                            data: result.data,
                        },
                    );
                }
            }
            Some(Pending::Unsubscribe(channel)) => {
                if let Some(error) = reply.error {
                    self.handler.on_error(&ErrorEvent {
                        message: format!(
                            "unsubscribe from {} failed ({}): {}",
                            channel, error.code, error.message
                        ),
                    });
                }
            }
            None => debug!(id = reply.id, "reply to unknown command"),
        }
    }

    async fn subscribe(&mut self, channel: String) -> Result<(), Error> {
        self.expire_pending();
        let id = self.next_command_id();
        let command = Command::subscribe(id, &channel).to_json()?;
        self.track(id, Pending::Subscribe(channel));
        self.send_raw(command).await
    }

    async fn unsubscribe(&mut self, channel: String) -> Result<(), Error> {
        self.expire_pending();
        let id = self.next_command_id();
        let command = Command::unsubscribe(id, &channel).to_json()?;
        self.send_raw(command).await?;

        if self.client_subs.remove(&channel) {
            self.handler.on_unsubscribe(
                &Subscription::new(channel.clone()),
                &UnsubscribeEvent {
                    code: 0,
                    reason: "unsubscribe called".to_string(),
                },
            );
        }
        self.track(id, Pending::Unsubscribe(channel));
        Ok(())
    }

    fn track(&mut self, id: u32, kind: Pending) {
        self.pending.insert(
            id,
            PendingCommand {
                kind,
                sent_at: Instant::now(),
            },
        );
    }

    fn expire_pending(&mut self) {
        for kind in take_expired(&mut self.pending, Instant::now()) {
            match kind {
                Pending::Subscribe(channel) => {
                    warn!(channel = %channel, "no reply to subscribe");
                    self.handler.on_subscribe_error(
                        &Subscription::new(channel),
                        &SubscribeErrorEvent {
                            code: 0,
                            message: "subscribe reply timed out".to_string(),
                        },
                    );
                }
                Pending::Unsubscribe(channel) => {
                    debug!(channel = %channel, "no reply to unsubscribe");
                }
            }
        }
    }

    async fn send_raw(&mut self, text: String) -> Result<(), Error> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|err| Error::WebSocket(Box::new(err)))
    }

    fn next_command_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(CONNECT_COMMAND_ID + 1);
        id
    }

    fn transport_error(&self, err: Error) -> DisconnectEvent {
        self.handler.on_error(&ErrorEvent {
            message: err.to_string(),
        });
        DisconnectEvent::transport_error(err.to_string())
    }
}
