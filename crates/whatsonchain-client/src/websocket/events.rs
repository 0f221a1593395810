//! Events delivered to a [`SocketHandler`](super::SocketHandler).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Information about a client taking part in a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// User id, empty for anonymous connections.
    #[serde(default)]
    pub user: String,
    /// Client connection id.
    #[serde(default)]
    pub client: String,
    /// Connection-scoped info attached by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conn_info: Option<Value>,
    /// Channel-scoped info attached by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chan_info: Option<Value>,
}

/// A message published into a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    /// Payload as sent by the server.
    #[serde(default)]
    pub data: Value,
    /// Position in the channel stream, when the channel keeps history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Publisher, when the server exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ClientInfo>,
    /// Publication tags.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

impl Publication {
    /// Decodes the payload into a typed value.
    ///
    /// # Errors
    /// Returns error if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}

/// A client-side subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    channel: String,
}

impl Subscription {
    pub(crate) fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }

    /// Channel name.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

/// Connection established and accepted by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectEvent {
    /// Id the server assigned to this connection.
    pub client_id: String,
    /// Server version.
    pub version: String,
    /// Optional data sent with the connect reply.
    pub data: Option<Value>,
}

/// Connection closed.
#[derive(Debug, Clone, PartialEq)]
pub struct DisconnectEvent {
    /// Disconnect code.
    pub code: u32,
    /// Human readable reason.
    pub reason: String,
    /// Whether the server allows reconnecting.
    pub reconnect: bool,
}

impl DisconnectEvent {
    /// `disconnect` was called by the owner of the client.
    pub const CODE_DISCONNECT_CALLED: u32 = 0;
    /// The transport was closed without a disconnect push.
    pub const CODE_TRANSPORT_CLOSED: u32 = 1;
    /// The transport failed.
    pub const CODE_TRANSPORT_ERROR: u32 = 2;

    pub(crate) fn called() -> Self {
        Self {
            code: Self::CODE_DISCONNECT_CALLED,
            reason: "disconnect called".to_string(),
            reconnect: false,
        }
    }

    pub(crate) fn transport_closed(reason: impl Into<String>) -> Self {
        Self {
            code: Self::CODE_TRANSPORT_CLOSED,
            reason: reason.into(),
            reconnect: true,
        }
    }

    pub(crate) fn transport_error(reason: impl Into<String>) -> Self {
        Self {
            code: Self::CODE_TRANSPORT_ERROR,
            reason: reason.into(),
            reconnect: true,
        }
    }
}

/// Asynchronous message sent to this client, outside any channel.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    /// Message payload.
    pub data: Value,
}

/// Transport or protocol error that did not end the call that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    /// Error description.
    pub message: String,
}

/// Publication in a server-side subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerPublishEvent {
    /// Channel name.
    pub channel: String,
    /// The publication.
    pub publication: Publication,
}

/// Client joined a server-side subscription channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerJoinEvent {
    /// Channel name.
    pub channel: String,
    /// Joining client.
    pub info: ClientInfo,
}

/// Client left a server-side subscription channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerLeaveEvent {
    /// Channel name.
    pub channel: String,
    /// Leaving client.
    pub info: ClientInfo,
}

/// Server subscribed this connection to a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSubscribeEvent {
    /// Channel name.
    pub channel: String,
    /// Whether missed publications were recovered.
    pub recovered: bool,
    /// Optional subscription data.
    pub data: Option<Value>,
}

/// Server unsubscribed this connection from a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerUnsubscribeEvent {
    /// Channel name.
    pub channel: String,
}

/// Publication in a client-side subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishEvent {
    /// The publication.
    pub publication: Publication,
}

/// Client joined a client-side subscription channel.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinEvent {
    /// Joining client.
    pub info: ClientInfo,
}

/// Client left a client-side subscription channel.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveEvent {
    /// Leaving client.
    pub info: ClientInfo,
}

/// Subscribe command accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeSuccessEvent {
    /// Whether missed publications were recovered.
    pub recovered: bool,
    /// Optional subscription data.
    pub data: Option<Value>,
}

/// Subscribe command rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeErrorEvent {
    /// Server error code.
    pub code: u32,
    /// Server error message.
    pub message: String,
}

/// Client-side subscription ended.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsubscribeEvent {
    /// Unsubscribe code, zero when requested by this client.
    pub code: u32,
    /// Human readable reason.
    pub reason: String,
}
