//! Centrifuge JSON protocol frames.
//!
//! Commands carry an `id`; replies echo it. Pushes have no id. An empty
//! object is a server ping and is answered with an empty object.

use super::events::{ClientInfo, Publication};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Id of the connect command, the first one on every connection.
pub(crate) const CONNECT_COMMAND_ID: u32 = 1;

/// Pong frame.
pub(crate) const PONG: &str = "{}";

/// Command sent to the server.
#[derive(Debug, Default, Serialize)]
pub(crate) struct Command {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect: Option<ConnectRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<ChannelRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsubscribe: Option<ChannelRequest>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ConnectRequest {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChannelRequest {
    pub channel: String,
}

impl Command {
    pub fn connect(id: u32, name: &str, version: &str) -> Self {
        Self {
            id,
            connect: Some(ConnectRequest {
                name: name.to_string(),
                version: version.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn subscribe(id: u32, channel: &str) -> Self {
        Self {
            id,
            subscribe: Some(ChannelRequest {
                channel: channel.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn unsubscribe(id: u32, channel: &str) -> Self {
        Self {
            id,
            unsubscribe: Some(ChannelRequest {
                channel: channel.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Reply or push received from the server.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Reply {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub error: Option<ErrorReply>,
    #[serde(default)]
    pub push: Option<Push>,
    #[serde(default)]
    pub connect: Option<ConnectResult>,
    #[serde(default)]
    pub subscribe: Option<SubscribeResult>,
    #[serde(default)]
    pub unsubscribe: Option<Value>,
}

impl Reply {
    /// An empty reply is a ping.
    pub fn is_ping(&self) -> bool {
        self.id == 0
            && self.error.is_none()
            && self.push.is_none()
            && self.connect.is_none()
            && self.subscribe.is_none()
            && self.unsubscribe.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorReply {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConnectResult {
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub subs: HashMap<String, SubscribeResult>,
    #[serde(default)]
    pub ping: Option<u32>,
    #[serde(default)]
    pub pong: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubscribeResult {
    #[serde(default)]
    pub recovered: bool,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Push {
    #[serde(default)]
    pub channel: String,
    #[serde(rename = "pub", default)]
    pub publication: Option<Publication>,
    #[serde(default)]
    pub join: Option<Presence>,
    #[serde(default)]
    pub leave: Option<Presence>,
    #[serde(default)]
    pub sub: Option<SubscribeResult>,
    #[serde(default)]
    pub unsub: Option<UnsubscribePush>,
    #[serde(default)]
    pub message: Option<MessagePush>,
    #[serde(default)]
    pub disconnect: Option<DisconnectPush>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Presence {
    #[serde(default)]
    pub info: ClientInfo,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UnsubscribePush {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MessagePush {
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DisconnectPush {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub reconnect: bool,
}

/// Non-empty lines of a text frame, one reply each.
pub(crate) fn frame_lines(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Splits a text frame into its newline-separated replies.
pub(crate) fn parse_frame(
    text: &str,
) -> impl Iterator<Item = Result<Reply, serde_json::Error>> + '_ {
    frame_lines(text).map(serde_json::from_str::<Reply>)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_command_json() {
        let json = Command::connect(CONNECT_COMMAND_ID, "whatsonchain-client", "0.1.0")
            .to_json()
            .unwrap();

        assert_eq!(
            json,
            r#"{"id":1,"connect":{"name":"whatsonchain-client","version":"0.1.0"}}"#
        );
    }

    #[test]
    fn test_subscribe_and_unsubscribe_command_json() {
        assert_eq!(
            Command::subscribe(2, "blocks").to_json().unwrap(),
            r#"{"id":2,"subscribe":{"channel":"blocks"}}"#
        );
        assert_eq!(
            Command::unsubscribe(3, "blocks").to_json().unwrap(),
            r#"{"id":3,"unsubscribe":{"channel":"blocks"}}"#
        );
    }

    #[test]
    fn test_parse_connect_reply() {
        let text = r#"{"id":1,"connect":{"client":"abc","version":"5.0.0","subs":{"mempool":{}},"ping":25,"pong":true}}"#;

        let reply = parse_frame(text).next().unwrap().unwrap();
        assert_eq!(reply.id, 1);
        let connect = reply.connect.unwrap();
        assert_eq!(connect.client, "abc");
        assert!(connect.subs.contains_key("mempool"));
        assert!(connect.pong);
    }

    #[test]
    fn test_parse_error_reply() {
        let reply = parse_frame(r#"{"id":1,"error":{"code":101,"message":"unauthorized"}}"#)
            .next()
            .unwrap()
            .unwrap();

        let error = reply.error.unwrap();
        assert_eq!(error.code, 101);
        assert_eq!(error.message, "unauthorized");
    }

    #[test]
    fn test_parse_ping() {
        let reply = parse_frame("{}").next().unwrap().unwrap();
        assert!(reply.is_ping());
    }

    #[test]
    fn test_parse_publication_push() {
        let text = r#"{"push":{"channel":"mempool","pub":{"data":{"hash":"ff00"},"offset":7}}}"#;

        let reply = parse_frame(text).next().unwrap().unwrap();
        assert!(!reply.is_ping());
        let push = reply.push.unwrap();
        assert_eq!(push.channel, "mempool");
        let publication = push.publication.unwrap();
        assert_eq!(publication.offset, Some(7));
        assert_eq!(publication.data["hash"], "ff00");
    }

    #[test]
    fn test_parse_batched_frame() {
        let text = "{}\n{\"push\":{\"message\":{\"data\":\"hello\"}}}\n\n";

        let replies: Vec<_> = parse_frame(text).collect();
        assert_eq!(replies.len(), 2);
        assert!(replies[0].as_ref().unwrap().is_ping());
        let push = replies[1].as_ref().unwrap().push.as_ref().unwrap();
        assert_eq!(push.message.as_ref().unwrap().data, "hello");
    }

    #[test]
    fn test_parse_disconnect_push() {
        let text = r#"{"push":{"disconnect":{"code":3001,"reason":"shutdown","reconnect":true}}}"#;

        let push = parse_frame(text).next().unwrap().unwrap().push.unwrap();
        let disconnect = push.disconnect.unwrap();
        assert_eq!(disconnect.code, 3001);
        assert!(disconnect.reconnect);
    }

    #[test]
    fn test_parse_malformed_frame() {
        let mut replies = parse_frame("not json");
        assert!(replies.next().unwrap().is_err());
    }
}
