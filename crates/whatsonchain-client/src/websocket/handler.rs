//! Callback interface for websocket events.

use super::events::*;

/// Receives websocket lifecycle and data events.
///
/// Callbacks run on the background task that owns the connection, never
/// inside [`WebsocketClient::connect`](super::WebsocketClient::connect).
/// Every method defaults to a no-op, so implementors only override the
/// events they care about.
pub trait SocketHandler: Send + Sync {
    /// Connection accepted by the server.
    fn on_connect(&self, _event: &ConnectEvent) {}

    /// Connection closed. Fired once per successful connect.
    fn on_disconnect(&self, _event: &DisconnectEvent) {}

    /// Asynchronous message outside any channel.
    fn on_message(&self, _event: &MessageEvent) {}

    /// Transport or protocol error.
    fn on_error(&self, _event: &ErrorEvent) {}

    /// Publication on a server-side subscription (e.g. the mempool feed).
    fn on_server_publish(&self, _event: &ServerPublishEvent) {}

    fn on_server_join(&self, _event: &ServerJoinEvent) {}

    fn on_server_leave(&self, _event: &ServerLeaveEvent) {}

    fn on_server_subscribe(&self, _event: &ServerSubscribeEvent) {}

    fn on_server_unsubscribe(&self, _event: &ServerUnsubscribeEvent) {}

    /// Publication on a channel subscribed with
    /// [`WebsocketClient::subscribe`](super::WebsocketClient::subscribe).
    fn on_publish(&self, _subscription: &Subscription, _event: &PublishEvent) {}

    fn on_join(&self, _subscription: &Subscription, _event: &JoinEvent) {}

    fn on_leave(&self, _subscription: &Subscription, _event: &LeaveEvent) {}

    fn on_subscribe_success(&self, _subscription: &Subscription, _event: &SubscribeSuccessEvent) {}

    fn on_subscribe_error(&self, _subscription: &Subscription, _event: &SubscribeErrorEvent) {}

    fn on_unsubscribe(&self, _subscription: &Subscription, _event: &UnsubscribeEvent) {}
}
