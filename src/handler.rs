//! Event handler that logs feed activity.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};
use whatsonchain_client::{
    ConnectEvent, DisconnectEvent, ErrorEvent, MessageEvent, PublishEvent, ServerPublishEvent,
    ServerSubscribeEvent, ServerUnsubscribeEvent, SocketHandler, SubscribeErrorEvent,
    SubscribeSuccessEvent, Subscription, UnsubscribeEvent,
};

/// Logs every event and counts publications.
#[derive(Debug, Default)]
pub struct LoggingHandler {
    publications: AtomicU64,
    connected: AtomicU64,
    disconnected: AtomicU64,
}

impl LoggingHandler {
    /// Creates a new handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publications seen so far, across all channels.
    #[must_use]
    pub fn publications(&self) -> u64 {
        self.publications.load(Ordering::Relaxed)
    }

    /// Number of accepted connections.
    #[must_use]
    pub fn connects(&self) -> u64 {
        self.connected.load(Ordering::Relaxed)
    }

    /// Number of ended sessions.
    #[must_use]
    pub fn disconnects(&self) -> u64 {
        self.disconnected.load(Ordering::Relaxed)
    }
}

impl SocketHandler for LoggingHandler {
    fn on_connect(&self, event: &ConnectEvent) {
        self.connected.fetch_add(1, Ordering::Relaxed);
        info!(client_id = %event.client_id, version = %event.version, "feed connected");
    }

    fn on_disconnect(&self, event: &DisconnectEvent) {
        self.disconnected.fetch_add(1, Ordering::Relaxed);
        info!(
            code = event.code,
            reason = %event.reason,
            reconnect = event.reconnect,
            "feed disconnected"
        );
    }

    fn on_message(&self, event: &MessageEvent) {
        debug!(data = %event.data, "message");
    }

    fn on_error(&self, event: &ErrorEvent) {
        warn!("feed error: {}", event.message);
    }

    fn on_server_publish(&self, event: &ServerPublishEvent) {
        let count = self.publications.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            channel = %event.channel,
            offset = ?event.publication.offset,
            count,
            "publication: {}",
            event.publication.data
        );
    }

    fn on_server_subscribe(&self, event: &ServerSubscribeEvent) {
        info!(channel = %event.channel, recovered = event.recovered, "subscribed by server");
    }

    fn on_server_unsubscribe(&self, event: &ServerUnsubscribeEvent) {
        info!(channel = %event.channel, "unsubscribed by server");
    }

    fn on_publish(&self, subscription: &Subscription, event: &PublishEvent) {
        let count = self.publications.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            channel = %subscription.channel(),
            offset = ?event.publication.offset,
            count,
            "publication: {}",
            event.publication.data
        );
    }

    fn on_subscribe_success(&self, subscription: &Subscription, _event: &SubscribeSuccessEvent) {
        info!(channel = %subscription.channel(), "subscribed");
    }

    fn on_subscribe_error(&self, subscription: &Subscription, event: &SubscribeErrorEvent) {
        warn!(
            channel = %subscription.channel(),
            code = event.code,
            "subscribe failed: {}",
            event.message
        );
    }

    fn on_unsubscribe(&self, subscription: &Subscription, event: &UnsubscribeEvent) {
        info!(channel = %subscription.channel(), reason = %event.reason, "unsubscribed");
    }
}
