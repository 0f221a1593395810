//! HTTP and WebSocket client library for the WhatsOnChain API.
//!
//! This crate provides a typed HTTP client for the WhatsOnChain REST API,
//! with retries and exponential backoff, and a WebSocket client for the
//! mempool and block header event feeds.
//!
//! # Example
//!
//! ```no_run
//! use whatsonchain_client::{ClientOptions, Network, WhatsOnChainClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), whatsonchain_client::Error> {
//!     let client = WhatsOnChainClient::new(Network::Main, Some(ClientOptions::default()), None);
//!
//!     // Check chain state
//!     let info = client.get_chain_info().await?;
//!     println!("Height: {}", info.blocks);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod options;
mod retry;
mod types;
mod websocket;

pub use client::{SOCKET_ENDPOINT_BLOCK_HEADERS, SOCKET_ENDPOINT_MEMPOOL, WhatsOnChainClient};
pub use error::Error;
pub use options::{ClientOptions, DEFAULT_USER_AGENT};
pub use retry::{BackoffPolicy, build_http_client};
pub use types::*;
pub use websocket::{
    ClientInfo, ConnectEvent, ConnectionState, DisconnectEvent, ErrorEvent, JoinEvent,
    LeaveEvent, MessageEvent, Publication, PublishEvent, ServerJoinEvent, ServerLeaveEvent,
    ServerPublishEvent, ServerSubscribeEvent, ServerUnsubscribeEvent, SocketHandler,
    SubscribeErrorEvent, SubscribeSuccessEvent, Subscription, UnsubscribeEvent, WebsocketClient,
    WebsocketConfig, new_websocket_client,
};
