//! # WhatsOnChain Feed
//!
//! Configuration and event handling around
//! [`whatsonchain_client`](whatsonchain_client), plus the
//! `whatsonchain-feed` binary that prints the chain state and streams one of
//! the WhatsOnChain event feeds until Ctrl-C.
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | TOML configuration mapped onto `ClientOptions` |
//! | [`handler`] | `SocketHandler` that logs events and counts publications |
//!
//! ## Example Usage
//!
//! ```bash
//! # Mainnet mempool feed with default options
//! cargo run
//!
//! # Custom configuration and verbose logs
//! WOC_CONFIG=woc.toml RUST_LOG=debug cargo run
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! network = "main"
//!
//! [client]
//! retry_count = 2
//! request_timeout_ms = 10000
//!
//! [feed]
//! channel = "block_headers"
//! ```

pub mod config;
pub mod handler;
