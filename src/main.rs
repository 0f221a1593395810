//! WhatsOnChain Feed
//!
//! Prints the chain state and streams a WhatsOnChain event feed until Ctrl-C.

use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whatsonchain_client::{SocketHandler, WhatsOnChainClient, new_websocket_client};
use whatsonchain_feed::config::Config;
use whatsonchain_feed::handler::LoggingHandler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::var("WOC_CONFIG") {
        Ok(path) => {
            info!("Loading configuration from {}", path);
            Config::load(&path)?
        }
        Err(_) => Config::default(),
    };

    let client = WhatsOnChainClient::new(config.network, Some(config.client.to_options()), None);
    info!(
        "Using {} network at {} ({})",
        client.network(),
        client.base_url(),
        client.user_agent()
    );

    match client.get_chain_info().await {
        Ok(info) => info!(
            "Chain {} at height {}, best block {}",
            info.chain, info.blocks, info.best_block_hash
        ),
        Err(err) => warn!("Failed to fetch chain info: {}", err),
    }

    let handler = Arc::new(LoggingHandler::new());
    let socket_handler: Arc<dyn SocketHandler> = handler.clone();
    let mut feed = new_websocket_client(config.feed.channel.url(), Some(socket_handler))
        .ok_or_else(|| anyhow::anyhow!("feed URL is empty"))?;

    feed.connect().await?;
    info!("Streaming {} feed, press Ctrl-C to stop", feed.channel());

    tokio::signal::ctrl_c().await?;

    feed.disconnect().await?;
    info!("Stopped after {} publications", handler.publications());

    Ok(())
}
