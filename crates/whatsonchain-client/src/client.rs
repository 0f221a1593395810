//! HTTP client for the WhatsOnChain API.

use crate::error::Error;
use crate::options::ClientOptions;
use crate::retry::build_http_client;
use crate::types::*;
use crate::websocket::{SocketHandler, WebsocketClient, new_websocket_client};
use reqwest::header::USER_AGENT;
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use std::sync::Arc;
use tracing::{debug, warn};


/// Mempool event feed.
pub const SOCKET_ENDPOINT_MEMPOOL: &str = "wss://socket.whatsonchain.com/mempool";

/// Block header event feed.
pub const SOCKET_ENDPOINT_BLOCK_HEADERS: &str = "wss://socket.whatsonchain.com/blockheaders";

/// HTTP client for the WhatsOnChain API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct WhatsOnChainClient {
    transport: reqwest::Client,
    http: ClientWithMiddleware,
    options: ClientOptions,
    network: Network,
    base_url: String,
}

impl WhatsOnChainClient {
    /// Creates a new client.
    ///
    /// # Arguments
    /// * `network` - Network whose API is queried.
    /// * `options` - Client options, `None` for [`ClientOptions::default`].
    /// * `http_client` - Transport to use as-is, `None` to build one from `options`.
    #[must_use]
    pub fn new(
        network: Network,
        options: Option<ClientOptions>,
        http_client: Option<reqwest::Client>,
    ) -> Self {
        let options = options.unwrap_or_default();

        let transport = http_client.unwrap_or_else(|| {
            options.build_transport().unwrap_or_else(|err| {
                warn!("failed to build tuned HTTP transport, using defaults: {}", err);
                reqwest::Client::new()
            })
        });
        let http = build_http_client(&options, transport.clone());

        Self {
            transport,
            http,
            options,
            network,
            base_url: network.api_url(),
        }
    }

    /// Points the client at another REST base URL (e.g. a proxy).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the user agent sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.options.user_agent
    }

    /// Returns the underlying HTTP transport.
    #[must_use]
    pub fn http_client(&self) -> &reqwest::Client {
        &self.transport
    }

    /// Returns the network this client queries.
    #[must_use]
    pub fn network(&self) -> Network {
        self.network
    }

    /// Returns the options this client was built with.
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns the REST base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Health & Chain
    // ========================================================================

    /// Checks that the API is up.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_health(&self) -> Result<String, Error> {
        let resp = self.get("/woc").send().await?;
        self.handle_text_response(resp).await
    }

    /// Gets the chain state.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_chain_info(&self) -> Result<ChainInfo, Error> {
        let resp = self.get("/chain/info").send().await?;
        self.handle_response(resp).await
    }

    /// Gets the current exchange rate.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_exchange_rate(&self) -> Result<ExchangeRate, Error> {
        let resp = self.get("/exchangerate").send().await?;
        self.handle_response(resp).await
    }

    /// Gets the mempool summary.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_mempool_info(&self) -> Result<MempoolInfo, Error> {
        let resp = self.get("/mempool/info").send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    /// Gets a block by height.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn get_block_by_height(&self, height: u64) -> Result<BlockInfo, Error> {
        let resp = self
            .get(&format!("/block/height/{}", height))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Gets a block by hash.
    ///
    /// # Errors
    /// Returns error if the hash is empty or the request fails.
    pub async fn get_block_by_hash(&self, hash: &str) -> Result<BlockInfo, Error> {
        require_non_empty("block hash", hash)?;
        let resp = self.get(&format!("/block/hash/{}", hash)).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Gets a transaction by id.
    ///
    /// # Errors
    /// Returns error if the id is empty or the request fails.
    pub async fn get_transaction(&self, txid: &str) -> Result<TxInfo, Error> {
        require_non_empty("transaction id", txid)?;
        let resp = self.get(&format!("/tx/hash/{}", txid)).send().await?;
        self.handle_response(resp).await
    }

    /// Broadcasts a raw transaction and returns its id.
    ///
    /// # Errors
    /// Returns error if the hex is empty or the request fails.
    pub async fn broadcast_transaction(&self, tx_hex: &str) -> Result<String, Error> {
        require_non_empty("transaction hex", tx_hex)?;
        let body = BroadcastRequest {
            tx_hex: tx_hex.to_string(),
        };
        let resp = self.post("/tx/raw").json(&body).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Addresses
    // ========================================================================

    /// Gets the balance of an address.
    ///
    /// # Errors
    /// Returns error if the address is empty or the request fails.
    pub async fn get_address_balance(&self, address: &str) -> Result<AddressBalance, Error> {
        require_non_empty("address", address)?;
        let resp = self
            .get(&format!("/address/{}/balance", address))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Gets the confirmed transaction history of an address.
    ///
    /// # Errors
    /// Returns error if the address is empty or the request fails.
    pub async fn get_address_history(&self, address: &str) -> Result<Vec<HistoryRecord>, Error> {
        require_non_empty("address", address)?;
        let resp = self
            .get(&format!("/address/{}/history", address))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // WebSocket
    // ========================================================================

    /// Creates a websocket client for the mempool feed.
    ///
    /// Returns `None` when `handler` is `None`.
    #[must_use]
    pub fn new_mempool_websocket(
        &self,
        handler: Option<Arc<dyn SocketHandler>>,
    ) -> Option<WebsocketClient> {
        new_websocket_client(SOCKET_ENDPOINT_MEMPOOL, handler)
    }

    /// Creates a websocket client for the block header feed.
    ///
    /// Returns `None` when `handler` is `None`.
    #[must_use]
    pub fn new_block_headers_websocket(
        &self,
        handler: Option<Arc<dyn SocketHandler>>,
    ) -> Option<WebsocketClient> {
        new_websocket_client(SOCKET_ENDPOINT_BLOCK_HEADERS, handler)
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    fn get(&self, path: &str) -> RequestBuilder {
        self.request(self.http.get(format!("{}{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.request(self.http.post(format!("{}{}", self.base_url, path)))
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(USER_AGENT, self.options.user_agent.as_str())
            .timeout(self.options.request_timeout)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        debug!(url = %resp.url(), status = status.as_u16(), "response received");

        if status.is_success() {
            Ok(resp.json().await?)
        } else if status.as_u16() == 404 {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::NotFound(text))
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }

    async fn handle_text_response(&self, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();

        if status.is_success() {
            Ok(resp.text().await?)
        } else if status.as_u16() == 404 {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::NotFound(text))
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}

fn require_non_empty(what: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::InvalidRequest(format!("{} cannot be empty", what)));
    }
    Ok(())
}
