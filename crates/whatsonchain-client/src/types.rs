//! Request and response types for the WhatsOnChain API.

use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// Root of the REST API, followed by `/<network>`.
pub const API_BASE_URL: &str = "https://api.whatsonchain.com/v1/bsv";

/// Network the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Main network.
    #[default]
    Main,
    /// Test network.
    Test,
    /// Scaling test network.
    Stn,
}

impl Network {
    /// Path segment used in API URLs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Test => "test",
            Self::Stn => "stn",
        }
    }

    /// REST base URL for this network.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("{}/{}", API_BASE_URL, self.as_str())
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "main" => Ok(Self::Main),
            "test" => Ok(Self::Test),
            "stn" => Ok(Self::Stn),
            other => Err(format!("unknown network: {}", other)),
        }
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Chain state, `GET /chain/info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainInfo {
    /// Chain name (`main`, `test`, ...).
    pub chain: String,
    /// Height of the best block.
    pub blocks: u64,
    /// Number of known headers.
    pub headers: u64,
    /// Hash of the best block.
    #[serde(rename = "bestblockhash")]
    pub best_block_hash: String,
    /// Current difficulty.
    pub difficulty: f64,
    /// Median time of the best block.
    #[serde(rename = "mediantime")]
    pub median_time: u64,
    /// Verification progress estimate (0.0 to 1.0).
    #[serde(rename = "verificationprogress")]
    pub verification_progress: f64,
    /// Whether the node prunes blocks.
    #[serde(default)]
    pub pruned: bool,
    /// Total work in the chain, hex encoded.
    #[serde(rename = "chainwork")]
    pub chain_work: String,
}

/// Exchange rate, `GET /exchangerate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Fiat currency code.
    pub currency: String,
    /// Price of one coin.
    pub rate: f64,
    /// Unix timestamp of the quote.
    #[serde(default)]
    pub time: Option<u64>,
}

/// Mempool summary, `GET /mempool/info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolInfo {
    /// Number of transactions.
    pub size: u64,
    /// Sum of transaction sizes in bytes.
    pub bytes: u64,
    /// Memory used by the mempool.
    pub usage: u64,
    /// Maximum mempool memory.
    #[serde(rename = "maxmempool")]
    pub max_mempool: u64,
    /// Minimum fee rate for acceptance.
    #[serde(rename = "mempoolminfee")]
    pub mempool_min_fee: f64,
}

// ============================================================================
// Blocks
// ============================================================================

/// Block details, `GET /block/height/{height}` and `GET /block/hash/{hash}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Block hash.
    pub hash: String,
    /// Number of confirmations.
    #[serde(default)]
    pub confirmations: u64,
    /// Serialized size in bytes.
    pub size: u64,
    /// Block height.
    pub height: u64,
    /// Block version.
    pub version: u64,
    /// Merkle root.
    #[serde(rename = "merkleroot")]
    pub merkle_root: String,
    /// Number of transactions.
    #[serde(rename = "txcount", default)]
    pub tx_count: u64,
    /// Block timestamp.
    pub time: u64,
    /// Median time past.
    #[serde(rename = "mediantime", default)]
    pub median_time: u64,
    /// Nonce.
    pub nonce: u64,
    /// Compact target.
    pub bits: String,
    /// Difficulty.
    pub difficulty: f64,
    /// Total chain work.
    #[serde(rename = "chainwork", default)]
    pub chain_work: String,
    /// Previous block hash (absent for genesis).
    #[serde(rename = "previousblockhash", default)]
    pub previous_block_hash: Option<String>,
    /// Next block hash (absent for the tip).
    #[serde(rename = "nextblockhash", default)]
    pub next_block_hash: Option<String>,
}

// ============================================================================
// Transactions
// ============================================================================

/// Transaction details, `GET /tx/hash/{hash}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInfo {
    /// Transaction id.
    pub txid: String,
    /// Transaction hash.
    #[serde(default)]
    pub hash: String,
    /// Transaction version.
    pub version: u32,
    /// Serialized size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Lock time.
    #[serde(rename = "locktime")]
    pub lock_time: u32,
    /// Inputs.
    #[serde(default)]
    pub vin: Vec<TxInput>,
    /// Outputs.
    #[serde(default)]
    pub vout: Vec<TxOutput>,
    /// Containing block hash, if mined.
    #[serde(rename = "blockhash", default)]
    pub block_hash: Option<String>,
    /// Containing block height, if mined.
    #[serde(rename = "blockheight", default)]
    pub block_height: Option<u64>,
    /// Number of confirmations.
    #[serde(default)]
    pub confirmations: u64,
    /// Transaction time.
    #[serde(default)]
    pub time: Option<u64>,
    /// Containing block time.
    #[serde(rename = "blocktime", default)]
    pub block_time: Option<u64>,
}

/// Transaction input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInput {
    /// Coinbase script, set only for coinbase inputs.
    #[serde(default)]
    pub coinbase: Option<String>,
    /// Spent transaction id.
    #[serde(default)]
    pub txid: Option<String>,
    /// Spent output index.
    #[serde(default)]
    pub vout: Option<u32>,
    /// Unlocking script.
    #[serde(rename = "scriptSig", default)]
    pub script_sig: Option<Script>,
    /// Sequence number.
    pub sequence: u64,
}

/// Transaction output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    /// Value in coins.
    pub value: f64,
    /// Output index.
    pub n: u32,
    /// Locking script.
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
}

/// Unlocking script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    /// Disassembly.
    #[serde(default)]
    pub asm: String,
    /// Hex encoding.
    pub hex: String,
}

/// Locking script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptPubKey {
    /// Disassembly.
    #[serde(default)]
    pub asm: String,
    /// Hex encoding.
    pub hex: String,
    /// Script type (`pubkeyhash`, `nulldata`, ...).
    #[serde(rename = "type", default)]
    pub script_type: Option<String>,
    /// Addresses paid by this output.
    #[serde(default)]
    pub addresses: Vec<String>,
}

/// Raw transaction broadcast body, `POST /tx/raw`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    /// Hex encoded transaction.
    #[serde(rename = "txhex")]
    pub tx_hex: String,
}

// ============================================================================
// Addresses
// ============================================================================

/// Address balance in satoshis, `GET /address/{address}/balance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBalance {
    /// Confirmed balance.
    pub confirmed: i64,
    /// Unconfirmed balance.
    pub unconfirmed: i64,
}

impl AddressBalance {
    /// Confirmed plus unconfirmed balance.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.confirmed + self.unconfirmed
    }
}

/// One entry of `GET /address/{address}/history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Transaction id.
    pub tx_hash: String,
    /// Block height, zero or absent while unconfirmed.
    #[serde(default)]
    pub height: Option<i64>,
}
