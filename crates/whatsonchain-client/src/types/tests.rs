//! Unit tests for types module.

use super::*;

// ============================================================================
// Network Tests
// ============================================================================

#[test]
fn test_network_display() {
    assert_eq!(Network::Main.to_string(), "main");
    assert_eq!(Network::Test.to_string(), "test");
    assert_eq!(Network::Stn.to_string(), "stn");
}

#[test]
fn test_network_api_url() {
    assert_eq!(
        Network::Main.api_url(),
        "https://api.whatsonchain.com/v1/bsv/main"
    );
    assert_eq!(
        Network::Test.api_url(),
        "https://api.whatsonchain.com/v1/bsv/test"
    );
}

#[test]
fn test_network_from_str() {
    assert_eq!("main".parse::<Network>(), Ok(Network::Main));
    assert_eq!("TEST".parse::<Network>(), Ok(Network::Test));
    assert_eq!("stn".parse::<Network>(), Ok(Network::Stn));
    assert!("regtest".parse::<Network>().is_err());
}

#[test]
fn test_network_serde() {
    assert_eq!(serde_json::to_string(&Network::Stn).unwrap(), "\"stn\"");
    let network: Network = serde_json::from_str("\"test\"").unwrap();
    assert_eq!(network, Network::Test);
}

#[test]
fn test_network_default_is_main() {
    assert_eq!(Network::default(), Network::Main);
}

// ============================================================================
// Response Tests
// ============================================================================

#[test]
fn test_chain_info_deserialization() {
    let json = r#"{
        "chain": "main",
        "blocks": 812345,
        "headers": 812345,
        "bestblockhash": "0000000000000000031a2b",
        "difficulty": 54510433428.83,
        "mediantime": 1697000000,
        "verificationprogress": 0.9999,
        "pruned": false,
        "chainwork": "00000000000000000000000000000000000000000145"
    }"#;

    let info: ChainInfo = serde_json::from_str(json).unwrap();
    assert_eq!(info.chain, "main");
    assert_eq!(info.blocks, 812345);
    assert_eq!(info.best_block_hash, "0000000000000000031a2b");
    assert!(!info.pruned);
}

#[test]
fn test_mempool_info_deserialization() {
    let json = r#"{"size":1200,"bytes":450000,"usage":900000,"maxmempool":64000000000,"mempoolminfee":0.000005}"#;

    let info: MempoolInfo = serde_json::from_str(json).unwrap();
    assert_eq!(info.size, 1200);
    assert_eq!(info.max_mempool, 64_000_000_000);
}

#[test]
fn test_block_info_genesis_has_no_previous() {
    let json = r#"{
        "hash": "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f",
        "confirmations": 800000,
        "size": 285,
        "height": 0,
        "version": 1,
        "merkleroot": "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b",
        "txcount": 1,
        "time": 1231006505,
        "mediantime": 1231006505,
        "nonce": 2083236893,
        "bits": "1d00ffff",
        "difficulty": 1,
        "chainwork": "0000000000000000000000000000000000000000000000000000000100010001",
        "nextblockhash": "00000000839a8e6886ab5951d76f411475428afc90947ee320161bbf18eb6048"
    }"#;

    let block: BlockInfo = serde_json::from_str(json).unwrap();
    assert_eq!(block.height, 0);
    assert_eq!(block.tx_count, 1);
    assert!(block.previous_block_hash.is_none());
    assert!(block.next_block_hash.is_some());
}

#[test]
fn test_tx_info_deserialization() {
    let json = r#"{
        "txid": "abcd",
        "hash": "abcd",
        "version": 1,
        "size": 191,
        "locktime": 0,
        "vin": [{
            "txid": "ef01",
            "vout": 1,
            "scriptSig": {"asm": "", "hex": "4830"},
            "sequence": 4294967295
        }],
        "vout": [{
            "value": 0.0001,
            "n": 0,
            "scriptPubKey": {
                "asm": "OP_DUP OP_HASH160",
                "hex": "76a9",
                "type": "pubkeyhash",
                "addresses": ["1BoatSLRHtKNngkdXEeobR76b53LETtpyT"]
            }
        }],
        "blockhash": "0000",
        "blockheight": 700000,
        "confirmations": 12,
        "time": 1600000000,
        "blocktime": 1600000000
    }"#;

    let tx: TxInfo = serde_json::from_str(json).unwrap();
    assert_eq!(tx.txid, "abcd");
    assert_eq!(tx.vin.len(), 1);
    assert_eq!(tx.vin[0].vout, Some(1));
    assert_eq!(tx.vout[0].script_pub_key.addresses.len(), 1);
    assert_eq!(tx.block_height, Some(700000));
}

#[test]
fn test_unconfirmed_tx_deserialization() {
    let json = r#"{"txid":"abcd","version":1,"locktime":0}"#;

    let tx: TxInfo = serde_json::from_str(json).unwrap();
    assert!(tx.block_hash.is_none());
    assert_eq!(tx.confirmations, 0);
    assert!(tx.vin.is_empty());
}

#[test]
fn test_broadcast_request_serialization() {
    let request = BroadcastRequest {
        tx_hex: "0100".to_string(),
    };

    assert_eq!(
        serde_json::to_string(&request).unwrap(),
        r#"{"txhex":"0100"}"#
    );
}

#[test]
fn test_address_balance_total() {
    let balance: AddressBalance =
        serde_json::from_str(r#"{"confirmed":1500,"unconfirmed":-500}"#).unwrap();

    assert_eq!(balance.total(), 1000);
}

#[test]
fn test_history_record_deserialization() {
    let json = r#"[{"tx_hash":"aa","height":100},{"tx_hash":"bb","height":0}]"#;

    let history: Vec<HistoryRecord> = serde_json::from_str(json).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].height, Some(100));
}
