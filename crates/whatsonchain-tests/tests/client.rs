//! REST client tests against a mock HTTP server.

use mockito::Server;
use std::time::Duration;
use whatsonchain_client::{ClientOptions, Error, Network, WhatsOnChainClient};
use whatsonchain_tests::fast_options;

fn mock_client(server: &Server, options: ClientOptions) -> WhatsOnChainClient {
    WhatsOnChainClient::new(Network::Main, Some(options), None).with_base_url(&server.url())
}

#[tokio::test]
async fn test_chain_info() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/chain/info")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"chain":"main","blocks":850000,"headers":850000,
                "bestblockhash":"0000000000000000034b1a0ecbdc5c6ad52a3e6ce4b5e56d75d0c3d1cbd8b8cc",
                "difficulty":73197634206448.34,"mediantime":1718000000,
                "verificationprogress":0.9999,"pruned":false,"chainwork":"00ff"}"#,
        )
        .create_async()
        .await;

    let client = mock_client(&server, fast_options());

    let info = client.get_chain_info().await.expect("Failed to get chain info");
    assert_eq!(info.chain, "main");
    assert_eq!(info.blocks, 850000);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_exchange_rate() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/exchangerate")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"currency":"USD","rate":52.31,"time":1718000000}"#)
        .create_async()
        .await;

    let client = mock_client(&server, fast_options());

    let rate = client
        .get_exchange_rate()
        .await
        .expect("Failed to get exchange rate");
    assert_eq!(rate.currency, "USD");
    assert!((rate.rate - 52.31).abs() < f64::EPSILON);
    assert_eq!(rate.time, Some(1718000000));
}

#[tokio::test]
async fn test_address_history() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/address/1BoatSLRHtKNngkdXEeobR76b53LETtpyT/history")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"tx_hash":"aa","height":100},{"tx_hash":"bb"}]"#)
        .create_async()
        .await;

    let client = mock_client(&server, fast_options());

    let history = client
        .get_address_history("1BoatSLRHtKNngkdXEeobR76b53LETtpyT")
        .await
        .expect("Failed to get history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].tx_hash, "aa");
    assert_eq!(history[0].height, Some(100));
    assert_eq!(history[1].height, None);
}

#[tokio::test]
async fn test_retry_count_bounds_attempts() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/mempool/info")
        .with_status(502)
        .expect(4)
        .create_async()
        .await;

    let options = ClientOptions {
        request_retry_count: 3,
        request_timeout: Duration::from_secs(2),
        ..ClientOptions::default()
    };
    let client = mock_client(&server, options);

    let result = client.get_mempool_info().await;
    assert!(matches!(result, Err(Error::Api { status: 502, .. })));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_not_found_maps_to_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/block/hash/unknown")
        .with_status(404)
        .with_body("block not found")
        .create_async()
        .await;

    let client = mock_client(&server, fast_options());

    match client.get_block_by_hash("unknown").await {
        Err(Error::NotFound(message)) => assert_eq!(message, "block not found"),
        other => panic!("expected not found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_injected_transport_is_exposed() {
    let transport = reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .build()
        .expect("Failed to build transport");

    let client = WhatsOnChainClient::new(Network::Test, None, Some(transport));

    assert_eq!(client.network(), Network::Test);
    assert!(!client.user_agent().is_empty());
    let _ = client.http_client();
}
