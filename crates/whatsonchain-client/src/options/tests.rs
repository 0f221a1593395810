//! Unit tests for options module.

use super::*;

#[test]
fn test_default_options_values() {
    let options = ClientOptions::default();

    assert_eq!(options.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(options.back_off_exponent_factor, 2.0);
    assert_eq!(options.back_off_initial_timeout, Duration::from_millis(2));
    assert_eq!(
        options.back_off_maximum_jitter_interval,
        Duration::from_millis(2)
    );
    assert_eq!(options.back_off_max_timeout, Duration::from_millis(10));
    assert_eq!(options.dialer_keep_alive, Duration::from_secs(20));
    assert_eq!(options.dialer_timeout, Duration::from_secs(5));
    assert_eq!(options.request_retry_count, 2);
    assert_eq!(options.request_timeout, Duration::from_secs(10));
    assert_eq!(
        options.transport_expect_continue_timeout,
        Duration::from_secs(3)
    );
    assert_eq!(options.transport_idle_timeout, Duration::from_secs(20));
    assert_eq!(options.transport_max_idle_connections, 10);
    assert_eq!(
        options.transport_tls_handshake_timeout,
        Duration::from_secs(5)
    );
}

#[test]
fn test_default_user_agent_format() {
    assert!(DEFAULT_USER_AGENT.starts_with("whatsonchain-client: v"));
    assert!(DEFAULT_USER_AGENT.ends_with(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_retries_enabled() {
    let mut options = ClientOptions::default();
    assert!(options.retries_enabled());

    options.request_retry_count = 0;
    assert!(!options.retries_enabled());
}

#[test]
fn test_connect_timeout_includes_tls_handshake() {
    let options = ClientOptions::default();
    assert_eq!(options.connect_timeout(), Duration::from_secs(10));
}

#[test]
fn test_options_clone_is_independent() {
    let options = ClientOptions::default();
    let mut cloned = options.clone();
    cloned.request_retry_count = 7;

    assert_eq!(options.request_retry_count, 2);
    assert_ne!(options, cloned);
}

#[test]
fn test_build_transport() {
    let options = ClientOptions::default();
    assert!(options.build_transport().is_ok());
}
