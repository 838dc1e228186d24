//! Startup configuration from the environment
//!
//! Kept in its own test binary because it mutates process environment.

use fairydeco_core::bootstrap::load_config;

#[test]
fn test_unparsable_env_value_is_fatal() {
    std::env::remove_var("FAIRYDECO_CONFIG_PATH");

    std::env::set_var("FAIRYDECO_SERVER__HTTP_PORT", "abc");
    let err = load_config().unwrap_err();
    assert!(
        err.to_string().contains("environment"),
        "unexpected error: {err:#}"
    );

    std::env::set_var("FAIRYDECO_SERVER__HTTP_PORT", "9191");
    let config = load_config().unwrap();
    assert_eq!(config.server.http_port, 9191);

    std::env::remove_var("FAIRYDECO_SERVER__HTTP_PORT");
}
