//! Tests for configuration validation

use std::time::Duration;

use prometheus_task_queue::config::{GateConfig, QueueConfig, RateLimit};

#[test]
fn test_queue_config_validation() {
    assert!(QueueConfig::new(4).validate().is_ok());
    assert!(QueueConfig::new(0).validate().is_err());
    assert!(QueueConfig::new(1).with_name("  ").validate().is_err());
}

#[test]
fn test_queue_config_from_json() {
    let json = r#"{
        "name": "airtable-global",
        "max_concurrent": 5,
        "max_per_interval": 5,
        "interval_ms": 1000
    }"#;

    let cfg = QueueConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.name.as_deref(), Some("airtable-global"));
    assert_eq!(
        cfg.rate_limit(),
        Some(RateLimit {
            max_per_interval: 5,
            interval: Duration::from_secs(1),
        })
    );
}

#[test]
fn test_queue_config_from_json_minimal() {
    let cfg = QueueConfig::from_json_str(r#"{ "max_concurrent": 2 }"#).unwrap();
    assert_eq!(cfg, QueueConfig::new(2));
    assert_eq!(cfg.rate_limit(), None);
}

#[test]
fn test_queue_config_from_json_rejects_invalid() {
    assert!(QueueConfig::from_json_str(r#"{ "max_concurrent": 0 }"#).is_err());
    assert!(QueueConfig::from_json_str("not json").is_err());
}

#[test]
fn test_gate_config_from_json() {
    let json = r#"{
        "global": { "max_concurrent": 10, "max_per_interval": 50, "interval_ms": 1000 },
        "per_resource": { "name": "base", "max_concurrent": 5, "max_per_interval": 5, "interval_ms": 1000 }
    }"#;

    let cfg = GateConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.global.max_concurrent, 10);
    assert_eq!(cfg.per_resource.name.as_deref(), Some("base"));
    assert!(cfg.per_resource.rate_limit().is_some());
}

#[test]
fn test_gate_config_names_failing_side() {
    let cfg = GateConfig {
        global: QueueConfig::new(0),
        per_resource: QueueConfig::new(1),
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.starts_with("global quota invalid"));
}

#[test]
fn test_queue_config_from_env() {
    std::env::set_var("PTQ_ENV_TEST_MAX_CONCURRENT", "3");
    std::env::set_var("PTQ_ENV_TEST_MAX_PER_INTERVAL", "10");
    std::env::set_var("PTQ_ENV_TEST_INTERVAL_MS", "250");
    std::env::set_var("PTQ_ENV_TEST_NAME", "from-env");

    let cfg = QueueConfig::from_env("PTQ_ENV_TEST").unwrap();
    assert_eq!(cfg.max_concurrent, 3);
    assert_eq!(cfg.name.as_deref(), Some("from-env"));
    assert_eq!(
        cfg.rate_limit(),
        Some(RateLimit {
            max_per_interval: 10,
            interval: Duration::from_millis(250),
        })
    );
}

#[test]
fn test_queue_config_from_env_requires_concurrency() {
    std::env::set_var("PTQ_ENV_MISSING_INTERVAL_MS", "250");
    let err = QueueConfig::from_env("PTQ_ENV_MISSING").unwrap_err();
    assert!(err.contains("PTQ_ENV_MISSING_MAX_CONCURRENT"));

    std::env::set_var("PTQ_ENV_BAD_MAX_CONCURRENT", "many");
    assert!(QueueConfig::from_env("PTQ_ENV_BAD").is_err());
}
