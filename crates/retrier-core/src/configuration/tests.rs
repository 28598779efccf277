//! Tests for Configuration defaults, setters and merge.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::retry::TransportError;

fn secs(v: &[u64]) -> Vec<Duration> {
    v.iter().copied().map(Duration::from_secs).collect()
}

#[test]
fn default_values() {
    let cfg = Configuration::default();
    assert_eq!(cfg.retries(), 3);
    assert_eq!(
        cfg.retriable(),
        &[kinds::HTTP_RETRIABLE, kinds::CONNECTION_RESET, kinds::IO]
    );
    assert_eq!(cfg.backoff_intervals(), secs(&[3; 10]).as_slice());
    assert!(!(cfg.retry_condition())(&TransportError::Http(503)));
    cfg.validate().unwrap();
}

#[test]
fn merge_sets_every_key() {
    let calls = Arc::new(AtomicU32::new(0));
    let seen = calls.clone();
    let overrides = Overrides::new()
        .retries(2)
        .retriable(vec![kinds::HTTP_RETRIABLE])
        .retry_condition(|_| true)
        .on_retry(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .backoff_intervals(secs(&[1, 2, 3, 4, 5]));

    let cfg = Configuration::new(&overrides).unwrap();
    assert_eq!(cfg.retries(), 2);
    assert_eq!(cfg.retriable(), &[kinds::HTTP_RETRIABLE]);
    assert!((cfg.retry_condition())(&TransportError::Http(503)));
    (cfg.on_retry())(&TransportError::Http(503), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cfg.backoff_intervals(), secs(&[1, 2, 3, 4, 5]).as_slice());
    assert!(cfg.backoff_strategy().is_none());
}

#[test]
fn merge_does_not_touch_base() {
    let base = Configuration::default();
    let merged = base.merge(&Overrides::new().retries(7)).unwrap();
    assert_eq!(merged.retries(), 7);
    assert_eq!(base.retries(), 3);
}

#[test]
fn non_positive_retries_rejected() {
    for n in [0, -1] {
        let err = Configuration::new(&Overrides::new().retries(n)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidConfigurationValue { field: "retries", .. }
        ));
    }
    let mut cfg = Configuration::default();
    assert!(cfg.set_retries(0).is_err());
    assert_eq!(cfg.retries(), 3);
}

#[test]
fn unknown_key_rejected() {
    let table: toml::Table = toml::from_str("unknown_field = 1").unwrap();
    let err = Overrides::from_table(&table).unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownConfigurationKey("unknown_field".to_string())
    );
}

#[test]
fn unknown_key_reported_even_after_bad_value() {
    let table: toml::Table = toml::from_str("retries = \"many\"\nzzz = 1").unwrap();
    assert!(matches!(
        Overrides::from_table(&table),
        Err(ConfigError::UnknownConfigurationKey(k)) if k == "zzz"
    ));
}

#[test]
fn table_values_are_converted() {
    let table: toml::Table = toml::from_str(
        r#"
            retries = 2
            retriable = ["io.timeout", "http.retriable"]
            backoff_intervals = [0.5, 1, 2]
        "#,
    )
    .unwrap();
    let cfg = Configuration::new(&Overrides::from_table(&table).unwrap()).unwrap();
    assert_eq!(cfg.retries(), 2);
    assert_eq!(cfg.retriable(), &[kinds::TIMEOUT, kinds::HTTP_RETRIABLE]);
    assert_eq!(
        cfg.backoff_intervals(),
        &[
            Duration::from_millis(500),
            Duration::from_secs(1),
            Duration::from_secs(2)
        ]
    );
}

#[test]
fn table_rejects_bad_values() {
    for (src, field) in [
        ("retriable = \"io\"", "retriable"),
        ("retriable = [\"no.such.kind\"]", "retriable"),
        ("retry_condition = true", "retry_condition"),
        ("on_retry = {}", "on_retry"),
        ("backoff_intervals = 1", "backoff_intervals"),
        ("backoff_intervals = [-1]", "backoff_intervals"),
    ] {
        let table: toml::Table = toml::from_str(src).unwrap();
        match Overrides::from_table(&table) {
            Err(ConfigError::InvalidConfigurationValue { field: f, .. }) => {
                assert_eq!(f, field, "for {}", src)
            }
            other => panic!("expected invalid value for {}, got {:?}", src, other),
        }
    }
}

#[test]
fn short_table_rejected() {
    let err = Configuration::new(&Overrides::new().backoff_intervals(secs(&[1]))).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidConfigurationValue {
            field: "backoff_intervals",
            ..
        }
    ));
}

#[test]
fn short_table_checked_against_merged_retries() {
    let ok = Overrides::new().retries(1).backoff_intervals(secs(&[1]));
    assert_eq!(Configuration::new(&ok).unwrap().backoff_intervals().len(), 1);

    let bad = Overrides::new().retries(5).backoff_intervals(secs(&[1, 1, 1, 1]));
    assert!(Configuration::new(&bad).is_err());
}

#[test]
fn merge_is_atomic() {
    let base = Configuration::default();
    let overrides = Overrides::new()
        .retriable(vec![kinds::TIMEOUT])
        .retries(-1);
    assert!(base.merge(&overrides).is_err());
    assert_eq!(base.retriable().len(), 3);
}

#[test]
fn larger_budget_than_table_is_rejected() {
    let err = Configuration::new(&Overrides::new().retries(15)).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidConfigurationValue { field: "backoff_intervals", .. }
    ));

    let mut cfg = Configuration::default();
    assert!(cfg.set_retries(12).is_err());
    assert_eq!(cfg.retries(), 3);
    assert_eq!(cfg.backoff_intervals().len(), 10);

    let grown = Overrides::new().retries(12).backoff_intervals(secs(&[2; 12]));
    assert_eq!(Configuration::new(&grown).unwrap().retries(), 12);
}

#[test]
fn merge_keeps_jittered_table() {
    let mut base = Configuration::default();
    base.declare_backoff_strategy(BackoffStrategy::new(BackoffKind::Exponential, 1))
        .unwrap();

    let merged = base.merge(&Overrides::new().retries(8)).unwrap();
    assert_eq!(merged.backoff_intervals(), base.backoff_intervals());

    assert!(base.merge(&Overrides::new().retries(12)).is_err());
}

#[test]
fn larger_budget_with_direct_table_fails() {
    let mut cfg = Configuration::default();
    cfg.set_backoff_intervals(secs(&[1, 2, 3])).unwrap();
    assert!(cfg.set_retries(4).is_err());
    assert_eq!(cfg.retries(), 3);
    assert!(cfg.merge(&Overrides::new().retries(4)).is_err());
}

#[test]
fn declare_strategy_replaces_table() {
    let mut cfg = Configuration::default();
    cfg.declare_backoff_strategy(BackoffStrategy::new(BackoffKind::Fibonacci, 1))
        .unwrap();
    assert_eq!(
        cfg.backoff_intervals(),
        secs(&[1, 1, 2, 3, 5, 8, 13, 21, 34, 55]).as_slice()
    );
    assert_eq!(
        cfg.backoff_strategy(),
        Some(BackoffStrategy::new(BackoffKind::Fibonacci, 1))
    );
}

#[test]
fn declare_strategy_covers_large_budget() {
    let mut cfg = Configuration::default();
    cfg.declare_backoff_strategy_for(
        BackoffStrategy::new(BackoffKind::Linear, 1).with_factor(2),
        14,
    )
    .unwrap();
    assert_eq!(cfg.retries(), 14);
    assert_eq!(cfg.backoff_intervals().len(), 14);
    assert_eq!(cfg.backoff_intervals()[13], Duration::from_secs(28));

    assert!(cfg
        .declare_backoff_strategy_for(BackoffStrategy::new(BackoffKind::Constant, 1), 0)
        .is_err());
    assert_eq!(cfg.retries(), 14);
}

#[test]
fn declare_strategy_falls_back_to_budget_length() {
    let mut cfg = Configuration::default();
    cfg.declare_backoff_strategy(BackoffStrategy::new(BackoffKind::Fibonacci, 1_000_000_000_000_000_000))
        .unwrap();
    assert_eq!(cfg.backoff_intervals().len(), 3);

    let err = cfg
        .declare_backoff_strategy_for(
            BackoffStrategy::new(BackoffKind::Fibonacci, 1_000_000_000_000_000_000),
            8,
        )
        .unwrap_err();
    assert!(matches!(err, ConfigError::BackoffTableTooShort { requested: 8, .. }));
}

#[test]
fn classify_matches_descendants() {
    let mut cfg = Configuration::default();
    cfg.set_retriable(vec![kinds::IO]);
    let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
    assert!(cfg.classify(&reset));
    assert!(!cfg.classify(&TransportError::Http(503)));

    cfg.set_retriable(vec![kinds::HTTP]);
    assert!(cfg.classify(&TransportError::Http(404)));
    assert!(!cfg.classify(&reset));
}

#[test]
fn decide_walks_states() {
    let mut cfg = Configuration::default();
    cfg.set_backoff_intervals(secs(&[1, 2, 3])).unwrap();
    let retriable = TransportError::Http(503);
    let fatal = TransportError::Http(404);

    assert_eq!(
        cfg.decide(&fatal, 3),
        RetryDecision::Stop(StopReason::NonRetriable)
    );
    assert_eq!(
        cfg.decide(&retriable, 3),
        RetryDecision::RetryAfter(Duration::from_secs(1))
    );
    assert_eq!(
        cfg.decide(&retriable, 1),
        RetryDecision::RetryAfter(Duration::from_secs(3))
    );
    assert_eq!(
        cfg.decide(&retriable, 0),
        RetryDecision::Stop(StopReason::Exhausted)
    );

    cfg.set_retry_condition(|f| f.status() == Some(503));
    assert_eq!(
        cfg.decide(&retriable, 3),
        RetryDecision::Stop(StopReason::Suppressed)
    );
}

#[test]
fn condition_not_consulted_when_exhausted_or_fatal() {
    let calls = Arc::new(AtomicU32::new(0));
    let seen = calls.clone();
    let mut cfg = Configuration::default();
    cfg.set_retry_condition(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        false
    });
    cfg.decide(&TransportError::Http(404), 3);
    cfg.decide(&TransportError::Http(503), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
