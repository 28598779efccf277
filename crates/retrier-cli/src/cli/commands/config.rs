//! `retrier config` – show the effective default configuration.

use anyhow::Result;
use retrier_core::config;
use retrier_core::configuration::global;

pub fn run_config() -> Result<()> {
    let cfg = global::config();
    println!("config file:  {}", config::config_path()?.display());
    println!("retries:      {}", cfg.retries());
    let kinds: Vec<&str> = cfg.retriable().iter().map(|k| k.name()).collect();
    println!("retriable:    {}", kinds.join(", "));
    match cfg.backoff_strategy() {
        Some(s) => println!("backoff:      {} (start {}, factor {})", s.kind, s.start, s.factor),
        None => println!("backoff:      explicit table"),
    }
    let waits: Vec<String> = cfg
        .backoff_intervals()
        .iter()
        .take(cfg.retries() as usize)
        .map(|d| format!("{:.3}s", d.as_secs_f64()))
        .collect();
    println!("waits:        {}", waits.join(" "));
    Ok(())
}
