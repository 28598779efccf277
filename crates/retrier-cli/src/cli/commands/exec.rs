//! `retrier exec -- <program> [args...]` – run a command under the retry engine.

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use retrier_core::backoff::{BackoffKind, BackoffStrategy};
use retrier_core::configuration::{global, Configuration, Overrides};
use retrier_core::retry::{kinds, Retrier, TransportError};
use std::process::Command;

#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Retries after the first attempt (default from config).
    #[arg(long)]
    pub retries: Option<u32>,

    /// Backoff strategy as `kind:start[:factor]`, e.g. `exponential:1`.
    #[arg(long, value_name = "STRATEGY")]
    pub backoff: Option<String>,

    /// Per-call override `key=value` (TOML value), repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Program and arguments to run.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Parse `kind:start[:factor]`.
pub fn parse_backoff(spec: &str) -> Result<BackoffStrategy> {
    let mut parts = spec.split(':');
    let kind: BackoffKind = parts.next().unwrap_or_default().parse()?;
    let start = match parts.next() {
        Some(s) => s.parse::<u64>().with_context(|| format!("bad backoff start `{}`", s))?,
        None => 1,
    };
    let factor = match parts.next() {
        Some(s) => s.parse::<u64>().with_context(|| format!("bad backoff factor `{}`", s))?,
        None => 1,
    };
    if parts.next().is_some() {
        bail!("backoff must look like kind:start[:factor], got `{}`", spec);
    }
    Ok(BackoffStrategy::new(kind, start).with_factor(factor))
}

/// Parse repeated `key=value` flags into overrides. Values are TOML literals.
pub fn parse_overrides(pairs: &[String]) -> Result<Overrides> {
    let mut table = toml::Table::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got `{}`", pair))?;
        let doc: toml::Table = toml::from_str(&format!("v = {}", raw.trim()))
            .with_context(|| format!("bad value for `{}`", key))?;
        let value = doc
            .get("v")
            .cloned()
            .ok_or_else(|| anyhow!("missing value for `{}`", key))?;
        table.insert(key.trim().to_string(), value);
    }
    Ok(Overrides::from_table(&table)?)
}

/// Apply `--backoff` and `--retries`. A budget beyond the current table
/// redeclares the strategy the table came from.
fn apply_budget(
    config: &mut Configuration,
    backoff: Option<BackoffStrategy>,
    retries: Option<u32>,
) -> Result<()> {
    let strategy = backoff.or(match retries {
        Some(n) if n as usize > config.backoff_intervals().len() => config.backoff_strategy(),
        _ => None,
    });
    match (strategy, retries) {
        (Some(strategy), n) => {
            config.declare_backoff_strategy_for(strategy, n.unwrap_or(config.retries()))?
        }
        (None, Some(n)) => config.set_retries(n)?,
        (None, None) => {}
    }
    Ok(())
}

fn run_once(program: &str, args: &[String]) -> Result<(), TransportError> {
    let status = Command::new(program).args(args).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(TransportError::Exit(status.code()))
    }
}

pub fn run_exec(args: &ExecArgs) -> Result<i32> {
    let (program, rest) = args
        .command
        .split_first()
        .ok_or_else(|| anyhow!("no command given"))?;

    let mut config = global::config();
    let backoff = args.backoff.as_deref().map(parse_backoff).transpose()?;
    apply_budget(&mut config, backoff, args.retries)?;

    let mut retrier = Retrier::from_configuration(config);
    let mut retriable = retrier.retriable_configuration().retriable().to_vec();
    retriable.push(kinds::PROCESS_EXIT);
    retrier.retriable_errors(retriable);
    let name = program.clone();
    retrier.on_retry(move |failure, remaining| {
        tracing::info!(program = %name, %failure, remaining, "retrying command");
        eprintln!("retrier: {} ({}); {} retries left", name, failure, remaining);
    });

    let overrides = parse_overrides(&args.set)?;
    let call = retrier.with_overrides(&overrides)?;
    match call.with_retry(|| run_once(program, rest)) {
        Ok(()) => Ok(0),
        Err(TransportError::Exit(code)) => Ok(code.unwrap_or(1)),
        Err(e) => Err(e).with_context(|| format!("failed to run `{}`", program)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrier_core::ConfigError;

    #[test]
    fn backoff_spec_parses() {
        assert_eq!(
            parse_backoff("linear:1:2").unwrap(),
            BackoffStrategy::new(BackoffKind::Linear, 1).with_factor(2)
        );
        assert_eq!(
            parse_backoff("exponential").unwrap(),
            BackoffStrategy::new(BackoffKind::Exponential, 1)
        );
        assert!(parse_backoff("cubic:1").is_err());
        assert!(parse_backoff("constant:x").is_err());
        assert!(parse_backoff("constant:1:2:3").is_err());
    }

    #[test]
    fn large_budget_redeclares_strategy() {
        let mut config = Configuration::default();
        apply_budget(&mut config, None, Some(15)).unwrap();
        assert_eq!(config.retries(), 15);
        assert_eq!(config.backoff_intervals().len(), 15);

        let mut config = Configuration::default();
        let linear = BackoffStrategy::new(BackoffKind::Linear, 1);
        apply_budget(&mut config, Some(linear), None).unwrap();
        assert_eq!(config.retries(), 3);
        assert_eq!(config.backoff_strategy(), Some(linear));

        let mut config = Configuration::default();
        apply_budget(&mut config, None, Some(4)).unwrap();
        assert_eq!(config.backoff_intervals().len(), 10);
    }

    #[test]
    fn set_flags_become_overrides() {
        let o = parse_overrides(&["retries=2".to_string(), "retriable=[\"io\"]".to_string()]).unwrap();
        assert_eq!(o.len(), 2);
    }

    #[test]
    fn unknown_set_key_rejected() {
        let err = parse_overrides(&["sleep=1".to_string()]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UnknownConfigurationKey("sleep".to_string()))
        );
    }

    #[test]
    fn malformed_set_flag_rejected() {
        assert!(parse_overrides(&["retries".to_string()]).is_err());
    }
}
