//! Orchestrator configuration.
//!
//! Every knob has a default; `from_env` overrides individual values and
//! falls back to the default (with a warning) when a variable does not parse.

use std::str::FromStr;
use std::time::Duration;

use shopreel_generation::PollConfig;

use crate::jobs::RetryPolicy;

pub const ENV_HARD_TIMEOUT_SECS: &str = "SHOPREEL_HARD_TIMEOUT_SECS";
pub const ENV_RETRY_BACKOFF_MS: &str = "SHOPREEL_RETRY_BACKOFF_MS";
pub const ENV_MAX_RETRIES: &str = "SHOPREEL_MAX_RETRIES";
pub const ENV_POLL_INTERVAL_MS: &str = "SHOPREEL_POLL_INTERVAL_MS";
pub const ENV_MAX_POLL_ATTEMPTS: &str = "SHOPREEL_MAX_POLL_ATTEMPTS";
pub const ENV_UPLOAD_TIMEOUT_SECS: &str = "SHOPREEL_UPLOAD_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Ceiling for one phase, retries and backoff included.
    pub hard_timeout: Duration,
    /// Ceiling for the final asset upload.
    pub upload_timeout: Duration,
    /// Fixed delay before the retry of a transient failure.
    pub retry_backoff: Duration,
    pub max_retries: u32,
    /// Interval between status checks of a provider-side operation.
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            hard_timeout: Duration::from_secs(600),
            upload_timeout: Duration::from_secs(60),
            retry_backoff: Duration::from_millis(2000),
            max_retries: 1,
            poll_interval: Duration::from_millis(10_000),
            max_poll_attempts: 45,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, file, test map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let config = Self {
            hard_timeout: Duration::from_secs(parse_or(
                &lookup,
                ENV_HARD_TIMEOUT_SECS,
                d.hard_timeout.as_secs(),
            )),
            upload_timeout: Duration::from_secs(parse_or(
                &lookup,
                ENV_UPLOAD_TIMEOUT_SECS,
                d.upload_timeout.as_secs(),
            )),
            retry_backoff: Duration::from_millis(parse_or(
                &lookup,
                ENV_RETRY_BACKOFF_MS,
                d.retry_backoff.as_millis() as u64,
            )),
            max_retries: parse_or(&lookup, ENV_MAX_RETRIES, d.max_retries),
            poll_interval: Duration::from_millis(parse_or(
                &lookup,
                ENV_POLL_INTERVAL_MS,
                d.poll_interval.as_millis() as u64,
            )),
            max_poll_attempts: parse_or(&lookup, ENV_MAX_POLL_ATTEMPTS, d.max_poll_attempts),
        };

        if !config.poll_budget_fits() {
            tracing::warn!(
                poll_budget_secs = config.poll_budget().as_secs(),
                hard_timeout_secs = config.hard_timeout.as_secs(),
                "poll budget does not fit under the hard timeout; stalled operations will fail on the deadline"
            );
        }
        config
    }

    /// Sleep time the poll loop spends before giving up, polls excluded.
    pub fn poll_budget(&self) -> Duration {
        self.poll_interval.saturating_mul(self.max_poll_attempts)
    }

    /// Whether an exhausted poll loop reports before the hard timeout fires.
    ///
    /// Polls themselves take time, so the budget must stay clear of the
    /// ceiling by at least one interval.
    pub fn poll_budget_fits(&self) -> bool {
        self.poll_budget().saturating_add(self.poll_interval) <= self.hard_timeout
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: self.retry_backoff,
        }
    }

    pub fn poll(&self) -> PollConfig {
        PollConfig {
            interval: self.poll_interval,
            max_attempts: self.max_poll_attempts,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, default = %default, "invalid config value; using default");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = OrchestratorConfig::from_lookup(lookup(&[]));
        assert_eq!(config, OrchestratorConfig::default());
        assert_eq!(config.retry_policy(), RetryPolicy::single_retry(Duration::from_secs(2)));
        assert_eq!(config.poll().max_attempts, 45);
        assert_eq!(config.poll_budget(), Duration::from_secs(450));
        assert!(config.poll_budget_fits());
    }

    #[test]
    fn poll_budget_at_the_ceiling_does_not_fit() {
        let config = OrchestratorConfig::from_lookup(lookup(&[(ENV_MAX_POLL_ATTEMPTS, "60")]));

        assert_eq!(config.poll_budget(), config.hard_timeout);
        assert!(!config.poll_budget_fits());

        let roomier = OrchestratorConfig::from_lookup(lookup(&[
            (ENV_MAX_POLL_ATTEMPTS, "60"),
            (ENV_HARD_TIMEOUT_SECS, "900"),
        ]));
        assert!(roomier.poll_budget_fits());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = OrchestratorConfig::from_lookup(lookup(&[
            (ENV_HARD_TIMEOUT_SECS, "120"),
            (ENV_RETRY_BACKOFF_MS, " 500 "),
            (ENV_MAX_RETRIES, "0"),
            (ENV_POLL_INTERVAL_MS, "250"),
        ]));

        assert_eq!(config.hard_timeout, Duration::from_secs(120));
        assert_eq!(config.retry_backoff, Duration::from_millis(500));
        assert_eq!(config.retry_policy(), RetryPolicy {
            max_retries: 0,
            backoff: Duration::from_millis(500),
        });
        assert_eq!(config.poll().interval, Duration::from_millis(250));
        assert_eq!(config.upload_timeout, Duration::from_secs(60));
    }

    #[test]
    fn garbage_falls_back_to_default() {
        let config = OrchestratorConfig::from_lookup(lookup(&[
            (ENV_HARD_TIMEOUT_SECS, "ten minutes"),
            (ENV_MAX_POLL_ATTEMPTS, "-3"),
        ]));

        assert_eq!(config.hard_timeout, Duration::from_secs(600));
        assert_eq!(config.max_poll_attempts, 45);
    }
}
