//! Monitor configuration.

use crate::domain::{FaultClassifier, TxPolicy};
use qc_18_periodic_supervisor::SupervisorConfig;
use shared_types::U256;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Transaction monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Time between evaluation passes.
    pub tick_interval: Duration,
    /// Evaluate once as soon as the supervisor starts.
    pub run_immediately: bool,
    /// Upper bound on every chain, strategy, broadcast and archive call.
    pub rpc_timeout: Duration,
    /// Policy applied by [`TransactionMonitor::pending`](crate::TransactionMonitor::pending).
    pub default_policy: TxPolicy,
    /// Report timed-out, fee-capped transactions as `PAUSE`.
    pub pause_on_capped_timeout: bool,
    /// Halt the loop after this many failed ticks in a row. `None` never halts.
    pub max_consecutive_tick_failures: Option<u32>,
    /// Buffer of the outcome broadcast channel.
    pub outcome_channel_capacity: usize,
    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,
    /// Emit JSON formatted logs.
    pub json_logs: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(10),
            run_immediately: true,
            rpc_timeout: Duration::from_secs(5),
            default_policy: TxPolicy::default(),
            pause_on_capped_timeout: true,
            max_consecutive_tick_failures: None,
            outcome_channel_capacity: 1024,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl MonitorConfig {
    /// Short intervals for tests.
    pub fn for_testing() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            rpc_timeout: Duration::from_millis(200),
            default_policy: TxPolicy::with_max_wait(Duration::from_secs(60)),
            outcome_channel_capacity: 64,
            log_level: "debug".to_string(),
            ..Default::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TXM_TICK_INTERVAL_SECS`: Seconds between evaluations (default: 10)
    /// - `TXM_RUN_IMMEDIATELY`: Evaluate on start (default: true)
    /// - `TXM_RPC_TIMEOUT_MS`: Collaborator call timeout (default: 5000)
    /// - `TXM_MAX_WAIT_SECS`: Seconds before TIMEOUT (default: 300)
    /// - `TXM_FEE_CAP_WEI`: Decimal fee cap per gas (default: none)
    /// - `TXM_PAUSE_ON_CAPPED_TIMEOUT`: PAUSE instead of TIMEOUT once capped (default: true)
    /// - `TXM_MAX_CONSECUTIVE_TICK_FAILURES`: Halt threshold (default: never)
    /// - `TXM_OUTCOME_CHANNEL_CAPACITY`: Outcome channel buffer (default: 1024)
    /// - `TXM_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `TXM_JSON_LOGS`: Enable JSON logs (default: false)
    ///
    /// # Errors
    /// `ConfigError` if a variable is set but unparsable, or the result fails
    /// [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            tick_interval: parse(&lookup, "TXM_TICK_INTERVAL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.tick_interval),

            run_immediately: parse_flag(&lookup, "TXM_RUN_IMMEDIATELY")?
                .unwrap_or(defaults.run_immediately),

            rpc_timeout: parse(&lookup, "TXM_RPC_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.rpc_timeout),

            default_policy: TxPolicy {
                max_wait: parse(&lookup, "TXM_MAX_WAIT_SECS")?
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.default_policy.max_wait),
                fee_cap: parse_u256(&lookup, "TXM_FEE_CAP_WEI")?
                    .or(defaults.default_policy.fee_cap),
            },

            pause_on_capped_timeout: parse_flag(&lookup, "TXM_PAUSE_ON_CAPPED_TIMEOUT")?
                .unwrap_or(defaults.pause_on_capped_timeout),

            max_consecutive_tick_failures: parse(&lookup, "TXM_MAX_CONSECUTIVE_TICK_FAILURES")?
                .or(defaults.max_consecutive_tick_failures),

            outcome_channel_capacity: parse(&lookup, "TXM_OUTCOME_CHANNEL_CAPACITY")?
                .unwrap_or(defaults.outcome_channel_capacity),

            log_level: lookup("TXM_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            json_logs: parse_flag(&lookup, "TXM_JSON_LOGS")?.unwrap_or(defaults.json_logs),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the supervisor or broadcast channel cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Zero {
                field: "tick_interval",
            });
        }
        if self.rpc_timeout.is_zero() {
            return Err(ConfigError::Zero {
                field: "rpc_timeout",
            });
        }
        if self.default_policy.max_wait.is_zero() {
            return Err(ConfigError::Zero {
                field: "default_policy.max_wait",
            });
        }
        if self.outcome_channel_capacity == 0 {
            return Err(ConfigError::Zero {
                field: "outcome_channel_capacity",
            });
        }
        if self.max_consecutive_tick_failures == Some(0) {
            return Err(ConfigError::Zero {
                field: "max_consecutive_tick_failures",
            });
        }
        Ok(())
    }

    /// Scheduler settings derived from this config.
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            interval: self.tick_interval,
            run_immediately: self.run_immediately,
        }
    }

    /// Classifier configured by this config.
    pub fn classifier(&self) -> FaultClassifier {
        FaultClassifier::new(self.pause_on_capped_timeout)
    }
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key,
                    value: value.clone(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}

fn parse_flag<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key,
                value: value.clone(),
                reason: "expected true or false".into(),
            }),
        })
        .transpose()
}

fn parse_u256<F>(lookup: &F, key: &'static str) -> Result<Option<U256>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            U256::from_dec_str(value.trim()).map_err(|e| ConfigError::InvalidValue {
                key,
                value: value.clone(),
                reason: format!("{e:?}"),
            })
        })
        .transpose()
}
