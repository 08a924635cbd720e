//! Engine configuration.
//!
//! [`EngineConfig`] carries the timeout/retry knobs of the exchange driver,
//! the consumer-fault policy of the dispatcher, and the per-backend
//! credentials checked at [`Orchestrator::initialize`](crate::Orchestrator::initialize).
//! Construct it directly, or read the knobs from the environment with
//! [`EngineConfig::from_env`]:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `ROUNDTABLE_MESSAGE_TIMEOUT_SECS` | `30` | Sliding per-message timeout |
//! | `ROUNDTABLE_MAX_RETRIES` | `3` | Attempt budget per task |
//! | `ROUNDTABLE_RETRY_DELAY_MS` | `1000` | Fixed backoff between attempts |
//! | `ROUNDTABLE_MAX_ROUNDS` | `5` | Default round budget per exchange |
//!
//! Credentials never come from the environment implicitly: the embedding
//! application decides which variables map to which backend key and installs
//! them via [`with_credential`](EngineConfig::with_credential).
//!
//! # Example
//!
//! ```
//! use roundtable::{ConsumerFaultPolicy, EngineConfig};
//!
//! let config = EngineConfig::from_env()
//!     .with_credential("anthropic", "sk-test")
//!     .with_consumer_fault_policy(ConsumerFaultPolicy::Continue);
//! assert!(config.credential("anthropic").is_some());
//! assert!(config.credential("openai").is_none());
//! ```

use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// What the dispatcher does when the host's awaited message-received hook
/// returns an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsumerFaultPolicy {
    /// Log the fault and continue with the next message.
    Continue,
    /// Cancel the whole task run.
    CancelTask,
}

/// Tunable knobs and credentials for one [`Orchestrator`](crate::Orchestrator).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Sliding per-message timeout, in seconds. The window resets every time
    /// a message is produced.
    pub message_timeout_secs: u64,
    /// How many exchange attempts a task may consume before failing.
    pub max_retries: u32,
    /// Fixed delay before each attempt after the first, in milliseconds.
    pub retry_delay_ms: u64,
    /// Round budget used when the caller does not pass one explicitly.
    pub default_max_rounds: usize,
    /// Dispatcher behavior on consumer faults.
    pub consumer_fault_policy: ConsumerFaultPolicy,
    /// Backend key → secret, consulted per roster entry at initialize.
    pub credentials: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            message_timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 1000,
            default_max_rounds: 5,
            consumer_fault_policy: ConsumerFaultPolicy::Continue,
            credentials: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Read the numeric knobs from `ROUNDTABLE_*` environment variables,
    /// falling back to the defaults for unset or unparseable values.
    /// Credentials start empty.
    pub fn from_env() -> Self {
        let defaults = EngineConfig::default();
        EngineConfig {
            message_timeout_secs: env_u64(
                "ROUNDTABLE_MESSAGE_TIMEOUT_SECS",
                defaults.message_timeout_secs,
            ),
            max_retries: env_u64("ROUNDTABLE_MAX_RETRIES", u64::from(defaults.max_retries))
                as u32,
            retry_delay_ms: env_u64("ROUNDTABLE_RETRY_DELAY_MS", defaults.retry_delay_ms),
            default_max_rounds: env_u64(
                "ROUNDTABLE_MAX_ROUNDS",
                defaults.default_max_rounds as u64,
            ) as usize,
            ..defaults
        }
    }

    /// Install a credential for one backend key (builder pattern).
    pub fn with_credential(
        mut self,
        provider: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.credentials.insert(provider.into(), secret.into());
        self
    }

    /// Override the consumer-fault policy (builder pattern).
    pub fn with_consumer_fault_policy(mut self, policy: ConsumerFaultPolicy) -> Self {
        self.consumer_fault_policy = policy;
        self
    }

    /// Credential for `provider`, if one was installed.
    pub fn credential(&self, provider: &str) -> Option<&str> {
        self.credentials.get(provider).map(|s| s.as_str())
    }

    pub fn message_timeout(&self) -> Duration {
        Duration::from_secs(self.message_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}
