//! Scheduler configuration.
//!
//! [`KernelConfig`] controls how a [`Scheduler`](crate::Scheduler) labels its
//! diagnostics and what it does when a thread body fails.  Defaults are
//! provided via [`Default`], and a builder-style API allows callers to
//! customise individual fields fluently.  The struct also deserializes from
//! the `[kernel]` table of a TOML file; absent keys take their defaults.

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};

/// What the scheduler does when a thread body returns an error or panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop `run()` and return [`KernelError::ThreadFailed`].  Threads still
    /// in the ready queue are left there; calling `run()` again resumes them.
    #[default]
    Propagate,
    /// Log the failure, record it in the thread's metadata and keep going.
    LogAndContinue,
}

/// Settings applied to a single scheduler instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Human-readable kernel name, attached to every tracing span.
    ///
    /// Default: **"cothreads"**.
    pub name: String,

    /// Policy for failing thread bodies.
    ///
    /// Default: [`FailurePolicy::Propagate`].
    pub failure_policy: FailurePolicy,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: "cothreads".to_string(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl KernelConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the kernel name used in diagnostics.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Reject configurations the scheduler cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(KernelError::InvalidConfig {
                reason: "kernel name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = KernelConfig::default();
        assert_eq!(cfg.name, "cothreads");
        assert_eq!(cfg.failure_policy, FailurePolicy::Propagate);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn new_equals_default() {
        assert_eq!(KernelConfig::new(), KernelConfig::default());
    }

    #[test]
    fn builder_sets_fields() {
        let cfg = KernelConfig::new()
            .with_name("bench")
            .with_failure_policy(FailurePolicy::LogAndContinue);
        assert_eq!(cfg.name, "bench");
        assert_eq!(cfg.failure_policy, FailurePolicy::LogAndContinue);
    }

    #[test]
    fn empty_name_is_rejected() {
        let cfg = KernelConfig::new().with_name("   ");
        assert!(matches!(
            cfg.validate(),
            Err(KernelError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn deserializes_with_partial_fields() {
        let cfg: KernelConfig =
            serde_json::from_str(r#"{"failure_policy":"log_and_continue"}"#).unwrap();
        assert_eq!(cfg.name, "cothreads");
        assert_eq!(cfg.failure_policy, FailurePolicy::LogAndContinue);
    }
}
