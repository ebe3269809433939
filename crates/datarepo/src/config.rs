// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Checkpoint configuration.
//!
//! # Example
//!
//! ```
//! use datarepo::CheckpointConfig;
//!
//! let config = CheckpointConfig::builder()
//!     .max_rank(4)
//!     .sized_from_parent_attribute("__sizedFromParent__")
//!     .build()
//!     .unwrap();
//! assert_eq!(config.max_rank, 4);
//! ```

#[cfg(feature = "config-loaders")]
mod yaml;

use crate::error::{Result, ViewError};
use crate::shape::MAX_RANK;

/// Reserved attribute name for the SizedFromParent flag.
pub const SIZED_FROM_PARENT_ATTRIBUTE: &str = "__sizedFromParent__";

/// Checkpoint protocol configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct CheckpointConfig {
    /// Largest rank accepted by the protocol (1..=`MAX_RANK`).
    pub max_rank: usize,

    /// Attribute name the SizedFromParent flag is stored under.
    pub sized_from_parent_attribute: String,

    /// Check the resized byte size against the slot before registering a
    /// restore target.
    pub verify_restored_bytes: bool,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            max_rank: MAX_RANK,
            sized_from_parent_attribute: SIZED_FROM_PARENT_ATTRIBUTE.to_string(),
            verify_restored_bytes: true,
        }
    }
}

impl CheckpointConfig {
    /// Create a new config builder
    pub fn builder() -> CheckpointConfigBuilder {
        CheckpointConfigBuilder::default()
    }

    /// Reject values the protocol cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_rank == 0 || self.max_rank > MAX_RANK {
            return Err(ViewError::Config(format!(
                "max_rank must be in 1..={}, got {}",
                MAX_RANK, self.max_rank
            )));
        }
        if self.sized_from_parent_attribute.is_empty() {
            return Err(ViewError::Config(
                "sized_from_parent_attribute must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Config builder for fluent API
#[derive(Debug, Default)]
pub struct CheckpointConfigBuilder {
    max_rank: Option<usize>,
    sized_from_parent_attribute: Option<String>,
    verify_restored_bytes: Option<bool>,
}

impl CheckpointConfigBuilder {
    /// Set the largest accepted rank
    pub fn max_rank(mut self, rank: usize) -> Self {
        self.max_rank = Some(rank);
        self
    }

    /// Set the SizedFromParent attribute name
    pub fn sized_from_parent_attribute(mut self, name: impl Into<String>) -> Self {
        self.sized_from_parent_attribute = Some(name.into());
        self
    }

    /// Enable or disable the restored byte size check (default: enabled)
    pub fn verify_restored_bytes(mut self, verify: bool) -> Self {
        self.verify_restored_bytes = Some(verify);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<CheckpointConfig> {
        let defaults = CheckpointConfig::default();

        let config = CheckpointConfig {
            max_rank: self.max_rank.unwrap_or(defaults.max_rank),
            sized_from_parent_attribute: self
                .sized_from_parent_attribute
                .unwrap_or(defaults.sized_from_parent_attribute),
            verify_restored_bytes: self
                .verify_restored_bytes
                .unwrap_or(defaults.verify_restored_bytes),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CheckpointConfig::default();

        assert_eq!(config.max_rank, MAX_RANK);
        assert_eq!(config.sized_from_parent_attribute, "__sizedFromParent__");
        assert!(config.verify_restored_bytes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = CheckpointConfig::builder()
            .max_rank(3)
            .sized_from_parent_attribute("sfp")
            .verify_restored_bytes(false)
            .build()
            .unwrap();

        assert_eq!(config.max_rank, 3);
        assert_eq!(config.sized_from_parent_attribute, "sfp");
        assert!(!config.verify_restored_bytes);
    }

    #[test]
    fn test_config_rejects_rank_out_of_range() {
        assert!(matches!(
            CheckpointConfig::builder().max_rank(0).build(),
            Err(ViewError::Config(_))
        ));
        assert!(matches!(
            CheckpointConfig::builder().max_rank(MAX_RANK + 1).build(),
            Err(ViewError::Config(_))
        ));
    }

    #[test]
    fn test_config_rejects_empty_attribute() {
        let result = CheckpointConfig::builder()
            .sized_from_parent_attribute("")
            .build();
        assert!(result.is_err());
    }
}
