// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML checkpoint configuration loader.
//!
//! # Example YAML
//!
//! ```yaml
//! # checkpoint.yaml
//! max_rank: 6
//! sized_from_parent_attribute: __sizedFromParent__
//! verify_restored_bytes: true
//! ```
//!
//! Missing keys take their default value.

use super::CheckpointConfig;
use crate::error::{Result, ViewError};
use std::fs;
use std::path::Path;

impl CheckpointConfig {
    /// Parse and validate a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: CheckpointConfig = serde_yaml::from_str(yaml)
            .map_err(|e| ViewError::Config(format!("YAML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ViewError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }
}
