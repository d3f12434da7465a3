// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Engine configuration.
//!
//! Options are deserialized from a YAML file or built in code; everything
//! has a sensible default so a container can be constructed with
//! `EngineOptions::default()` and never touch a file.
//!
//! # Example
//! ```yaml
//! max_concurrency: 8
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading engine options.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse options file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Tunables for the split-join execution engine.
///
/// `max_concurrency` bounds the number of branch tasks running at once
/// within one container; nested containers each apply their own bound.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EngineOptions {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl EngineOptions {
    /// Loads options from a YAML file, clamping out-of-range values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let options: EngineOptions = serde_yaml::from_str(&raw)?;
        Ok(options.clamped())
    }

    /// Concurrency of zero would deadlock the join wait; clamp to one.
    pub fn clamped(mut self) -> Self {
        self.max_concurrency = self.max_concurrency.max(1);
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

fn default_max_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
