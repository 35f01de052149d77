// Copyright 2025 Cowboy AI, LLC.

//! Realm configuration

use crate::errors::{MixinError, MixinResult};
use serde::{Deserialize, Serialize};

/// Limits applied by a [`Realm`](crate::Realm)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealmConfig {
    /// Longest ancestor chain a walk will follow before reporting it as malformed
    pub max_chain_depth: usize,
    /// Upper bound on mixins accepted by a single `mix(..).with(..)` call
    pub max_mixins_per_composition: Option<usize>,
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: 1024,
            max_mixins_per_composition: None,
        }
    }
}

impl RealmConfig {
    /// Parse a configuration from JSON, filling missing keys with defaults
    pub fn from_json(json: &str) -> MixinResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would make every walk or composition fail
    pub fn validate(&self) -> MixinResult<()> {
        if self.max_chain_depth == 0 {
            return Err(MixinError::Configuration(
                "max_chain_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
