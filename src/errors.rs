// Copyright 2025 Cowboy AI, LLC.

//! Error types for mixin composition

use crate::identifiers::ClassId;
use thiserror::Error;

/// Errors that can occur while building or using mixed class hierarchies
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MixinError {
    /// Class id does not belong to this realm
    #[error("Unknown class: {0}")]
    UnknownClass(ClassId),

    /// Ancestor walk exceeded the configured depth
    #[error("Malformed ancestor chain starting at {class}: exceeded depth {depth}")]
    MalformedAncestorChain {
        /// Class the walk started from
        class: ClassId,
        /// Depth limit that was hit
        depth: usize,
    },

    /// No instance method with this name on the chain
    #[error("Method not found: {class}.{method}")]
    MethodNotFound {
        /// Name of the class the lookup started from
        class: String,
        /// Method that was looked up
        method: String,
    },

    /// No static method with this name on the chain
    #[error("Static method not found: {class}::{method}")]
    StaticMethodNotFound {
        /// Name of the class the lookup started from
        class: String,
        /// Method that was looked up
        method: String,
    },

    /// More mixins were passed to a composition than the realm allows
    #[error("Too many mixins: {given} given, at most {max} allowed")]
    TooManyMixins {
        /// Number of mixins supplied
        given: usize,
        /// Configured maximum
        max: usize,
    },

    /// Failure raised by a user-supplied method, constructor or mixin body
    #[error("Invocation failed: {0}")]
    Invocation(String),

    /// Invalid realm configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for mixin operations
pub type MixinResult<T> = Result<T, MixinError>;

impl From<serde_json::Error> for MixinError {
    fn from(err: serde_json::Error) -> Self {
        MixinError::Configuration(err.to_string())
    }
}

impl MixinError {
    /// Create an invocation error from a user method body
    pub fn invocation(msg: impl Into<String>) -> Self {
        MixinError::Invocation(msg.into())
    }

    /// Check if this is a lookup failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MixinError::UnknownClass(_)
                | MixinError::MethodNotFound { .. }
                | MixinError::StaticMethodNotFound { .. }
        )
    }
}
