// Copyright 2025 Cowboy AI, LLC.

//! Identifier types for classes and mixins

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Class ID - an index into the realm's class arena
///
/// Class ids are only meaningful within the realm that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(usize);

impl ClassId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Position of the class in its realm's arena
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// Mixin ID - the identity of a transformation
///
/// Two mixins that build structurally identical classes are still distinct
/// unless they share this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MixinId(Uuid);

impl MixinId {
    /// Create a new random mixin ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MixinId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MixinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<MixinId> for Uuid {
    fn from(id: MixinId) -> Self {
        id.0
    }
}
