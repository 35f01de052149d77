// Copyright 2025 Cowboy AI, LLC.

//! Mixin application and membership queries

use crate::class::Object;
use crate::errors::MixinResult;
use crate::identifiers::ClassId;
use crate::mixin::Mixin;
use crate::realm::Realm;
use tracing::{debug, warn};

/// Anything with an ancestor chain: a class or an instance of one
pub trait Ancestry {
    /// First class on the chain
    fn class_id(&self) -> ClassId;
}

impl Ancestry for ClassId {
    fn class_id(&self) -> ClassId {
        *self
    }
}

impl Ancestry for Object {
    fn class_id(&self) -> ClassId {
        self.class()
    }
}

impl<T: Ancestry + ?Sized> Ancestry for &T {
    fn class_id(&self) -> ClassId {
        (**self).class_id()
    }
}

impl Realm {
    /// Apply `mixin` to `base` and stamp the result with the original mixin
    ///
    /// Each call runs the mixin body again; use [`Realm::cached`] to
    /// memoize per base.
    pub fn apply(&self, base: ClassId, mixin: &Mixin) -> MixinResult<ClassId> {
        let application = mixin.invoke(self, base)?;
        self.registry.register(mixin);
        let original = self.registry.root_id(mixin.id());
        let descriptor = self.class(application)?;

        if let Err(existing) = descriptor.stamp(original) {
            warn!(
                class = %application,
                existing = %existing,
                rejected = %original,
                "Class is already an application of another mixin"
            );
        } else {
            debug!(
                base = %base,
                application = %application,
                mixin = mixin.name(),
                "Applied mixin"
            );
        }
        Ok(application)
    }

    /// Whether `class` itself was produced by applying `mixin`
    ///
    /// Compares against the original behind any wrap layers, by identity.
    /// Fails with [`UnknownClass`](crate::MixinError::UnknownClass) when
    /// `class` was not defined by this realm.
    pub fn is_application_of(&self, class: ClassId, mixin: &Mixin) -> MixinResult<bool> {
        let original = self.registry.root_id(mixin.id());
        Ok(self.class(class)?.applied_mixin() == Some(original))
    }

    /// Whether an application of `mixin` appears anywhere on the chain of `target`
    pub fn has_mixin(&self, target: &impl Ancestry, mixin: &Mixin) -> MixinResult<bool> {
        let original = self.registry.root_id(mixin.id());
        let found = self.find_in_chain(Some(target.class_id()), |descriptor| {
            (descriptor.applied_mixin() == Some(original)).then_some(())
        })?;
        Ok(found.is_some())
    }
}
