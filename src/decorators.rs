// Copyright 2025 Cowboy AI, LLC.

//! Mixin decorators
//!
//! Each decorator returns a mixin with the same shape (base class in,
//! derived class out) registered as a wrapper of its input, so decorators
//! stack without hiding the original's identity.
//!
//! The standard stack, built by [`Realm::mixin`], is
//! `dedupe(cached(bare_mixin(m)))`.

use crate::application::Ancestry;
use crate::errors::MixinResult;
use crate::identifiers::ClassId;
use crate::mixin::Mixin;
use crate::realm::Realm;
use std::sync::PoisonError;
use tracing::debug;

impl Realm {
    /// Memoize applications of `mixin` per base class
    ///
    /// The cache lives on the base and is keyed by `mixin`'s own id, so
    /// nested caching layers keep separate entries. Concurrent first
    /// applications to the same base converge on a single class.
    pub fn cached(&self, mixin: &Mixin) -> Mixin {
        let inner = mixin.clone();
        let wrapper = Mixin::new(format!("Cached({})", mixin.name()), move |realm, base| {
            realm.cached_application(base, &inner)
        });
        self.wrap(mixin, wrapper)
    }

    fn cached_application(&self, base: ClassId, mixin: &Mixin) -> MixinResult<ClassId> {
        let slot = self.class(base)?.application_slot(mixin.id());
        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(application) = *cached {
            debug!(base = %base, application = %application, mixin = mixin.name(), "Application cache hit");
            return Ok(application);
        }

        let application = mixin.invoke(self, base)?;
        *cached = Some(application);
        debug!(base = %base, application = %application, mixin = mixin.name(), "Application cached");
        Ok(application)
    }

    /// Skip `mixin` when the base already has it on its chain
    pub fn dedupe(&self, mixin: &Mixin) -> Mixin {
        let inner = mixin.clone();
        let wrapper = Mixin::new(format!("DeDupe({})", mixin.name()), move |realm, base| {
            if realm.has_mixin(&base, &inner)? {
                debug!(base = %base, mixin = inner.name(), "Mixin already applied, skipping");
                return Ok(base);
            }
            inner.invoke(realm, base)
        });
        self.wrap(mixin, wrapper)
    }

    /// Install native instance-of support on `mixin` itself
    ///
    /// Afterwards [`Realm::instance_of`] against `mixin`, or anything
    /// wrapping it, answers with a membership query. Installing twice is a
    /// no-op. Returns the same mixin.
    pub fn has_instance(&self, mixin: &Mixin) -> Mixin {
        if self.registry.install_instance_check(mixin) {
            debug!(mixin = mixin.name(), "Installed instance check");
        }
        mixin.clone()
    }

    /// Instance-of test against a mixin
    ///
    /// Without an installed instance check a mixin has no instances, so
    /// the answer is `false`.
    pub fn instance_of(&self, target: &impl Ancestry, mixin: &Mixin) -> MixinResult<bool> {
        match self.registry.instance_check_owner(mixin.id()) {
            Some(owner) => match self.registry.mixin(owner) {
                Some(owner) => self.has_mixin(target, &owner),
                None => Ok(false),
            },
            None => Ok(false),
        }
    }

    /// Minimal decorator: apply through [`Realm::apply`] so results are stamped
    pub fn bare_mixin(&self, mixin: &Mixin) -> Mixin {
        let inner = mixin.clone();
        let wrapper = Mixin::new(mixin.name(), move |realm, base| realm.apply(base, &inner));
        self.wrap(mixin, wrapper)
    }

    /// The fully decorated mixin: deduplicated, cached and stamped
    ///
    /// Decoration is memoized per input mixin, so every call for the same
    /// mixin returns the same decorated value and shares its cache.
    pub fn mixin(&self, mixin: &Mixin) -> Mixin {
        if let Some(existing) = self.composites.get(&mixin.id()) {
            return existing.value().clone();
        }
        let composite = self.dedupe(&self.cached(&self.bare_mixin(mixin)));
        self.composites
            .entry(mixin.id())
            .or_insert(composite)
            .value()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassSpec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(name: &str, counter: &Arc<AtomicUsize>) -> Mixin {
        let counter = Arc::clone(counter);
        let class_name = name.to_string();
        Mixin::new(name, move |realm, base| {
            counter.fetch_add(1, Ordering::SeqCst);
            realm.extend(base, ClassSpec::new(class_name.as_str()))
        })
    }

    /// Test cached applications converge per base
    ///
    /// ```mermaid
    /// graph LR
    ///     A[Base A] -->|cached M| MA[M(A)]
    ///     A -->|cached M again| MA
    ///     B[Base B] -->|cached M| MB[M(B)]
    /// ```
    #[test]
    fn test_cached_converges_per_base() {
        let realm = Realm::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let cached = realm.cached(&realm.bare_mixin(&counting("M", &counter)));
        let a = realm.define_class(ClassSpec::new("A"));
        let b = realm.define_class(ClassSpec::new("B"));

        let first = cached.invoke(&realm, a).unwrap();
        let second = cached.invoke(&realm, a).unwrap();
        let other = cached.invoke(&realm, b).unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(realm.class(a).unwrap().cached_application_count(), 1);
    }

    #[test]
    fn test_nested_cached_layers_do_not_collide() {
        let realm = Realm::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let inner = realm.cached(&realm.bare_mixin(&counting("M", &counter)));
        let outer = realm.cached(&inner);
        let base = realm.define_class(ClassSpec::new("Base"));

        let via_outer = outer.invoke(&realm, base).unwrap();
        let via_inner = inner.invoke(&realm, base).unwrap();
        assert_eq!(via_outer, via_inner);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(realm.class(base).unwrap().cached_application_count(), 2);
    }

    #[test]
    fn test_cached_failure_is_not_memoized() {
        let realm = Realm::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&attempts);
        let flaky = Mixin::new("Flaky", move |realm, base| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(crate::MixinError::invocation("first try fails"));
            }
            realm.extend(base, ClassSpec::new("Flaky"))
        });
        let cached = realm.cached(&flaky);
        let base = realm.define_class(ClassSpec::new("Base"));

        assert!(cached.invoke(&realm, base).is_err());
        let application = cached.invoke(&realm, base).unwrap();
        assert_eq!(cached.invoke(&realm, base).unwrap(), application);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dedupe_applies_once() {
        let realm = Realm::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let m = realm.dedupe(&realm.bare_mixin(&counting("M", &counter)));
        let base = realm.define_class(ClassSpec::new("Object"));

        let once = m.invoke(&realm, base).unwrap();
        let twice = m.invoke(&realm, once).unwrap();

        assert_eq!(once, twice);
        assert!(realm.has_mixin(&twice, &m).unwrap());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_has_instance() {
        let realm = Realm::new();
        let raw = Mixin::layer("M", |spec| spec);
        let m = realm.has_instance(&realm.bare_mixin(&raw));
        let other = realm.bare_mixin(&Mixin::layer("Other", |spec| spec));
        let base = realm.define_class(ClassSpec::new("Object"));

        let application = m.invoke(&realm, base).unwrap();
        let subclass = realm.extend(application, ClassSpec::new("C")).unwrap();
        let object = realm.construct(subclass, &[]).unwrap();

        assert!(realm.instance_of(&object, &m).unwrap());
        assert!(realm.is_instance_of_class(&object, subclass).unwrap());
        // No check installed on `other`
        assert!(!realm.instance_of(&object, &other).unwrap());
        // Installing again is a no-op and returns the same mixin
        assert_eq!(realm.has_instance(&m), m);
    }

    #[test]
    fn test_has_instance_visible_through_wrappers() {
        let realm = Realm::new();
        let raw = Mixin::layer("M", |spec| spec);
        let composite = realm.mixin(&raw);
        realm.has_instance(&raw);
        let base = realm.define_class(ClassSpec::new("Object"));

        let application = composite.invoke(&realm, base).unwrap();
        assert!(realm.instance_of(&application, &composite).unwrap());
        assert!(realm.instance_of(&application, &raw).unwrap());
        assert!(!realm.instance_of(&base, &raw).unwrap());
    }

    #[test]
    fn test_mixin_decoration_is_memoized() {
        let realm = Realm::new();
        let raw = Mixin::layer("M", |spec| spec);
        let first = realm.mixin(&raw);
        let second = realm.mixin(&raw);

        assert_eq!(first, second);
        assert_ne!(first, raw);
        assert_eq!(realm.unwrap(&first), raw);
    }

    #[test]
    fn test_concurrent_cached_application_converges() {
        let realm = Realm::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let cached = realm.cached(&realm.bare_mixin(&counting("M", &counter)));
        let base = realm.define_class(ClassSpec::new("Base"));

        let results: Vec<ClassId> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cached.invoke(&realm, base).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
