// Copyright 2025 Cowboy AI, LLC.

//! Mixin identity and wrapping
//!
//! Decorators hand out new [`Mixin`] values, but recognition has to work
//! against the undecorated original. The registry keeps a side-table from
//! [`MixinId`] to metadata: the wrap link, attached properties and the
//! instance-check flag. Following wrap links always ends at the original,
//! and property lookups fall through the same links so a wrapper sees what
//! was attached to the mixin it wraps.

use crate::identifiers::MixinId;
use crate::mixin::Mixin;
use crate::realm::Realm;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{trace, warn};

pub(crate) struct MixinRecord {
    mixin: Mixin,
    wraps: Option<MixinId>,
    properties: HashMap<String, Value>,
    instance_check: bool,
}

impl MixinRecord {
    fn new(mixin: Mixin) -> Self {
        Self {
            mixin,
            wraps: None,
            properties: HashMap::new(),
            instance_check: false,
        }
    }
}

/// Side-table of per-mixin metadata; records are never removed
pub(crate) struct MixinRegistry {
    records: DashMap<MixinId, MixinRecord>,
    // Held across check-then-write on wrap links and instance checks
    writes: Mutex<()>,
}

impl MixinRegistry {
    pub(crate) fn new() -> Self {
        Self {
            records: DashMap::new(),
            writes: Mutex::new(()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn register(&self, mixin: &Mixin) {
        self.records
            .entry(mixin.id())
            .or_insert_with(|| MixinRecord::new(mixin.clone()));
    }

    fn wraps(&self, id: MixinId) -> Option<MixinId> {
        self.records.get(&id).and_then(|record| record.wraps)
    }

    /// `id` followed by every mixin it wraps, innermost last
    fn lineage(&self, id: MixinId) -> Vec<MixinId> {
        let mut chain = vec![id];
        let mut cursor = id;
        while let Some(next) = self.wraps(cursor) {
            chain.push(next);
            cursor = next;
        }
        chain
    }

    /// Point `wrapper` at `original`. Refuses links that would close a cycle.
    pub(crate) fn link(&self, original: &Mixin, wrapper: &Mixin) -> bool {
        self.register(original);
        self.register(wrapper);
        let _writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        if self.lineage(original.id()).contains(&wrapper.id()) {
            return false;
        }
        if let Some(mut record) = self.records.get_mut(&wrapper.id()) {
            record.wraps = Some(original.id());
        }
        true
    }

    pub(crate) fn root_id(&self, id: MixinId) -> MixinId {
        self.lineage(id).last().copied().unwrap_or(id)
    }

    pub(crate) fn mixin(&self, id: MixinId) -> Option<Mixin> {
        self.records.get(&id).map(|record| record.mixin.clone())
    }

    pub(crate) fn name_of(&self, id: MixinId) -> Option<String> {
        self.records
            .get(&id)
            .map(|record| record.mixin.name().to_string())
    }

    pub(crate) fn set_property(&self, mixin: &Mixin, key: String, value: Value) -> Option<Value> {
        self.register(mixin);
        self.records
            .get_mut(&mixin.id())
            .and_then(|mut record| record.properties.insert(key, value))
    }

    pub(crate) fn property(&self, id: MixinId, key: &str) -> Option<Value> {
        self.lineage(id).into_iter().find_map(|link| {
            self.records
                .get(&link)
                .and_then(|record| record.properties.get(key).cloned())
        })
    }

    /// Nearest mixin along the wrap links that carries an instance check
    pub(crate) fn instance_check_owner(&self, id: MixinId) -> Option<MixinId> {
        self.lineage(id).into_iter().find(|link| {
            self.records
                .get(link)
                .is_some_and(|record| record.instance_check)
        })
    }

    /// Install the instance check on `mixin`; false if one is already visible
    pub(crate) fn install_instance_check(&self, mixin: &Mixin) -> bool {
        self.register(mixin);
        let _writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        if self.instance_check_owner(mixin.id()).is_some() {
            return false;
        }
        if let Some(mut record) = self.records.get_mut(&mixin.id()) {
            record.instance_check = true;
        }
        true
    }
}

impl Realm {
    /// Register `wrapper` as a decoration of `original` and return it
    ///
    /// After wrapping, [`Realm::unwrap`] on the wrapper yields the same
    /// original as on `original`, and properties attached to `original`
    /// are visible through the wrapper. The original's own wrap link is
    /// left untouched.
    pub fn wrap(&self, original: &Mixin, wrapper: Mixin) -> Mixin {
        if self.registry.link(original, &wrapper) {
            trace!(
                wrapper = %wrapper.id(),
                original = %original.id(),
                name = wrapper.name(),
                "Wrapped mixin"
            );
        } else {
            warn!(
                wrapper = %wrapper.id(),
                original = %original.id(),
                "Refusing wrap link that would form a cycle"
            );
        }
        wrapper
    }

    /// The original mixin behind any number of wrap layers
    ///
    /// Returns `mixin` itself when it was never wrapped.
    pub fn unwrap(&self, mixin: &Mixin) -> Mixin {
        let root = self.registry.root_id(mixin.id());
        if root == mixin.id() {
            return mixin.clone();
        }
        self.registry.mixin(root).unwrap_or_else(|| mixin.clone())
    }

    /// Identity of the original mixin behind `mixin`
    pub fn original_id(&self, mixin: &Mixin) -> MixinId {
        self.registry.root_id(mixin.id())
    }

    /// Attach a property to `mixin`, returning the previous own value
    pub fn set_mixin_property(
        &self,
        mixin: &Mixin,
        key: impl Into<String>,
        value: Value,
    ) -> Option<Value> {
        self.registry.set_property(mixin, key.into(), value)
    }

    /// Read a property from `mixin` or anything it wraps
    pub fn mixin_property(&self, mixin: &Mixin, key: &str) -> Option<Value> {
        self.registry.property(mixin.id(), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop(name: &str) -> Mixin {
        Mixin::new(name, |_realm, base| Ok(base))
    }

    /// Test unwrap through nested wrappers
    ///
    /// ```mermaid
    /// graph LR
    ///     W2 -->|wraps| W1 -->|wraps| M
    ///     W2 -.->|unwrap| M
    /// ```
    #[test]
    fn test_unwrap_nested() {
        let realm = Realm::new();
        let m = noop("M");
        let w1 = realm.wrap(&m, noop("W1"));
        let w2 = realm.wrap(&w1, noop("W2"));

        assert_eq!(realm.unwrap(&w2), m);
        assert_eq!(realm.unwrap(&w1), m);
        assert_eq!(realm.original_id(&w2), m.id());
    }

    #[test]
    fn test_unwrap_plain_mixin_is_itself() {
        let realm = Realm::new();
        let m = noop("M");
        assert_eq!(realm.unwrap(&m), m);
        assert_eq!(realm.unwrap(&realm.unwrap(&m)), m);
    }

    #[test]
    fn test_wrapper_inherits_properties() {
        let realm = Realm::new();
        let m = noop("M");
        realm.set_mixin_property(&m, "test", json!(true));
        let wrapper = realm.wrap(&m, noop("W"));

        assert_eq!(realm.mixin_property(&wrapper, "test"), Some(json!(true)));

        // Own properties shadow inherited ones and don't leak back
        realm.set_mixin_property(&wrapper, "test", json!(false));
        assert_eq!(realm.mixin_property(&wrapper, "test"), Some(json!(false)));
        assert_eq!(realm.mixin_property(&m, "test"), Some(json!(true)));
        assert_eq!(realm.mixin_property(&m, "missing"), None);
    }

    #[test]
    fn test_properties_added_after_wrapping_are_visible() {
        let realm = Realm::new();
        let m = noop("M");
        let wrapper = realm.wrap(&m, noop("W"));
        realm.set_mixin_property(&m, "late", json!(1));
        assert_eq!(realm.mixin_property(&wrapper, "late"), Some(json!(1)));
    }

    #[test]
    fn test_cyclic_wrap_refused() {
        let realm = Realm::new();
        let m = noop("M");
        let w = realm.wrap(&m, noop("W"));

        // Would make M wrap its own wrapper
        let returned = realm.wrap(&w, m.clone());
        assert_eq!(returned, m);
        assert_eq!(realm.unwrap(&m), m);
        assert_eq!(realm.unwrap(&w), m);
    }

    #[test]
    fn test_instance_check_install_is_idempotent() {
        let registry = MixinRegistry::new();
        let m = noop("M");
        assert!(registry.install_instance_check(&m));
        assert!(!registry.install_instance_check(&m));
        assert_eq!(registry.instance_check_owner(m.id()), Some(m.id()));
    }

    #[test]
    fn test_opposing_concurrent_wraps_never_cycle() {
        for _ in 0..64 {
            let realm = Realm::new();
            let a = noop("A");
            let b = noop("B");

            std::thread::scope(|scope| {
                scope.spawn(|| realm.wrap(&a, b.clone()));
                scope.spawn(|| realm.wrap(&b, a.clone()));
            });

            // Exactly one link won, so both resolve to the same original
            let original = realm.original_id(&a);
            assert_eq!(realm.original_id(&b), original);
            assert!(original == a.id() || original == b.id());
        }
    }

    #[test]
    fn test_concurrent_instance_check_installs_once() {
        let registry = MixinRegistry::new();
        let m = noop("M");

        let installed = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.install_instance_check(&m)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|&installed| installed)
                .count()
        });
        assert_eq!(installed, 1);
    }
}
