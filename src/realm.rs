// Copyright 2025 Cowboy AI, LLC.

//! The realm: class arena, mixin registry and object model operations
//!
//! A [`Realm`] owns every class it defines, stored in an append-only arena
//! and linked to its parent by [`ClassId`]. A class can only extend a
//! class that already exists, so ancestor chains are acyclic by
//! construction. Walks are still capped at
//! [`RealmConfig::max_chain_depth`].

use crate::application::Ancestry;
use crate::class::{ClassDescriptor, ClassInfo, ClassSpec, Invocation, MethodFn, Object};
use crate::config::RealmConfig;
use crate::errors::{MixinError, MixinResult};
use crate::identifiers::{ClassId, MixinId};
use crate::mixin::Mixin;
use crate::wrapping::MixinRegistry;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, trace};

/// Owner of a class hierarchy and the mixins layered onto it
pub struct Realm {
    config: RealmConfig,
    classes: RwLock<Vec<Arc<ClassDescriptor>>>,
    pub(crate) registry: MixinRegistry,
    pub(crate) composites: DashMap<MixinId, Mixin>,
    empty_root: OnceLock<ClassId>,
}

impl Realm {
    /// Create a realm with default limits
    pub fn new() -> Self {
        Self::build(RealmConfig::default())
    }

    /// Create a realm with the given limits
    ///
    /// Fails with [`MixinError::Configuration`] when the limits would make
    /// walks over well-formed chains fail.
    pub fn with_config(config: RealmConfig) -> MixinResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RealmConfig) -> Self {
        Self {
            config,
            classes: RwLock::new(Vec::new()),
            registry: MixinRegistry::new(),
            composites: DashMap::new(),
            empty_root: OnceLock::new(),
        }
    }

    /// Active limits
    pub fn config(&self) -> &RealmConfig {
        &self.config
    }

    /// Define a root class
    pub fn define_class(&self, spec: ClassSpec) -> ClassId {
        self.insert(None, spec)
    }

    /// Define a class extending `base`
    pub fn extend(&self, base: ClassId, spec: ClassSpec) -> MixinResult<ClassId> {
        self.class(base)?;
        Ok(self.insert(Some(base), spec))
    }

    fn insert(&self, parent: Option<ClassId>, spec: ClassSpec) -> ClassId {
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        let id = ClassId::from_index(classes.len());
        trace!(class = %id, name = spec.name(), parent = ?parent, "Defining class");
        classes.push(Arc::new(ClassDescriptor::new(id, parent, spec)));
        id
    }

    /// Look up a class descriptor
    pub fn class(&self, id: ClassId) -> MixinResult<Arc<ClassDescriptor>> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id.index())
            .cloned()
            .ok_or(MixinError::UnknownClass(id))
    }

    /// Number of classes defined so far
    pub fn class_count(&self) -> usize {
        self.classes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// The synthetic root used by `mix(None)`, created once per realm
    pub fn empty_root(&self) -> ClassId {
        *self
            .empty_root
            .get_or_init(|| self.define_class(ClassSpec::new("EmptyRoot")))
    }

    /// Walk from `start` towards the root, returning the first value `visit` produces
    pub(crate) fn find_in_chain<T>(
        &self,
        start: Option<ClassId>,
        mut visit: impl FnMut(&ClassDescriptor) -> Option<T>,
    ) -> MixinResult<Option<T>> {
        let Some(origin) = start else {
            return Ok(None);
        };
        let mut cursor = Some(origin);
        let mut depth = 0;
        while let Some(id) = cursor {
            if depth >= self.config.max_chain_depth {
                return Err(MixinError::MalformedAncestorChain {
                    class: origin,
                    depth: self.config.max_chain_depth,
                });
            }
            let descriptor = self.class(id)?;
            if let Some(found) = visit(&descriptor) {
                return Ok(Some(found));
            }
            cursor = descriptor.parent();
            depth += 1;
        }
        Ok(None)
    }

    /// Ancestor chain of `class`, most derived first
    pub fn ancestors(&self, class: ClassId) -> MixinResult<Vec<ClassId>> {
        let mut chain = Vec::new();
        self.find_in_chain(Some(class), |descriptor| {
            chain.push(descriptor.id());
            None::<()>
        })?;
        Ok(chain)
    }

    /// Serializable snapshot of a class
    pub fn describe(&self, class: ClassId) -> MixinResult<ClassInfo> {
        let descriptor = self.class(class)?;
        let mixin_name = descriptor
            .applied_mixin()
            .and_then(|mixin| self.registry.name_of(mixin));
        Ok(ClassInfo::from_descriptor(&descriptor, mixin_name))
    }

    /// Instantiate `class`
    ///
    /// Field defaults are seeded root first so derived classes win, then
    /// the nearest constructor on the chain runs with `args`.
    pub fn construct(&self, class: ClassId, args: &[Value]) -> MixinResult<Object> {
        let mut fields = HashMap::new();
        for id in self.ancestors(class)?.into_iter().rev() {
            let descriptor = self.class(id)?;
            fields.extend(
                descriptor
                    .fields()
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            );
        }

        let object = Object::new(class, fields);
        self.initialize(Some(class), &object, args)?;
        debug!(class = %class, args = args.len(), "Constructed object");
        Ok(object)
    }

    pub(crate) fn initialize(
        &self,
        from: Option<ClassId>,
        this: &Object,
        args: &[Value],
    ) -> MixinResult<()> {
        let constructor = self.find_in_chain(from, |descriptor| {
            descriptor
                .constructor()
                .map(|body| (descriptor.id(), body))
        })?;
        match constructor {
            Some((owner, body)) => body(&Invocation::new(self, this, owner), args),
            None => Ok(()),
        }
    }

    pub(crate) fn resolve_method(
        &self,
        from: Option<ClassId>,
        name: &str,
    ) -> MixinResult<Option<(ClassId, Arc<MethodFn>)>> {
        self.find_in_chain(from, |descriptor| {
            descriptor.method(name).map(|body| (descriptor.id(), body))
        })
    }

    /// Call an instance method, dispatching on the object's concrete class
    pub fn invoke(&self, object: &Object, method: &str, args: &[Value]) -> MixinResult<Value> {
        match self.resolve_method(Some(object.class()), method)? {
            Some((owner, body)) => body(&Invocation::new(self, object, owner), args),
            None => Err(MixinError::MethodNotFound {
                class: self.class(object.class())?.name().to_string(),
                method: method.to_string(),
            }),
        }
    }

    /// Whether `method` resolves anywhere on the object's chain
    pub fn responds_to(&self, object: &Object, method: &str) -> MixinResult<bool> {
        Ok(self.resolve_method(Some(object.class()), method)?.is_some())
    }

    /// Call a static method; statics are inherited along the chain
    pub fn call_static(&self, class: ClassId, method: &str, args: &[Value]) -> MixinResult<Value> {
        let body = self.find_in_chain(Some(class), |descriptor| descriptor.static_method(method))?;
        match body {
            Some(body) => body(self, args),
            None => Err(MixinError::StaticMethodNotFound {
                class: self.class(class)?.name().to_string(),
                method: method.to_string(),
            }),
        }
    }

    /// Native instance-of against a concrete class
    pub fn is_instance_of_class(&self, target: &impl Ancestry, class: ClassId) -> MixinResult<bool> {
        let found = self.find_in_chain(Some(target.class_id()), |descriptor| {
            (descriptor.id() == class).then_some(())
        })?;
        Ok(found.is_some())
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("config", &self.config)
            .field("classes", &self.class_count())
            .field("mixins", &self.registry.len())
            .finish()
    }
}
