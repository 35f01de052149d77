// Copyright 2025 Cowboy AI, LLC.

//! The mixin value: an identified transformation from a base class to a derived class

use crate::class::ClassSpec;
use crate::errors::MixinResult;
use crate::identifiers::{ClassId, MixinId};
use crate::realm::Realm;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Body of a mixin: given a base class, produce a class extending it
pub type MixinFn = dyn Fn(&Realm, ClassId) -> MixinResult<ClassId> + Send + Sync;

/// A transformation from a base class to a derived class
///
/// Cloning a `Mixin` keeps its identity. Equality and hashing go by
/// [`MixinId`] only, so two mixins with identical bodies are still
/// different mixins.
///
/// # Examples
///
/// ```rust
/// use cim_mixin::{Mixin, Realm, ClassSpec};
/// use serde_json::json;
///
/// let shooter = Mixin::layer("Shooter", |spec| {
///     spec.method("shoot", |_cx, _args| Ok(json!("bang")))
/// });
///
/// let realm = Realm::new();
/// let base = realm.define_class(ClassSpec::new("GroundForce"));
/// let armed = shooter.invoke(&realm, base).unwrap();
/// assert_eq!(realm.class(armed).unwrap().parent(), Some(base));
/// ```
#[derive(Clone)]
pub struct Mixin {
    id: MixinId,
    name: Arc<str>,
    body: Arc<MixinFn>,
}

impl Mixin {
    /// Create a mixin from an arbitrary body
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Realm, ClassId) -> MixinResult<ClassId> + Send + Sync + 'static,
    {
        Self {
            id: MixinId::new(),
            name: Arc::from(name.into()),
            body: Arc::new(body),
        }
    }

    /// Create a mixin whose body extends the base with one new class
    ///
    /// `build` receives an empty [`ClassSpec`] carrying the mixin's name
    /// and adds the layer's members to it.
    pub fn layer<F>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn(ClassSpec) -> ClassSpec + Send + Sync + 'static,
    {
        let name: String = name.into();
        let class_name = name.clone();
        Self::new(name, move |realm, base| {
            realm.extend(base, build(ClassSpec::new(class_name.as_str())))
        })
    }

    /// Identity of this mixin
    pub fn id(&self) -> MixinId {
        self.id
    }

    /// Human readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the body against `base`
    pub fn invoke(&self, realm: &Realm, base: ClassId) -> MixinResult<ClassId> {
        (self.body)(realm, base)
    }
}

impl PartialEq for Mixin {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Mixin {}

impl Hash for Mixin {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Mixin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixin")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
