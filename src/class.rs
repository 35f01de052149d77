// Copyright 2025 Cowboy AI, LLC.

//! Class descriptors, instances and method dispatch contexts
//!
//! Classes live in a [`Realm`] arena and point at their parent by
//! [`ClassId`]. A class is immutable once defined, apart from two slots:
//! the mixin stamp, which is written at most once, and the application
//! cache, which only grows.

use crate::errors::{MixinError, MixinResult};
use crate::identifiers::{ClassId, MixinId};
use crate::realm::Realm;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock, TryLockError};

/// Instance method body
pub type MethodFn = dyn Fn(&Invocation<'_>, &[Value]) -> MixinResult<Value> + Send + Sync;

/// Constructor body
pub type ConstructorFn = dyn Fn(&Invocation<'_>, &[Value]) -> MixinResult<()> + Send + Sync;

/// Static (class-level) method body
pub type StaticFn = dyn Fn(&Realm, &[Value]) -> MixinResult<Value> + Send + Sync;

pub(crate) type ApplicationSlot = Arc<Mutex<Option<ClassId>>>;

/// Blueprint for a new class
///
/// # Examples
///
/// ```rust
/// use cim_mixin::{ClassSpec, Realm};
/// use serde_json::json;
///
/// let realm = Realm::new();
/// let force = realm.define_class(
///     ClassSpec::new("AirForce")
///         .field("xPos", json!(0))
///         .method("altitude", |_cx, _args| Ok(json!(10_000))),
/// );
/// let plane = realm.construct(force, &[]).unwrap();
/// assert_eq!(realm.invoke(&plane, "altitude", &[]).unwrap(), json!(10_000));
/// ```
#[derive(Clone)]
pub struct ClassSpec {
    name: String,
    constructor: Option<Arc<ConstructorFn>>,
    methods: HashMap<String, Arc<MethodFn>>,
    statics: HashMap<String, Arc<StaticFn>>,
    fields: HashMap<String, Value>,
}

impl ClassSpec {
    /// Start a blueprint with the given class name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: None,
            methods: HashMap::new(),
            statics: HashMap::new(),
            fields: HashMap::new(),
        }
    }

    /// Set an explicit constructor
    ///
    /// Without one, constructor arguments flow unchanged to the nearest
    /// ancestor that has a constructor.
    pub fn constructor<F>(mut self, body: F) -> Self
    where
        F: Fn(&Invocation<'_>, &[Value]) -> MixinResult<()> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(body));
        self
    }

    /// Add an instance method, overriding any inherited one of the same name
    pub fn method<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Invocation<'_>, &[Value]) -> MixinResult<Value> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(body));
        self
    }

    /// Add a static method
    pub fn static_method<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Realm, &[Value]) -> MixinResult<Value> + Send + Sync + 'static,
    {
        self.statics.insert(name.into(), Arc::new(body));
        self
    }

    /// Declare a field with its initial value
    pub fn field(mut self, name: impl Into<String>, initial: Value) -> Self {
        self.fields.insert(name.into(), initial);
        self
    }

    /// Name the class will carry
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ClassSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("ClassSpec")
            .field("name", &self.name)
            .field("has_constructor", &self.constructor.is_some())
            .field("methods", &methods)
            .finish()
    }
}

/// A class as stored in the realm arena
pub struct ClassDescriptor {
    id: ClassId,
    name: String,
    parent: Option<ClassId>,
    constructor: Option<Arc<ConstructorFn>>,
    methods: HashMap<String, Arc<MethodFn>>,
    statics: HashMap<String, Arc<StaticFn>>,
    fields: HashMap<String, Value>,
    applied_mixin: OnceLock<MixinId>,
    applications: OnceLock<DashMap<MixinId, ApplicationSlot>>,
}

impl ClassDescriptor {
    pub(crate) fn new(id: ClassId, parent: Option<ClassId>, spec: ClassSpec) -> Self {
        Self {
            id,
            name: spec.name,
            parent,
            constructor: spec.constructor,
            methods: spec.methods,
            statics: spec.statics,
            fields: spec.fields,
            applied_mixin: OnceLock::new(),
            applications: OnceLock::new(),
        }
    }

    /// Arena id of this class
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Immediate ancestor, `None` for a root class
    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    /// The original mixin this class is an application of, if any
    pub fn applied_mixin(&self) -> Option<MixinId> {
        self.applied_mixin.get().copied()
    }

    /// Whether this class defines `name` itself (not through an ancestor)
    pub fn has_own_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Whether this class defines its own constructor
    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Number of mixin applications memoized against this class
    pub fn cached_application_count(&self) -> usize {
        self.applications.get().map_or(0, |cache| {
            cache
                .iter()
                // A slot locked by an application in progress is not cached yet
                .filter(|slot| match slot.value().try_lock() {
                    Ok(cached) => cached.is_some(),
                    Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().is_some(),
                    Err(TryLockError::WouldBlock) => false,
                })
                .count()
        })
    }

    pub(crate) fn method(&self, name: &str) -> Option<Arc<MethodFn>> {
        self.methods.get(name).cloned()
    }

    pub(crate) fn static_method(&self, name: &str) -> Option<Arc<StaticFn>> {
        self.statics.get(name).cloned()
    }

    pub(crate) fn constructor(&self) -> Option<Arc<ConstructorFn>> {
        self.constructor.clone()
    }

    pub(crate) fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    /// Record `mixin` as the producer of this class.
    ///
    /// Returns the already recorded id when a different mixin got here first.
    pub(crate) fn stamp(&self, mixin: MixinId) -> Result<(), MixinId> {
        let existing = *self.applied_mixin.get_or_init(|| mixin);
        if existing == mixin {
            Ok(())
        } else {
            Err(existing)
        }
    }

    /// Cache slot for applications of `mixin` to this class, created on demand
    pub(crate) fn application_slot(&self, mixin: MixinId) -> ApplicationSlot {
        let cache = self.applications.get_or_init(DashMap::new);
        let slot = cache.entry(mixin).or_default();
        Arc::clone(slot.value())
    }

    fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    fn static_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.statics.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("applied_mixin", &self.applied_mixin())
            .field("methods", &self.method_names())
            .finish()
    }
}

/// Serializable snapshot of a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    /// Arena id
    pub id: ClassId,
    /// Class name
    pub name: String,
    /// Immediate ancestor
    pub parent: Option<ClassId>,
    /// Original mixin this class is an application of
    pub applied_mixin: Option<MixinId>,
    /// Name of that mixin, when known to the realm
    pub applied_mixin_name: Option<String>,
    /// Own instance methods, sorted
    pub methods: Vec<String>,
    /// Own static methods, sorted
    pub static_methods: Vec<String>,
    /// Whether the class defines its own constructor
    pub has_constructor: bool,
    /// Applications memoized against this class
    pub cached_applications: usize,
}

impl ClassInfo {
    pub(crate) fn from_descriptor(descriptor: &ClassDescriptor, mixin_name: Option<String>) -> Self {
        Self {
            id: descriptor.id,
            name: descriptor.name.clone(),
            parent: descriptor.parent,
            applied_mixin: descriptor.applied_mixin(),
            applied_mixin_name: mixin_name,
            methods: descriptor.method_names(),
            static_methods: descriptor.static_names(),
            has_constructor: descriptor.has_constructor(),
            cached_applications: descriptor.cached_application_count(),
        }
    }
}

/// An instance of a realm class
#[derive(Debug)]
pub struct Object {
    class: ClassId,
    fields: RwLock<HashMap<String, Value>>,
}

impl Object {
    pub(crate) fn new(class: ClassId, fields: HashMap<String, Value>) -> Self {
        Self {
            class,
            fields: RwLock::new(fields),
        }
    }

    /// The concrete class this object was constructed from
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Read a field
    pub fn get(&self, field: &str) -> Option<Value> {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field)
            .cloned()
    }

    /// Write a field, returning the previous value
    pub fn set(&self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(field.into(), value)
    }

    /// Copy of all fields
    pub fn fields(&self) -> HashMap<String, Value> {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Context handed to constructors and instance methods
///
/// `owner` is the class that defines the running body, which is where
/// `super` lookups start from.
pub struct Invocation<'a> {
    realm: &'a Realm,
    this: &'a Object,
    owner: ClassId,
}

impl<'a> Invocation<'a> {
    pub(crate) fn new(realm: &'a Realm, this: &'a Object, owner: ClassId) -> Self {
        Self { realm, this, owner }
    }

    /// Realm the receiver belongs to
    pub fn realm(&self) -> &'a Realm {
        self.realm
    }

    /// The receiver
    pub fn this(&self) -> &'a Object {
        self.this
    }

    /// Class defining the running body
    pub fn owner(&self) -> ClassId {
        self.owner
    }

    /// Read a field on the receiver
    pub fn get(&self, field: &str) -> Option<Value> {
        self.this.get(field)
    }

    /// Write a field on the receiver
    pub fn set(&self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.this.set(field, value)
    }

    /// Dispatch on the receiver's concrete class
    pub fn call(&self, method: &str, args: &[Value]) -> MixinResult<Value> {
        self.realm.invoke(self.this, method, args)
    }

    /// Call the implementation `method` would have without the owner's override
    pub fn call_super(&self, method: &str, args: &[Value]) -> MixinResult<Value> {
        let owner = self.realm.class(self.owner)?;
        match self.realm.resolve_method(owner.parent(), method)? {
            Some((defined_on, body)) => body(&Invocation::new(self.realm, self.this, defined_on), args),
            None => Err(MixinError::MethodNotFound {
                class: owner.name().to_string(),
                method: method.to_string(),
            }),
        }
    }

    /// Run the parent's constructor chain with `args`
    pub fn super_init(&self, args: &[Value]) -> MixinResult<()> {
        let parent = self.realm.class(self.owner)?.parent();
        self.realm.initialize(parent, self.this, args)
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("this", &self.this)
            .field("owner", &self.owner)
            .finish()
    }
}
