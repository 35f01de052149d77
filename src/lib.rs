// Copyright 2025 Cowboy AI, LLC.

//! # CIM Mixin
//!
//! Build classes by layering independent, reusable behavior units
//! ("mixins") onto a base class, in order, while keeping type-membership
//! checks working and avoiding accidental duplicate layering.
//!
//! Classes live in a [`Realm`]: an arena of [`ClassDescriptor`]s linked to
//! their parents, with instances ([`Object`]), method dispatch with
//! explicit `super` calls, and constructor argument forwarding.
//!
//! A [`Mixin`] is an identified transformation from a base class to a
//! class extending it. The realm provides:
//! - **Identity & Wrapping**: [`Realm::wrap`], [`Realm::unwrap`]
//! - **Application Registry**: [`Realm::apply`], [`Realm::is_application_of`]
//! - **Membership Query**: [`Realm::has_mixin`]
//! - **Decorators**: [`Realm::cached`], [`Realm::dedupe`], [`Realm::has_instance`]
//! - **Composite Decorator**: [`Realm::bare_mixin`], [`Realm::mixin`]
//! - **Fluent Builder**: [`Realm::mix`] and [`MixinBuilder::with`]
//!
//! ```rust
//! use cim_mixin::{ClassSpec, Mixin, Realm};
//! use serde_json::json;
//!
//! let realm = Realm::new();
//! let ground_force = realm.define_class(ClassSpec::new("GroundForce"));
//! let shooter = Mixin::layer("Shooter", |spec| {
//!     spec.method("shoot", |_cx, _args| Ok(json!("bang")))
//! });
//!
//! let tank = realm.mix(ground_force).with([&shooter]).unwrap();
//! let t = realm.construct(tank, &[]).unwrap();
//! assert!(realm.instance_of(&t, &shooter).unwrap());
//! ```

#![warn(missing_docs)]

mod application;
mod builder;
mod class;
mod config;
mod decorators;
mod errors;
mod identifiers;
mod mixin;
mod realm;
mod wrapping;

pub use application::Ancestry;
pub use builder::MixinBuilder;
pub use class::{ClassDescriptor, ClassInfo, ClassSpec, ConstructorFn, Invocation, MethodFn, Object, StaticFn};
pub use config::RealmConfig;
pub use errors::{MixinError, MixinResult};
pub use identifiers::{ClassId, MixinId};
pub use mixin::{Mixin, MixinFn};
pub use realm::Realm;

/// JSON value type used for fields, arguments and return values
pub use serde_json::Value;
