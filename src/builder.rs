// Copyright 2025 Cowboy AI, LLC.

//! Fluent composition: `realm.mix(base).with([&a, &b, &c])`

use crate::errors::{MixinError, MixinResult};
use crate::identifiers::ClassId;
use crate::mixin::Mixin;
use crate::realm::Realm;
use tracing::debug;

/// Applies an ordered list of mixins to a base class
///
/// Created by [`Realm::mix`].
#[derive(Debug)]
pub struct MixinBuilder<'r> {
    realm: &'r Realm,
    base: Option<ClassId>,
}

impl Realm {
    /// Start a composition on `base`, or on the realm's empty root when `None`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cim_mixin::{ClassSpec, Mixin, Realm};
    /// use serde_json::json;
    ///
    /// let realm = Realm::new();
    /// let air_force = realm.define_class(ClassSpec::new("AirForce"));
    /// let shooter = Mixin::layer("Shooter", |spec| spec.method("shoot", |_cx, _args| Ok(json!("bang"))));
    /// let bomber = Mixin::layer("Bomber", |spec| spec.method("bomb", |_cx, _args| Ok(json!("boom"))));
    ///
    /// let airplane = realm.mix(air_force).with([&shooter, &bomber]).unwrap();
    /// let plane = realm.construct(airplane, &[]).unwrap();
    /// assert!(realm.has_mixin(&plane, &shooter).unwrap());
    /// assert_eq!(realm.invoke(&plane, "bomb", &[]).unwrap(), json!("boom"));
    /// ```
    pub fn mix(&self, base: impl Into<Option<ClassId>>) -> MixinBuilder<'_> {
        MixinBuilder {
            realm: self,
            base: base.into(),
        }
    }
}

impl MixinBuilder<'_> {
    /// Apply `mixins` left to right and return the most derived class
    ///
    /// Every mixin gets instance-of support and the standard decoration
    /// before any application runs. The last mixin ends up as the most
    /// derived layer. An empty list returns the base unchanged.
    pub fn with<'m, I>(self, mixins: I) -> MixinResult<ClassId>
    where
        I: IntoIterator<Item = &'m Mixin>,
    {
        let mixins: Vec<&Mixin> = mixins.into_iter().collect();
        if let Some(max) = self.realm.config().max_mixins_per_composition {
            if mixins.len() > max {
                return Err(MixinError::TooManyMixins {
                    given: mixins.len(),
                    max,
                });
            }
        }

        let base = match self.base {
            Some(base) => {
                self.realm.class(base)?;
                base
            }
            None => self.realm.empty_root(),
        };

        let decorated: Vec<Mixin> = mixins
            .iter()
            .map(|mixin| {
                self.realm.has_instance(mixin);
                self.realm.mixin(mixin)
            })
            .collect();

        let result = decorated
            .iter()
            .try_fold(base, |current, mixin| mixin.invoke(self.realm, current))?;
        debug!(base = %base, result = %result, mixins = decorated.len(), "Composed mixins");
        Ok(result)
    }
}
