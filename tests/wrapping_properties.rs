// Copyright 2025 Cowboy AI, LLC.

//! Property tests for identity, membership and deduplication

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cim_mixin::{ClassSpec, Mixin, Realm};
use proptest::prelude::*;

fn noop(name: String) -> Mixin {
    Mixin::new(name, |_realm, base| Ok(base))
}

fn counted_layer(index: usize, runs: &Arc<AtomicUsize>) -> Mixin {
    let runs = Arc::clone(runs);
    Mixin::new(format!("M{index}"), move |realm, base| {
        runs.fetch_add(1, Ordering::SeqCst);
        realm.extend(base, ClassSpec::new(format!("M{index}")))
    })
}

proptest! {
    #[test]
    fn unwrap_reaches_original_through_any_depth(depth in 0usize..12) {
        let realm = Realm::new();
        let original = noop("original".to_string());
        let mut current = original.clone();
        for level in 0..depth {
            current = realm.wrap(&current, noop(format!("wrapper{level}")));
        }

        let unwrapped = realm.unwrap(&current);
        prop_assert_eq!(&unwrapped, &original);
        prop_assert_eq!(realm.unwrap(&unwrapped), unwrapped);
        prop_assert_eq!(realm.original_id(&current), original.id());
    }

    #[test]
    fn decorator_stacks_preserve_identity(stack in proptest::collection::vec(0u8..3, 0..8)) {
        let realm = Realm::new();
        let original = Mixin::layer("M", |spec| spec);
        let mut decorated = original.clone();
        for decorator in stack {
            decorated = match decorator {
                0 => realm.cached(&decorated),
                1 => realm.dedupe(&decorated),
                _ => realm.bare_mixin(&decorated),
            };
        }

        prop_assert_eq!(realm.unwrap(&decorated), original.clone());

        let base = realm.define_class(ClassSpec::new("Base"));
        let application = realm.apply(base, &decorated).unwrap();
        prop_assert!(realm.is_application_of(application, &original).unwrap());
        prop_assert!(realm.has_mixin(&application, &decorated).unwrap());
    }

    #[test]
    fn composition_runs_each_distinct_mixin_once(picks in proptest::collection::vec(0usize..5, 1..12)) {
        let realm = Realm::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let pool: Vec<Mixin> = (0..5).map(|index| counted_layer(index, &runs)).collect();
        let base = realm.define_class(ClassSpec::new("Base"));

        let chosen: Vec<&Mixin> = picks.iter().map(|&index| &pool[index]).collect();
        let derived = realm.mix(base).with(chosen).unwrap();
        let object = realm.construct(derived, &[]).unwrap();

        let distinct: BTreeSet<usize> = picks.iter().copied().collect();
        prop_assert_eq!(runs.load(Ordering::SeqCst), distinct.len());
        prop_assert_eq!(realm.ancestors(derived).unwrap().len(), distinct.len() + 1);
        for (index, mixin) in pool.iter().enumerate() {
            prop_assert_eq!(realm.has_mixin(&object, mixin).unwrap(), distinct.contains(&index));
        }
    }

    #[test]
    fn cached_converges_per_base(bases in 1usize..6, repeats in 1usize..4) {
        let realm = Realm::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let cached = realm.cached(&realm.bare_mixin(&counted_layer(0, &runs)));
        let roots: Vec<_> = (0..bases)
            .map(|index| realm.define_class(ClassSpec::new(format!("Base{index}"))))
            .collect();

        let mut applications = BTreeSet::new();
        for _ in 0..repeats {
            for root in &roots {
                applications.insert(cached.invoke(&realm, *root).unwrap());
            }
        }

        prop_assert_eq!(applications.len(), bases);
        prop_assert_eq!(runs.load(Ordering::SeqCst), bases);
    }
}
