// Copyright 2025 Cowboy AI, LLC.

//! Airplanes, helicopters and tanks built from shared behavior layers
//!
//! This example shows:
//! - Composing one base with different mixin lists
//! - A mixin that relies on fields of the class it extends
//! - Constructor arguments flowing through a mixin layer

use cim_mixin::{ClassSpec, Mixin, MixinResult, Realm, Value};
use serde_json::json;

fn main() -> MixinResult<()> {
    let realm = Realm::new();

    let air_force = realm.define_class(
        ClassSpec::new("AirForce")
            .field("xPos", json!(0))
            .field("yPos", json!(0)),
    );
    let ground_force = realm.define_class(
        ClassSpec::new("GroundForce")
            .field("xPos", json!(0))
            .field("yPos", json!(0)),
    );

    let bomber = Mixin::layer("Bomber", |spec| {
        spec.method("bomb", |_cx, _args| Ok(json!("bombs away")))
    });
    let shooter = Mixin::layer("Shooter", |spec| {
        spec.method("shoot", |_cx, _args| Ok(json!("pew")))
    });
    // Needs xPos/yPos from whatever it extends
    let spawner = Mixin::layer("Spawner", |spec| {
        spec.method("spawn", |cx, args| {
            cx.set("xPos", args.first().cloned().unwrap_or(json!(0)));
            cx.set("yPos", args.get(1).cloned().unwrap_or(json!(0)));
            Ok(Value::Null)
        })
    });

    let airplane = realm.mix(air_force).with([&spawner, &shooter, &bomber])?;
    let helicopter = realm.mix(air_force).with([&spawner, &shooter])?;
    let tank = realm.mix(ground_force).with([&spawner, &shooter])?;
    let fortification = realm.mix(ground_force).with([&shooter])?;

    let plane = realm.construct(airplane, &[])?;
    realm.invoke(&plane, "spawn", &[json!(12), json!(40)])?;
    println!("Airplane at ({}, {})", plane.get("xPos").unwrap_or_default(), plane.get("yPos").unwrap_or_default());
    println!("Airplane: {}", realm.invoke(&plane, "bomb", &[])?);

    for (label, class) in [("Helicopter", helicopter), ("Tank", tank), ("Fortification", fortification)] {
        let unit = realm.construct(class, &[])?;
        println!(
            "{label}: shoots={} spawns={} bombs={}",
            realm.instance_of(&unit, &shooter)?,
            realm.instance_of(&unit, &spawner)?,
            realm.instance_of(&unit, &bomber)?,
        );
    }

    // Helicopter and airplane share the Spawner and Shooter layers on AirForce
    println!("Helicopter chain: {:?}", realm.ancestors(helicopter)?);
    println!("Airplane chain:   {:?}", realm.ancestors(airplane)?);

    let super_class = realm.define_class(ClassSpec::new("MySuperClass").constructor(|_cx, args| {
        let (num, text) = (args.first().cloned().unwrap_or_default(), args.get(1).cloned().unwrap_or_default());
        println!("SuperClass {{ numArg: {num}, strArg: {text} }}");
        Ok(())
    }));
    let logging = Mixin::layer("MyMixin", |spec| {
        spec.constructor(|cx, args| {
            cx.super_init(args)?;
            println!("MyMixin {{ args: {:?} }}", args);
            Ok(())
        })
    });
    let mixed = realm.extend(
        realm.mix(super_class).with([&logging])?,
        ClassSpec::new("MixedClass").constructor(|cx, args| {
            cx.super_init(args)?;
            let (num, text) = (args.first().cloned().unwrap_or_default(), args.get(1).cloned().unwrap_or_default());
            println!("MixedClass {{ numArg: {num}, strArg: {text} }}");
            Ok(())
        }),
    )?;
    realm.construct(mixed, &[json!(42), json!("hello world")])?;

    println!("{}", serde_json::to_string_pretty(&realm.describe(airplane)?).unwrap_or_default());
    Ok(())
}
