mod common;

use chrono::Duration;
use structurebot_lib::{
    Error, Fitting, FuelPolicy, SlotCategory, Structure, TypeCatalog, TypeRegistry,
};

use common::{fixture_registry, now, raitaru_fitting};

fn raitaru(registry: &TypeRegistry) -> Structure {
    let hull = registry.resolve("Raitaru").expect("raitaru present");
    Structure::new(1, hull.type_id, hull.name.clone())
        .with_fitting(raitaru_fitting(registry))
        .with_fuel_expires(now() + Duration::days(3))
}

#[test]
fn fitted_raitaru_burns_eighteen_blocks_and_needs_fuel() {
    let registry = fixture_registry();
    let structure = raitaru(&registry);
    let policy = FuelPolicy::default();

    assert!(!structure.fitting().is_empty());
    assert_eq!(structure.fuel_rate(&registry).expect("rate"), 18.0);
    assert_eq!(structure.fuel_rate(&registry).expect("rate"), 18.0);
    assert!(structure
        .needs_fuel_at(&registry, &policy, now())
        .expect("evaluates"));
    assert!(structure.has_core());
    assert!(!structure.unanchoring());
}

#[test]
fn unanchoring_before_fuel_runs_out_needs_no_fuel() {
    let registry = fixture_registry();
    let structure = raitaru(&registry).with_unanchors_at(now() + Duration::days(2));

    assert!(structure.unanchoring());
    assert!(!structure
        .needs_fuel_at(&registry, &FuelPolicy::default(), now())
        .expect("evaluates"));
}

#[test]
fn unanchoring_after_fuel_runs_out_still_needs_fuel() {
    let registry = fixture_registry();
    let structure = raitaru(&registry).with_unanchors_at(now() + Duration::days(5));

    assert!(structure
        .needs_fuel_at(&registry, &FuelPolicy::default(), now())
        .expect("evaluates"));
}

#[test]
fn expiry_exactly_at_the_horizon_is_not_flagged() {
    let registry = fixture_registry();
    let policy = FuelPolicy::default();
    let hull = registry.resolve("Raitaru").expect("raitaru present");
    let structure = Structure::new(8, hull.type_id, hull.name.clone())
        .with_fitting(raitaru_fitting(&registry))
        .with_fuel_expires(now() + policy.warning_threshold);

    assert!(!structure
        .needs_fuel_at(&registry, &policy, now())
        .expect("evaluates"));
    assert!(structure
        .needs_fuel_at(&registry, &policy, now() + Duration::seconds(1))
        .expect("evaluates"));
}

#[test]
fn fuel_lasting_exactly_until_unanchored_needs_no_fuel() {
    let registry = fixture_registry();
    let structure = raitaru(&registry).with_unanchors_at(now() + Duration::days(3));

    assert_eq!(structure.fuel_expires(), structure.unanchors_at());
    assert!(!structure
        .needs_fuel_at(&registry, &FuelPolicy::default(), now())
        .expect("evaluates"));
}

#[test]
fn unfit_raitaru_burns_nothing() {
    let registry = fixture_registry();
    let hull = registry.resolve("Raitaru").expect("raitaru present");
    let structure = Structure::new(2, hull.type_id, hull.name.clone())
        .with_fuel_expires(now() + Duration::hours(1));

    assert!(structure.fitting().is_empty());
    assert_eq!(structure.fuel_rate(&registry).expect("rate"), 0.0);
    assert!(!structure
        .needs_fuel_at(&registry, &FuelPolicy::default(), now())
        .expect("evaluates"));
    assert!(!structure.has_core());
}

#[test]
fn fitted_structure_without_expiry_needs_no_fuel() {
    let registry = fixture_registry();
    let hull = registry.resolve("Raitaru").expect("raitaru present");
    let structure =
        Structure::new(3, hull.type_id, hull.name.clone()).with_fitting(raitaru_fitting(&registry));

    assert_eq!(structure.fuel_rate(&registry).expect("rate"), 18.0);
    assert!(!structure
        .needs_fuel_at(&registry, &FuelPolicy::default(), now())
        .expect("evaluates"));
}

#[test]
fn plenty_of_fuel_is_not_flagged() {
    let registry = fixture_registry();
    let hull = registry.resolve("Raitaru").expect("raitaru present");
    let structure = Structure::new(4, hull.type_id, hull.name.clone())
        .with_fitting(raitaru_fitting(&registry))
        .with_fuel_expires(now() + Duration::days(30));

    assert!(!structure
        .needs_fuel_at(&registry, &FuelPolicy::default(), now())
        .expect("evaluates"));
    assert!(structure
        .needs_fuel_at(&registry, &FuelPolicy::try_from_days(45).expect("policy"), now())
        .expect("evaluates"));
}

#[test]
fn fuel_rate_is_computed_once_per_structure() {
    let registry = fixture_registry();
    let structure = raitaru(&registry);
    assert_eq!(structure.fuel_rate(&registry).expect("rate"), 18.0);

    // A registry that knows nothing would fail a fresh computation.
    let empty = TypeRegistry::new(TypeCatalog::default());
    assert_eq!(structure.fuel_rate(&empty).expect("cached rate"), 18.0);

    let fresh = raitaru(&registry);
    assert!(matches!(
        fresh.fuel_rate(&empty),
        Err(Error::UnresolvedModule { .. })
    ));
}

#[test]
fn only_service_slots_consume_fuel() {
    let registry = fixture_registry();
    let resolve = |name: &str| registry.resolve(name).expect("fixture type resolves");
    let hull = resolve("Astrahus");
    let fitting = Fitting::from_slots([
        (
            SlotCategory::MedSlot,
            vec![resolve("Standup Variable Spectrum ECM I")],
        ),
        (
            SlotCategory::LoSlot,
            vec![resolve("Standup Layered Armor Plating I")],
        ),
        (
            SlotCategory::ServiceSlot,
            vec![resolve("Standup Cloning Center I"), resolve("Standup Market Hub I")],
        ),
    ]);
    let structure = Structure::new(5, hull.type_id, hull.name.clone()).with_fitting(fitting);

    assert_eq!(structure.fuel_rate(&registry).expect("rate"), 37.5);
    assert!(!structure.has_core());
}

#[test]
fn fitted_modules_without_services_burn_nothing() {
    let registry = fixture_registry();
    let hull = registry.resolve("Astrahus").expect("present");
    let ecm = registry
        .resolve("Standup Variable Spectrum ECM I")
        .expect("present");
    let structure = Structure::new(6, hull.type_id, hull.name.clone())
        .with_fitting(Fitting::from_slots([(SlotCategory::MedSlot, vec![ecm])]))
        .with_fuel_expires(now() + Duration::days(1));

    assert_eq!(structure.fuel_rate(&registry).expect("rate"), 0.0);
    assert!(!structure
        .needs_fuel_at(&registry, &FuelPolicy::default(), now())
        .expect("evaluates"));
}

#[test]
fn remaining_fuel_is_measured_from_now() {
    let registry = fixture_registry();
    let structure = raitaru(&registry);
    assert_eq!(structure.fuel_remaining_at(now()), Some(Duration::days(3)));
    assert_eq!(
        Structure::new(9, 35825, "Raitaru").fuel_remaining_at(now()),
        None
    );
}
