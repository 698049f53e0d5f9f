//! Common test utilities and fixture helpers.

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use structurebot_lib::{Fitting, SlotCategory, TypeCatalog, TypeRegistry};

/// Path to fixtures directory used by tests.
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// Registry backed by the fixture type catalog.
#[allow(dead_code)]
pub fn fixture_registry() -> TypeRegistry {
    let catalog = TypeCatalog::from_path(&fixtures_dir().join("structure_types.csv"))
        .expect("load fixture structure_types.csv");
    TypeRegistry::new(catalog)
}

/// Fixed reference time so tests do not depend on the wall clock.
#[allow(dead_code)]
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Two manufacturing/research services plus a quantum core, resolved by name.
#[allow(dead_code)]
pub fn raitaru_fitting(registry: &TypeRegistry) -> Fitting {
    let resolve = |name: &str| registry.resolve(name).expect("fixture type resolves");
    Fitting::from_slots([
        (
            SlotCategory::ServiceSlot,
            vec![
                resolve("Standup Manufacturing Plant I"),
                resolve("Standup Research Lab I"),
            ],
        ),
        (
            SlotCategory::QuantumCoreRoom,
            vec![resolve("Raitaru Upwell Quantum Core")],
        ),
    ])
}
