//! structurebot library entry points.
//!
//! This crate models EVE Online corporation structures: it resolves item
//! types from static data, builds fittings and structures from upstream ESI
//! records, and derives fuel consumption, fuel sufficiency, quantum core and
//! unanchoring state. Higher-level consumers (the CLI) should only depend on
//! the items exported here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod esi;
pub mod fitting;
pub mod notify;
pub mod report;
pub mod sde;
pub mod structure;
pub mod time;
pub mod types;

pub use auth::{refresh_access_token, SsoCredentials};
pub use catalog::TypeCatalog;
pub use config::{Config, SlackConfig};
pub use error::{Error, Result};
pub use esi::{EsiClient, RetryPolicy};
pub use fitting::{Fitting, SlotCategory};
pub use notify::SlackNotifier;
pub use report::{check_structures, Finding, FindingKind, StructureStatus};
pub use sde::{AttributeNames, StaticData};
pub use structure::{
    FittedModule, FuelPolicy, Structure, StructureId, StructureProvider, StructureRecord,
    DEFAULT_FUEL_WARNING_DAYS, MAX_FUEL_WARNING_DAYS,
};
pub use types::{Type, TypeAttributes, TypeId, TypeRegistry, TypeSource};
