//! Corporation structures and their derived fuel/status properties.
//!
//! A [`Structure`] is built from a raw [`StructureRecord`] supplied by a
//! [`StructureProvider`] (normally the ESI client). Construction resolves the
//! hull and every fitted module through the [`TypeRegistry`]; afterwards the
//! entity is immutable apart from its write-once fuel rate cache.
//!
//! Fuel rate, in blocks per hour:
//!
//! ```text
//! rate = hull.base_fuel_per_hour
//!      + sum(service_module.service_fuel_per_hour) * (1 + hull.service_fuel_bonus / 100)
//! ```
//!
//! An unfit structure consumes nothing regardless of hull.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::fitting::{Fitting, SlotCategory};
use crate::time::remaining;
use crate::types::{Type, TypeId, TypeRegistry};

/// Identifier assigned to a structure by ESI.
pub type StructureId = i64;

/// Default warning horizon for low fuel.
pub const DEFAULT_FUEL_WARNING_DAYS: i64 = 7;

/// Largest accepted warning horizon, roughly a century.
pub const MAX_FUEL_WARNING_DAYS: i64 = 36_500;

/// An item located inside a structure, as reported by the asset endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedModule {
    pub type_id: TypeId,
    pub location_flag: String,
}

/// Raw structure data as returned by the upstream provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub structure_id: StructureId,
    pub type_id: TypeId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub modules: Vec<FittedModule>,
    #[serde(default)]
    pub fuel_expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unanchors_at: Option<DateTime<Utc>>,
}

/// Source of raw structure records for a corporation.
pub trait StructureProvider {
    /// Every structure owned by `corporation`, in upstream order.
    fn corporation_structures(&self, corporation: &str) -> Result<Vec<StructureRecord>>;
}

/// Thresholds applied when deciding whether a structure needs fuel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuelPolicy {
    /// Warn when fuel runs out sooner than this.
    pub warning_threshold: Duration,
}

impl FuelPolicy {
    /// Warn when fuel runs out within `days` days.
    ///
    /// # Errors
    /// [`Error::Config`] when `days` is not positive or does not fit a
    /// [`Duration`].
    pub fn try_from_days(days: i64) -> Result<Self> {
        Duration::try_days(days)
            .filter(|_| days > 0)
            .map(|warning_threshold| Self { warning_threshold })
            .ok_or_else(|| Error::Config {
                message: format!("fuel warning horizon of {days} days is out of range"),
            })
    }
}

impl Default for FuelPolicy {
    fn default() -> Self {
        Self {
            warning_threshold: Duration::days(DEFAULT_FUEL_WARNING_DAYS),
        }
    }
}

/// A corporation-owned structure.
#[derive(Debug, Clone)]
pub struct Structure {
    structure_id: StructureId,
    type_id: TypeId,
    type_name: String,
    name: Option<String>,
    fitting: Fitting,
    fuel_expires: Option<DateTime<Utc>>,
    unanchors_at: Option<DateTime<Utc>>,
    fuel_rate: OnceCell<f64>,
}

impl Structure {
    /// Create an unfit structure with no fuel or unanchor data.
    pub fn new(structure_id: StructureId, type_id: TypeId, type_name: impl Into<String>) -> Self {
        Self {
            structure_id,
            type_id,
            type_name: type_name.into(),
            name: None,
            fitting: Fitting::new(),
            fuel_expires: None,
            unanchors_at: None,
            fuel_rate: OnceCell::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_fitting(mut self, fitting: Fitting) -> Self {
        self.fitting = fitting;
        self.fuel_rate = OnceCell::new();
        self
    }

    pub fn with_fuel_expires(mut self, fuel_expires: DateTime<Utc>) -> Self {
        self.fuel_expires = Some(fuel_expires);
        self
    }

    pub fn with_unanchors_at(mut self, unanchors_at: DateTime<Utc>) -> Self {
        self.unanchors_at = Some(unanchors_at);
        self
    }

    /// Load every structure owned by `corporation`.
    ///
    /// Records are returned in upstream order. Any unresolvable hull or
    /// module aborts the whole set.
    pub fn from_corporation<P>(
        provider: &P,
        registry: &TypeRegistry,
        corporation: &str,
    ) -> Result<Vec<Structure>>
    where
        P: StructureProvider + ?Sized,
    {
        let records = provider.corporation_structures(corporation)?;
        info!(corporation, count = records.len(), "loaded structure records");

        records
            .into_iter()
            .map(|record| Structure::from_record(record, registry))
            .collect()
    }

    /// Build a structure from a raw record, resolving hull and modules.
    pub fn from_record(record: StructureRecord, registry: &TypeRegistry) -> Result<Structure> {
        let hull = resolve_for(registry, record.structure_id, record.type_id, "hull")?;

        let fitting = record
            .modules
            .iter()
            .filter_map(|module| {
                let category = SlotCategory::from_location_flag(&module.location_flag);
                if category.is_none() {
                    trace!(
                        structure_id = record.structure_id,
                        flag = %module.location_flag,
                        "skipping non-fitting item"
                    );
                }
                category.map(|category| (category, module.type_id))
            })
            .map(|(category, type_id)| {
                resolve_for(registry, record.structure_id, type_id, "module")
                    .map(|ty| (category, ty))
            })
            .collect::<Result<Fitting>>()?;

        Ok(Structure {
            structure_id: record.structure_id,
            type_id: hull.type_id,
            type_name: hull.name.clone(),
            name: record.name,
            fitting,
            fuel_expires: record.fuel_expires,
            unanchors_at: record.unanchors_at,
            fuel_rate: OnceCell::new(),
        })
    }

    pub fn structure_id(&self) -> StructureId {
        self.structure_id
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Player-given name, falling back to the hull type name.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.type_name)
    }

    pub fn fitting(&self) -> &Fitting {
        &self.fitting
    }

    pub fn fuel_expires(&self) -> Option<DateTime<Utc>> {
        self.fuel_expires
    }

    pub fn unanchors_at(&self) -> Option<DateTime<Utc>> {
        self.unanchors_at
    }

    /// Fuel blocks consumed per hour.
    ///
    /// Computed on first successful call and cached for the lifetime of the
    /// structure. A failed computation is not cached.
    ///
    /// # Errors
    /// [`Error::UnresolvedModule`] when the hull or a service module is not
    /// in static data.
    pub fn fuel_rate(&self, registry: &TypeRegistry) -> Result<f64> {
        self.fuel_rate
            .get_or_try_init(|| self.compute_fuel_rate(registry))
            .copied()
    }

    fn compute_fuel_rate(&self, registry: &TypeRegistry) -> Result<f64> {
        if self.fitting.is_empty() {
            return Ok(0.0);
        }

        let hull = resolve_for(registry, self.structure_id, self.type_id, &self.type_name)?;
        let mut service_rate = 0.0;
        for module in self.fitting.slots(SlotCategory::ServiceSlot) {
            let module = resolve_for(registry, self.structure_id, module.type_id, &module.name)?;
            service_rate += module.attributes.service_fuel_per_hour.unwrap_or(0.0);
        }

        let bonus = hull.attributes.service_fuel_bonus.unwrap_or(0.0);
        let rate =
            hull.attributes.base_fuel_per_hour.unwrap_or(0.0) + service_rate * (1.0 + bonus / 100.0);
        debug!(
            structure_id = self.structure_id,
            service_rate, bonus, rate, "computed fuel rate"
        );
        Ok(rate)
    }

    /// Whether fuel runs out inside the policy's warning horizon, as of now.
    pub fn needs_fuel(&self, registry: &TypeRegistry, policy: &FuelPolicy) -> Result<bool> {
        self.needs_fuel_at(registry, policy, Utc::now())
    }

    /// Whether fuel runs out inside the policy's warning horizon, as of `now`.
    ///
    /// A structure that burns nothing, has no expiry, or will finish
    /// unanchoring before the fuel runs out never needs fuel.
    pub fn needs_fuel_at(
        &self,
        registry: &TypeRegistry,
        policy: &FuelPolicy,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if self.fuel_rate(registry)? <= 0.0 {
            return Ok(false);
        }
        let Some(fuel_expires) = self.fuel_expires else {
            return Ok(false);
        };
        if let Some(unanchors_at) = self.unanchors_at {
            if fuel_expires >= unanchors_at {
                return Ok(false);
            }
        }
        Ok(remaining(fuel_expires, now) < policy.warning_threshold)
    }

    /// Time until fuel expires, if the structure reports an expiry.
    pub fn fuel_remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.fuel_expires.map(|expires| remaining(expires, now))
    }

    pub fn unanchoring(&self) -> bool {
        self.unanchors_at.is_some()
    }

    pub fn has_core(&self) -> bool {
        self.fitting.contains_category(SlotCategory::QuantumCoreRoom)
    }
}

fn resolve_for(
    registry: &TypeRegistry,
    structure_id: StructureId,
    type_id: TypeId,
    name: &str,
) -> Result<Arc<Type>> {
    registry.resolve_id(type_id).map_err(|err| match err {
        Error::TypeIdNotFound { .. } | Error::TypeNotFound { .. } => Error::UnresolvedModule {
            structure_id,
            type_id,
            name: name.to_string(),
        },
        other => other,
    })
}
