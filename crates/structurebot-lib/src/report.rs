//! Turns evaluated structures into findings for the notification channel.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::fitting::SlotCategory;
use crate::structure::{FuelPolicy, Structure, StructureId};
use crate::time::format_remaining;
use crate::types::{TypeId, TypeRegistry};

/// Something about a structure worth telling the corporation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub structure_id: StructureId,
    pub structure: String,
    #[serde(flatten)]
    pub kind: FindingKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingKind {
    /// Fuel runs out inside the warning horizon.
    LowFuel {
        fuel_expires: DateTime<Utc>,
        remaining_seconds: i64,
        fuel_rate: f64,
    },
    /// Services are fitted but the structure has no fuel left.
    OutOfFuel,
    /// Fitted structure without a quantum core.
    MissingCore,
    /// Structure is being unanchored.
    Unanchoring { unanchors_at: DateTime<Utc> },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FindingKind::LowFuel {
                fuel_expires,
                remaining_seconds,
                fuel_rate,
            } => write!(
                f,
                "{} runs out of fuel in {} ({}, {} blocks/h)",
                self.structure,
                format_remaining(Duration::seconds(*remaining_seconds)),
                fuel_expires.format("%Y-%m-%d %H:%M UTC"),
                fuel_rate
            ),
            FindingKind::OutOfFuel => write!(f, "{} is out of fuel", self.structure),
            FindingKind::MissingCore => {
                write!(f, "{} has no quantum core fitted", self.structure)
            }
            FindingKind::Unanchoring { unanchors_at } => write!(
                f,
                "{} is unanchoring, completes {}",
                self.structure,
                unanchors_at.format("%Y-%m-%d %H:%M UTC")
            ),
        }
    }
}

/// Evaluate every structure, in order, and collect findings.
///
/// # Errors
/// Propagates fuel rate lookup failures; no partial report is produced.
pub fn check_structures(
    structures: &[Structure],
    registry: &TypeRegistry,
    policy: &FuelPolicy,
    now: DateTime<Utc>,
) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    for structure in structures {
        let finding = |kind| Finding {
            structure_id: structure.structure_id(),
            structure: structure.display_name().to_string(),
            kind,
        };

        let fuel_rate = structure.fuel_rate(registry)?;
        let remaining = structure.fuel_remaining_at(now);
        let has_services = structure
            .fitting()
            .contains_category(SlotCategory::ServiceSlot);

        if has_services
            && !structure.unanchoring()
            && remaining.map_or(true, |left| left <= Duration::zero())
        {
            findings.push(finding(FindingKind::OutOfFuel));
        } else if structure.needs_fuel_at(registry, policy, now)? {
            if let (Some(fuel_expires), Some(remaining)) = (structure.fuel_expires(), remaining) {
                findings.push(finding(FindingKind::LowFuel {
                    fuel_expires,
                    remaining_seconds: remaining.num_seconds(),
                    fuel_rate,
                }));
            }
        }

        if !structure.fitting().is_empty() && !structure.has_core() {
            findings.push(finding(FindingKind::MissingCore));
        }

        if let Some(unanchors_at) = structure.unanchors_at() {
            findings.push(finding(FindingKind::Unanchoring { unanchors_at }));
        }
    }
    Ok(findings)
}

/// Serializable snapshot of a structure's derived state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureStatus {
    pub structure_id: StructureId,
    pub name: String,
    pub type_id: TypeId,
    pub type_name: String,
    pub fuel_rate: f64,
    pub fuel_expires: Option<DateTime<Utc>>,
    pub unanchors_at: Option<DateTime<Utc>>,
    pub needs_fuel: bool,
    pub has_core: bool,
    pub unanchoring: bool,
    pub modules: Vec<String>,
}

impl StructureStatus {
    pub fn evaluate(
        structure: &Structure,
        registry: &TypeRegistry,
        policy: &FuelPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        Ok(Self {
            structure_id: structure.structure_id(),
            name: structure.display_name().to_string(),
            type_id: structure.type_id(),
            type_name: structure.type_name().to_string(),
            fuel_rate: structure.fuel_rate(registry)?,
            fuel_expires: structure.fuel_expires(),
            unanchors_at: structure.unanchors_at(),
            needs_fuel: structure.needs_fuel_at(registry, policy, now)?,
            has_core: structure.has_core(),
            unanchoring: structure.unanchoring(),
            modules: structure
                .fitting()
                .modules()
                .map(|(category, ty)| format!("{category}: {}", ty.name))
                .collect(),
        })
    }
}
