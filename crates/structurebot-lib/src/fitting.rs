//! Structure fittings grouped by slot category.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::Type;

/// Slot categories a structure module can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SlotCategory {
    HiSlot,
    MedSlot,
    LoSlot,
    RigSlot,
    ServiceSlot,
    QuantumCoreRoom,
    FighterBay,
    FighterTube,
    StructureFuel,
}

impl SlotCategory {
    pub const ALL: [SlotCategory; 9] = [
        SlotCategory::HiSlot,
        SlotCategory::MedSlot,
        SlotCategory::LoSlot,
        SlotCategory::RigSlot,
        SlotCategory::ServiceSlot,
        SlotCategory::QuantumCoreRoom,
        SlotCategory::FighterBay,
        SlotCategory::FighterTube,
        SlotCategory::StructureFuel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SlotCategory::HiSlot => "HiSlot",
            SlotCategory::MedSlot => "MedSlot",
            SlotCategory::LoSlot => "LoSlot",
            SlotCategory::RigSlot => "RigSlot",
            SlotCategory::ServiceSlot => "ServiceSlot",
            SlotCategory::QuantumCoreRoom => "QuantumCoreRoom",
            SlotCategory::FighterBay => "FighterBay",
            SlotCategory::FighterTube => "FighterTube",
            SlotCategory::StructureFuel => "StructureFuel",
        }
    }

    /// Map an ESI asset `location_flag` (e.g. `ServiceSlot2`) to its
    /// category. Hangar and delivery flags are not part of a fitting.
    pub fn from_location_flag(flag: &str) -> Option<Self> {
        flag.trim_end_matches(|c: char| c.is_ascii_digit())
            .parse()
            .ok()
    }
}

impl fmt::Display for SlotCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown slot label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSlot(pub String);

impl fmt::Display for UnknownSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown slot category: {}", self.0)
    }
}

impl std::error::Error for UnknownSlot {}

impl FromStr for SlotCategory {
    type Err = UnknownSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SlotCategory::ALL
            .into_iter()
            .find(|category| category.label() == s)
            .ok_or_else(|| UnknownSlot(s.to_string()))
    }
}

/// Modules installed in a structure, keyed by slot category.
///
/// Categories with no occupants are never stored, so an empty map means an
/// unfit structure (or one whose assets are not visible).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fitting {
    slots: BTreeMap<SlotCategory, Vec<Arc<Type>>>,
}

impl Fitting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fitting from category/occupant pairs.
    pub fn from_slots<I, T>(slots: I) -> Self
    where
        I: IntoIterator<Item = (SlotCategory, Vec<T>)>,
        T: Into<Arc<Type>>,
    {
        let mut fitting = Self::new();
        for (category, occupants) in slots {
            for ty in occupants {
                fitting.push(category, ty.into());
            }
        }
        fitting
    }

    pub(crate) fn push(&mut self, category: SlotCategory, ty: Arc<Type>) {
        self.slots.entry(category).or_default().push(ty);
    }

    /// True iff no category has any occupant.
    pub fn is_empty(&self) -> bool {
        self.slots.values().all(Vec::is_empty)
    }

    /// True if `needle` is the label of an occupied category or the name of
    /// a fitted type.
    pub fn contains(&self, needle: &str) -> bool {
        match needle.parse::<SlotCategory>() {
            Ok(category) if self.contains_category(category) => true,
            _ => self.contains_type(needle),
        }
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.modules().any(|(_, ty)| ty.name == name)
    }

    pub fn contains_category(&self, category: SlotCategory) -> bool {
        !self.slots(category).is_empty()
    }

    /// Occupants of a category; empty when nothing is fitted there.
    pub fn slots(&self, category: SlotCategory) -> &[Arc<Type>] {
        self.slots.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All fitted modules in category order.
    pub fn modules(&self) -> impl Iterator<Item = (SlotCategory, &Type)> + '_ {
        self.slots
            .iter()
            .flat_map(|(category, types)| types.iter().map(move |ty| (*category, ty.as_ref())))
    }
}

impl FromIterator<(SlotCategory, Arc<Type>)> for Fitting {
    fn from_iter<I: IntoIterator<Item = (SlotCategory, Arc<Type>)>>(iter: I) -> Self {
        let mut fitting = Self::new();
        for (category, ty) in iter {
            fitting.push(category, ty);
        }
        fitting
    }
}
