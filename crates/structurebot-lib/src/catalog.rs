//! Type catalog loading from CSV.
//!
//! The catalog is a small hand-maintained alternative to the full SDE export:
//! one row per item type with the fuel attributes the structure checks need.
//!
//! ```text
//! type_id,name,group_id,service_fuel_per_hour,service_fuel_bonus,base_fuel_per_hour
//! 35825,Raitaru,1404,,-25,
//! 35878,Standup Manufacturing Plant I,1415,12,,
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::{Type, TypeAttributes, TypeId, TypeSource};

/// Maximum edit distance for "did you mean" suggestions.
const SUGGESTION_DISTANCE: usize = 3;

#[derive(Debug, Deserialize)]
struct CatalogRow {
    type_id: TypeId,
    name: String,
    #[serde(default)]
    group_id: Option<i64>,
    #[serde(default)]
    service_fuel_per_hour: Option<f64>,
    #[serde(default)]
    service_fuel_bonus: Option<f64>,
    #[serde(default)]
    base_fuel_per_hour: Option<f64>,
}

impl CatalogRow {
    fn validate(&self, row: usize) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::CatalogValidation {
                message: format!("type name must not be empty at row {row}"),
            });
        }
        if self.type_id <= 0 {
            return Err(Error::CatalogValidation {
                message: format!("type_id for '{}' must be positive at row {row}", self.name),
            });
        }

        let fields = [
            (self.service_fuel_per_hour, "service_fuel_per_hour"),
            (self.base_fuel_per_hour, "base_fuel_per_hour"),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(Error::CatalogValidation {
                        message: format!(
                            "{field} for '{}' must be finite and non-negative at row {row}",
                            self.name
                        ),
                    });
                }
            }
        }
        if let Some(bonus) = self.service_fuel_bonus {
            if !bonus.is_finite() || bonus < -100.0 {
                return Err(Error::CatalogValidation {
                    message: format!(
                        "service_fuel_bonus for '{}' must be at least -100 at row {row}",
                        self.name
                    ),
                });
            }
        }
        Ok(())
    }

    fn into_type(self) -> Type {
        Type {
            type_id: self.type_id,
            name: self.name.trim().to_string(),
            group_id: self.group_id,
            attributes: TypeAttributes {
                service_fuel_per_hour: self.service_fuel_per_hour,
                service_fuel_bonus: self.service_fuel_bonus,
                base_fuel_per_hour: self.base_fuel_per_hour,
            },
        }
    }
}

/// Collection of item types loaded from a CSV file.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<TypeId, Type>,
    name_to_id: HashMap<String, TypeId>,
    source: Option<PathBuf>,
}

impl TypeCatalog {
    /// Load a catalog from a file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        let mut catalog = Self::from_reader(file)?;
        catalog.source = Some(path.to_path_buf());
        Ok(catalog)
    }

    /// Load a catalog from a reader (e.g., file or in-memory buffer).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new().trim(Trim::Fields).from_reader(reader);

        let mut catalog = Self::default();
        // header is line 1
        for (index, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            let row = index + 2;
            let record = record.map_err(|err| Error::CatalogValidation {
                message: format!("row {row}: {err}"),
            })?;
            record.validate(row)?;
            catalog.insert(record.into_type())?;
        }

        Ok(catalog)
    }

    /// Build a catalog from already constructed types.
    pub fn from_types<I>(types: I) -> Result<Self>
    where
        I: IntoIterator<Item = Type>,
    {
        let mut catalog = Self::default();
        for ty in types {
            catalog.insert(ty)?;
        }
        Ok(catalog)
    }

    fn insert(&mut self, ty: Type) -> Result<()> {
        let key = normalize_name(&ty.name);
        if self.name_to_id.contains_key(&key) {
            return Err(Error::DuplicateTypeName { name: key });
        }
        if let Some(existing) = self.types.get(&ty.type_id) {
            return Err(Error::DuplicateTypeId {
                type_id: ty.type_id,
                name: ty.name,
                existing: existing.name.clone(),
            });
        }
        self.name_to_id.insert(key, ty.type_id);
        self.types.insert(ty.type_id, ty);
        Ok(())
    }

    /// Get a type by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Type> {
        self.name_to_id
            .get(&normalize_name(name))
            .and_then(|id| self.types.get(id))
    }

    /// Get a type by id.
    pub fn get_id(&self, type_id: TypeId) -> Option<&Type> {
        self.types.get(&type_id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Get the source path if the catalog was loaded from a file.
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl TypeSource for TypeCatalog {
    fn type_by_name(&self, name: &str) -> Result<Option<Type>> {
        Ok(self.get(name).cloned())
    }

    fn type_by_id(&self, type_id: TypeId) -> Result<Option<Type>> {
        Ok(self.get_id(type_id).cloned())
    }

    fn suggest(&self, name: &str) -> Vec<String> {
        let needle = normalize_name(name);
        let mut scored: Vec<(usize, &str)> = self
            .types
            .values()
            .map(|ty| {
                (
                    strsim::levenshtein(&needle, &normalize_name(&ty.name)),
                    ty.name.as_str(),
                )
            })
            .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
            .collect();
        scored.sort();
        scored
            .into_iter()
            .take(3)
            .map(|(_, name)| name.to_string())
            .collect()
    }
}

/// Normalize a type name for case-insensitive lookup.
fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
