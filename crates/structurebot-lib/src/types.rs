//! Static item types and the name/id registry in front of them.
//!
//! A [`TypeRegistry`] resolves item names and ids through a [`TypeSource`]
//! (the SQLite SDE export or a CSV catalog) and caches every resolved
//! [`Type`] for its own lifetime. Static data does not change during a run,
//! so entries are never invalidated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Numeric identifier for an item type.
pub type TypeId = i64;

/// Dogma attributes relevant to structure fuel consumption.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeAttributes {
    /// Fuel blocks per hour consumed by an online service module.
    pub service_fuel_per_hour: Option<f64>,
    /// Hull role bonus to service module fuel consumption, in percent.
    pub service_fuel_bonus: Option<f64>,
    /// Fuel blocks per hour consumed by the hull itself.
    pub base_fuel_per_hour: Option<f64>,
}

/// A resolved game item type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Type {
    pub type_id: TypeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub attributes: TypeAttributes,
}

impl Type {
    /// Create a type without any dogma attributes.
    pub fn new(type_id: TypeId, name: impl Into<String>) -> Self {
        Self {
            type_id,
            name: name.into(),
            group_id: None,
            attributes: TypeAttributes::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: TypeAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Backing store for static item data.
pub trait TypeSource {
    /// Look up a type by its exact name.
    fn type_by_name(&self, name: &str) -> Result<Option<Type>>;

    /// Look up a type by id.
    fn type_by_id(&self, type_id: TypeId) -> Result<Option<Type>>;

    /// Names close to `name`, used to enrich not-found errors.
    fn suggest(&self, _name: &str) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Default)]
struct RegistryCache {
    by_name: HashMap<String, Arc<Type>>,
    by_id: HashMap<TypeId, Arc<Type>>,
}

impl RegistryCache {
    /// Cache `ty` under its id, its canonical name and the name it was
    /// requested by. An entry already cached for the id is reused.
    fn insert(&mut self, requested: Option<&str>, ty: Type) -> Arc<Type> {
        let ty = match self.by_id.get(&ty.type_id) {
            Some(existing) => Arc::clone(existing),
            None => Arc::new(ty),
        };
        if let Some(requested) = requested {
            self.by_name.insert(requested.to_string(), Arc::clone(&ty));
        }
        self.by_name.insert(ty.name.clone(), Arc::clone(&ty));
        self.by_id.insert(ty.type_id, Arc::clone(&ty));
        ty
    }
}

/// Caching resolver for item types.
pub struct TypeRegistry {
    source: Box<dyn TypeSource + Send + Sync>,
    cache: Mutex<RegistryCache>,
}

impl TypeRegistry {
    pub fn new<S>(source: S) -> Self
    where
        S: TypeSource + Send + Sync + 'static,
    {
        Self {
            source: Box::new(source),
            cache: Mutex::new(RegistryCache::default()),
        }
    }

    /// Resolve a type by exact name.
    ///
    /// # Errors
    /// [`Error::TypeNotFound`] when the source has no such name.
    pub fn resolve(&self, name: &str) -> Result<Arc<Type>> {
        if let Some(ty) = self.cache().by_name.get(name) {
            return Ok(Arc::clone(ty));
        }

        debug!(name, "resolving type by name");
        match self.source.type_by_name(name)? {
            Some(ty) => Ok(self.cache().insert(Some(name), ty)),
            None => Err(Error::TypeNotFound {
                name: name.to_string(),
                suggestions: self.source.suggest(name),
            }),
        }
    }

    /// Resolve a type by id.
    ///
    /// # Errors
    /// [`Error::TypeIdNotFound`] when the source has no such id.
    pub fn resolve_id(&self, type_id: TypeId) -> Result<Arc<Type>> {
        if let Some(ty) = self.cache().by_id.get(&type_id) {
            return Ok(Arc::clone(ty));
        }

        debug!(type_id, "resolving type by id");
        match self.source.type_by_id(type_id)? {
            Some(ty) => Ok(self.cache().insert(None, ty)),
            None => Err(Error::TypeIdNotFound { type_id }),
        }
    }

    /// Number of cached types.
    pub fn cached(&self) -> usize {
        self.cache().by_id.len()
    }

    fn cache(&self) -> MutexGuard<'_, RegistryCache> {
        // The cache only ever holds fully inserted entries, so a poisoned
        // lock still guards consistent data.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("cached", &self.cached())
            .finish()
    }
}
