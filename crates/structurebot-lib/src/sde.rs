//! Static data export (SDE) backed type source.
//!
//! Reads the SQLite conversion of CCP's static data export. Types come from
//! `invTypes`; fuel attributes come from `dgmTypeAttributes` joined with
//! `dgmAttributeTypes` by attribute name, so the attribute names can be
//! adjusted when CCP renames them.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Type, TypeAttributes, TypeId, TypeSource};

/// Dogma attribute names mapped onto [`TypeAttributes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeNames {
    pub service_fuel_per_hour: String,
    pub service_fuel_bonus: String,
    pub base_fuel_per_hour: String,
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self {
            service_fuel_per_hour: "serviceModuleFuelAmount".to_string(),
            service_fuel_bonus: "structureServiceRoleBonus".to_string(),
            base_fuel_per_hour: "structureFuelConsumption".to_string(),
        }
    }
}

/// How attribute values are stored; older exports use a single `value`
/// column, newer ones split it into `valueInt`/`valueFloat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueColumns {
    Single,
    Split,
}

impl ValueColumns {
    fn expression(self) -> &'static str {
        match self {
            ValueColumns::Single => "t.value",
            ValueColumns::Split => "COALESCE(t.valueFloat, t.valueInt)",
        }
    }
}

/// SQLite static data source.
pub struct StaticData {
    connection: Mutex<Connection>,
    values: ValueColumns,
    attributes: AttributeNames,
}

impl StaticData {
    /// Open an SDE database with the default attribute names.
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(Connection::open(path)?, AttributeNames::default())
    }

    /// Wrap an open connection, verifying the expected tables exist.
    pub fn from_connection(connection: Connection, attributes: AttributeNames) -> Result<Self> {
        for (table, columns) in [
            ("invTypes", &["typeID", "typeName", "groupID"][..]),
            ("dgmTypeAttributes", &["typeID", "attributeID"][..]),
            ("dgmAttributeTypes", &["attributeID", "attributeName"][..]),
        ] {
            if !table_exists(&connection, table)? || !table_has_columns(&connection, table, columns)?
            {
                return Err(Error::Config {
                    message: format!(
                        "static data is missing table {table} with columns {}",
                        columns.join(", ")
                    ),
                });
            }
        }

        let values = if table_has_columns(&connection, "dgmTypeAttributes", &["value"])? {
            ValueColumns::Single
        } else if table_has_columns(&connection, "dgmTypeAttributes", &["valueInt", "valueFloat"])? {
            ValueColumns::Split
        } else {
            return Err(Error::Config {
                message: "dgmTypeAttributes has no value columns".to_string(),
            });
        };
        debug!(?values, "opened static data");

        Ok(Self {
            connection: Mutex::new(connection),
            values,
            attributes,
        })
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load_attributes(&self, connection: &Connection, type_id: TypeId) -> Result<TypeAttributes> {
        let sql = format!(
            "SELECT a.attributeName, {value} FROM dgmTypeAttributes t \
             JOIN dgmAttributeTypes a ON a.attributeID = t.attributeID \
             WHERE t.typeID = ?1 AND a.attributeName IN (?2, ?3, ?4)",
            value = self.values.expression()
        );
        let mut stmt = connection.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                type_id,
                self.attributes.service_fuel_per_hour,
                self.attributes.service_fuel_bonus,
                self.attributes.base_fuel_per_hour,
            ],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<f64>>(1)?)),
        )?;

        let mut attributes = TypeAttributes::default();
        for row in rows {
            let (name, value) = row?;
            if name == self.attributes.service_fuel_per_hour {
                attributes.service_fuel_per_hour = value;
            } else if name == self.attributes.service_fuel_bonus {
                attributes.service_fuel_bonus = value;
            } else if name == self.attributes.base_fuel_per_hour {
                attributes.base_fuel_per_hour = value;
            }
        }
        Ok(attributes)
    }

    fn load_type(&self, column: &str, key: &dyn rusqlite::ToSql) -> Result<Option<Type>> {
        let connection = self.connection();
        let sql = format!("SELECT typeID, typeName, groupID FROM invTypes WHERE {column} = ?1");
        let row = connection
            .query_row(&sql, [key], |row| {
                Ok((
                    row.get::<_, TypeId>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                ))
            })
            .optional()?;

        match row {
            Some((type_id, name, group_id)) => {
                let attributes = self.load_attributes(&connection, type_id)?;
                Ok(Some(Type {
                    type_id,
                    name,
                    group_id,
                    attributes,
                }))
            }
            None => Ok(None),
        }
    }
}

impl TypeSource for StaticData {
    fn type_by_name(&self, name: &str) -> Result<Option<Type>> {
        self.load_type("typeName", &name)
    }

    fn type_by_id(&self, type_id: TypeId) -> Result<Option<Type>> {
        self.load_type("typeID", &type_id)
    }

    fn suggest(&self, name: &str) -> Vec<String> {
        let connection = self.connection();
        let pattern = format!("%{}%", name.trim());
        let lookup = || -> rusqlite::Result<Vec<String>> {
            let mut stmt = connection
                .prepare("SELECT typeName FROM invTypes WHERE typeName LIKE ?1 ORDER BY typeName LIMIT 3")?;
            let rows = stmt.query_map([pattern.as_str()], |row| row.get(0))?;
            let names = rows.collect::<rusqlite::Result<Vec<String>>>();
            names
        };
        lookup().unwrap_or_default()
    }
}

impl std::fmt::Debug for StaticData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticData")
            .field("values", &self.values)
            .field("attributes", &self.attributes)
            .finish()
    }
}

fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let mut stmt = connection
        .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}

fn table_has_columns(connection: &Connection, table: &str, required: &[&str]) -> Result<bool> {
    let pragma = format!("PRAGMA table_info('{table}')");
    let mut stmt = connection.prepare(&pragma)?;
    let mut rows = stmt.query([])?;

    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        columns.push(name);
    }

    Ok(required.iter().all(|required| {
        columns
            .iter()
            .any(|column| column.eq_ignore_ascii_case(required))
    }))
}
