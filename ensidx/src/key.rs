use std::fmt;

use chrono::NaiveDateTime;

use crate::coords::Coordinate;
use crate::errors::{Error, Result};
use crate::schema::DatasetSchema;

/// A stable reference to one stored 2D field.
///
/// Every field that discriminates between two stored grids is part of the
/// key, so two distinct (variable, level, member, date, term) tuples can
/// never resolve to the same key. The `Display` rendering is the canonical
/// string form used by storage backends.
///
#[derive(Clone, Debug, PartialEq)]
pub struct StorageKey {
    pub domain: String,
    pub model: String,
    pub date: NaiveDateTime,
    pub member: u32,
    /// File stem for the variable: `filename` when configured, `shortname`
    /// otherwise.
    pub variable: String,
    /// Vertical level, `None` for surface/single-level fields.
    pub level: Option<i32>,
    /// Forecast lead time in hours.
    pub term: f64,
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/mb{:03}/{}/",
            self.domain,
            self.model,
            self.date.format("%Y%m%d%H%M"),
            self.member,
            self.variable,
        )?;
        match self.level {
            Some(level) => write!(f, "{level}")?,
            None => f.write_str("sfc")?,
        }
        write!(f, "/+{}h", self.term)
    }
}

/// Resolve the storage key for one (variable, level) pair at a coordinate.
///
/// # Arguments
///
/// * `schema` - The resolved dataset schema the coordinate was enumerated
///   from.
/// * `variable_name` - Name of a variable declared in the schema.
/// * `level` - Vertical level, `None` for single-level variables.
/// * `coordinate` - The address being materialized.
///
pub fn resolve_key(
    schema: &DatasetSchema,
    variable_name: &str,
    level: Option<i32>,
    coordinate: &Coordinate,
) -> Result<StorageKey> {
    let variable = schema
        .variable(variable_name)
        .ok_or_else(|| Error::UnknownVariable(variable_name.to_string()))?;

    Ok(StorageKey {
        domain: schema.domain.clone(),
        model: schema.model.clone(),
        date: coordinate.date,
        member: coordinate.member,
        variable: variable.storage_name().to_string(),
        level,
        term: coordinate.term,
    })
}
