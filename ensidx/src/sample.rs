use std::collections::BTreeMap;
use std::io;

use async_trait::async_trait;
use ndarray::{Array2, Array3, Axis};
use serde::Deserialize;

use crate::coords::Coordinate;
use crate::errors::{Error, Result};
use crate::geom;
use crate::key::{resolve_key, StorageKey};
use crate::schema::DatasetSchema;

/// Failure modes of a storage backend, kept separate from the crate error
/// type so that a recoverable "not found" is distinguishable from a
/// transient I/O problem.
///
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A storage backend resolving a `StorageKey` to a raw 2D field.
///
/// Raw file I/O and format decoding live entirely behind this trait.
/// Implementations must be safe for concurrent use: the index issues
/// independent `load` calls from parallel workers without any
/// synchronization of its own. Any caching layer in front of a loader is
/// expected to guarantee at most one in-flight load per key.
///
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, key: &StorageKey) -> std::result::Result<Array2<f32>, LoadError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct VarStats {
    pub mean: f32,
    pub scale: f32,
}

/// Supplies per-variable normalization statistics.
///
/// The statistics themselves are an external concern; this crate only
/// applies `(x - mean) / scale` when a schema asks for standardization.
///
pub trait Standardizer: Send + Sync {
    fn stats(&self, variable: &str) -> Option<VarStats>;
}

/// A `Standardizer` backed by a plain table, loadable from JSON.
///
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct StatsTable(BTreeMap<String, VarStats>);

impl StatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn insert<S: Into<String>>(&mut self, variable: S, mean: f32, scale: f32) {
        self.0.insert(variable.into(), VarStats { mean, scale });
    }
}

impl Standardizer for StatsTable {
    fn stats(&self, variable: &str) -> Option<VarStats> {
        self.0.get(variable).copied()
    }
}

/// The realized payload for one coordinate.
///
/// `fields` maps each variable name to its `[levels, rows, cols]` array, in
/// the schema's canonical (name-sorted) variable order. Samples are built on
/// demand, never cached here, and owned by the caller once returned.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub coordinate: Coordinate,
    pub fields: BTreeMap<String, Array3<f32>>,
}

impl Sample {
    pub fn field(&self, name: &str) -> Option<&Array3<f32>> {
        self.fields.get(name)
    }

    /// Stack every field into one `[planes, rows, cols]` tensor, variables
    /// in schema order, levels in declaration order within each variable.
    ///
    pub fn stacked(&self) -> Result<Array3<f32>> {
        let views: Vec<_> = self.fields.values().map(|a| a.view()).collect();
        ndarray::concatenate(Axis(0), &views)
            .map_err(|err| Error::GridBounds(format!("cannot stack sample fields: {err}")))
    }
}

/// Assemble the sample for one coordinate.
///
/// For each variable and each of its levels: resolve the storage key, load
/// the raw field through the injected `loader`, crop it to the schema's
/// spatial window, then stack the levels. A key the loader cannot supply
/// fails the whole sample with `Error::MissingData` — a partially assembled
/// sample is never returned and missing planes are never zero-filled.
///
/// # Arguments
///
/// * `schema` - The resolved schema the coordinate belongs to.
/// * `coordinate` - The address to materialize.
/// * `loader` - Storage backend; see `Loader` for its concurrency contract.
/// * `standardizer` - Statistics source, required when `schema.standardize`
///   is set.
///
pub async fn assemble(
    schema: &DatasetSchema,
    coordinate: &Coordinate,
    loader: &dyn Loader,
    standardizer: Option<&dyn Standardizer>,
) -> Result<Sample> {
    let mut fields = BTreeMap::new();
    let mut expected: Option<(usize, usize)> = None;

    for variable in &schema.variables {
        let stats = if schema.standardize {
            let standardizer = standardizer.ok_or_else(|| {
                Error::Schema(format!(
                    "dataset {:?} requires standardization but no standardizer was supplied",
                    schema.name
                ))
            })?;
            Some(standardizer.stats(&variable.name).ok_or_else(|| {
                Error::Schema(format!(
                    "no standardization statistics for variable {:?}",
                    variable.name
                ))
            })?)
        } else {
            None
        };

        let mut planes = Vec::with_capacity(variable.level_count());
        for level in variable.level_axis() {
            let key = resolve_key(schema, &variable.name, level, coordinate)?;
            let raw = loader.load(&key).await.map_err(|err| match err {
                LoadError::NotFound => Error::MissingData(key),
                LoadError::Io(err) => Error::Io(err),
            })?;

            let mut plane = geom::subset(raw.view(), schema)?;
            match expected {
                None => expected = Some(plane.dim()),
                Some(dim) if dim != plane.dim() => {
                    return Err(Error::GridBounds(format!(
                        "plane for {:?} level {level:?} has shape {:?}, expected {dim:?}",
                        variable.name,
                        plane.dim(),
                    )))
                }
                Some(_) => {}
            }

            if let Some(VarStats { mean, scale }) = stats {
                plane.mapv_inplace(|v| (v - mean) / scale);
            }
            planes.push(plane);
        }

        let views: Vec<_> = planes.iter().map(|p| p.view()).collect();
        let stacked = ndarray::stack(Axis(0), &views).map_err(|err| {
            Error::GridBounds(format!(
                "cannot stack levels of variable {:?}: {err}",
                variable.name
            ))
        })?;
        fields.insert(variable.name.clone(), stacked);
    }

    Ok(Sample {
        coordinate: *coordinate,
        fields,
    })
}
