use std::sync::Arc;

use log::info;

use crate::coords::{self, Coordinate, Split};
use crate::errors::{Error, Result};
use crate::sample::{assemble, Loader, Sample, Standardizer};
use crate::schema::DatasetSchema;

/// A random-access collection of training samples for one split.
///
/// The index owns the resolved schema and the coordinate list for its
/// lifetime; both are fixed at construction, so `get(i)` always materializes
/// the same coordinate and, with unchanged backing data, the same sample.
/// Shuffling is the caller's business, performed on indices.
///
/// `get` calls are independent and may run from parallel workers; the only
/// shared state is immutable, so no synchronization happens here. The
/// injected loader carries its own concurrency contract (see `Loader`).
///
pub struct DatasetIndex {
    schema: Arc<DatasetSchema>,
    split: Split,
    coordinates: Vec<Coordinate>,
    loader: Arc<dyn Loader>,
    standardizer: Option<Arc<dyn Standardizer>>,
}

impl DatasetIndex {
    /// Build the index for one split.
    ///
    /// Fails fast, before any data access: a schema that asks for
    /// standardization without a standardizer, or with statistics missing
    /// for any of its variables, is rejected here rather than on the first
    /// unlucky `get`.
    ///
    pub fn new(
        schema: Arc<DatasetSchema>,
        split: Split,
        loader: Arc<dyn Loader>,
        standardizer: Option<Arc<dyn Standardizer>>,
    ) -> Result<Self> {
        if schema.standardize {
            let standardizer = standardizer.as_ref().ok_or_else(|| {
                Error::Schema(format!(
                    "dataset {:?} requires standardization but no standardizer was supplied",
                    schema.name
                ))
            })?;
            for variable in &schema.variables {
                if standardizer.stats(&variable.name).is_none() {
                    return Err(Error::Schema(format!(
                        "no standardization statistics for variable {:?}",
                        variable.name
                    )));
                }
            }
        }

        let coordinates = coords::enumerate(&schema, split);
        info!(
            "indexed dataset {:?} split {split}: {} samples of {} planes",
            schema.name,
            coordinates.len(),
            schema.plane_count(),
        );

        Ok(Self {
            schema,
            split,
            coordinates,
            loader,
            standardizer,
        })
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn coordinate(&self, index: usize) -> Option<&Coordinate> {
        self.coordinates.get(index)
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    /// Materialize the sample at `index`.
    ///
    /// `Error::MissingData` is scoped to this one sample; the index stays
    /// usable and the caller decides whether to skip or abort.
    ///
    pub async fn get(&self, index: usize) -> Result<Sample> {
        let coordinate = self.coordinates.get(index).ok_or(Error::OutOfBounds {
            index,
            len: self.coordinates.len(),
        })?;

        assemble(
            &self.schema,
            coordinate,
            self.loader.as_ref(),
            self.standardizer.as_deref(),
        )
        .await
    }
}
