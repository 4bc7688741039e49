//! Coordinate-resolving indexing and sample assembly for ensemble forecast
//! datasets.
//!
//! A raw dataset descriptor is resolved into an immutable `DatasetSchema`,
//! expanded into the full set of addressable `Coordinate`s for a split, and
//! exposed as a random-access `DatasetIndex`. Each access resolves storage
//! keys, pulls raw fields through an injected `Loader`, crops them to the
//! schema's spatial window and stacks them into one `Sample`.
//!
mod coords;
mod descriptor;
mod errors;
mod geom;
mod index;
mod key;
mod sample;
mod schema;
mod time;

#[cfg(test)]
mod testing;

pub use coords::{enumerate, Coordinate, Split};
pub use descriptor::{
    Descriptor, RawDataset, RawGrid, RawPeriod, RawPeriods, RawSettings, RawTerm, RawVariable,
};
pub use errors::{Error, Result};
pub use geom::{subset, Window};
pub use index::DatasetIndex;
pub use key::{resolve_key, StorageKey};
pub use sample::{assemble, LoadError, Loader, Sample, Standardizer, StatsTable, VarStats};
pub use schema::{DatasetSchema, Periods, VariableSpec};
pub use time::{parse_datestamp, DateRange, TermRange};
