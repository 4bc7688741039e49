use std::collections::BTreeMap;

use serde::Deserialize;

use crate::errors::Result;

/// The raw, unvalidated dataset descriptor, exactly as supplied by the
/// configuration layer.
///
/// Two attested shapes deserialize into this struct: a flat one where a
/// single top-level `grid` applies to every dataset entry, and a nested one
/// where entries carry their own `grid` block overriding the top-level one.
/// All defaulting and cross-field validation happens later, in
/// `DatasetSchema::resolve`.
///
#[derive(Clone, Debug, Deserialize)]
pub struct Descriptor {
    pub periods: RawPeriods,
    #[serde(default)]
    pub grid: Option<RawGrid>,
    #[serde(default)]
    pub settings: RawSettings,
    pub dataset: BTreeMap<String, RawDataset>,
}

impl Descriptor {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A split with no period configured simply enumerates to a zero-length
/// index.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPeriods {
    pub train: Option<RawPeriod>,
    pub test: Option<RawPeriod>,
    pub valid: Option<RawPeriod>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawPeriod {
    /// Run base date as a YYYYMMDDHH stamp, e.g. 2020061521.
    pub start: u64,
    pub end: u64,
    /// Hours between consecutive runs. May be fractional.
    pub step: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawGrid {
    pub geometry: String,
    #[serde(default)]
    pub border_size: usize,
    pub domain: String,
    pub model: String,
    /// [row_start, row_end, col_start, col_end] in border-trimmed grid
    /// coordinates, half-open.
    #[serde(default)]
    pub subgrid: Option<[usize; 4]>,
    /// Full [rows, cols] extent of the raw grid, when known. Enables eager
    /// bounds validation at resolve time.
    #[serde(default)]
    pub size: Option<[usize; 2]>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawSettings {
    pub step_duration: Option<f64>,
    pub standardize: Option<bool>,
    pub file_format: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawDataset {
    #[serde(default)]
    pub grid: Option<RawGrid>,
    pub members: Vec<u32>,
    pub term: RawTerm,
    pub var: BTreeMap<String, RawVariable>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawTerm {
    /// Forecast lead times in hours. `timestep` may be fractional, e.g. 0.25.
    pub start: f64,
    pub end: f64,
    pub timestep: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawVariable {
    pub shortname: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub level: Option<Vec<i32>>,
    #[serde(default, rename = "typeOfLevel")]
    pub type_of_level: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}
