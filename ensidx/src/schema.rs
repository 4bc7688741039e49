use std::collections::BTreeSet;

use log::debug;

use crate::coords::Split;
use crate::descriptor::{Descriptor, RawDataset, RawPeriod, RawVariable};
use crate::errors::{Error, Result};
use crate::geom::Window;
use crate::time::{parse_datestamp, DateRange, TermRange};

/// A fully qualified dataset schema.
///
/// This is the normalized form both attested descriptor shapes resolve into:
/// after resolution nothing downstream ever branches on whether the grid was
/// declared globally or per dataset, or on which optional variable fields
/// were present. The schema is immutable for the lifetime of the index built
/// on top of it.
///
#[derive(Clone, Debug)]
pub struct DatasetSchema {
    /// Name of the dataset entry this schema was resolved from.
    pub name: String,
    pub domain: String,
    pub model: String,
    pub geometry: String,
    pub border_size: usize,
    pub subgrid: Option<Window>,
    /// Raw grid extent, when the descriptor declares one.
    pub grid_size: Option<[usize; 2]>,
    /// Ensemble members, declaration order.
    pub members: Vec<u32>,
    pub term: TermRange<f64>,
    /// Variables, sorted by name. This ordering is the canonical field order
    /// of assembled samples.
    pub variables: Vec<VariableSpec>,
    pub periods: Periods,
    pub step_duration: f64,
    pub standardize: bool,
    pub file_format: String,
}

#[derive(Clone, Debug)]
pub struct Periods {
    pub train: Option<DateRange>,
    pub test: Option<DateRange>,
    pub valid: Option<DateRange>,
}

impl Periods {
    pub fn get(&self, split: Split) -> Option<&DateRange> {
        match split {
            Split::Train => self.train.as_ref(),
            Split::Test => self.test.as_ref(),
            Split::Valid => self.valid.as_ref(),
        }
    }
}

/// Per-variable metadata with all defaults filled in.
///
#[derive(Clone, Debug)]
pub struct VariableSpec {
    pub name: String,
    pub shortname: String,
    pub filename: Option<String>,
    /// Vertical levels, declaration order. Empty means one implicit
    /// surface/single level.
    pub levels: Vec<i32>,
    pub type_of_level: String,
    pub unit: String,
    pub kind: String,
}

impl VariableSpec {
    /// File stem used in storage keys: `filename` when configured,
    /// `shortname` otherwise.
    pub fn storage_name(&self) -> &str {
        self.filename.as_deref().unwrap_or(&self.shortname)
    }

    /// The vertical axis to iterate when assembling this variable. A
    /// variable without declared levels still occupies one slot.
    pub fn level_axis(&self) -> Vec<Option<i32>> {
        if self.levels.is_empty() {
            vec![None]
        } else {
            self.levels.iter().copied().map(Some).collect()
        }
    }

    pub fn level_count(&self) -> usize {
        self.level_axis().len()
    }
}

impl DatasetSchema {
    /// Resolve one dataset entry of a descriptor into a schema.
    ///
    /// Pure and fail-fast: any inconsistency surfaces as `Error::Schema`
    /// here, before an index is ever built, and nothing is partially
    /// resolved.
    ///
    pub fn resolve(descriptor: &Descriptor, name: &str) -> Result<Self> {
        let entry = descriptor
            .dataset
            .get(name)
            .ok_or_else(|| Error::Schema(format!("no dataset entry named {name:?}")))?;

        Self::resolve_entry(descriptor, name, entry)
    }

    /// Resolve every dataset entry of a descriptor, in name order.
    ///
    pub fn resolve_all(descriptor: &Descriptor) -> Result<Vec<Self>> {
        descriptor
            .dataset
            .iter()
            .map(|(name, entry)| Self::resolve_entry(descriptor, name, entry))
            .collect()
    }

    fn resolve_entry(descriptor: &Descriptor, name: &str, entry: &RawDataset) -> Result<Self> {
        // Per-dataset grid block overrides the top-level one wholesale.
        let grid = entry
            .grid
            .as_ref()
            .or(descriptor.grid.as_ref())
            .ok_or_else(|| Error::Schema(format!("dataset {name:?} declares no grid")))?;

        if entry.members.is_empty() {
            return Err(Error::Schema(format!(
                "dataset {name:?} has an empty members list"
            )));
        }
        let distinct: BTreeSet<u32> = entry.members.iter().copied().collect();
        if distinct.len() != entry.members.len() {
            return Err(Error::Schema(format!(
                "dataset {name:?} lists duplicate members"
            )));
        }

        let term = TermRange::inclusive(entry.term.start, entry.term.end, entry.term.timestep)?;

        let periods = Periods {
            train: resolve_period(descriptor.periods.train.as_ref())?,
            test: resolve_period(descriptor.periods.test.as_ref())?,
            valid: resolve_period(descriptor.periods.valid.as_ref())?,
        };

        let mut variables = Vec::with_capacity(entry.var.len());
        for (var_name, raw) in &entry.var {
            variables.push(resolve_variable(var_name, raw)?);
        }
        if variables.is_empty() {
            return Err(Error::Schema(format!(
                "dataset {name:?} declares no variables"
            )));
        }
        let stems: BTreeSet<&str> = variables.iter().map(|v| v.storage_name()).collect();
        if stems.len() != variables.len() {
            return Err(Error::Schema(format!(
                "dataset {name:?} has variables sharing a storage name"
            )));
        }

        let subgrid = grid.subgrid.map(Window::from_box);
        if let Some(window) = subgrid {
            validate_subgrid(name, window, grid.border_size, grid.size)?;
        } else if let Some([rows, cols]) = grid.size {
            if rows <= 2 * grid.border_size || cols <= 2 * grid.border_size {
                return Err(Error::Schema(format!(
                    "dataset {name:?}: border of {} leaves no interior on a {rows}x{cols} grid",
                    grid.border_size
                )));
            }
        }

        debug!(
            "resolved schema {name:?}: {} variables, {} members, {} terms",
            variables.len(),
            entry.members.len(),
            term.len(),
        );

        Ok(Self {
            name: name.to_string(),
            domain: grid.domain.clone(),
            model: grid.model.clone(),
            geometry: grid.geometry.clone(),
            border_size: grid.border_size,
            subgrid,
            grid_size: grid.size,
            members: entry.members.clone(),
            term,
            variables,
            periods,
            step_duration: descriptor.settings.step_duration.unwrap_or(1.0),
            standardize: descriptor.settings.standardize.unwrap_or(false),
            file_format: descriptor
                .settings
                .file_format
                .clone()
                .unwrap_or_else(|| String::from("npy")),
        })
    }

    pub fn variable(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Number of stacked 2D planes in one assembled sample.
    pub fn plane_count(&self) -> usize {
        self.variables.iter().map(|v| v.level_count()).sum()
    }
}

fn resolve_period(raw: Option<&RawPeriod>) -> Result<Option<DateRange>> {
    match raw {
        None => Ok(None),
        Some(period) => {
            let start = parse_datestamp(period.start)?;
            let end = parse_datestamp(period.end)?;
            Ok(Some(DateRange::inclusive(start, end, period.step)?))
        }
    }
}

fn resolve_variable(name: &str, raw: &RawVariable) -> Result<VariableSpec> {
    let shortname = raw
        .shortname
        .clone()
        .ok_or_else(|| Error::Schema(format!("variable {name:?} has no shortname")))?;

    Ok(VariableSpec {
        name: name.to_string(),
        shortname,
        filename: raw.filename.clone(),
        levels: raw.level.clone().unwrap_or_default(),
        type_of_level: raw
            .type_of_level
            .clone()
            .unwrap_or_else(|| String::from("unspecified")),
        unit: raw.unit.clone().unwrap_or_else(|| String::from("unspecified")),
        kind: raw.kind.clone().unwrap_or_else(|| String::from("input")),
    })
}

fn validate_subgrid(
    name: &str,
    window: Window,
    border_size: usize,
    size: Option<[usize; 2]>,
) -> Result<()> {
    if window.bottom <= window.top || window.right <= window.left {
        return Err(Error::Schema(format!(
            "dataset {name:?}: subgrid {window:?} has non-positive extent"
        )));
    }
    if let Some([rows, cols]) = size {
        if rows <= 2 * border_size || cols <= 2 * border_size {
            return Err(Error::Schema(format!(
                "dataset {name:?}: border of {border_size} leaves no interior on a {rows}x{cols} grid"
            )));
        }
        window
            .validate(rows - 2 * border_size, cols - 2 * border_size)
            .map_err(|err| Error::Schema(format!("dataset {name:?}: {err}")))?;
    }

    Ok(())
}
