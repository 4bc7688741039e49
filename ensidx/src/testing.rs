use std::collections::HashMap;

use async_trait::async_trait;
use ndarray::Array2;
use parking_lot::Mutex;

use crate::coords::{enumerate, Split};
use crate::descriptor::Descriptor;
use crate::errors::Result;
use crate::key::{resolve_key, StorageKey};
use crate::sample::{LoadError, Loader};
use crate::schema::DatasetSchema;

/// A descriptor exercising both attested shapes: "arome" uses the top-level
/// grid, "arome_eurw1s40" nests its own grid block, and the variable entries
/// range from fully specified to bare shortname.
const DESCRIPTOR_JSON: &str = r#"{
    "periods": {
        "train": {"start": 2020061521, "end": 2020061621, "step": 24},
        "test": {"start": 2020070100, "end": 2020070100, "step": 24},
        "valid": {"start": 2020071500, "end": 2020071600, "step": 24}
    },
    "grid": {
        "geometry": "franmgsp32",
        "border_size": 2,
        "domain": "france",
        "model": "arome",
        "subgrid": [0, 8, 0, 8],
        "size": [20, 20]
    },
    "settings": {"step_duration": 1.0, "standardize": false, "file_format": "npy"},
    "dataset": {
        "arome": {
            "members": [0, 1],
            "term": {"start": 3, "end": 4, "timestep": 0.5},
            "var": {
                "hum": {
                    "shortname": "r",
                    "level": [850, 500],
                    "typeOfLevel": "isobaricInhPa",
                    "unit": "%",
                    "kind": "input"
                },
                "t2m": {"shortname": "2t", "filename": "t2m_height", "unit": "K"}
            }
        },
        "arome_eurw1s40": {
            "grid": {
                "geometry": "EURW1S40_gribcompat",
                "border_size": 0,
                "domain": "eur",
                "model": "arome",
                "size": [10, 10]
            },
            "members": [1, 2, 3],
            "term": {"start": 0, "end": 1, "timestep": 0.25},
            "var": {
                "tpw": {"shortname": "tpw"}
            }
        }
    }
}"#;

pub(crate) fn descriptor() -> Descriptor {
    Descriptor::from_json(DESCRIPTOR_JSON).unwrap()
}

pub(crate) fn schema() -> Result<DatasetSchema> {
    DatasetSchema::resolve(&descriptor(), "arome")
}

/// Deterministic cell value for synthetic planes, a function of everything
/// that discriminates one stored grid point from another.
pub(crate) fn cell(member: u32, term: f64, level: Option<i32>, row: usize, col: usize) -> f32 {
    member as f32 * 100_000.0
        + (term * 1_000.0) as f32
        + level.unwrap_or(-1) as f32 * 10.0
        + (row * 20 + col) as f32
}

pub(crate) fn plane(
    member: u32,
    term: f64,
    level: Option<i32>,
    rows: usize,
    cols: usize,
) -> Array2<f32> {
    Array2::from_shape_fn([rows, cols], |(row, col)| cell(member, term, level, row, col))
}

/// Fill a loader with synthetic planes for every key of one split.
pub(crate) fn populate(loader: &MemoryLoader, schema: &DatasetSchema, split: Split) {
    let [rows, cols] = schema.grid_size.unwrap_or([20, 20]);
    for coordinate in enumerate(schema, split) {
        for variable in &schema.variables {
            for level in variable.level_axis() {
                let key = resolve_key(schema, &variable.name, level, &coordinate).unwrap();
                loader.insert(
                    &key,
                    plane(coordinate.member, coordinate.term, level, rows, cols),
                );
            }
        }
    }
}

/// A test implementation of `Loader` that stores planes in RAM.
///
pub(crate) struct MemoryLoader {
    objects: Mutex<HashMap<String, Array2<f32>>>,
}

impl MemoryLoader {
    pub(crate) fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn insert(&self, key: &StorageKey, value: Array2<f32>) {
        self.objects.lock().insert(key.to_string(), value);
    }

    pub(crate) fn remove(&self, key: &StorageKey) {
        self.objects.lock().remove(&key.to_string());
    }
}

#[async_trait]
impl Loader for MemoryLoader {
    async fn load(&self, key: &StorageKey) -> std::result::Result<Array2<f32>, LoadError> {
        let objects = self.objects.lock();
        objects
            .get(&key.to_string())
            .cloned()
            .ok_or(LoadError::NotFound)
    }
}
