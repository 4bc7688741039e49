//! A concrete implementation of the `ensidx::Loader` interface for a local
//! filesystem tree.
//!
//! Fields are stored one file per storage key, under the key's canonical
//! string rendering, in a self-describing flat format: a little-endian
//! `[u32 rows][u32 cols]` header followed by `rows * cols` little-endian
//! f32 cells, row major. Decoders for richer formats are further `Loader`
//! implementations, not this crate's business.
//!
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ndarray::{Array2, ArrayView2};
use tokio::fs;

use ensidx::{LoadError, Loader, StorageKey};

const HEADER_SIZE: usize = 8;

pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The on-disk location for a key: `<root>/<key>.dat`.
    ///
    pub fn path_for(&self, key: &StorageKey) -> PathBuf {
        self.root.join(format!("{key}.dat"))
    }

    /// Write one field under its key, creating parent directories as needed.
    ///
    pub async fn store(&self, key: &StorageKey, data: ArrayView2<'_, f32>) -> io::Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, encode(data)).await
    }
}

#[async_trait]
impl Loader for FsLoader {
    /// Read the field stored under `key`.
    ///
    /// A missing file surfaces as the recoverable `LoadError::NotFound`;
    /// everything else, including a truncated or corrupt file, is an I/O
    /// error.
    ///
    async fn load(&self, key: &StorageKey) -> Result<Array2<f32>, LoadError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(LoadError::NotFound),
            Err(err) => return Err(LoadError::Io(err)),
        };

        decode(&bytes).map_err(LoadError::Io)
    }
}

fn encode(data: ArrayView2<f32>) -> Vec<u8> {
    let (rows, cols) = data.dim();
    let mut bytes = Vec::with_capacity(HEADER_SIZE + rows * cols * 4);
    bytes.extend_from_slice(&(rows as u32).to_le_bytes());
    bytes.extend_from_slice(&(cols as u32).to_le_bytes());
    for cell in data.iter() {
        bytes.extend_from_slice(&cell.to_le_bytes());
    }

    bytes
}

fn decode(bytes: &[u8]) -> io::Result<Array2<f32>> {
    if bytes.len() < HEADER_SIZE {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            "field file shorter than its header",
        ));
    }
    let rows = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
    let cols = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
    let body = &bytes[HEADER_SIZE..];
    if body.len() != rows * cols * 4 {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            format!(
                "field file holds {} bytes for a {rows}x{cols} grid",
                body.len()
            ),
        ));
    }

    let cells = body
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
        .collect();

    Array2::from_shape_vec([rows, cols], cells)
        .map_err(|err| io::Error::new(ErrorKind::InvalidData, err))
}
