// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Filesystem store for generated images

use chrono::{Local, NaiveDateTime};
use image::RgbImage;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::vision::encode_rgb_png;

/// Prefix of every generated filename
pub const FILENAME_PREFIX: &str = "inpainted_";

/// Extension of every generated filename
pub const FILENAME_EXTENSION: &str = "png";

/// How many `_N` suffixes are tried when a timestamp name is taken
const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid output filename: {0:?}")]
    InvalidFilename(String),

    #[error("output file not found: {0}")]
    NotFound(String),

    #[error("no free output filename for {0}")]
    NameExhausted(String),

    #[error("failed to encode output image: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output directory holding generated PNGs
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    /// Open the store, creating the directory if needed
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        info!("Output directory ready: {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `inpainted_<YYYYMMDD>_<HHMMSS>.png`
    pub fn generate_filename(at: NaiveDateTime) -> String {
        format!(
            "{}{}.{}",
            FILENAME_PREFIX,
            at.format("%Y%m%d_%H%M%S"),
            FILENAME_EXTENSION
        )
    }

    /// Encode and persist `image`, returning the stored filename
    pub async fn save_png(&self, image: &RgbImage) -> Result<String, StorageError> {
        self.save_png_at(image, Local::now().naive_local()).await
    }

    pub async fn save_png_at(
        &self,
        image: &RgbImage,
        at: NaiveDateTime,
    ) -> Result<String, StorageError> {
        let bytes = encode_rgb_png(image).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.save_bytes_at(&bytes, at).await
    }

    /// Write `bytes` under a fresh timestamp name; existing files are never replaced
    pub async fn save_bytes_at(
        &self,
        bytes: &[u8],
        at: NaiveDateTime,
    ) -> Result<String, StorageError> {
        let base = Self::generate_filename(at);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let filename = if attempt == 0 {
                base.clone()
            } else {
                with_suffix(&base, attempt)
            };
            let path = self.root.join(&filename);

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("Output name {} taken, trying next suffix", filename);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = write_all(&mut file, bytes).await {
                drop(file);
                if let Err(cleanup) = fs::remove_file(&path).await {
                    warn!(
                        "Failed to remove partial output {}: {}",
                        path.display(),
                        cleanup
                    );
                }
                return Err(e.into());
            }

            debug!("Saved {} ({} bytes)", path.display(), bytes.len());
            return Ok(filename);
        }

        Err(StorageError::NameExhausted(base))
    }

    /// Read a stored output by name
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(filename)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Map a client-supplied name onto a path inside the store
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, StorageError> {
        if !is_plain_filename(filename) {
            return Err(StorageError::InvalidFilename(filename.to_string()));
        }
        Ok(self.root.join(filename))
    }
}

async fn write_all(file: &mut fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

fn with_suffix(filename: &str, n: u32) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, n, ext),
        None => format!("{}_{}", filename, n),
    }
}

/// A single path component with no separators or dot segments
fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}
