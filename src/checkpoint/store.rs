//! File-backed checkpoint store.

use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::checkpoint::Checkpoint;

/// Errors raised while writing or removing the checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Checkpoint file at a fixed path.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the checkpoint, falling back to zeros.
    ///
    /// Missing files, undecodable contents and counters whose total does not
    /// add up all yield `Checkpoint::default()`.
    pub fn load(&self) -> Checkpoint {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No checkpoint, starting fresh");
                return Checkpoint::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Checkpoint unreadable, starting fresh");
                return Checkpoint::default();
            }
        };

        match Self::decode(BufReader::new(file)) {
            Ok(checkpoint) if checkpoint.is_consistent() => {
                tracing::info!(
                    path = %self.path.display(),
                    checkpoint = %checkpoint,
                    "Loaded checkpoint"
                );
                checkpoint
            }
            Ok(checkpoint) => {
                tracing::warn!(
                    path = %self.path.display(),
                    checkpoint = %checkpoint,
                    "Checkpoint total does not match counters, starting fresh"
                );
                Checkpoint::default()
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Checkpoint malformed, starting fresh");
                Checkpoint::default()
            }
        }
    }

    /// Atomically replace the checkpoint.
    ///
    /// Writes a sibling temporary file, syncs it and renames it over the
    /// target, so readers see either the old or the new record.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let tmp_path = self.tmp_path();
        let io_err = |source| CheckpointError::Io {
            path: tmp_path.clone(),
            source,
        };

        let file = File::create(&tmp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, checkpoint)?;
        writer.flush().map_err(io_err)?;
        writer.get_ref().sync_all().map_err(io_err)?;
        drop(writer);

        fs::rename(&tmp_path, &self.path).map_err(|source| CheckpointError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), checkpoint = %checkpoint, "Saved checkpoint");
        Ok(())
    }

    /// Remove the checkpoint. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool, CheckpointError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CheckpointError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Decode a checkpoint record. Only a JSON object is accepted; the derived
    /// `Deserialize` would also take a positional array.
    fn decode(reader: impl Read) -> serde_json::Result<Checkpoint> {
        let value: Value = serde_json::from_reader(reader)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom("checkpoint must be a JSON object"));
        }
        serde_json::from_value(value)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
