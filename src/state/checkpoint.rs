//! Durable run checkpoint
//!
//! The checkpoint records which crawl scopes finished, so an interrupted run
//! picks up at the first unfinished scope. It is tied to the configuration
//! hash: a checkpoint written under another configuration is discarded.

use crate::ScrapeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Hash of the configuration the checkpoint was written under
    pub config_hash: String,

    /// Completed scope ids in completion order
    pub completed_scopes: Vec<String>,

    pub last_completed: Option<String>,

    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(config_hash: impl Into<String>) -> Self {
        Self {
            config_hash: config_hash.into(),
            completed_scopes: Vec::new(),
            last_completed: None,
            updated_at: Utc::now(),
        }
    }

    /// Reads a checkpoint file
    ///
    /// A missing file is `Ok(None)`. A file that does not parse is logged and
    /// also treated as missing; the sinks still suppress duplicates.
    pub fn load(path: &Path) -> Result<Option<Self>, ScrapeError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ScrapeError::Checkpoint(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        match serde_json::from_str(&content) {
            Ok(checkpoint) => Ok(Some(checkpoint)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable checkpoint {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Loads the checkpoint for `config_hash`, or starts a new one
    pub fn resume(path: &Path, config_hash: &str) -> Result<Self, ScrapeError> {
        match Self::load(path)? {
            Some(checkpoint) if checkpoint.config_hash == config_hash => {
                tracing::info!(
                    "Resuming from checkpoint: {} scopes completed (last: {})",
                    checkpoint.completed_scopes.len(),
                    checkpoint.last_completed.as_deref().unwrap_or("none")
                );
                Ok(checkpoint)
            }
            Some(_) => {
                tracing::warn!("Configuration changed since the last run; discarding checkpoint");
                Ok(Self::new(config_hash))
            }
            None => Ok(Self::new(config_hash)),
        }
    }

    pub fn is_completed(&self, scope: &str) -> bool {
        self.completed_scopes.iter().any(|s| s == scope)
    }

    pub fn mark_completed(&mut self, scope: &str) {
        if !self.is_completed(scope) {
            self.completed_scopes.push(scope.to_string());
        }
        self.last_completed = Some(scope.to_string());
        self.updated_at = Utc::now();
    }

    /// Writes the checkpoint atomically (temp file, sync, rename)
    pub fn save(&self, path: &Path) -> Result<(), ScrapeError> {
        let fail = |what: &str, e: &dyn std::fmt::Display| {
            ScrapeError::Checkpoint(format!("cannot {} {}: {}", what, path.display(), e))
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| fail("create directory for", &e))?;
            }
        }

        let json = serde_json::to_vec_pretty(self)?;
        let tmp = temp_path(path);

        let mut file = File::create(&tmp).map_err(|e| fail("write", &e))?;
        file.write_all(&json).map_err(|e| fail("write", &e))?;
        file.sync_all().map_err(|e| fail("sync", &e))?;
        drop(file);

        std::fs::rename(&tmp, path).map_err(|e| fail("replace", &e))?;

        tracing::debug!("Checkpoint saved to {}", path.display());
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
