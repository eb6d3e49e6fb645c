//! Model cache state and cross-process initialization lock
//!
//! Model artifacts live in a cache directory shared by every worker process
//! on the host. Exactly one process may run the download/initialization
//! step; siblings either observe the recorded state and skip, or find the
//! lock held and back off. The advisory lock is released by the OS when its
//! holder dies, so a stale lock file alone never blocks initialization; the
//! recorded pid identifies the current holder.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{NlpError, NlpResult};

/// State file recorded after successful initialization.
pub const STATE_FILE: &str = "model_state.json";

const LOCK_FILE: &str = "model_download.lock";

/// Persisted initialization record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelState {
    pub spacy_initialized: bool,
    pub transformer_initialized: bool,
    pub timestamp: DateTime<Utc>,
}

impl ModelState {
    pub fn initialized() -> Self {
        Self {
            spacy_initialized: true,
            transformer_initialized: true,
            timestamp: Utc::now(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.spacy_initialized && self.transformer_initialized
    }

    pub fn load(dir: &Path) -> NlpResult<Option<Self>> {
        let path = dir.join(STATE_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        match serde_json::from_str(&contents) {
            Ok(state) => Ok(Some(state)),
            Err(err) => {
                warn!(%err, path = %path.display(), "unreadable model state file");
                Ok(None)
            }
        }
    }

    pub fn save(&self, dir: &Path) -> NlpResult<()> {
        fs::create_dir_all(dir)?;
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(STATE_FILE), contents)?;
        Ok(())
    }
}

/// Exclusive cross-process lock over the model cache directory.
pub struct ModelLock {
    file: File,
    path: PathBuf,
}

impl ModelLock {
    /// Try to take the lock. `Ok(None)` means another process holds it.
    pub fn acquire(dir: &Path) -> NlpResult<Option<Self>> {
        fs::create_dir_all(dir)?;
        let path = dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        if file.try_lock_exclusive().is_err() {
            let holder = Self::read_pid(&mut file);
            debug!(path = %path.display(), ?holder, "model lock held elsewhere");
            return Ok(None);
        }
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        write!(file, "{}", std::process::id())?;
        file.sync_all()?;
        Ok(Some(Self { file, path }))
    }

    /// Pid recorded by the current or most recent holder.
    pub fn holder_pid(dir: &Path) -> Option<u32> {
        let mut file = File::open(dir.join(LOCK_FILE)).ok()?;
        Self::read_pid(&mut file)
    }

    fn read_pid(file: &mut File) -> Option<u32> {
        let mut contents = String::new();
        file.seek(SeekFrom::Start(0)).ok()?;
        file.read_to_string(&mut contents).ok()?;
        contents.trim().parse().ok()
    }
}

impl Drop for ModelLock {
    fn drop(&mut self) {
        if let Err(err) = fs2::FileExt::unlock(&self.file) {
            warn!(%err, path = %self.path.display(), "failed to release model lock");
        }
    }
}

/// Model cache directory with guarded one-time initialization.
pub struct ModelCache {
    dir: PathBuf,
}

impl ModelCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run `init` at most once across processes.
    ///
    /// Returns `true` when this call performed the initialization, `false`
    /// when the recorded state made it unnecessary or another process holds
    /// the lock (that process will record the state when it finishes).
    pub fn ensure_initialized<F>(&self, init: F) -> NlpResult<bool>
    where
        F: FnOnce() -> NlpResult<()>,
    {
        if let Some(state) = ModelState::load(&self.dir)? {
            if state.is_complete() {
                debug!(dir = %self.dir.display(), "model cache already initialized");
                return Ok(false);
            }
        }
        let Some(_lock) = ModelLock::acquire(&self.dir)? else {
            info!(
                holder = ?ModelLock::holder_pid(&self.dir),
                "model initialization in progress in another process"
            );
            return Ok(false);
        };
        // Re-check under the lock: the previous holder may have finished.
        if let Some(state) = ModelState::load(&self.dir)? {
            if state.is_complete() {
                return Ok(false);
            }
        }
        init().map_err(|err| {
            NlpError::Cache(format!("model initialization failed: {err}"))
        })?;
        ModelState::initialized().save(&self.dir)?;
        info!(dir = %self.dir.display(), "model cache initialized");
        Ok(true)
    }
}
