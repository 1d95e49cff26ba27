//! Credential pair storage
//!
//! Persists the access/renewal pair to a JSON file. All writes use atomic
//! temp-file + rename to prevent corruption on crash. A tokio Mutex
//! serializes concurrent access from request-time renewal and the optional
//! early-renewal task.
//!
//! The store is pure storage: it never inspects credential contents, and the
//! empty state is normal. The file may be missing, wiped externally, or
//! cleared by a failed renewal at any point, so every reader must tolerate
//! `None`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// The persisted credential pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Short-lived bearer credential attached to decorated requests
    pub access: String,
    /// Longer-lived credential accepted only by the renewal endpoint
    pub renewal: String,
}

/// Thread-safe credential file manager.
///
/// The Mutex serializes all access. Reads clone the in-memory pair, so the
/// request path never blocks on a disk write.
pub struct TokenStore {
    path: PathBuf,
    state: Mutex<Option<StoredCredentials>>,
}

impl TokenStore {
    /// Load the pair from the given file path.
    ///
    /// A missing file is the empty state, not an error: sessions start
    /// logged out. An unreadable or unparseable file is also treated as
    /// empty, so a corrupted cache can only ever cost a re-login.
    pub async fn load(path: PathBuf) -> Self {
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<StoredCredentials>(&contents) {
                Ok(pair) => {
                    info!(path = %path.display(), "loaded stored credentials");
                    Some(pair)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "credential file unparseable, starting empty");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no credential file, starting empty");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "credential file unreadable, starting empty");
                None
            }
        };

        Self {
            path,
            state: Mutex::new(state),
        }
    }

    /// Current access credential, if any.
    pub async fn access(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.as_ref().map(|pair| pair.access.clone())
    }

    /// Current renewal credential, if any.
    pub async fn renewal(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.as_ref().map(|pair| pair.renewal.clone())
    }

    /// Replace the stored pair and persist to disk.
    pub async fn set(&self, access: String, renewal: String) -> Result<()> {
        let mut state = self.state.lock().await;
        let pair = StoredCredentials { access, renewal };
        write_atomic(&self.path, &pair).await?;
        *state = Some(pair);
        debug!("stored credential pair");
        Ok(())
    }

    /// Remove both credentials and delete the file.
    ///
    /// Clearing an already-empty store is a no-op, not an error.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = None;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "cleared credentials");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(format!("removing credential file: {e}"))),
        }
    }

    /// Whether no pair is stored.
    pub async fn is_empty(&self) -> bool {
        let state = self.state.lock().await;
        state.is_none()
    }
}

/// Write the pair to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. This prevents corruption if the process crashes mid-write.
/// Sets file permissions to 0600 (owner read/write only) since the file
/// contains live bearer credentials.
async fn write_atomic(path: &Path, pair: &StoredCredentials) -> Result<()> {
    let json = serde_json::to_string_pretty(pair)
        .map_err(|e| Error::Parse(format!("serializing credentials: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    // Set 0600 permissions (unix only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    Ok(())
}
