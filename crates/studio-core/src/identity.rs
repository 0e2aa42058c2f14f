//! Persistent per-machine user identity
//!
//! The identifier is derived once and stored at `<home>/.studio/user_id.txt`.
//! Later launches read it back unchanged.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::config::DATA_DIR;
use crate::errors::{io_error, Result, ShellError};

pub const IDENTITY_DIR: &str = ".studio";
pub const IDENTITY_FILE: &str = "user_id.txt";

/// Length of a derived user id in hex characters
pub const USER_ID_LEN: usize = 12;

/// Home directory of the current OS user
///
/// # Errors
///
/// Returns `Configuration` when no home directory can be determined.
pub fn default_home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| ShellError::Configuration {
        source_name: "identity".to_string(),
        reason: "cannot determine the home directory".to_string(),
    })
}

/// Read the stored user id under `home`, deriving and storing it on first use
///
/// # Errors
///
/// Returns `Io` if the identity file cannot be read or created.
pub fn persistent_user_id(home: &Path) -> Result<String> {
    let path = home.join(IDENTITY_DIR).join(IDENTITY_FILE);
    if path.exists() {
        let stored = fs::read_to_string(&path).map_err(|e| io_error("read_user_id", e))?;
        let stored = stored.trim();
        if !stored.is_empty() {
            return Ok(stored.to_string());
        }
        tracing::warn!(path = %path.display(), "identity file is empty; deriving a new id");
    }

    let user_id = derive_user_id(&os_user_name());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_identity_dir", e))?;
    }
    fs::write(&path, &user_id).map_err(|e| io_error("write_user_id", e))?;
    tracing::info!(user_id = %user_id, "created persistent user id");
    Ok(user_id)
}

/// Hash the user name, current time and pid into a short hex id
pub fn derive_user_id(user_name: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(user_name.as_bytes());
    hasher.update(nanos.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(USER_ID_LEN);
    digest
}

/// Check that `user_id` is usable as a single path component
///
/// # Errors
///
/// Returns `Configuration` for empty ids, `.`/`..`, or ids containing a
/// path separator.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    let bad = user_id.is_empty()
        || user_id == "."
        || user_id == ".."
        || user_id.contains(['/', '\\', '\0']);
    if bad {
        return Err(ShellError::Configuration {
            source_name: "identity".to_string(),
            reason: format!("invalid user id '{}'", user_id),
        });
    }
    Ok(())
}

/// Create `<root>/Data/roles/<user_id>/` if missing
///
/// # Errors
///
/// Returns `Configuration` for an id that is not a plain path component and
/// `Io` if the directory cannot be created.
pub fn ensure_user_data_dir(root: &Path, user_id: &str) -> Result<PathBuf> {
    validate_user_id(user_id)?;
    let dir = root.join(DATA_DIR).join("roles").join(user_id);
    if !dir.is_dir() {
        fs::create_dir_all(&dir).map_err(|e| io_error("create_user_data_dir", e))?;
        tracing::debug!(path = %dir.display(), "created user data directory");
    }
    Ok(dir)
}

pub(crate) fn os_user_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
