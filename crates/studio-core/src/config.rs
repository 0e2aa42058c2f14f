//! Roles and users configuration
//!
//! Both files live under `<root>/Data/` as JSON objects:
//!
//! - `roles_config.json`: `{ "<role>": { "allowed_commands": ["cmd", ...] } }`
//! - `users_config.json`: `{ "<user_id>": "<role>" }`
//!
//! Loading is fail-soft. Malformed entries are dropped with a warning and the
//! valid remainder is kept; the shell never refuses to start over a bad
//! configuration file.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;

use crate::errors::{io_error, Result};
use crate::role::{Role, RoleHierarchy};

pub const DATA_DIR: &str = "Data";
pub const ROLES_CONFIG_FILE: &str = "roles_config.json";
pub const USERS_CONFIG_FILE: &str = "users_config.json";

pub fn roles_config_path(root: &Path) -> PathBuf {
    root.join(DATA_DIR).join(ROLES_CONFIG_FILE)
}

pub fn users_config_path(root: &Path) -> PathBuf {
    root.join(DATA_DIR).join(USERS_CONFIG_FILE)
}

/// A loaded value plus the problems skipped while loading it
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub warnings: Vec<String>,
}

impl<T> Loaded<T> {
    fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Warnings(Vec<String>);

impl Warnings {
    fn push(&mut self, source: &Path, message: String) {
        tracing::warn!(op = "config_load", source = %source.display(), "{}", message);
        self.0.push(message);
    }
}

/// Read a JSON object from disk
///
/// `Ok(None)` when the file does not exist.
fn read_object(path: &Path, warnings: &mut Warnings) -> Option<serde_json::Map<String, Value>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warnings.push(path, format!("cannot read {}: {}", path.display(), e));
            return Some(serde_json::Map::new());
        }
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            warnings.push(path, format!("{} is not a JSON object", path.display()));
            Some(serde_json::Map::new())
        }
        Err(e) => {
            warnings.push(path, format!("{} is not valid JSON: {}", path.display(), e));
            Some(serde_json::Map::new())
        }
    }
}

/// Load the role hierarchy from a roles configuration file
///
/// A missing file, or an empty object, yields an unrestricted hierarchy. An
/// unreadable file, a document that is not a JSON object, or one declaring a
/// role outside the hierarchy falls back to
/// [`RoleHierarchy::minimal_default`].
pub fn load_roles(path: &Path) -> Loaded<RoleHierarchy> {
    let mut warnings = Warnings::default();
    let Some(raw) = read_object(path, &mut warnings) else {
        tracing::debug!(source = %path.display(), "no roles configuration; all commands permitted");
        return Loaded::clean(RoleHierarchy::unrestricted());
    };
    if !warnings.0.is_empty() {
        return Loaded {
            value: RoleHierarchy::minimal_default(),
            warnings: warnings.0,
        };
    }
    if raw.is_empty() {
        return Loaded::clean(RoleHierarchy::unrestricted());
    }

    let mut declared: Vec<(String, Vec<String>)> = Vec::new();
    for (role, entry) in raw {
        let commands = match entry.get("allowed_commands") {
            Some(Value::Array(items)) => items,
            _ => {
                warnings.push(
                    path,
                    format!("role '{}' has no allowed_commands list; entry dropped", role),
                );
                continue;
            }
        };
        let mut names = Vec::with_capacity(commands.len());
        for item in commands {
            match item.as_str() {
                Some(name) => names.push(name.to_string()),
                None => warnings.push(
                    path,
                    format!("role '{}' lists a non-string command {}; dropped", role, item),
                ),
            }
        }
        declared.push((role, names));
    }

    match RoleHierarchy::load(declared) {
        Ok(hierarchy) => Loaded {
            value: hierarchy,
            warnings: warnings.0,
        },
        Err(e) => {
            warnings.push(path, format!("{}; using built-in minimal roles", e));
            Loaded {
                value: RoleHierarchy::minimal_default(),
                warnings: warnings.0,
            }
        }
    }
}

/// User to role assignments, optionally backed by a users config file
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    path: Option<PathBuf>,
    users: BTreeMap<String, Role>,
}

impl UserDirectory {
    /// Load assignments from disk
    ///
    /// A missing or invalid file yields an empty directory that will be
    /// created on the first `assign`.
    pub fn load(path: &Path) -> Loaded<Self> {
        let mut warnings = Warnings::default();
        let raw = read_object(path, &mut warnings).unwrap_or_default();

        let mut users = BTreeMap::new();
        for (user, role) in raw {
            match role.as_str().map(Role::from_str) {
                Some(Ok(role)) => {
                    users.insert(user, role);
                }
                Some(Err(e)) => {
                    warnings.push(path, format!("user '{}': {}; entry dropped", user, e))
                }
                None => warnings.push(
                    path,
                    format!("user '{}' has a non-string role {}; entry dropped", user, role),
                ),
            }
        }

        Loaded {
            value: Self {
                path: Some(path.to_path_buf()),
                users,
            },
            warnings: warnings.0,
        }
    }

    /// Directory that is never written to disk
    pub fn in_memory<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Role)>,
        S: Into<String>,
    {
        Self {
            path: None,
            users: entries.into_iter().map(|(u, r)| (u.into(), r)).collect(),
        }
    }

    pub fn role_of(&self, user_id: &str) -> Option<Role> {
        self.users.get(user_id).copied()
    }

    /// Assigned role, Artist for users without an entry
    pub fn assigned_or_default(&self, user_id: &str) -> Role {
        self.role_of(user_id).unwrap_or(Role::Artist)
    }

    /// Record an assignment and persist the directory
    ///
    /// # Errors
    ///
    /// Returns `Io` if the users config cannot be written. The in-memory
    /// assignment is left unchanged in that case.
    pub fn assign(&mut self, user_id: &str, role: Role) -> Result<()> {
        let previous = self.users.insert(user_id.to_string(), role);
        if let Err(e) = self.persist() {
            match previous {
                Some(previous) => self.users.insert(user_id.to_string(), previous),
                None => self.users.remove(user_id),
            };
            return Err(e);
        }
        tracing::info!(user_id, role = role.as_str(), "role assigned");
        Ok(())
    }

    /// Assignments ordered by user id
    pub fn iter(&self) -> impl Iterator<Item = (&str, Role)> {
        self.users.iter().map(|(u, r)| (u.as_str(), *r))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_vec_pretty(&self.users)?;
        atomic_write(path, &content)
    }
}

/// Write bytes through a sibling temp file and rename
fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_config_dir", e))?;
    }
    let temp_path = target_path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|e| io_error("write_config_temp", e))?;
    fs::rename(&temp_path, target_path).map_err(|e| io_error("rename_config_temp", e))?;
    Ok(())
}
