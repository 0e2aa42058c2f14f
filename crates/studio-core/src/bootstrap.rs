//! Startup wiring
//!
//! Loads configuration from the data root, resolves the user identity and
//! moves every piece of shell state into a [`Dispatcher`]. Configuration
//! problems become warnings; only a registry failure aborts startup.

use std::path::PathBuf;

use crate::builtins;
use crate::config::{load_roles, roles_config_path, users_config_path, UserDirectory};
use crate::dispatch::Dispatcher;
use crate::errors::Result;
use crate::identity::{
    default_home, derive_user_id, ensure_user_data_dir, os_user_name, persistent_user_id,
};
use crate::jobs::{JobManager, ProcessHost, SystemProcessHost};
use crate::registry::CommandRegistry;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct StartupOptions {
    /// Directory holding `Data/`
    pub root: PathBuf,
    /// Initial working directory of the session
    pub working_dir: PathBuf,
    /// Use this id instead of the persisted one
    pub user_id: Option<String>,
    /// Home directory for the persisted id; the OS home when unset
    pub home: Option<PathBuf>,
}

impl StartupOptions {
    pub fn new(root: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            working_dir: working_dir.into(),
            user_id: None,
            home: None,
        }
    }
}

#[derive(Debug)]
pub struct Startup {
    pub dispatcher: Dispatcher,
    /// Non-fatal problems found while loading configuration
    pub warnings: Vec<String>,
}

/// Build a dispatcher backed by real OS processes
///
/// # Errors
///
/// Returns an error only if the built-in registry cannot be built.
pub fn start(options: StartupOptions) -> Result<Startup> {
    start_with_host(options, Box::new(SystemProcessHost))
}

/// Build a dispatcher whose job manager uses `host`
///
/// # Errors
///
/// Same as [`start`].
pub fn start_with_host(options: StartupOptions, host: Box<dyn ProcessHost>) -> Result<Startup> {
    let mut warnings = Vec::new();
    let user_id = match options.user_id {
        Some(id) => id,
        None => resolve_user_id(options.home, &mut warnings),
    };

    if let Err(e) = ensure_user_data_dir(&options.root, &user_id) {
        tracing::warn!(error = %e, "user data directory unavailable");
        warnings.push(e.to_string());
    }

    let roles = load_roles(&roles_config_path(&options.root));
    warnings.extend(roles.warnings);
    let users = UserDirectory::load(&users_config_path(&options.root));
    warnings.extend(users.warnings);

    let mut registry = CommandRegistry::new();
    builtins::register_all(&mut registry)?;

    let assigned = users.value.assigned_or_default(&user_id);
    let session = Session::new(user_id, assigned, options.working_dir);
    tracing::info!(
        user_id = session.user_id(),
        role = assigned.as_str(),
        session_id = %session.id(),
        commands = registry.len(),
        "session started"
    );

    Ok(Startup {
        dispatcher: Dispatcher::new(
            roles.value,
            registry,
            session,
            JobManager::new(host),
            users.value,
        ),
        warnings,
    })
}

/// Persisted id, or a one-off derived id when the home directory is unusable
fn resolve_user_id(home: Option<PathBuf>, warnings: &mut Vec<String>) -> String {
    let persisted = match home {
        Some(home) => persistent_user_id(&home),
        None => default_home().and_then(|home| persistent_user_id(&home)),
    };
    persisted.unwrap_or_else(|e| {
        let user_id = derive_user_id(&os_user_name());
        tracing::warn!(error = %e, user_id = %user_id, "using a temporary user id");
        warnings.push(format!("{}; using temporary user id {}", e, user_id));
        user_id
    })
}
