//! Shell session state
//!
//! One `Session` exists per shell process. It carries the user identity,
//! the persisted role assignment, the transient active role and the working
//! directory handed to handlers and spawned processes.

use std::path::{Path, PathBuf};

use studio_core_types::SessionId;

use crate::errors::{Result, ShellError};
use crate::role::Role;

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    user_id: String,
    assigned_role: Role,
    current_role: Role,
    working_dir: PathBuf,
}

impl Session {
    /// Create a session whose active role starts at the assigned role
    pub fn new(user_id: impl Into<String>, assigned_role: Role, working_dir: PathBuf) -> Self {
        Self {
            id: SessionId::new(),
            user_id: user_id.into(),
            assigned_role,
            current_role: assigned_role,
            working_dir,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Role recorded for this user in the users configuration
    pub fn assigned_role(&self) -> Role {
        self.assigned_role
    }

    /// Role currently used for authorization
    pub fn current_role(&self) -> Role {
        self.current_role
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Switch the active role for the rest of the session
    ///
    /// Authority comes from the persisted assignment, never from the
    /// current active role.
    ///
    /// # Errors
    ///
    /// Returns `Permission` unless the user is assigned Master.
    pub fn switch_role(&mut self, new_role: Role) -> Result<()> {
        if self.assigned_role != Role::Master {
            return Err(ShellError::Permission {
                action: "switch role".to_string(),
                required: Role::Master,
            });
        }
        tracing::info!(
            user_id = %self.user_id,
            from = self.current_role.as_str(),
            to = new_role.as_str(),
            "role switched"
        );
        self.current_role = new_role;
        Ok(())
    }

    /// Replace the persisted assignment after this user was reassigned
    pub fn reassign(&mut self, role: Role) {
        self.assigned_role = role;
        self.current_role = role;
    }

    /// Change the working directory
    ///
    /// Relative targets resolve against the current working directory. The
    /// stored path is canonical.
    ///
    /// # Errors
    ///
    /// Returns `Path` if the target does not exist or is not a directory.
    pub fn change_directory(&mut self, target: &str) -> Result<()> {
        let candidate = self.working_dir.join(target);
        let resolved = candidate.canonicalize().map_err(|e| ShellError::Path {
            path: target.to_string(),
            reason: e.to_string(),
        })?;
        if !resolved.is_dir() {
            return Err(ShellError::Path {
                path: target.to_string(),
                reason: "not a directory".to_string(),
            });
        }
        self.working_dir = resolved;
        Ok(())
    }

    /// Prompt text shown before each input line
    pub fn prompt(&self) -> String {
        format!("[{}][studio]$ ", self.current_role)
    }

    #[cfg(test)]
    pub(crate) fn force_current_role(&mut self, role: Role) {
        self.current_role = role;
    }
}
