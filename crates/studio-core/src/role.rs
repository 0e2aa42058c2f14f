//! Role hierarchy
//!
//! Roles form a fixed total order. A role satisfies a minimum-role
//! requirement when it sits at or above it. Per-role permission sets come
//! from configuration and are normalized at load time so that every role
//! holds at least what the roles below it hold.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, ShellError};

/// A permission tier, ordered lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Artist,
    Supe,
    Pipe,
    Rnd,
    Master,
}

impl Role {
    /// Every role, lowest first
    pub const ALL: [Role; 5] = [Role::Artist, Role::Supe, Role::Pipe, Role::Rnd, Role::Master];

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Artist => "artist",
            Role::Supe => "supe",
            Role::Pipe => "pipe",
            Role::Rnd => "rnd",
            Role::Master => "master",
        }
    }

    /// Position in the hierarchy (Artist = 0)
    pub fn order(&self) -> u8 {
        *self as u8
    }

    /// Check whether this role meets a minimum-role requirement
    pub fn satisfies(self, required: Role) -> bool {
        self.order() >= required.order()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == lowered)
            .ok_or_else(|| ShellError::InvalidRole {
                role: s.to_string(),
            })
    }
}

/// Commands granted to Artist (and inherited by everyone) when the roles
/// configuration cannot be used
pub const NAVIGATION_COMMANDS: [&str; 9] = [
    "cd", "clear", "dir", "exit", "help", "jobs", "ll", "ls", "pwd",
];

#[derive(Debug, Clone, PartialEq)]
enum Grants {
    /// No roles configuration: only minimum roles gate access
    Unrestricted,
    /// Effective (already inherited) permission set per role below Master
    Configured(BTreeMap<Role, BTreeSet<String>>),
}

/// Ordered roles plus their effective permission sets
#[derive(Debug, Clone, PartialEq)]
pub struct RoleHierarchy {
    grants: Grants,
}

impl RoleHierarchy {
    /// Hierarchy used when no roles configuration exists
    pub fn unrestricted() -> Self {
        Self {
            grants: Grants::Unrestricted,
        }
    }

    /// Built-in fallback: Artist gets the navigation commands, everyone
    /// above inherits exactly that set
    pub fn minimal_default() -> Self {
        let artist: BTreeSet<String> = NAVIGATION_COMMANDS.iter().map(|c| c.to_string()).collect();
        let mut declared = BTreeMap::new();
        declared.insert(Role::Artist, artist);
        Self {
            grants: Grants::Configured(inherit(&declared)),
        }
    }

    /// Build a hierarchy from declared per-role command sets
    ///
    /// Role names are matched case-insensitively. Command names are stored
    /// lowercase. A higher role whose declared set omits commands granted
    /// below it is normalized by inheritance and logged.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if any declared role is outside the fixed
    /// hierarchy.
    pub fn load<I, S>(declared: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, S)>,
        S: IntoIterator<Item = String>,
    {
        let mut by_role: BTreeMap<Role, BTreeSet<String>> = BTreeMap::new();
        for (name, commands) in declared {
            let role = Role::from_str(&name).map_err(|_| ShellError::Configuration {
                source_name: "roles".to_string(),
                reason: format!("role '{}' is not part of the hierarchy", name),
            })?;
            by_role
                .entry(role)
                .or_default()
                .extend(commands.into_iter().map(|c| c.to_ascii_lowercase()));
        }

        let mut below: BTreeSet<String> = BTreeSet::new();
        for role in Role::ALL {
            if let Some(own) = by_role.get(&role) {
                let narrowed: Vec<&String> = below.difference(own).collect();
                if !narrowed.is_empty() {
                    tracing::warn!(
                        role = role.as_str(),
                        missing = ?narrowed,
                        "role narrows commands granted to lower roles; inheriting them"
                    );
                }
                below.extend(own.iter().cloned());
            }
        }

        Ok(Self {
            grants: Grants::Configured(inherit(&by_role)),
        })
    }

    /// Check whether `active` meets `required`
    pub fn satisfies(&self, active: Role, required: Role) -> bool {
        active.satisfies(required)
    }

    /// Check whether a name denotes a role in the hierarchy
    pub fn is_valid_role(&self, name: &str) -> bool {
        Role::from_str(name).is_ok()
    }

    /// Whether permission sets restrict access beyond minimum roles
    pub fn is_restricted(&self) -> bool {
        matches!(self.grants, Grants::Configured(_))
    }

    /// Check whether a role's permission set includes a command
    ///
    /// Master is granted every command.
    pub fn permits(&self, role: Role, command: &str) -> bool {
        match &self.grants {
            Grants::Unrestricted => true,
            Grants::Configured(_) if role == Role::Master => true,
            Grants::Configured(sets) => sets
                .get(&role)
                .map(|set| set.contains(&command.to_ascii_lowercase()))
                .unwrap_or(false),
        }
    }

    /// Lowest role whose permission set includes the command
    pub fn lowest_permitting(&self, command: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| self.permits(*role, command))
    }

    /// Effective permission set of a role (None when unrestricted or Master)
    pub fn effective(&self, role: Role) -> Option<&BTreeSet<String>> {
        match &self.grants {
            Grants::Configured(sets) => sets.get(&role),
            Grants::Unrestricted => None,
        }
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::unrestricted()
    }
}

/// Union each role's declared set with everything below it
fn inherit(declared: &BTreeMap<Role, BTreeSet<String>>) -> BTreeMap<Role, BTreeSet<String>> {
    let mut effective = BTreeMap::new();
    let mut accumulated: BTreeSet<String> = BTreeSet::new();
    for role in Role::ALL {
        if let Some(own) = declared.get(&role) {
            accumulated.extend(own.iter().cloned());
        }
        effective.insert(role, accumulated.clone());
    }
    effective
}
