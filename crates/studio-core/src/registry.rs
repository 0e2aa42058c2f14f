//! Command registry and handler contract
//!
//! The registry is the single source of truth for which commands exist and
//! which minimum role each needs. It is filled once at startup and read-only
//! afterwards.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::config::UserDirectory;
use crate::errors::{Result, ShellError};
use crate::jobs::JobManager;
use crate::role::{Role, RoleHierarchy};
use crate::session::Session;

/// How a handler executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Runs synchronously inside the main loop
    Inline,
    /// Launches OS processes; the only kind allowed with the background marker
    Spawning,
}

/// Result of a successful command, rendered by the REPL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Silent,
    Lines(Vec<String>),
    ClearScreen,
    Exit,
}

impl Outcome {
    pub fn line(text: impl Into<String>) -> Self {
        Outcome::Lines(vec![text.into()])
    }
}

/// Shell state lent to a handler for one invocation
pub struct CommandContext<'a> {
    /// Name the command was invoked under
    pub command: &'a str,
    pub session: &'a mut Session,
    pub jobs: &'a mut JobManager,
    pub users: &'a mut UserDirectory,
    pub registry: &'a CommandRegistry,
    pub hierarchy: &'a RoleHierarchy,
}

/// Behaviour behind a registered command
///
/// Handlers never check roles themselves; the dispatcher authorizes before
/// `execute` is called.
pub trait CommandHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Inline
    }

    /// One-line usage synopsis
    fn usage(&self) -> &str {
        ""
    }

    /// Argument checks shared by foreground and background use
    ///
    /// `Some` answers the line on its own (help text, for instance) and
    /// nothing is executed or spawned.
    ///
    /// # Errors
    ///
    /// `Usage` when the arguments cannot start the command.
    fn preflight(&self, _command: &str, _args: &[String]) -> Result<Option<Outcome>> {
        Ok(None)
    }

    /// Run the command with the tokens following its name
    ///
    /// # Errors
    ///
    /// Any `ShellError`; the dispatcher reports it and the loop continues.
    fn execute(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> Result<Outcome>;
}

/// A registered command
pub struct Command {
    pub name: String,
    pub min_role: Role,
    pub description: String,
    handler: Box<dyn CommandHandler>,
}

impl Command {
    pub fn handler(&self) -> &dyn CommandHandler {
        self.handler.as_ref()
    }

    pub fn kind(&self) -> HandlerKind {
        self.handler.kind()
    }

    pub fn usage(&self) -> &str {
        match self.handler.usage() {
            "" => &self.name,
            usage => usage,
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("min_role", &self.min_role)
            .field("kind", &self.kind())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
    aliases: BTreeMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under a unique, case-insensitive name
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCommand` if the name (or an alias) is taken, or
    /// `InvalidRole` if `min_role` is not a role in the hierarchy.
    pub fn register<H>(
        &mut self,
        name: &str,
        min_role: &str,
        handler: H,
        description: &str,
    ) -> Result<()>
    where
        H: CommandHandler + 'static,
    {
        let key = name.to_lowercase();
        if self.commands.contains_key(&key) || self.aliases.contains_key(&key) {
            return Err(ShellError::DuplicateCommand { command: key });
        }
        let min_role = Role::from_str(min_role)?;

        tracing::debug!(command = %key, min_role = min_role.as_str(), "registered command");
        self.commands.insert(
            key.clone(),
            Command {
                name: key,
                min_role,
                description: description.to_string(),
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    /// Make `alias` resolve to an existing command
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCommand` if the alias is taken, or `UnknownCommand`
    /// if the target does not exist.
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<()> {
        let alias = alias.to_lowercase();
        let target = target.to_lowercase();
        if self.commands.contains_key(&alias) || self.aliases.contains_key(&alias) {
            return Err(ShellError::DuplicateCommand { command: alias });
        }
        if !self.commands.contains_key(&target) {
            return Err(ShellError::UnknownCommand { command: target });
        }
        self.aliases.insert(alias, target);
        Ok(())
    }

    /// Look up a command by name or alias
    pub fn resolve(&self, name: &str) -> Option<&Command> {
        let key = name.to_lowercase();
        let key = self.aliases.get(&key).unwrap_or(&key);
        self.commands.get(key)
    }

    /// Commands whose minimum role `active` satisfies, ordered by name
    pub fn list_for(&self, active: Role) -> Vec<&Command> {
        self.commands
            .values()
            .filter(|c| active.satisfies(c.min_role))
            .collect()
    }

    /// Every registered command, ordered by name
    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    struct Noop;

    impl CommandHandler for Noop {
        fn execute(&self, _: &mut CommandContext<'_>, _: &[String]) -> Result<Outcome> {
            Ok(Outcome::Silent)
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = CommandRegistry::new();
        registry.register("ls", "artist", Noop, "List files").unwrap();

        let command = registry.resolve("LS").unwrap();
        assert_eq!(command.name, "ls");
        assert_eq!(command.min_role, Role::Artist);
        assert_eq!(command.usage(), "ls");
        assert!(registry.resolve("foobar").is_none());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = CommandRegistry::new();
        registry.register("ls", "artist", Noop, "List files").unwrap();
        let err = registry.register("LS", "rnd", Noop, "Again").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateCommand);
        assert_eq!(registry.resolve("ls").unwrap().min_role, Role::Artist);
    }

    #[test]
    fn test_unknown_min_role_rejected_at_registration() {
        let mut registry = CommandRegistry::new();
        let err = registry.register("render", "producer", Noop, "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRole);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_for_filters_and_orders() {
        let mut registry = CommandRegistry::new();
        registry.register("run", "rnd", Noop, "").unwrap();
        registry.register("pwd", "artist", Noop, "").unwrap();
        registry.register("assign", "master", Noop, "").unwrap();
        registry.register("cd", "artist", Noop, "").unwrap();

        let names = |role| {
            registry
                .list_for(role)
                .into_iter()
                .map(|c| c.name.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(names(Role::Artist), vec!["cd", "pwd"]);
        assert_eq!(names(Role::Rnd), vec!["cd", "pwd", "run"]);
        assert_eq!(names(Role::Master), vec!["assign", "cd", "pwd", "run"]);
    }

    #[test]
    fn test_alias_resolves_to_target() {
        let mut registry = CommandRegistry::new();
        registry.register("quit", "artist", Noop, "").unwrap();
        registry.alias("kill", "quit").unwrap();

        assert_eq!(registry.resolve("kill").unwrap().name, "quit");
        assert_eq!(
            registry.alias("quit", "quit").unwrap_err().kind(),
            ErrorKind::DuplicateCommand
        );
        assert_eq!(
            registry.alias("stop", "halt").unwrap_err().kind(),
            ErrorKind::UnknownCommand
        );
        assert_eq!(
            registry.register("kill", "artist", Noop, "").unwrap_err().kind(),
            ErrorKind::DuplicateCommand
        );
    }
}
