//! Dispatch engine
//!
//! Turns one input line into exactly one outcome or error:
//!
//! 1. tokenize, detecting the trailing background marker
//! 2. resolve the command name through the registry
//! 3. authorize against the session's active role
//! 4. run the handler inline, or hand the tokens to the job manager
//!
//! Authorization always completes before a handler or the job manager is
//! touched. Every failure, including a handler panic, is returned as a
//! `ShellError`; nothing here ends the main loop.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use studio_core_types::{schema, RequestId};

use crate::config::UserDirectory;
use crate::errors::{ErrorKind, Result, ShellError};
use crate::jobs::JobManager;
use crate::registry::{Command, CommandContext, CommandRegistry, HandlerKind, Outcome};
use crate::role::{Role, RoleHierarchy};
use crate::session::Session;
use crate::tokenize::{parse_line, ParsedLine};
use crate::{log_op_end, log_op_error, log_op_start};

/// Check whether the session may run `command`
///
/// The active role must meet the command's minimum role and, unless the
/// user is assigned Master, the active role's permission set must list the
/// command.
///
/// # Errors
///
/// Returns `Permission` naming the lowest role that would be allowed.
pub fn authorize(hierarchy: &RoleHierarchy, session: &Session, command: &Command) -> Result<()> {
    let active = session.current_role();
    let waived = session.assigned_role() == Role::Master;
    let meets_minimum = hierarchy.satisfies(active, command.min_role);
    let in_permission_set = waived || hierarchy.permits(active, &command.name);

    if meets_minimum && in_permission_set {
        return Ok(());
    }

    let required = if waived {
        command.min_role
    } else {
        hierarchy
            .lowest_permitting(&command.name)
            .unwrap_or(Role::Master)
            .max(command.min_role)
    };
    Err(ShellError::Permission {
        action: command.name.clone(),
        required,
    })
}

/// Owner of all shell state for one session
pub struct Dispatcher {
    hierarchy: RoleHierarchy,
    registry: CommandRegistry,
    session: Session,
    jobs: JobManager,
    users: UserDirectory,
}

impl Dispatcher {
    pub fn new(
        hierarchy: RoleHierarchy,
        registry: CommandRegistry,
        session: Session,
        jobs: JobManager,
        users: UserDirectory,
    ) -> Self {
        Self {
            hierarchy,
            registry,
            session,
            jobs,
            users,
        }
    }

    /// Process one input line
    ///
    /// Blank input yields `Outcome::Silent`.
    ///
    /// # Errors
    ///
    /// Any `ShellError` from parsing, lookup, authorization, the handler or
    /// the job manager. The dispatcher stays usable afterwards.
    pub fn dispatch(&mut self, line: &str) -> Result<Outcome> {
        let request_id = RequestId::new();
        let span = tracing::info_span!(
            "dispatch",
            { schema::FIELD_REQUEST_ID } = tracing::field::display(&request_id),
            { schema::FIELD_SESSION_ID } = tracing::field::display(self.session.id()),
        );
        let _guard = span.enter();

        let Some(parsed) = parse_line(line)? else {
            return Ok(Outcome::Silent);
        };

        let started = Instant::now();
        log_op_start!(
            "dispatch",
            { schema::FIELD_COMMAND } = parsed.command.as_str(),
            role = self.session.current_role().as_str(),
            background = parsed.background
        );

        let result = self.route(&parsed);
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                log_op_end!("dispatch", duration_ms = duration_ms);
            }
            Err(e) if e.kind() == ErrorKind::Handler => {
                log_op_error!("dispatch", e, duration_ms = duration_ms);
            }
            Err(e) => tracing::debug!(
                { schema::FIELD_OP } = "dispatch",
                { schema::FIELD_EVENT } = schema::EVENT_END_ERROR,
                { schema::FIELD_DURATION_MS } = duration_ms,
                { schema::FIELD_ERR_CODE } = e.code(),
                "{}",
                e
            ),
        }
        result
    }

    fn route(&mut self, parsed: &ParsedLine) -> Result<Outcome> {
        let Self {
            hierarchy,
            registry,
            session,
            jobs,
            users,
        } = self;
        let registry = &*registry;
        let hierarchy = &*hierarchy;

        let command = registry
            .resolve(&parsed.command)
            .ok_or_else(|| ShellError::UnknownCommand {
                command: parsed.command.clone(),
            })?;

        authorize(hierarchy, session, command)?;

        if parsed.background {
            if command.kind() != HandlerKind::Spawning {
                return Err(ShellError::InvalidBackgroundUse {
                    command: command.name.clone(),
                });
            }
            if let Some(outcome) = command.handler().preflight(&command.name, &parsed.args)? {
                return Ok(outcome);
            }
            let job = jobs.spawn(&parsed.args, session.working_dir())?;
            return Ok(Outcome::line(format!(
                "[{}] {} started: {}",
                job.id, job.pid, job.command_line
            )));
        }

        let mut ctx = CommandContext {
            command: &command.name,
            session,
            jobs,
            users,
            registry,
            hierarchy,
        };
        let handler = command.handler();
        match panic::catch_unwind(AssertUnwindSafe(|| handler.execute(&mut ctx, &parsed.args))) {
            Ok(result) => result,
            Err(payload) => Err(ShellError::handler(
                &command.name,
                format!("panicked: {}", panic_message(payload.as_ref())),
            )),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn jobs(&self) -> &JobManager {
        &self.jobs
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    /// Replace the whole role hierarchy at once
    pub fn reload_roles(&mut self, hierarchy: RoleHierarchy) {
        tracing::info!(restricted = hierarchy.is_restricted(), "role hierarchy reloaded");
        self.hierarchy = hierarchy;
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("session", &self.session)
            .field("commands", &self.registry.len())
            .field("jobs", &self.jobs)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
