//! Studio Core - command dispatch and job engine for the studio shell
//!
//! This crate provides everything behind the interactive prompt:
//! - Role hierarchy with configuration-driven, inherited permission sets
//! - Command registry and the handler contract
//! - Session state (identity, assigned and active role, working directory)
//! - Background job manager over an injectable process host
//! - Dispatch engine that parses, authorizes and routes one line at a time
//!
//! The binary in `studio-cli` only reads lines and renders outcomes.

pub mod bootstrap;
pub mod builtins;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod identity;
pub mod jobs;
pub mod logging_facility;
pub mod registry;
pub mod role;
pub mod session;
pub mod tokenize;

// Re-export commonly used types
pub use bootstrap::{start, start_with_host, Startup, StartupOptions};
pub use config::UserDirectory;
pub use dispatch::{authorize, Dispatcher};
pub use errors::{ErrorKind, Result, ShellError};
pub use jobs::{Job, JobManager, JobStatus, KillReport, ProcessHandle, ProcessHost};
pub use registry::{CommandContext, CommandHandler, CommandRegistry, HandlerKind, Outcome};
pub use role::{Role, RoleHierarchy};
pub use session::Session;
pub use studio_core_types::schema;
