use crate::role::Role;
use thiserror::Error;

/// Result type alias using ShellError
pub type Result<T> = std::result::Result<T, ShellError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure the dispatch boundary can report maps onto exactly one kind.
/// Kinds carry a stable code used in structured log events and in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // Dispatch
    UnknownCommand,
    Permission,
    InvalidBackgroundUse,
    Parse,
    Usage,

    // Jobs
    Spawn,
    NoJobs,
    AlreadyTerminated,

    // Handlers
    Handler,
    Path,

    // Startup / configuration
    Configuration,
    DuplicateCommand,
    InvalidRole,

    // Integration/IO
    Io,
}

impl ErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnknownCommand => "ERR_UNKNOWN_COMMAND",
            ErrorKind::Permission => "ERR_PERMISSION",
            ErrorKind::InvalidBackgroundUse => "ERR_INVALID_BACKGROUND_USE",
            ErrorKind::Parse => "ERR_PARSE",
            ErrorKind::Usage => "ERR_USAGE",
            ErrorKind::Spawn => "ERR_SPAWN",
            ErrorKind::NoJobs => "ERR_NO_JOBS",
            ErrorKind::AlreadyTerminated => "ERR_ALREADY_TERMINATED",
            ErrorKind::Handler => "ERR_HANDLER",
            ErrorKind::Path => "ERR_PATH",
            ErrorKind::Configuration => "ERR_CONFIGURATION",
            ErrorKind::DuplicateCommand => "ERR_DUPLICATE_COMMAND",
            ErrorKind::InvalidRole => "ERR_INVALID_ROLE",
            ErrorKind::Io => "ERR_IO",
        }
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for the studio shell
///
/// All variants except a registry construction failure at startup are
/// recovered at the dispatch boundary and rendered as a single line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShellError {
    // ===== Dispatch Errors =====
    /// No command is registered under this name
    #[error("Command not found: {command}")]
    UnknownCommand { command: String },

    /// Active role is too low (or the action needs an assigned Master)
    #[error("Permission denied: '{action}' requires the {required} role")]
    Permission { action: String, required: Role },

    /// A non-spawning command was suffixed with the background marker
    #[error("'{command}' cannot run in the background")]
    InvalidBackgroundUse { command: String },

    /// Input line could not be tokenized
    #[error("Error parsing command: {reason}")]
    Parse { reason: String },

    /// Handler rejected its arguments
    #[error("Usage: {usage}")]
    Usage { command: String, usage: String },

    // ===== Job Errors =====
    /// OS refused to create the process or the program was not found
    #[error("Failed to start '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// No background job has ever been spawned
    #[error("No background jobs")]
    NoJobs,

    /// The targeted job is already terminated
    #[error("Job {job_id} is already terminated")]
    AlreadyTerminated { job_id: u64 },

    // ===== Handler Errors =====
    /// Handler-internal failure
    #[error("'{command}' failed: {message}")]
    Handler { command: String, message: String },

    /// Working directory change target is missing or not a directory
    #[error("Invalid directory {path}: {reason}")]
    Path { path: String, reason: String },

    // ===== Configuration / Registry Errors =====
    /// Malformed role or user configuration
    #[error("Configuration error in {source_name}: {reason}")]
    Configuration { source_name: String, reason: String },

    /// Command name already registered
    #[error("Command already registered: {command}")]
    DuplicateCommand { command: String },

    /// Role name outside the fixed hierarchy
    #[error("Unknown role: {role}")]
    InvalidRole { role: String },

    // ===== Generic Errors =====
    /// Filesystem or stream failure
    #[error("I/O error during {op}: {message}")]
    Io { op: String, message: String },
}

impl ShellError {
    /// Classify this error into the canonical taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShellError::UnknownCommand { .. } => ErrorKind::UnknownCommand,
            ShellError::Permission { .. } => ErrorKind::Permission,
            ShellError::InvalidBackgroundUse { .. } => ErrorKind::InvalidBackgroundUse,
            ShellError::Parse { .. } => ErrorKind::Parse,
            ShellError::Usage { .. } => ErrorKind::Usage,
            ShellError::Spawn { .. } => ErrorKind::Spawn,
            ShellError::NoJobs => ErrorKind::NoJobs,
            ShellError::AlreadyTerminated { .. } => ErrorKind::AlreadyTerminated,
            ShellError::Handler { .. } => ErrorKind::Handler,
            ShellError::Path { .. } => ErrorKind::Path,
            ShellError::Configuration { .. } => ErrorKind::Configuration,
            ShellError::DuplicateCommand { .. } => ErrorKind::DuplicateCommand,
            ShellError::InvalidRole { .. } => ErrorKind::InvalidRole,
            ShellError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Build a usage error for a command
    pub fn usage(command: &str, usage: &str) -> Self {
        ShellError::Usage {
            command: command.to_string(),
            usage: usage.to_string(),
        }
    }

    /// Build a handler failure for a command
    pub fn handler(command: &str, message: impl Into<String>) -> Self {
        ShellError::Handler {
            command: command.to_string(),
            message: message.into(),
        }
    }
}

/// Wrap an I/O error with the operation that produced it
pub fn io_error(op: &str, err: std::io::Error) -> ShellError {
    ShellError::Io {
        op: op.to_string(),
        message: err.to_string(),
    }
}

impl From<serde_json::Error> for ShellError {
    fn from(err: serde_json::Error) -> Self {
        ShellError::Configuration {
            source_name: "json".to_string(),
            reason: err.to_string(),
        }
    }
}
