//! Operation logging macros
//!
//! An operation such as `dispatch` or `job_spawn` emits one `start` event and
//! then either `end` or `end_error`. Keys come from [`crate::schema`], so the
//! JSON output and the test capture layer agree on them. Extra `key = value`
//! fields are passed through to `tracing` as written.

#[doc(hidden)]
#[macro_export]
macro_rules! __op_event {
    ($level:expr, $event:expr, $op:expr $(, $($field:tt)+)?) => {
        tracing::event!(
            $level,
            { $crate::schema::FIELD_COMPONENT } = module_path!(),
            { $crate::schema::FIELD_OP } = $op,
            { $crate::schema::FIELD_EVENT } = $event
            $(, $($field)+)?
        )
    };
}

/// Info-level `start` event
///
/// ```
/// # use studio_core::log_op_start;
/// log_op_start!("job_spawn", command = "render");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)+)?) => {
        $crate::__op_event!(
            tracing::Level::INFO,
            $crate::schema::EVENT_START,
            $op
            $(, $($field)+)?
        )
    };
}

/// Info-level `end` event with the elapsed time
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {
        $crate::__op_event!(
            tracing::Level::INFO,
            $crate::schema::EVENT_END,
            $op,
            { $crate::schema::FIELD_DURATION_MS } = $duration
            $(, $($field)+)?
        )
    };
}

/// Error-level `end_error` event carrying the error's kind and stable code
///
/// Reserved for failures a maintainer should see. User mistakes (unknown
/// command, missing permission) are logged at debug level by the dispatcher.
///
/// ```
/// # use studio_core::{log_op_error, ShellError};
/// let err = ShellError::NoJobs;
/// log_op_error!("job_kill_last", err, duration_ms = 0);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {{
        let shell_err: &$crate::errors::ShellError = &$err;
        $crate::__op_event!(
            tracing::Level::ERROR,
            $crate::schema::EVENT_END_ERROR,
            $op,
            { $crate::schema::FIELD_DURATION_MS } = $duration,
            { $crate::schema::FIELD_ERR_KIND } = tracing::field::debug(shell_err.kind()),
            { $crate::schema::FIELD_ERR_CODE } = shell_err.code()
            $(, $($field)+)?
        )
    }};
}
