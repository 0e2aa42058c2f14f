//! Field keys and event names for the shell's structured logs
//!
//! The operation macros in `studio-core` emit these keys, the dispatch span
//! carries the correlation keys, and the test capture layer reads them back.

/// Module that emitted the event
pub const FIELD_COMPONENT: &str = "component";
/// Operation name, e.g. `dispatch` or `job_spawn`
pub const FIELD_OP: &str = "op";
/// One of the `EVENT_*` names below
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// set on the dispatch span, inherited by every event of that line
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_SESSION_ID: &str = "session_id";

pub const FIELD_COMMAND: &str = "command";
pub const FIELD_JOB_ID: &str = "job_id";

pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_distinct() {
        assert_ne!(EVENT_START, EVENT_END);
        assert_ne!(EVENT_START, EVENT_END_ERROR);
        assert_ne!(EVENT_END, EVENT_END_ERROR);
    }

    #[test]
    fn test_error_fields_are_namespaced() {
        assert!(FIELD_ERR_KIND.starts_with("err."));
        assert!(FIELD_ERR_CODE.starts_with("err."));
    }
}
