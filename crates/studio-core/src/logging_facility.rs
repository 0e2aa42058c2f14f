//! Structured logging for the shell
//!
//! [`init`] installs the subscriber once per process, the `log_op_*` macros
//! bracket operations with `start` / `end` / `end_error` events, and
//! [`test_capture`] records events in memory for assertions.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
