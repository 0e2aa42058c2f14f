//! Types shared by the studio shell crates
//!
//! [`correlation`] holds the ids stamped on log events and [`schema`] the
//! field keys those events use.

pub mod correlation;
pub mod schema;

pub use correlation::{RequestId, SessionId};
