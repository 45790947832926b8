//! Domain services used by the CLI.
//!
//! ARCHITECTURE
//! ============
//! `storage` owns persistence and never fails loudly. `account` and
//! `events` sit on top of it, enforce the session and ownership rules the
//! screens used to enforce, and report typed errors.

pub mod account;
pub mod events;
pub mod storage;

/// Stable machine-readable code for a service error.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}
