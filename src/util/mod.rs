//! Presentation and id helpers shared by services and the CLI.

pub mod format;
