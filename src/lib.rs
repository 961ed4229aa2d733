//! `lda-grid` library crate.
//!
//! The binary (`lda`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., notebooks, services, other frontends)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod grid;
pub mod io;
pub mod report;
pub mod train;
