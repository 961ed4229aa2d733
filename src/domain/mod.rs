//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the Dirichlet prior styles (`DirichletPrior`)
//! - one grid point's hyperparameters (`HyperParams`)
//! - fixed training settings and the resolved run configuration

pub mod types;

pub use types::*;
