//! Input/output helpers.
//!
//! - dictionary + corpus ingest (`corpus`)
//! - trained model storage under the grid layout (`store`)
//! - doc-topics CSV export (`export`)

pub mod corpus;
pub mod export;
pub mod store;

pub use corpus::*;
pub use export::*;
pub use store::*;
