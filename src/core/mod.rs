//! Core plumbing for the export pipeline.
//!
//! This module contains the error taxonomy shared by every stage of the
//! export and re-exports the commonly used types.

pub mod errors;

pub use errors::{ExportError, ExportResult};
