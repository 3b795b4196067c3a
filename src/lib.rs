// ABOUTME: Library module for table-quirks
// ABOUTME: Exports the table model, override layer, and CLI commands

pub mod commands;
pub mod error;
pub mod overrides;
pub mod schema;
pub mod utils;

pub use error::{OverrideError, Result};
pub use overrides::{apply_overrides, apply_overrides_with, Registry};
