//! Command implementations.

pub mod extract;
pub mod summary;

pub use self::extract::{execute_extract, run_extraction};
pub use self::summary::{execute_summary, render_summary};
