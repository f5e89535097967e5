//! Core definitions (errors and verification macros), relied upon by all lexica-* crates.

pub mod error;
pub mod result;

pub use result::Result;
