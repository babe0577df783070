//! # catalog-core
//!
//! Core crate for the catalog workspace. Contains the unified error
//! system, typed identifiers, pagination and sorting types, and the
//! configuration schema.
//!
//! This crate has **no** internal dependencies on other catalog crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
