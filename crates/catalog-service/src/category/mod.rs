//! Category trees and entity assignments.

pub mod service;
pub mod tree;

pub use service::{CategoryService, DeleteOutcome};
pub use tree::TreeService;
