//! Catalog behaviour policies.

use serde::{Deserialize, Serialize};

/// What happens when a second cover image is attached to the same owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverPolicy {
    /// Detach the previous cover before attaching the new one.
    #[default]
    Replace,
    /// Fail with a conflict while a cover is present.
    Reject,
}

/// What happens when an entity is assigned to a category it already has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Treat the assignment as a no-op and return the existing link.
    #[default]
    Ignore,
    /// Fail with a duplicate error.
    Reject,
}

/// How a category with live sub-categories or entity links is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Refuse while children or entity links exist.
    #[default]
    Restrict,
    /// Promote children to roots, then drop entity links.
    ReparentToRoot,
    /// Hand children to the deleted node's parent, then drop entity links.
    ReparentToParent,
}

/// Catalog behaviour configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Cover image multiplicity policy.
    #[serde(default)]
    pub cover_policy: CoverPolicy,
    /// Repeated category assignment policy.
    #[serde(default)]
    pub duplicate_assignment: DuplicatePolicy,
    /// Delete policy used when the caller does not name one.
    #[serde(default)]
    pub delete_policy: DeletePolicy,
}
