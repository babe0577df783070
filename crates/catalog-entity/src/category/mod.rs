//! Category tree and entity-category links.

pub mod link;
pub mod model;
pub mod query;
pub mod tree;

pub use link::CategoryLink;
pub use model::{
    Category, CategoryChanges, CategoryState, DESCRIPTION_MAX_LEN, NAME_MAX_LEN, NewCategory,
    TreePosition,
};
pub use query::{CategoryQuery, ParentFilter, SORTABLE_FIELDS};
pub use tree::{CategoryNode, CategoryTree};
