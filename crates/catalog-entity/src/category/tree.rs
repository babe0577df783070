//! Arena view over a flat list of categories.
//!
//! Categories are stored flat with a `parent_id`. [`CategoryTree`] indexes
//! them by id and by parent so that sub-categories, ancestry and cycle
//! checks never need live parent/child references.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use catalog_core::error::AppError;
use catalog_core::result::AppResult;
use catalog_core::types::CategoryId;

use super::model::Category;
use super::query::by_name;

/// A category rendered with its nested children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryNode {
    /// Category ID.
    pub id: CategoryId,
    /// Category name.
    pub name: String,
    /// Active flag.
    pub active: bool,
    /// Featured flag.
    pub featured: bool,
    /// Depth level (0 for roots).
    pub depth: u32,
    /// Number of direct child nodes rendered below.
    pub child_count: u64,
    /// Number of entities linked to this category.
    pub entity_count: u64,
    /// Child category nodes.
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Whether the node has rendered children.
    pub fn has_sub_categories(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Flat category store with a parent index.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: HashMap<CategoryId, Category>,
    children: HashMap<CategoryId, Vec<CategoryId>>,
}

impl CategoryTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a list of categories.
    pub fn from_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut tree = Self::new();
        for category in categories {
            tree.insert(category);
        }
        tree
    }

    /// Insert or replace a category, keeping the parent index current.
    pub fn insert(&mut self, category: Category) {
        let id = category.id;
        if let Some(previous) = self.nodes.get(&id) {
            if let Some(old_parent) = previous.parent_id {
                self.unlink_child(old_parent, id);
            }
        }
        if let Some(parent) = category.parent_id {
            self.children.entry(parent).or_default().push(id);
        }
        self.nodes.insert(id, category);
    }

    /// Remove a category. Its children keep their `parent_id`; callers
    /// reparent them first.
    pub fn remove(&mut self, id: CategoryId) -> Option<Category> {
        let category = self.nodes.remove(&id)?;
        if let Some(parent) = category.parent_id {
            self.unlink_child(parent, id);
        }
        Some(category)
    }

    fn unlink_child(&mut self, parent: CategoryId, child: CategoryId) {
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.retain(|c| *c != child);
            if siblings.is_empty() {
                self.children.remove(&parent);
            }
        }
    }

    /// Look up a category.
    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.nodes.get(&id)
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no categories.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root categories, sorted by name.
    pub fn roots(&self) -> Vec<&Category> {
        let mut roots: Vec<&Category> = self.nodes.values().filter(|c| c.is_root()).collect();
        roots.sort_by(|a, b| by_name(a, b));
        roots
    }

    /// Direct sub-categories of `id`, sorted by name.
    pub fn children(&self, id: CategoryId) -> Vec<&Category> {
        let mut children: Vec<&Category> = self
            .children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.nodes.get(child))
            .collect();
        children.sort_by(|a, b| by_name(a, b));
        children
    }

    /// Number of direct sub-categories.
    pub fn child_count(&self, id: CategoryId) -> usize {
        self.children.get(&id).map_or(0, Vec::len)
    }

    /// Whether `id` has at least one sub-category.
    pub fn has_sub_categories(&self, id: CategoryId) -> bool {
        self.child_count(id) > 0
    }

    /// Ancestor ids of `id`, nearest first. Stops at a root or at a parent
    /// missing from the tree. A revisited node is reported as a cycle.
    pub fn ancestors(&self, id: CategoryId) -> AppResult<Vec<CategoryId>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.nodes.get(&id).and_then(|c| c.parent_id);

        while let Some(parent) = current {
            if !seen.insert(parent) {
                return Err(AppError::invariant(format!(
                    "Category {id} is its own ancestor through {parent}"
                )));
            }
            chain.push(parent);
            current = self.nodes.get(&parent).and_then(|c| c.parent_id);
        }
        Ok(chain)
    }

    /// Every descendant of `id`, breadth first.
    pub fn descendants(&self, id: CategoryId) -> Vec<CategoryId> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);
        while let Some(next) = queue.pop_front() {
            for child in self.children.get(&next).into_iter().flatten() {
                if seen.insert(*child) {
                    out.push(*child);
                    queue.push_back(*child);
                }
            }
        }
        out
    }

    /// Depth of `id` (0 for roots).
    pub fn depth(&self, id: CategoryId) -> AppResult<u32> {
        Ok(self.ancestors(id)?.len() as u32)
    }

    /// Root-to-node path, inclusive.
    pub fn breadcrumbs(&self, id: CategoryId) -> AppResult<Vec<&Category>> {
        let node = self
            .nodes
            .get(&id)
            .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))?;
        let mut trail: Vec<&Category> = self
            .ancestors(id)?
            .into_iter()
            .rev()
            .filter_map(|a| self.nodes.get(&a))
            .collect();
        trail.push(node);
        Ok(trail)
    }

    /// Check that `id` may hang under `new_parent`.
    ///
    /// Fails with `NotFound` when either node is missing, and with
    /// `InvariantViolation` when the parent is of another kind, is the node
    /// itself, or is one of its descendants.
    pub fn check_parent(&self, id: CategoryId, new_parent: Option<CategoryId>) -> AppResult<()> {
        let node = self
            .nodes
            .get(&id)
            .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))?;
        let Some(parent_id) = new_parent else {
            return Ok(());
        };
        let parent = self
            .nodes
            .get(&parent_id)
            .ok_or_else(|| AppError::not_found(format!("Parent category {parent_id} not found")))?;

        if parent.kind != node.kind {
            return Err(AppError::invariant(format!(
                "A {} category cannot be placed under a {} category",
                node.kind, parent.kind
            )));
        }
        if parent_id == id {
            return Err(AppError::invariant(format!(
                "Category {id} cannot be its own parent"
            )));
        }
        if self.ancestors(parent_id)?.contains(&id) {
            return Err(AppError::invariant(format!(
                "Moving category {id} under {parent_id} would create a cycle"
            )));
        }
        Ok(())
    }

    /// Move `id` under `new_parent` after [`Self::check_parent`] passes.
    pub fn reparent(&mut self, id: CategoryId, new_parent: Option<CategoryId>) -> AppResult<()> {
        self.check_parent(id, new_parent)?;
        if let Some(mut category) = self.nodes.get(&id).cloned() {
            category.parent_id = new_parent;
            self.insert(category);
        }
        Ok(())
    }

    /// Verify that no category is its own ancestor.
    pub fn verify_acyclic(&self) -> AppResult<()> {
        for id in self.nodes.keys() {
            self.ancestors(*id)?;
        }
        Ok(())
    }

    /// Render the nested tree below the roots.
    ///
    /// With `active_only`, inactive categories and everything below them
    /// are skipped. `entity_counts` supplies per-category link counts.
    pub fn to_nodes(
        &self,
        active_only: bool,
        entity_counts: &HashMap<CategoryId, u64>,
    ) -> Vec<CategoryNode> {
        self.roots()
            .into_iter()
            .filter(|c| !active_only || c.active)
            .map(|root| self.build_node(root, 0, active_only, entity_counts))
            .collect()
    }

    /// Render the nested subtree rooted at `id`.
    pub fn subtree(
        &self,
        id: CategoryId,
        active_only: bool,
        entity_counts: &HashMap<CategoryId, u64>,
    ) -> AppResult<CategoryNode> {
        let root = self
            .nodes
            .get(&id)
            .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))?;
        let depth = self.depth(id)?;
        Ok(self.build_node(root, depth, active_only, entity_counts))
    }

    fn build_node(
        &self,
        category: &Category,
        depth: u32,
        active_only: bool,
        entity_counts: &HashMap<CategoryId, u64>,
    ) -> CategoryNode {
        let children: Vec<CategoryNode> = self
            .children(category.id)
            .into_iter()
            .filter(|c| !active_only || c.active)
            .map(|child| self.build_node(child, depth + 1, active_only, entity_counts))
            .collect();

        CategoryNode {
            id: category.id,
            name: category.name.clone(),
            active: category.active,
            featured: category.featured,
            depth,
            child_count: children.len() as u64,
            entity_count: entity_counts.get(&category.id).copied().unwrap_or(0),
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::NewCategory;
    use crate::kind::EntityKind;
    use catalog_core::error::ErrorKind;

    fn category(name: &str, parent: Option<&Category>) -> Category {
        let mut new = NewCategory::new(EntityKind::Lodging, name);
        new.parent_id = parent.map(|p| p.id);
        new.into_category()
    }

    fn sample() -> (CategoryTree, Category, Category, Category) {
        let a = category("Accommodation", None);
        let b = category("Hotels", Some(&a));
        let c = category("Boutique", Some(&b));
        let tree = CategoryTree::from_categories([a.clone(), b.clone(), c.clone()]);
        (tree, a, b, c)
    }

    #[test]
    fn test_create_and_nest() {
        let (tree, a, b, _) = sample();
        assert!(tree.has_sub_categories(a.id));
        assert_eq!(tree.get(b.id).unwrap().parent_id, Some(a.id));
        assert_eq!(tree.children(a.id)[0].id, b.id);
        assert_eq!(tree.roots().len(), 1);
    }

    #[test]
    fn test_has_sub_categories_tracks_child_count() {
        let (mut tree, a, b, c) = sample();
        for id in [a.id, b.id, c.id] {
            assert_eq!(tree.has_sub_categories(id), tree.child_count(id) > 0);
        }
        tree.remove(c.id);
        assert!(!tree.has_sub_categories(b.id));
        tree.reparent(b.id, None).unwrap();
        assert!(!tree.has_sub_categories(a.id));
        assert_eq!(tree.roots().len(), 2);
    }

    #[test]
    fn test_reject_cyclic_reparent() {
        let (mut tree, a, b, c) = sample();
        let err = tree.reparent(a.id, Some(b.id)).unwrap_err();
        assert!(err.is(ErrorKind::InvariantViolation));
        let err = tree.reparent(a.id, Some(c.id)).unwrap_err();
        assert!(err.is(ErrorKind::InvariantViolation));
        let err = tree.reparent(a.id, Some(a.id)).unwrap_err();
        assert!(err.is(ErrorKind::InvariantViolation));
        assert!(tree.get(a.id).unwrap().is_root());
    }

    #[test]
    fn test_reject_cross_kind_parent() {
        let (mut tree, a, _, _) = sample();
        let tools = NewCategory::new(EntityKind::Product, "Tools").into_category();
        let tools_id = tools.id;
        tree.insert(tools);
        let err = tree.reparent(tools_id, Some(a.id)).unwrap_err();
        assert!(err.is(ErrorKind::InvariantViolation));
    }

    #[test]
    fn test_missing_parent_is_not_found() {
        let (tree, a, _, _) = sample();
        let err = tree.check_parent(a.id, Some(CategoryId::new())).unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }

    #[test]
    fn test_any_reparent_sequence_stays_acyclic() {
        let mut nodes = vec![category("n0", None)];
        for i in 1..12 {
            let parent = nodes[(i - 1) / 2].clone();
            nodes.push(category(&format!("n{i}"), Some(&parent)));
        }
        let ids: Vec<CategoryId> = nodes.iter().map(|n| n.id).collect();
        let mut tree = CategoryTree::from_categories(nodes);

        // Deterministic pseudo-random walk over (node, parent) pairs.
        let mut seed: usize = 7;
        for _ in 0..400 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345) % 2_147_483_648;
            let node = ids[seed % ids.len()];
            let target = (seed / 7) % (ids.len() + 1);
            let parent = ids.get(target).copied();
            let _ = tree.reparent(node, parent);
            tree.verify_acyclic().unwrap();
        }
        for id in &ids {
            let chain = tree.ancestors(*id).unwrap();
            assert!(!chain.contains(id));
            assert!(chain.len() < ids.len());
        }
    }

    #[test]
    fn test_ancestors_detects_corrupt_cycle() {
        let mut a = category("a", None);
        let mut b = category("b", None);
        a.parent_id = Some(b.id);
        b.parent_id = Some(a.id);
        let a_id = a.id;
        let tree = CategoryTree::from_categories([a, b]);
        assert!(tree.ancestors(a_id).unwrap_err().is(ErrorKind::InvariantViolation));
        assert!(tree.verify_acyclic().is_err());
    }

    #[test]
    fn test_breadcrumbs_and_descendants() {
        let (tree, a, b, c) = sample();
        let trail: Vec<CategoryId> = tree.breadcrumbs(c.id).unwrap().iter().map(|x| x.id).collect();
        assert_eq!(trail, vec![a.id, b.id, c.id]);
        assert_eq!(tree.descendants(a.id), vec![b.id, c.id]);
        assert_eq!(tree.depth(c.id).unwrap(), 2);
    }

    #[test]
    fn test_to_nodes_skips_inactive_branches() {
        let (mut tree, a, b, _) = sample();
        let mut hidden = tree.get(b.id).unwrap().clone();
        hidden.active = false;
        tree.insert(hidden);

        let counts = HashMap::from([(a.id, 4)]);
        let all = tree.to_nodes(false, &counts);
        assert_eq!(all[0].entity_count, 4);
        assert_eq!(all[0].children[0].children.len(), 1);

        let active = tree.to_nodes(true, &counts);
        assert!(!active[0].has_sub_categories());
    }
}
