//! Category lifecycle integration tests.

mod helpers;

use catalog_core::config::{AppConfig, DeletePolicy};
use catalog_core::error::ErrorKind;
use catalog_core::types::{CategoryId, SortField};
use catalog_entity::{
    AuditableEntity, Category, CategoryChanges, CategoryQuery, EntityKind, NewCategory, ParentFilter,
};
use helpers::{Listing, TestCatalog};

#[tokio::test]
async fn test_create_nested_category() {
    let t = TestCatalog::new().await;
    let accommodation = t.create(EntityKind::Lodging, "Accommodation", None).await;
    assert!(!t.catalog.trees.has_sub_categories(accommodation.id).await.unwrap());

    let hotels = t
        .create(EntityKind::Lodging, "Hotels", Some(accommodation.id))
        .await;

    assert_eq!(hotels.parent_id, Some(accommodation.id));
    assert!(hotels.active);
    assert_eq!(hotels.version, 1);
    assert!(t.catalog.trees.has_sub_categories(accommodation.id).await.unwrap());
    assert!(!t.catalog.trees.has_sub_categories(hotels.id).await.unwrap());
}

#[tokio::test]
async fn test_create_trims_name() {
    let t = TestCatalog::new().await;
    let category = t.create(EntityKind::Product, "  Shoes  ", None).await;
    assert_eq!(category.name, "Shoes");
}

#[tokio::test]
async fn test_create_rejects_invalid_names() {
    let t = TestCatalog::new().await;

    let long = NewCategory::new(EntityKind::Lodging, "x".repeat(101));
    let err = t.catalog.categories.create(&t.ctx, long).await.unwrap_err();
    assert!(err.is(ErrorKind::Validation));

    let blank = NewCategory::new(EntityKind::Lodging, "   ");
    let err = t.catalog.categories.create(&t.ctx, blank).await.unwrap_err();
    assert!(err.is(ErrorKind::Validation));

    let exact = NewCategory::new(EntityKind::Lodging, "x".repeat(100));
    assert!(t.catalog.categories.create(&t.ctx, exact).await.is_ok());
}

#[tokio::test]
async fn test_create_rejects_long_description() {
    let t = TestCatalog::new().await;
    let new = NewCategory::new(EntityKind::Service, "Cleaning").with_description("d".repeat(5001));
    let err = t.catalog.categories.create(&t.ctx, new).await.unwrap_err();
    assert!(err.is(ErrorKind::Validation));
}

#[tokio::test]
async fn test_create_with_missing_parent() {
    let t = TestCatalog::new().await;
    let new = NewCategory::new(EntityKind::Lodging, "Hotels").with_parent(CategoryId::new());
    let err = t.catalog.categories.create(&t.ctx, new).await.unwrap_err();
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_create_under_other_kind() {
    let t = TestCatalog::new().await;
    let products = t.create(EntityKind::Product, "Products", None).await;
    let new = NewCategory::new(EntityKind::Lodging, "Hotels").with_parent(products.id);
    let err = t.catalog.categories.create(&t.ctx, new).await.unwrap_err();
    assert!(err.is(ErrorKind::InvariantViolation));
}

#[tokio::test]
async fn test_update_checks_version() {
    let t = TestCatalog::new().await;
    let category = t.create(EntityKind::Business, "Cafes", None).await;

    let changes = CategoryChanges {
        name: Some(" Coffee Shops ".into()),
        featured: Some(true),
        ..CategoryChanges::default()
    };
    let updated = t
        .catalog
        .categories
        .update(&t.ctx, category.id, changes.clone(), category.version)
        .await
        .unwrap();
    assert_eq!(updated.name, "Coffee Shops");
    assert!(updated.featured);
    assert_eq!(updated.version, category.version + 1);

    let err = t
        .catalog
        .categories
        .update(&t.ctx, category.id, changes, category.version)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Conflict));
}

#[tokio::test]
async fn test_reparent_into_own_subtree_is_rejected() {
    let t = TestCatalog::new().await;
    let a = t.create(EntityKind::Lodging, "A", None).await;
    let b = t.create(EntityKind::Lodging, "B", Some(a.id)).await;
    let c = t.create(EntityKind::Lodging, "C", Some(b.id)).await;

    let err = t
        .catalog
        .categories
        .reparent(&t.ctx, a.id, Some(c.id), a.version)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::InvariantViolation));

    let err = t
        .catalog
        .categories
        .reparent(&t.ctx, a.id, Some(a.id), a.version)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::InvariantViolation));

    let unchanged = t.catalog.categories.get(a.id).await.unwrap();
    assert_eq!(unchanged.parent_id, None);
    assert_eq!(unchanged.version, a.version);
}

#[tokio::test]
async fn test_reparent_moves_subtree() {
    let t = TestCatalog::new().await;
    let a = t.create(EntityKind::Lodging, "A", None).await;
    let b = t.create(EntityKind::Lodging, "B", None).await;
    let c = t.create(EntityKind::Lodging, "C", Some(a.id)).await;

    let moved = t
        .catalog
        .categories
        .reparent(&t.ctx, c.id, Some(b.id), c.version)
        .await
        .unwrap();
    assert_eq!(moved.parent_id, Some(b.id));
    assert!(!t.catalog.trees.has_sub_categories(a.id).await.unwrap());
    assert!(t.catalog.trees.has_sub_categories(b.id).await.unwrap());

    let root = t
        .catalog
        .categories
        .reparent(&t.ctx, c.id, None, moved.version)
        .await
        .unwrap();
    assert_eq!(root.parent_id, None);
}

#[tokio::test]
async fn test_reparent_sequence_stays_acyclic() {
    let t = TestCatalog::new().await;
    let mut ids = Vec::new();
    for i in 0..12 {
        ids.push(t.create(EntityKind::Product, &format!("Node {i}"), None).await.id);
    }

    // Deterministic pseudo-random walk over (node, target) pairs.
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    for _ in 0..300 {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let node = ids[(seed >> 33) as usize % ids.len()];
        let pick = (seed >> 17) as usize % (ids.len() + 1);
        let target = ids.get(pick).copied();

        let version = t.version(node).await;
        match t
            .catalog
            .categories
            .reparent(&t.ctx, node, target, version)
            .await
        {
            Ok(_) => {}
            Err(e) => assert!(e.is(ErrorKind::InvariantViolation), "unexpected error: {e}"),
        }

        let tree = t.catalog.trees.load(EntityKind::Product).await.unwrap();
        tree.verify_acyclic().unwrap();
        for id in &ids {
            assert!(tree.ancestors(*id).is_ok());
        }
    }
}

#[tokio::test]
async fn test_deactivate_keeps_children_and_links() {
    let t = TestCatalog::new().await;
    let parent = t.create(EntityKind::Lodging, "Accommodation", None).await;
    t.create(EntityKind::Lodging, "Hotels", Some(parent.id)).await;
    t.create(EntityKind::Lodging, "Hostels", Some(parent.id)).await;
    let listing = Listing::new(EntityKind::Lodging);
    t.catalog
        .categories
        .assign(&t.ctx, &listing, parent.id)
        .await
        .unwrap();

    let children_before = t.catalog.trees.sub_categories(parent.id).await.unwrap();
    let members_before = t.catalog.categories.entities_in_category(parent.id).await.unwrap();

    let inactive = t.catalog.categories.deactivate(&t.ctx, parent.id).await.unwrap();
    assert!(!inactive.active);

    let children_after = t.catalog.trees.sub_categories(parent.id).await.unwrap();
    let members_after = t.catalog.categories.entities_in_category(parent.id).await.unwrap();
    let ids = |v: &[Category]| v.iter().map(|c| c.id).collect::<Vec<_>>();
    assert_eq!(ids(&children_before), ids(&children_after));
    assert_eq!(children_after.len(), 2);
    assert_eq!(members_before, members_after);

    let again = t.catalog.categories.deactivate(&t.ctx, parent.id).await.unwrap();
    assert_eq!(again.version, inactive.version);

    let active = t.catalog.categories.reactivate(&t.ctx, parent.id).await.unwrap();
    assert!(active.active);
}

#[tokio::test]
async fn test_delete_restrict_conflicts() {
    let t = TestCatalog::new().await;
    let parent = t.create(EntityKind::Lodging, "Accommodation", None).await;
    let child = t.create(EntityKind::Lodging, "Hotels", Some(parent.id)).await;

    let err = t
        .catalog
        .categories
        .delete(&t.ctx, parent.id, None)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Conflict));

    let listing = Listing::new(EntityKind::Lodging);
    t.catalog.categories.assign(&t.ctx, &listing, child.id).await.unwrap();
    let err = t
        .catalog
        .categories
        .delete(&t.ctx, child.id, Some(DeletePolicy::Restrict))
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Conflict));

    t.catalog
        .categories
        .unassign(&t.ctx, listing.entity_ref(), child.id)
        .await
        .unwrap();
    let outcome = t.catalog.categories.delete(&t.ctx, child.id, None).await.unwrap();
    assert_eq!(outcome.moved_children, 0);
    assert!(!t.catalog.trees.has_sub_categories(parent.id).await.unwrap());

    let err = t.catalog.categories.get(child.id).await.unwrap_err();
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_delete_reparents_to_grandparent() {
    let t = TestCatalog::new().await;
    let a = t.create(EntityKind::Lodging, "A", None).await;
    let b = t.create(EntityKind::Lodging, "B", Some(a.id)).await;
    let c = t.create(EntityKind::Lodging, "C", Some(b.id)).await;
    let listing = Listing::new(EntityKind::Lodging);
    t.catalog.categories.assign(&t.ctx, &listing, b.id).await.unwrap();

    let outcome = t
        .catalog
        .categories
        .delete(&t.ctx, b.id, Some(DeletePolicy::ReparentToParent))
        .await
        .unwrap();
    assert_eq!(outcome.moved_children, 1);
    assert_eq!(outcome.removed_links, 1);

    let c = t.catalog.categories.get(c.id).await.unwrap();
    assert_eq!(c.parent_id, Some(a.id));
    assert!(
        t.catalog
            .categories
            .categories_for_entity(listing.entity_ref())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_delete_reparents_to_root_by_config() {
    let mut config = AppConfig::default();
    config.catalog.delete_policy = DeletePolicy::ReparentToRoot;
    let t = TestCatalog::with_config(config).await;
    let a = t.create(EntityKind::Service, "A", None).await;
    let b = t.create(EntityKind::Service, "B", Some(a.id)).await;
    let c = t.create(EntityKind::Service, "C", Some(b.id)).await;

    let outcome = t.catalog.categories.delete(&t.ctx, b.id, None).await.unwrap();
    assert_eq!(outcome.moved_children, 1);
    assert_eq!(t.catalog.categories.get(c.id).await.unwrap().parent_id, None);
}

#[tokio::test]
async fn test_list_filters_and_sorts() {
    let t = TestCatalog::new().await;
    let root = t.create(EntityKind::Lodging, "Stays", None).await;
    t.create(EntityKind::Lodging, "Hotels", Some(root.id)).await;
    t.create(EntityKind::Lodging, "Hostels", Some(root.id)).await;
    t.create(EntityKind::Lodging, "Cabins", Some(root.id)).await;
    t.create(EntityKind::Product, "Hoodies", None).await;

    let query = CategoryQuery {
        search: Some("ho".into()),
        ..CategoryQuery::for_kind(EntityKind::Lodging)
    }
    .sorted_by("name desc")
    .unwrap();
    let page = t.catalog.categories.list(&query).await.unwrap();
    let names: Vec<_> = page.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Hotels", "Hostels"]);
    assert_eq!(page.total_items, 2);

    let roots = CategoryQuery {
        parent: ParentFilter::Root,
        ..CategoryQuery::for_kind(EntityKind::Lodging)
    };
    let page = t.catalog.categories.list(&roots).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, root.id);
}

#[tokio::test]
async fn test_list_rejects_unknown_sort_field() {
    let t = TestCatalog::new().await;
    let query = CategoryQuery {
        sort: Some(SortField::asc("secret")),
        ..CategoryQuery::default()
    };
    let err = t.catalog.categories.list(&query).await.unwrap_err();
    assert!(err.is(ErrorKind::Validation));
}

#[tokio::test]
async fn test_tree_and_breadcrumbs() {
    let t = TestCatalog::new().await;
    let a = t.create(EntityKind::Lodging, "Accommodation", None).await;
    let b = t.create(EntityKind::Lodging, "Hotels", Some(a.id)).await;
    let c = t.create(EntityKind::Lodging, "Boutique", Some(b.id)).await;
    for _ in 0..2 {
        let listing = Listing::new(EntityKind::Lodging);
        t.catalog.categories.assign(&t.ctx, &listing, b.id).await.unwrap();
    }

    let crumbs = t.catalog.trees.breadcrumbs(c.id).await.unwrap();
    let names: Vec<_> = crumbs.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Accommodation", "Hotels", "Boutique"]);

    let forest = t.catalog.trees.tree(EntityKind::Lodging, false).await.unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].child_count, 1);
    assert_eq!(forest[0].children[0].entity_count, 2);
    assert_eq!(forest[0].children[0].children[0].depth, 2);

    t.catalog.categories.deactivate(&t.ctx, b.id).await.unwrap();
    let visible = t.catalog.trees.tree(EntityKind::Lodging, true).await.unwrap();
    assert_eq!(visible[0].child_count, 0);
    assert!(visible[0].children.is_empty());

    let err = t.catalog.trees.breadcrumbs(CategoryId::new()).await.unwrap_err();
    assert!(err.is(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_menu_and_slider_categories() {
    let t = TestCatalog::new().await;
    let mut menu = NewCategory::new(EntityKind::Business, "Restaurants");
    menu.display_in_main_menu = true;
    let menu = t.catalog.categories.create(&t.ctx, menu).await.unwrap();
    let mut slider = NewCategory::new(EntityKind::Business, "Bars");
    slider.display_as_slider_item = true;
    slider.display_in_main_menu = true;
    let slider = t.catalog.categories.create(&t.ctx, slider).await.unwrap();
    t.create(EntityKind::Business, "Plain", None).await;

    let menu_items = t.catalog.categories.menu_categories(EntityKind::Business).await.unwrap();
    let ids: Vec<_> = menu_items.iter().map(|c| c.id).collect();
    assert_eq!(ids, [slider.id, menu.id]);

    t.catalog.categories.deactivate(&t.ctx, slider.id).await.unwrap();
    assert!(
        t.catalog
            .categories
            .slider_categories(EntityKind::Business)
            .await
            .unwrap()
            .is_empty()
    );
}
