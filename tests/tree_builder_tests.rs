mod common;

use category_core::{
    build_tree,
    domain::{CategoryRecord, TransactionRecord, VendorRecord},
    Flow, NodeKind, TreeNode, TreeOptions,
};
use common::*;
use uuid::Uuid;

fn amount_of(tree: &category_core::CategoryTree, id: Uuid) -> f64 {
    tree.node(id).map(|node| node.amount).expect("node present")
}

fn count_nodes(nodes: &[TreeNode]) -> usize {
    nodes.iter().map(|n| 1 + count_nodes(&n.children)).sum()
}

#[test]
fn grocery_example_rolls_up_to_food() {
    let snapshot = grocery_snapshot();
    let tree = build_tree(
        &snapshot.categories,
        &snapshot.vendors,
        &snapshot.transactions,
        &TreeOptions::default(),
    );

    assert_eq!(amount_of(&tree, FOOD), 42.0);
    assert_eq!(amount_of(&tree, GROCERIES), 42.0);
    assert_eq!(amount_of(&tree, DINING), 0.0);
    assert_eq!(tree.parent_of(JUMBO), Some(Some(GROCERIES)));
}

#[test]
fn rollup_matches_sum_of_descendant_transactions() {
    let root = CategoryRecord::new("Root");
    let mid = CategoryRecord::new("Mid").with_parent(Some(root.id));
    let leaf = CategoryRecord::new("Leaf").with_parent(Some(mid.id));
    let vendor = VendorRecord::new("Shop", Some(leaf.id));
    let transactions = vec![
        TransactionRecord::outflow(10.0, date(1)).in_category(root.id),
        TransactionRecord::outflow(5.5, date(2)).in_category(mid.id),
        TransactionRecord::outflow(2.25, date(3))
            .in_category(leaf.id)
            .at_vendor(vendor.id),
        TransactionRecord::inflow(100.0, date(4)).in_category(leaf.id),
    ];
    let categories = vec![root.clone(), mid.clone(), leaf.clone()];
    let vendors = vec![vendor.clone()];

    let tree = build_tree(&categories, &vendors, &transactions, &TreeOptions::default());
    assert_eq!(amount_of(&tree, root.id), 17.75);
    assert_eq!(amount_of(&tree, mid.id), 7.75);
    assert_eq!(amount_of(&tree, leaf.id), 2.25);
    assert_eq!(amount_of(&tree, vendor.id), 2.25);

    let net = build_tree(
        &categories,
        &vendors,
        &transactions,
        &TreeOptions::default().with_flow(Flow::Net),
    );
    assert_eq!(amount_of(&net, leaf.id), 97.75);
    assert_eq!(net.node(leaf.id).map(|n| n.transaction_count), Some(2));
}

#[test]
fn every_record_appears_exactly_once() {
    let a = CategoryRecord::new("A");
    let b = CategoryRecord::new("B").with_parent(Some(a.id));
    let orphan = CategoryRecord::new("Orphan").with_parent(Some(Uuid::new_v4()));
    let mut looped = CategoryRecord::new("Loop");
    looped.parent = Some(looped.id);
    let stray_vendor = VendorRecord::new("Stray", Some(Uuid::new_v4()));
    let categories = vec![a, b, orphan.clone(), looped.clone()];
    let vendors = vec![stray_vendor.clone()];

    let tree = build_tree(&categories, &vendors, &[], &TreeOptions::default());
    assert_eq!(count_nodes(tree.roots()), 5);
    assert_eq!(tree.len(), 5);
    for id in [orphan.id, looped.id, stray_vendor.id] {
        assert_eq!(tree.parent_of(id), Some(None));
    }
}

#[test]
fn children_group_categories_before_vendors_and_transactions() {
    let snapshot = grocery_snapshot();
    let mut categories = snapshot.categories.clone();
    categories.push(CategoryRecord::new("Bakery").with_parent(Some(GROCERIES)));

    let tree = build_tree(
        &categories,
        &snapshot.vendors,
        &snapshot.transactions,
        &TreeOptions::default().with_transactions(true),
    );
    let kinds: Vec<NodeKind> = tree
        .node(GROCERIES)
        .expect("groceries")
        .children
        .iter()
        .map(|child| child.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![NodeKind::Category, NodeKind::Vendor, NodeKind::Transaction]
    );
}

#[test]
fn hiding_system_categories_promotes_children_to_root() {
    let system = CategoryRecord::new("Utilities").system();
    let custom = CategoryRecord::new("Internet").with_parent(Some(system.id));
    let tree = build_tree(
        &[system.clone(), custom.clone()],
        &[],
        &[],
        &TreeOptions::default().with_system_categories(false),
    );
    assert!(!tree.contains(system.id));
    assert_eq!(tree.parent_of(custom.id), Some(None));
}

#[test]
fn precomputed_totals_override_local_sums() {
    let snapshot = grocery_snapshot();
    let totals = [(GROCERIES, 50.0), (DINING, 8.0)].into_iter().collect();
    let tree = build_tree(
        &snapshot.categories,
        &snapshot.vendors,
        &snapshot.transactions,
        &TreeOptions::default().with_totals(Some(totals)),
    );
    assert_eq!(amount_of(&tree, FOOD), 58.0);
    assert_eq!(amount_of(&tree, GROCERIES), 50.0);
}

#[tokio::test]
async fn refiled_vendor_keeps_spending_on_booked_category() {
    let mut snapshot = grocery_snapshot();
    snapshot.transactions[0].vendor_id = Some(JUMBO);
    snapshot.vendors[0].parent = Some(DINING);
    let (mut editor, backend) = editor_for(snapshot).await;

    let with_vendors = editor.tree();
    let without_vendors = editor.tree_with(&editor.tree_options().clone().with_vendors(false));
    backend.serve_totals(true);
    editor.refresh().await.unwrap();
    let precomputed = editor.tree();
    assert!(editor.store().spending_totals().is_some());

    for tree in [&with_vendors, &without_vendors, &precomputed] {
        assert_eq!(amount_of(tree, GROCERIES), 42.0);
        assert_eq!(amount_of(tree, DINING), 0.0);
        assert_eq!(amount_of(tree, FOOD), 42.0);
    }
    assert_eq!(with_vendors.parent_of(JUMBO), Some(Some(DINING)));
    assert_eq!(amount_of(&with_vendors, JUMBO), 42.0);
    assert_eq!(with_vendors.node(DINING).map(|n| n.transaction_count), Some(0));
}
