use category_core::domain::{CategoryRecord, TransactionRecord, VendorRecord};
use category_core::{build_tree, can_move, TreeOptions};
use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// `roots` top-level categories, each with `depth` nested levels, one vendor
/// per leaf and `txn_count` transactions spread over the leaves.
fn sample_records(
    roots: usize,
    depth: usize,
    txn_count: usize,
) -> (Vec<CategoryRecord>, Vec<VendorRecord>, Vec<TransactionRecord>) {
    let mut categories = Vec::new();
    let mut vendors = Vec::new();
    let mut leaves = Vec::new();

    for root_idx in 0..roots {
        let mut parent = None;
        for level in 0..depth {
            let category =
                CategoryRecord::new(format!("Cat {root_idx}.{level}")).with_parent(parent);
            parent = Some(category.id);
            categories.push(category);
        }
        if let Some(leaf) = parent {
            leaves.push(leaf);
            vendors.push(VendorRecord::new(format!("Vendor {root_idx}"), Some(leaf)));
        }
    }

    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let transactions = (0..txn_count)
        .map(|idx| {
            let slot = idx % leaves.len();
            let txn = TransactionRecord::outflow(
                10.0 + (idx % 50) as f64,
                start + Duration::days((idx % 365) as i64),
            )
            .in_category(leaves[slot]);
            if idx % 2 == 0 {
                txn.at_vendor(vendors[slot].id)
            } else {
                txn
            }
        })
        .collect();

    (categories, vendors, transactions)
}

fn bench_build(c: &mut Criterion) {
    let (categories, vendors, transactions) = sample_records(200, 5, 20_000);
    let options = TreeOptions::default();

    c.bench_function("build_tree_1k_categories_20k_txn", |b| {
        b.iter(|| {
            let tree = build_tree(
                black_box(&categories),
                black_box(&vendors),
                black_box(&transactions),
                &options,
            );
            black_box(tree);
        })
    });

    let with_transactions = TreeOptions::default().with_transactions(true);
    c.bench_function("build_tree_with_transaction_nodes", |b| {
        b.iter(|| black_box(build_tree(&categories, &vendors, &transactions, &with_transactions)))
    });
}

fn bench_move_checks(c: &mut Criterion) {
    let (categories, vendors, transactions) = sample_records(200, 5, 2_000);
    let tree = build_tree(&categories, &vendors, &transactions, &TreeOptions::default());
    let first = categories[0].id;
    let deepest = categories[4].id;
    let other = categories[5].id;

    c.bench_function("can_move_cycle_and_sideways", |b| {
        b.iter(|| {
            black_box(can_move(first, Some(deepest), &tree));
            black_box(can_move(first, Some(other), &tree));
        })
    });
}

criterion_group!(benches, bench_build, bench_move_checks);
criterion_main!(benches);
