//! Projection of the flat record store into a navigable category tree with
//! rolled-up amounts.
//!
//! The builder never fails: links that cannot be resolved (missing or
//! filtered-out parents, parent chains that loop) are attached to the root so
//! every visible record shows up exactly once.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::TreeDefaults;
use crate::domain::{CategoryRecord, Direction, TransactionRecord, VendorRecord};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Category,
    Vendor,
    Transaction,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Category => "category",
            NodeKind::Vendor => "vendor",
            NodeKind::Transaction => "transaction",
        })
    }
}

/// Which transactions contribute to node amounts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    #[default]
    Outflow,
    Inflow,
    /// Inflows count positive, outflows negative.
    Net,
}

impl Flow {
    pub fn contribution(self, txn: &TransactionRecord) -> f64 {
        match (self, txn.direction) {
            (Flow::Outflow, Direction::Outflow) | (Flow::Inflow, Direction::Inflow) => txn.amount,
            (Flow::Outflow, Direction::Inflow) | (Flow::Inflow, Direction::Outflow) => 0.0,
            (Flow::Net, Direction::Inflow) => txn.amount,
            (Flow::Net, Direction::Outflow) => -txn.amount,
        }
    }
}

impl std::str::FromStr for Flow {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "outflow" => Ok(Flow::Outflow),
            "inflow" => Ok(Flow::Inflow),
            "net" => Ok(Flow::Net),
            other => Err(format!("unknown flow `{other}`")),
        }
    }
}

/// Display options for a single build. Resolved once from [`TreeDefaults`].
#[derive(Debug, Clone, PartialEq)]
pub struct TreeOptions {
    pub include_vendors: bool,
    pub include_transactions: bool,
    pub show_system_categories: bool,
    pub show_user_categories: bool,
    pub flow: Flow,
    /// Outflow totals keyed by category id. Only consulted for [`Flow::Outflow`].
    pub category_spending_totals: Option<HashMap<Uuid, f64>>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self::from(&TreeDefaults::default())
    }
}

impl From<&TreeDefaults> for TreeOptions {
    fn from(defaults: &TreeDefaults) -> Self {
        Self {
            include_vendors: defaults.include_vendors,
            include_transactions: defaults.include_transactions,
            show_system_categories: defaults.show_system_categories,
            show_user_categories: defaults.show_user_categories,
            flow: defaults.flow,
            category_spending_totals: None,
        }
    }
}

impl TreeOptions {
    pub fn with_vendors(mut self, include: bool) -> Self {
        self.include_vendors = include;
        self
    }

    pub fn with_transactions(mut self, include: bool) -> Self {
        self.include_transactions = include;
        self
    }

    pub fn with_system_categories(mut self, show: bool) -> Self {
        self.show_system_categories = show;
        self
    }

    pub fn with_user_categories(mut self, show: bool) -> Self {
        self.show_user_categories = show;
        self
    }

    pub fn with_flow(mut self, flow: Flow) -> Self {
        self.flow = flow;
        self
    }

    pub fn with_totals(mut self, totals: Option<HashMap<Uuid, f64>>) -> Self {
        self.category_spending_totals = totals;
        self
    }

    fn shows(&self, is_system: bool) -> bool {
        if is_system {
            self.show_system_categories
        } else {
            self.show_user_categories
        }
    }

    fn precomputed_totals(&self) -> Option<&HashMap<Uuid, f64>> {
        match self.flow {
            Flow::Outflow => self.category_spending_totals.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TreeNode {
    pub id: Uuid,
    pub kind: NodeKind,
    pub name: String,
    pub children: Vec<TreeNode>,
    pub amount: f64,
    pub transaction_count: usize,
}

impl TreeNode {
    /// Depth-first search within this subtree.
    pub fn contains(&self, id: Uuid) -> bool {
        self.children
            .iter()
            .any(|child| child.id == id || child.contains(id))
    }

    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct NodeLocation {
    path: Vec<usize>,
    parent: Option<Uuid>,
}

/// Built tree plus an id-indexed side table for O(depth) lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTree {
    roots: Vec<TreeNode>,
    index: HashMap<Uuid, NodeLocation>,
}

impl CategoryTree {
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index.contains_key(&id)
    }

    pub fn node(&self, id: Uuid) -> Option<&TreeNode> {
        let location = self.index.get(&id)?;
        let (first, rest) = location.path.split_first()?;
        let mut node = self.roots.get(*first)?;
        for step in rest {
            node = node.children.get(*step)?;
        }
        Some(node)
    }

    /// `Some(None)` for roots, `None` for unknown ids.
    pub fn parent_of(&self, id: Uuid) -> Option<Option<Uuid>> {
        self.index.get(&id).map(|location| location.parent)
    }

    /// True when `candidate` lies strictly below `ancestor`.
    pub fn is_descendant(&self, ancestor: Uuid, candidate: Uuid) -> bool {
        self.node(ancestor)
            .map(|node| node.contains(candidate))
            .unwrap_or(false)
    }

    fn from_roots(roots: Vec<TreeNode>) -> Self {
        fn walk(
            node: &TreeNode,
            parent: Option<Uuid>,
            path: &mut Vec<usize>,
            index: &mut HashMap<Uuid, NodeLocation>,
        ) {
            index.insert(
                node.id,
                NodeLocation {
                    path: path.clone(),
                    parent,
                },
            );
            for (position, child) in node.children.iter().enumerate() {
                path.push(position);
                walk(child, Some(node.id), path, index);
                path.pop();
            }
        }

        let mut index = HashMap::new();
        let mut path = Vec::new();
        for (position, root) in roots.iter().enumerate() {
            path.push(position);
            walk(root, None, &mut path, &mut index);
            path.pop();
        }
        Self { roots, index }
    }
}

struct Shell {
    id: Uuid,
    kind: NodeKind,
    name: String,
    children: Vec<usize>,
    direct_amount: f64,
    direct_count: usize,
}

impl Shell {
    fn new(id: Uuid, kind: NodeKind, name: &str) -> Self {
        Self {
            id,
            kind,
            name: name.to_string(),
            children: Vec::new(),
            direct_amount: 0.0,
            direct_count: 0,
        }
    }
}

/// Builds the tree. Children are ordered categories, vendors, transactions,
/// each group in input order.
pub fn build_tree(
    categories: &[CategoryRecord],
    vendors: &[VendorRecord],
    transactions: &[TransactionRecord],
    options: &TreeOptions,
) -> CategoryTree {
    let mut shells: Vec<Shell> = Vec::new();
    let mut by_id: HashMap<Uuid, usize> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();

    let mut records: Vec<&CategoryRecord> = Vec::new();
    for category in categories.iter().filter(|category| options.shows(!category.is_custom)) {
        if by_id.contains_key(&category.id) {
            warn!(id = %category.id, "duplicate category record ignored");
            continue;
        }
        by_id.insert(category.id, shells.len());
        records.push(category);
        shells.push(Shell::new(category.id, NodeKind::Category, &category.name));
    }

    // Pass two: attach categories, breaking loops at the record that closes them.
    let category_count = shells.len();
    let raw_parent: Vec<Option<usize>> = records
        .iter()
        .map(|category| {
            category
                .parent
                .and_then(|parent| by_id.get(&parent).copied())
        })
        .collect();
    let mut effective: Vec<Option<usize>> = vec![None; category_count];
    for slot in 0..category_count {
        let parent = raw_parent[slot]
            .filter(|&parent| !closes_loop(slot, parent, &effective, &raw_parent));
        if raw_parent[slot].is_some() && parent.is_none() {
            warn!(id = %shells[slot].id, "category parent chain loops; attaching to root");
        } else if parent.is_none() && records[slot].parent.is_some() {
            debug!(id = %shells[slot].id, "category parent not visible; attaching to root");
        }
        effective[slot] = parent;
        match parent {
            Some(parent) => shells[parent].children.push(slot),
            None => roots.push(slot),
        }
    }

    let mut vendor_slots: HashMap<Uuid, usize> = HashMap::new();
    if options.include_vendors {
        for vendor in vendors.iter().filter(|vendor| options.shows(vendor.is_system_vendor)) {
            if by_id.contains_key(&vendor.id) {
                warn!(id = %vendor.id, "vendor id collides with another record; skipped");
                continue;
            }
            let slot = shells.len();
            by_id.insert(vendor.id, slot);
            vendor_slots.insert(vendor.id, slot);
            shells.push(Shell::new(vendor.id, NodeKind::Vendor, &vendor.name));
            match vendor.parent.and_then(|parent| category_slot(&by_id, category_count, parent)) {
                Some(parent) => shells[parent].children.push(slot),
                None => roots.push(slot),
            }
        }
    }

    // Category amounts come from `category_id` alone; vendor nodes carry a
    // display subtotal of their own transactions and never feed the rollup.
    let totals = options.precomputed_totals();
    let mut vendor_subtotals = 0usize;
    for txn in transactions {
        let vendor = txn
            .vendor_id
            .and_then(|vendor_id| vendor_slots.get(&vendor_id).copied());
        let category = txn
            .category_id
            .and_then(|category_id| category_slot(&by_id, category_count, category_id));
        let contribution = options.flow.contribution(txn);

        if let Some(category) = category {
            shells[category].direct_count += 1;
            shells[category].direct_amount += contribution;
        }
        if let Some(vendor) = vendor {
            vendor_subtotals += 1;
            shells[vendor].direct_count += 1;
            shells[vendor].direct_amount += contribution;
        }

        if options.include_transactions {
            let slot = shells.len();
            let label = format!("{} {} {:.2}", txn.date, txn.direction, txn.amount);
            let mut shell = Shell::new(txn.id, NodeKind::Transaction, &label);
            shell.direct_amount = contribution;
            shell.direct_count = 1;
            shells.push(shell);
            match vendor.or(category) {
                Some(owner) => shells[owner].children.push(slot),
                None => roots.push(slot),
            }
        }
    }

    if let Some(totals) = totals {
        for shell in shells.iter_mut().take(category_count) {
            shell.direct_amount = totals.get(&shell.id).copied().unwrap_or(0.0);
        }
    }

    let nodes: Vec<TreeNode> = roots
        .iter()
        .map(|&root| materialize(&shells, root))
        .collect();

    let tree = CategoryTree::from_roots(nodes);
    debug!(
        nodes = tree.len(),
        roots = tree.roots().len(),
        vendor_subtotals,
        precomputed = totals.is_some(),
        "category tree built"
    );
    tree
}

fn category_slot(by_id: &HashMap<Uuid, usize>, category_count: usize, id: Uuid) -> Option<usize> {
    by_id.get(&id).copied().filter(|&slot| slot < category_count)
}

/// Follows the parent chain from `start` (decided links for slots before
/// `target`, raw links otherwise) and reports whether it reaches `target`.
fn closes_loop(
    target: usize,
    start: usize,
    effective: &[Option<usize>],
    raw_parent: &[Option<usize>],
) -> bool {
    let mut seen = HashSet::new();
    let mut cursor = Some(start);
    while let Some(current) = cursor {
        if current == target {
            return true;
        }
        if !seen.insert(current) {
            return false;
        }
        cursor = if current < target {
            effective[current]
        } else {
            raw_parent[current]
        };
    }
    false
}

/// Post-order: child categories are finalized before their parent sums them.
/// Vendor and transaction children are display-only; their transactions are
/// already counted on the category they are booked to.
fn materialize(shells: &[Shell], slot: usize) -> TreeNode {
    let shell = &shells[slot];
    let children: Vec<TreeNode> = shell
        .children
        .iter()
        .map(|&child| materialize(shells, child))
        .collect();

    let mut amount = shell.direct_amount;
    let mut transaction_count = shell.direct_count;
    for child in children.iter().filter(|child| child.kind == NodeKind::Category) {
        amount += child.amount;
        transaction_count += child.transaction_count;
    }

    TreeNode {
        id: shell.id,
        kind: shell.kind,
        name: shell.name.clone(),
        children,
        amount,
        transaction_count,
    }
}
