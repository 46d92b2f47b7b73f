//! Box-drawing rendering of a [`CategoryTree`].

use colored::Colorize;

use crate::core::tree_builder::{CategoryTree, NodeKind, TreeNode};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE_GAP: &str = "│   ";
const SPACE: &str = "    ";

/// Roots are written flush left; every line ends with a newline.
pub fn render_tree(tree: &CategoryTree) -> String {
    let mut out = String::new();
    let mut prefix = String::new();
    for root in tree.roots() {
        out.push_str(&label(root));
        out.push('\n');
        write_children(root, &mut prefix, &mut out);
    }
    out
}

fn write_children(node: &TreeNode, prefix: &mut String, out: &mut String) {
    let count = node.children.len();
    for (index, child) in node.children.iter().enumerate() {
        let last = index + 1 == count;
        let (connector, gap) = if last {
            (LAST_BRANCH, SPACE)
        } else {
            (BRANCH, PIPE_GAP)
        };
        out.push_str(prefix);
        out.push_str(connector);
        out.push_str(&label(child));
        out.push('\n');

        prefix.push_str(gap);
        write_children(child, prefix, out);
        prefix.truncate(prefix.len() - gap.len());
    }
}

fn label(node: &TreeNode) -> String {
    let amount = format!("{:.2}", node.amount);
    match node.kind {
        NodeKind::Category => format!(
            "{}  {} ({} txn)",
            node.name.bold(),
            amount,
            node.transaction_count
        ),
        NodeKind::Vendor => format!("{} {}  {}", "@".cyan(), node.name.cyan(), amount),
        NodeKind::Transaction => format!("{}  {}", node.name.dimmed(), amount.dimmed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree_builder::{build_tree, TreeOptions};
    use crate::domain::{CategoryRecord, VendorRecord};

    #[test]
    fn draws_connectors_for_nested_children() {
        colored::control::set_override(false);
        let food = CategoryRecord::new("Food");
        let dining = CategoryRecord::new("Dining").with_parent(Some(food.id));
        let groceries = CategoryRecord::new("Groceries").with_parent(Some(food.id));
        let jumbo = VendorRecord::new("Jumbo", Some(groceries.id));
        let tree = build_tree(
            &[food, dining, groceries],
            &[jumbo],
            &[],
            &TreeOptions::default(),
        );

        let rendered = render_tree(&tree);
        let expected = "Food  0.00 (0 txn)\n\
                        ├── Dining  0.00 (0 txn)\n\
                        └── Groceries  0.00 (0 txn)\n    \
                        └── @ Jumbo  0.00\n";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn empty_tree_renders_nothing() {
        let tree = build_tree(&[], &[], &[], &TreeOptions::default());
        assert_eq!(render_tree(&tree), "");
    }
}
