//! Structural legality of reparenting, and the name rules enforced before a
//! create or rename reaches the backend.

use uuid::Uuid;

use crate::core::tree_builder::{CategoryTree, NodeKind};
use crate::domain::{CategoryRecord, Identifiable, NamedEntity, Parented};
use crate::errors::ValidationError;

/// Characters rejected in category names.
pub const FORBIDDEN_NAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Boolean verdict consumed before a drag-drop commits visually.
pub fn can_move(node_id: Uuid, target_parent: Option<Uuid>, tree: &CategoryTree) -> bool {
    check_move(node_id, target_parent, tree).is_ok()
}

/// Same rules as [`can_move`], with the reason for a refusal. `None` moves to
/// the root. Callers must pass a tree built from the current record store.
pub fn check_move(
    node_id: Uuid,
    target_parent: Option<Uuid>,
    tree: &CategoryTree,
) -> Result<(), ValidationError> {
    let node = tree
        .node(node_id)
        .ok_or(ValidationError::NodeNotFound(node_id))?;
    if node.kind == NodeKind::Transaction {
        return Err(ValidationError::NotMovable(node_id));
    }

    let Some(target_id) = target_parent else {
        return Ok(());
    };
    if target_id == node_id {
        return Err(ValidationError::SelfParent(node_id));
    }
    let target = tree
        .node(target_id)
        .ok_or(ValidationError::NodeNotFound(target_id))?;
    if target.kind != NodeKind::Category {
        return Err(ValidationError::InvalidTarget(format!(
            "{} `{}` cannot hold children",
            target.kind, target.name
        )));
    }
    if node.contains(target_id) {
        return Err(ValidationError::Cycle {
            node: node_id,
            target: target_id,
        });
    }
    Ok(())
}

/// Trims and checks the character set. Returns the trimmed name.
pub fn validate_name_characters(candidate: &str) -> Result<&str, ValidationError> {
    let name = candidate.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if let Some(character) = name.chars().find(|ch| FORBIDDEN_NAME_CHARS.contains(ch)) {
        return Err(ValidationError::ForbiddenCharacter {
            name: name.to_string(),
            character,
        });
    }
    Ok(name)
}

/// Rejects names that case-insensitively match a sibling under `parent`.
/// `exclude` is the record being renamed.
pub fn validate_sibling_name<T: Identifiable + NamedEntity + Parented>(
    siblings: &[T],
    parent: Option<Uuid>,
    candidate: &str,
    exclude: Option<Uuid>,
) -> Result<(), ValidationError> {
    let normalized = candidate.trim().to_lowercase();
    let duplicate = siblings.iter().any(|record| {
        record.parent() == parent
            && exclude.map_or(true, |id| record.id() != id)
            && record.name().trim().to_lowercase() == normalized
    });
    if duplicate {
        Err(ValidationError::DuplicateName(candidate.trim().to_string()))
    } else {
        Ok(())
    }
}

/// Full name check for a category create or rename.
pub fn validate_category_name(
    categories: &[CategoryRecord],
    parent: Option<Uuid>,
    candidate: &str,
    exclude: Option<Uuid>,
) -> Result<String, ValidationError> {
    let name = validate_name_characters(candidate)?;
    validate_sibling_name(categories, parent, name, exclude)?;
    Ok(name.to_string())
}
