#![doc(test(attr(deny(warnings))))]

//! Category Core assembles categories, vendors, and transactions into a
//! navigable spending tree and guards structural edits to it: move validation,
//! vendor-rule conflict resolution, and undoable edit history.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod utils;

pub use crate::core::{
    build_tree, can_move, CategoryEditor, CategoryTree, ConflictResolution, ConflictResolver,
    EditOutcome, Flow, MoveRequest, MoveVerdict, NodeKind, OperationHistory, RecordStore,
    TreeNode, TreeOptions,
};
pub use errors::{EngineError, EngineResult, ValidationError};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Category Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
