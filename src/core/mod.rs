pub mod conflict_resolver;
pub mod editor;
pub mod history;
pub mod move_validator;
pub mod record_store;
pub mod services;
pub mod tree_builder;

pub use conflict_resolver::{
    ConflictDescriptor, ConflictResolution, ConflictResolver, MoveVerdict, ResolutionOutcome,
};
pub use editor::{CategoryEditor, EditOutcome, EngineServices, MoveRequest, PendingMove};
pub use history::{
    Command, CommandOutput, HistoryEntry, HistoryOutcome, HistoryStatus, IdRemap, OperationHistory,
    OperationKind,
};
pub use move_validator::{can_move, check_move, validate_category_name};
pub use record_store::RecordStore;
pub use tree_builder::{build_tree, CategoryTree, Flow, NodeKind, TreeNode, TreeOptions};
