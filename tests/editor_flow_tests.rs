mod common;

use std::sync::Arc;

use category_core::{
    core::{
        services::{FailPoint, InMemoryBackend, ServiceError},
        ConflictResolver, PendingMove, ResolutionOutcome,
    },
    domain::VendorRule,
    ConflictResolution, EditOutcome, EngineError, MoveRequest, MoveVerdict, ValidationError,
};
use common::*;
use uuid::Uuid;

fn rules(backend: &InMemoryBackend) -> Vec<VendorRule> {
    backend.snapshot().unwrap().rules
}

fn backend_vendor_parent(backend: &InMemoryBackend) -> Option<Uuid> {
    backend
        .snapshot()
        .unwrap()
        .vendors
        .iter()
        .find(|vendor| vendor.id == JUMBO)
        .and_then(|vendor| vendor.parent)
}

async fn pending_jumbo_move(editor: &mut category_core::CategoryEditor) -> PendingMove {
    match editor
        .move_node(MoveRequest::new(JUMBO, Some(DINING)))
        .await
        .unwrap()
    {
        EditOutcome::Conflict(pending) => pending,
        EditOutcome::Applied => panic!("expected a rule conflict"),
    }
}

#[tokio::test]
async fn moving_jumbo_to_dining_reports_rule_conflict() {
    let (mut editor, backend) = editor_for(grocery_snapshot_with_rule()).await;

    let pending = pending_jumbo_move(&mut editor).await;
    assert_eq!(pending.conflict.vendor_name, "Jumbo");
    assert_eq!(pending.conflict.old_category_name, "Groceries");
    assert_eq!(pending.conflict.new_category_name, "Dining");
    assert_eq!(pending.conflict.existing_rule.id, JUMBO_RULE);

    assert_eq!(backend_vendor_parent(&backend), Some(GROCERIES));
    assert_eq!(editor.tree().parent_of(JUMBO), Some(Some(GROCERIES)));
}

#[tokio::test]
async fn conflict_evaluation_is_idempotent() {
    let (editor, backend) = editor_for(grocery_snapshot_with_rule()).await;
    let resolver = ConflictResolver::new(backend.clone());
    let tree = editor.tree();
    let jumbo = tree.node(JUMBO).unwrap();
    let dining = tree.node(DINING).unwrap();

    let first = resolver.evaluate_move(jumbo, dining, &tree).await;
    let second = resolver.evaluate_move(jumbo, dining, &tree).await;
    assert!(first.is_conflict());
    assert_eq!(first, second);

    let groceries = tree.node(GROCERIES).unwrap();
    assert_eq!(
        resolver.evaluate_move(jumbo, groceries, &tree).await,
        MoveVerdict::Proceed
    );
}

#[tokio::test]
async fn update_repoints_rule_and_moves_vendor() {
    let (mut editor, backend) = editor_for(grocery_snapshot_with_rule()).await;
    let pending = pending_jumbo_move(&mut editor).await;

    let outcome = editor
        .resolve_conflict(&pending, ConflictResolution::Update)
        .await
        .unwrap();
    assert!(matches!(outcome, ResolutionOutcome::RuleUpdated(ref rule) if rule.category_id == DINING));
    assert_eq!(rules(&backend)[0].category_id, DINING);
    assert_eq!(backend_vendor_parent(&backend), Some(DINING));
    assert_eq!(editor.tree().parent_of(JUMBO), Some(Some(DINING)));
}

#[tokio::test]
async fn keep_moves_vendor_but_leaves_rule() {
    let (mut editor, backend) = editor_for(grocery_snapshot_with_rule()).await;
    let pending = pending_jumbo_move(&mut editor).await;

    editor
        .resolve_conflict(&pending, ConflictResolution::Keep)
        .await
        .unwrap();
    assert_eq!(rules(&backend)[0].category_id, GROCERIES);
    assert_eq!(backend_vendor_parent(&backend), Some(DINING));
}

#[tokio::test]
async fn remove_deletes_rule_and_moves_vendor() {
    let (mut editor, backend) = editor_for(grocery_snapshot_with_rule()).await;
    let pending = pending_jumbo_move(&mut editor).await;

    editor
        .resolve_conflict(&pending, ConflictResolution::Remove)
        .await
        .unwrap();
    assert!(rules(&backend).is_empty());
    assert_eq!(backend_vendor_parent(&backend), Some(DINING));
}

#[tokio::test]
async fn cancel_changes_nothing() {
    let (mut editor, backend) = editor_for(grocery_snapshot_with_rule()).await;
    let pending = pending_jumbo_move(&mut editor).await;

    let outcome = editor
        .resolve_conflict(&pending, ConflictResolution::Cancel)
        .await
        .unwrap();
    assert!(!outcome.applies_move());
    assert_eq!(rules(&backend)[0].category_id, GROCERIES);
    assert_eq!(backend_vendor_parent(&backend), Some(GROCERIES));
}

#[tokio::test]
async fn failed_rule_update_rolls_back_placement() {
    let (mut editor, backend) = editor_for(grocery_snapshot_with_rule()).await;
    let pending = pending_jumbo_move(&mut editor).await;
    backend.fail(FailPoint::RuleUpdate, ServiceError::Transient("offline".into()));

    let err = editor
        .resolve_conflict(&pending, ConflictResolution::Update)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OperationFailure(_)));
    assert_eq!(
        editor.store().vendor(JUMBO).and_then(|v| v.parent),
        Some(GROCERIES)
    );
    assert_eq!(backend_vendor_parent(&backend), Some(GROCERIES));
    assert_eq!(rules(&backend)[0].category_id, GROCERIES);
}

#[tokio::test]
async fn failed_placement_restores_removed_rule() {
    let (mut editor, backend) = editor_for(grocery_snapshot_with_rule()).await;
    let pending = pending_jumbo_move(&mut editor).await;
    backend.fail(
        FailPoint::VendorSetParent,
        ServiceError::Transient("offline".into()),
    );

    assert!(editor
        .resolve_conflict(&pending, ConflictResolution::Remove)
        .await
        .is_err());
    let restored = rules(&backend);
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].vendor_name, "Jumbo");
    assert_eq!(restored[0].category_id, GROCERIES);
    assert!(restored[0].is_persistent);
    assert_eq!(
        editor.store().vendor(JUMBO).and_then(|v| v.parent),
        Some(GROCERIES)
    );
}

#[tokio::test]
async fn rule_lookup_failure_lets_move_proceed() {
    let (mut editor, backend) = editor_for(grocery_snapshot_with_rule()).await;
    backend.fail(FailPoint::RuleList, ServiceError::Transient("timeout".into()));

    let outcome = editor
        .move_node(MoveRequest::new(JUMBO, Some(DINING)))
        .await
        .unwrap();
    assert_eq!(outcome, EditOutcome::Applied);
    assert_eq!(backend_vendor_parent(&backend), Some(DINING));
}

#[tokio::test]
async fn remember_rule_creates_persistent_rule() {
    let (mut editor, backend) = editor_for(grocery_snapshot()).await;

    editor
        .move_node(MoveRequest::new(JUMBO, Some(DINING)).remembering_rule())
        .await
        .unwrap();
    let stored = rules(&backend);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].category_id, DINING);
    assert!(stored[0].is_persistent);
}

#[tokio::test]
async fn remembering_an_existing_rule_reuses_it() {
    let mut snapshot = grocery_snapshot();
    snapshot.rules.push(VendorRule::persistent("Jumbo", DINING));
    let (mut editor, backend) = editor_for(snapshot).await;

    let outcome = editor
        .move_node(MoveRequest::new(JUMBO, Some(DINING)).remembering_rule())
        .await
        .unwrap();
    assert_eq!(outcome, EditOutcome::Applied);
    assert_eq!(rules(&backend).len(), 1);
    assert_eq!(backend_vendor_parent(&backend), Some(DINING));
    assert_eq!(editor.tree().parent_of(JUMBO), Some(Some(DINING)));
}

#[tokio::test]
async fn rejected_rule_leaves_vendor_in_place() {
    let (mut editor, backend) = editor_for(grocery_snapshot()).await;
    backend.fail(
        FailPoint::RuleCreate,
        ServiceError::Conflict("rule already exists".into()),
    );

    let err = editor
        .move_node(MoveRequest::new(JUMBO, Some(DINING)).remembering_rule())
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(backend_vendor_parent(&backend), Some(GROCERIES));
    assert_eq!(
        editor.store().vendor(JUMBO).and_then(|v| v.parent),
        Some(GROCERIES)
    );
}

#[tokio::test]
async fn failed_placement_drops_remembered_rule() {
    let (mut editor, backend) = editor_for(grocery_snapshot()).await;
    backend.fail(
        FailPoint::VendorSetParent,
        ServiceError::Transient("offline".into()),
    );

    assert!(editor
        .move_node(MoveRequest::new(JUMBO, Some(DINING)).remembering_rule())
        .await
        .is_err());
    assert!(rules(&backend).is_empty());
    assert_eq!(backend_vendor_parent(&backend), Some(GROCERIES));
    assert_eq!(
        editor.store().vendor(JUMBO).and_then(|v| v.parent),
        Some(GROCERIES)
    );
}

#[tokio::test]
async fn structural_refusals_never_reach_backend() {
    let (mut editor, backend) = editor_for(grocery_snapshot()).await;
    backend.fail(
        FailPoint::CategoryUpdate,
        ServiceError::Transient("must not be called".into()),
    );

    let err = editor
        .move_node(MoveRequest::new(FOOD, Some(GROCERIES)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::Cycle { .. })
    ));

    let err = editor
        .move_node(MoveRequest::new(GROCERY_TXN, Some(DINING)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::NotMovable(_))
    ));

    let err = editor
        .move_node(MoveRequest::new(DINING, Some(JUMBO)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::InvalidTarget(_))
    ));
}

#[tokio::test]
async fn backend_refused_delete_is_not_recorded() {
    let (mut editor, _backend) = editor_for(grocery_snapshot()).await;

    let err = editor.delete_category(GROCERIES).await.unwrap_err();
    assert!(matches!(err, EngineError::OperationFailure(_)));
    assert_eq!(editor.history_status().history_length, 0);
    assert!(editor.tree().contains(GROCERIES));
}

#[tokio::test]
async fn shared_history_is_visible_to_observers() {
    let (mut editor, _backend) = editor_for(grocery_snapshot()).await;
    let history = editor.history();

    editor.create_category("Travel", None).await.unwrap();
    assert!(history.status().can_undo);
    assert!(Arc::ptr_eq(&history, &editor.history()));
}
