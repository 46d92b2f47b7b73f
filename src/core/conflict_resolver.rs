//! Detects when moving a vendor would contradict a stored persistent
//! assignment rule, and carries out the user's chosen resolution.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::services::VendorRuleService;
use crate::core::tree_builder::{CategoryTree, NodeKind, TreeNode};
use crate::domain::{NewVendorRule, RuleFilter, VendorRule, VendorRulePatch};
use crate::errors::{EngineError, EngineResult};

/// Payload shown to the user when a move and a rule disagree.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConflictDescriptor {
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub old_category_id: Uuid,
    pub old_category_name: String,
    pub new_category_id: Uuid,
    pub new_category_name: String,
    pub existing_rule: VendorRule,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveVerdict {
    Proceed,
    Conflict(ConflictDescriptor),
}

impl MoveVerdict {
    pub fn is_conflict(&self) -> bool {
        matches!(self, MoveVerdict::Conflict(_))
    }
}

/// Terminal user actions for a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Repoint the rule at the new category, then move.
    Update,
    /// Leave the rule on the old category but move anyway.
    Keep,
    /// Delete the rule, then move.
    Remove,
    /// Change nothing.
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    RuleUpdated(VendorRule),
    RuleKept,
    RuleRemoved(VendorRule),
    Cancelled,
}

impl ResolutionOutcome {
    pub fn applies_move(&self) -> bool {
        !matches!(self, ResolutionOutcome::Cancelled)
    }
}

pub struct ConflictResolver {
    rules: Arc<dyn VendorRuleService>,
}

impl ConflictResolver {
    pub fn new(rules: Arc<dyn VendorRuleService>) -> Self {
        Self { rules }
    }

    /// Only vendor-onto-category moves are checked. A failed rule lookup is
    /// logged and the move proceeds unverified.
    pub async fn evaluate_move(
        &self,
        dragged: &TreeNode,
        target: &TreeNode,
        tree: &CategoryTree,
    ) -> MoveVerdict {
        if dragged.kind != NodeKind::Vendor || target.kind != NodeKind::Category {
            return MoveVerdict::Proceed;
        }

        let rule = match self.conflicting_rule(&dragged.name, target.id).await {
            Ok(rule) => rule,
            Err(err) => {
                warn!(vendor = %dragged.name, "moving without rule verification: {}", err);
                return MoveVerdict::Proceed;
            }
        };

        match rule {
            Some(rule) => {
                let old_category_name = tree
                    .node(rule.category_id)
                    .map(|node| node.name.clone())
                    .unwrap_or_else(|| rule.category_id.to_string());
                MoveVerdict::Conflict(ConflictDescriptor {
                    vendor_id: dragged.id,
                    vendor_name: dragged.name.clone(),
                    old_category_id: rule.category_id,
                    old_category_name,
                    new_category_id: target.id,
                    new_category_name: target.name.clone(),
                    existing_rule: rule,
                })
            }
            None => MoveVerdict::Proceed,
        }
    }

    /// First persistent rule for `vendor_name` that files it somewhere other
    /// than `target`.
    async fn conflicting_rule(
        &self,
        vendor_name: &str,
        target: Uuid,
    ) -> EngineResult<Option<VendorRule>> {
        let rules = self
            .rules
            .list(Some(RuleFilter::vendor(vendor_name)))
            .await
            .map_err(|err| EngineError::Transient(format!("vendor rule lookup failed: {err}")))?;
        Ok(rules.into_iter().find(|rule| {
            rule.vendor_name == vendor_name && rule.is_persistent && rule.category_id != target
        }))
    }

    /// Runs the rule side of a resolution. The caller applies the move only
    /// when this succeeds and [`ResolutionOutcome::applies_move`] holds.
    pub async fn apply_resolution(
        &self,
        conflict: &ConflictDescriptor,
        resolution: ConflictResolution,
    ) -> EngineResult<ResolutionOutcome> {
        let rule = &conflict.existing_rule;
        let outcome = match resolution {
            ConflictResolution::Update => {
                let updated = self
                    .rules
                    .update(rule.id, VendorRulePatch::repoint(conflict.new_category_id))
                    .await?;
                ResolutionOutcome::RuleUpdated(updated)
            }
            ConflictResolution::Keep => ResolutionOutcome::RuleKept,
            ConflictResolution::Remove => {
                self.rules.delete(rule.id).await?;
                ResolutionOutcome::RuleRemoved(rule.clone())
            }
            ConflictResolution::Cancel => ResolutionOutcome::Cancelled,
        };
        info!(
            vendor = %conflict.vendor_name,
            ?resolution,
            "vendor rule conflict resolved"
        );
        Ok(outcome)
    }

    /// Best-effort undo of a rule change whose paired move failed.
    pub async fn compensate(&self, conflict: &ConflictDescriptor, outcome: &ResolutionOutcome) {
        let result = match outcome {
            ResolutionOutcome::RuleUpdated(rule) => self
                .rules
                .update(rule.id, VendorRulePatch::repoint(conflict.old_category_id))
                .await
                .map(|_| ()),
            ResolutionOutcome::RuleRemoved(rule) => {
                let mut recreated = NewVendorRule::from(rule);
                recreated.vendor_id = Some(conflict.vendor_id);
                self.rules.create(recreated).await.map(|_| ())
            }
            ResolutionOutcome::RuleKept | ResolutionOutcome::Cancelled => Ok(()),
        };
        if let Err(err) = result {
            warn!(
                vendor = %conflict.vendor_name,
                "failed to restore vendor rule after aborted move: {}",
                err
            );
        }
    }

    /// The persistent rule already filing `vendor_name` under `category`, if any.
    pub async fn persistent_rule(
        &self,
        vendor_name: &str,
        category: Uuid,
    ) -> EngineResult<Option<VendorRule>> {
        let rules = self.rules.list(Some(RuleFilter::vendor(vendor_name))).await?;
        Ok(rules.into_iter().find(|rule| {
            rule.vendor_name == vendor_name && rule.is_persistent && rule.category_id == category
        }))
    }

    /// Best-effort removal of a rule created for a move that then failed.
    pub async fn forget(&self, rule: &VendorRule) {
        if let Err(err) = self.rules.delete(rule.id).await {
            warn!(vendor = %rule.vendor_name, "failed to drop rule for aborted move: {}", err);
        }
    }

    /// Stores a persistent rule filing `vendor` under `category`. A backend
    /// conflict surfaces as [`crate::EngineError::Conflict`].
    pub async fn remember_vendor(
        &self,
        vendor: &TreeNode,
        category: &TreeNode,
    ) -> EngineResult<VendorRule> {
        let rule = self
            .rules
            .create(NewVendorRule {
                vendor_id: Some(vendor.id),
                vendor_name: vendor.name.clone(),
                category_id: category.id,
                priority: 0,
                is_persistent: true,
            })
            .await?;
        info!(vendor = %vendor.name, category = %category.name, "persistent vendor rule created");
        Ok(rule)
    }
}
