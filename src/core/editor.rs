//! Orchestrates structural edits: validate against a fresh tree, check vendor
//! rules, call the backend, record history, then refresh the cache.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::core::conflict_resolver::{
    ConflictDescriptor, ConflictResolution, ConflictResolver, MoveVerdict, ResolutionOutcome,
};
use crate::core::history::{Command, HistoryOutcome, HistoryStatus, OperationHistory};
use crate::core::move_validator::{check_move, validate_category_name};
use crate::core::record_store::RecordStore;
use crate::core::services::{
    CategoryService, TransactionSource, VendorDirectory, VendorRuleService,
};
use crate::core::tree_builder::{CategoryTree, NodeKind, TreeNode, TreeOptions};
use crate::domain::{CategoryPatch, CategoryRecord, NewCategory, VendorRule};
use crate::errors::{EngineResult, ValidationError};

/// Handles to every collaborator the editor talks to.
#[derive(Clone)]
pub struct EngineServices {
    pub categories: Arc<dyn CategoryService>,
    pub rules: Arc<dyn VendorRuleService>,
    pub vendors: Arc<dyn VendorDirectory>,
    pub transactions: Arc<dyn TransactionSource>,
}

impl EngineServices {
    /// Uses one backend for all four roles.
    pub fn shared<B>(backend: Arc<B>) -> Self
    where
        B: CategoryService + VendorRuleService + VendorDirectory + TransactionSource + 'static,
    {
        Self {
            categories: backend.clone(),
            rules: backend.clone(),
            vendors: backend.clone(),
            transactions: backend,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub node_id: Uuid,
    /// `None` moves to the root.
    pub target: Option<Uuid>,
    /// After a vendor move that proceeds without conflict, also store a
    /// persistent rule for the new category unless one already exists. The
    /// rule is created first and dropped again if the placement fails.
    pub remember_rule: bool,
}

impl MoveRequest {
    pub fn new(node_id: Uuid, target: Option<Uuid>) -> Self {
        Self {
            node_id,
            target,
            remember_rule: false,
        }
    }

    pub fn remembering_rule(mut self) -> Self {
        self.remember_rule = true;
        self
    }
}

/// A vendor move held back until the user picks a resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMove {
    pub request: MoveRequest,
    pub conflict: ConflictDescriptor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Applied,
    /// Nothing changed; pass the pending move to [`CategoryEditor::resolve_conflict`].
    Conflict(PendingMove),
}

pub struct CategoryEditor {
    services: EngineServices,
    store: RecordStore,
    history: Arc<OperationHistory>,
    resolver: ConflictResolver,
    tree_options: TreeOptions,
}

impl CategoryEditor {
    pub fn new(services: EngineServices, config: &EngineConfig) -> Self {
        let history = Arc::new(OperationHistory::new(config.history_limit()));
        Self::with_history(services, config, history)
    }

    /// Shares an existing history, e.g. one observed by another component.
    pub fn with_history(
        services: EngineServices,
        config: &EngineConfig,
        history: Arc<OperationHistory>,
    ) -> Self {
        let resolver = ConflictResolver::new(services.rules.clone());
        Self {
            services,
            store: RecordStore::new(),
            history,
            resolver,
            tree_options: TreeOptions::from(&config.tree),
        }
    }

    pub async fn refresh(&mut self) -> EngineResult<()> {
        self.store
            .refresh(
                self.services.categories.as_ref(),
                self.services.vendors.as_ref(),
                self.services.transactions.as_ref(),
            )
            .await
    }

    /// Tree with the configured display options.
    pub fn tree(&self) -> CategoryTree {
        self.store.build_tree(&self.tree_options)
    }

    pub fn tree_with(&self, options: &TreeOptions) -> CategoryTree {
        self.store.build_tree(options)
    }

    pub fn tree_options(&self) -> &TreeOptions {
        &self.tree_options
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn history(&self) -> Arc<OperationHistory> {
        Arc::clone(&self.history)
    }

    pub fn history_status(&self) -> HistoryStatus {
        self.history.status()
    }

    pub async fn create_category(
        &mut self,
        name: &str,
        parent: Option<Uuid>,
    ) -> EngineResult<CategoryRecord> {
        if let Some(parent_id) = parent {
            if self.store.category(parent_id).is_none() {
                return Err(ValidationError::NodeNotFound(parent_id).into());
            }
        }
        let name = validate_category_name(self.store.categories(), parent, name, None)?;
        let fields = NewCategory::new(name, parent);
        let record = self.services.categories.create(fields.clone()).await?;
        info!(category = %record.name, "category created");

        self.store.upsert_category(record.clone());
        self.history.push_command(Command::create(fields, &record));
        self.refresh_quietly().await;
        Ok(record)
    }

    pub async fn rename_category(&mut self, id: Uuid, name: &str) -> EngineResult<CategoryRecord> {
        let current = self
            .store
            .category(id)
            .cloned()
            .ok_or(ValidationError::NodeNotFound(id))?;
        let name = validate_category_name(self.store.categories(), current.parent, name, Some(id))?;
        if name == current.name {
            return Ok(current);
        }

        let record = self
            .services
            .categories
            .update(id, CategoryPatch::rename(name.clone()))
            .await?;
        info!(from = %current.name, to = %record.name, "category renamed");

        self.store.upsert_category(record.clone());
        self.history
            .push_command(Command::rename(id, current.name, name));
        self.refresh_quietly().await;
        Ok(record)
    }

    /// Validates then applies a move. Vendor moves whose stored rule points
    /// elsewhere come back as [`EditOutcome::Conflict`] without side effects.
    pub async fn move_node(&mut self, request: MoveRequest) -> EngineResult<EditOutcome> {
        let tree = self.structure_tree();
        check_move(request.node_id, request.target, &tree)?;
        let node = tree
            .node(request.node_id)
            .ok_or(ValidationError::NodeNotFound(request.node_id))?;
        if tree.parent_of(request.node_id) == Some(request.target) {
            debug!(node = %request.node_id, "node already under requested parent");
            return Ok(EditOutcome::Applied);
        }

        match node.kind {
            NodeKind::Category => {
                self.move_category(request).await?;
                Ok(EditOutcome::Applied)
            }
            NodeKind::Vendor => {
                let target = request.target.and_then(|id| tree.node(id));
                if let Some(target) = target {
                    if let MoveVerdict::Conflict(conflict) =
                        self.resolver.evaluate_move(node, target, &tree).await
                    {
                        info!(vendor = %conflict.vendor_name, "vendor move held for rule conflict");
                        return Ok(EditOutcome::Conflict(PendingMove { request, conflict }));
                    }
                }
                let created = match (request.remember_rule, target) {
                    (true, Some(target)) => self.rule_for_move(node, target).await?,
                    _ => None,
                };
                if let Err(err) = self.place_vendor(request.node_id, request.target).await {
                    if let Some(rule) = &created {
                        self.resolver.forget(rule).await;
                    }
                    return Err(err);
                }
                self.refresh_quietly().await;
                Ok(EditOutcome::Applied)
            }
            NodeKind::Transaction => Err(ValidationError::NotMovable(request.node_id).into()),
        }
    }

    /// Carries out the user's choice for a held vendor move. The rule change
    /// and the placement succeed or fail together.
    pub async fn resolve_conflict(
        &mut self,
        pending: &PendingMove,
        resolution: ConflictResolution,
    ) -> EngineResult<ResolutionOutcome> {
        if resolution == ConflictResolution::Cancel {
            info!(vendor = %pending.conflict.vendor_name, "vendor move cancelled");
            return Ok(ResolutionOutcome::Cancelled);
        }
        let vendor_id = pending.request.node_id;
        let target = pending.request.target;
        check_move(vendor_id, target, &self.structure_tree())?;

        let previous = self
            .store
            .place_vendor(vendor_id, target)
            .ok_or(ValidationError::NodeNotFound(vendor_id))?;

        let outcome = match self
            .resolver
            .apply_resolution(&pending.conflict, resolution)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                self.store.place_vendor(vendor_id, previous);
                return Err(err);
            }
        };

        if let Err(err) = self.services.vendors.set_parent(vendor_id, target).await {
            self.store.place_vendor(vendor_id, previous);
            self.resolver.compensate(&pending.conflict, &outcome).await;
            return Err(err.into());
        }
        info!(vendor = %pending.conflict.vendor_name, ?resolution, "vendor moved");
        self.refresh_quietly().await;
        Ok(outcome)
    }

    pub async fn delete_category(&mut self, id: Uuid) -> EngineResult<()> {
        let record = self
            .store
            .category(id)
            .cloned()
            .ok_or(ValidationError::NodeNotFound(id))?;
        self.services.categories.delete(id).await?;
        info!(category = %record.name, "category deleted");

        self.store.remove_category(id);
        self.history.push_command(Command::delete(record));
        self.refresh_quietly().await;
        Ok(())
    }

    /// Stores a persistent rule filing `vendor` under `category` without moving it.
    pub async fn remember_vendor(&mut self, vendor: Uuid, category: Uuid) -> EngineResult<VendorRule> {
        let tree = self.structure_tree();
        let vendor_node = Self::node_of_kind(&tree, vendor, NodeKind::Vendor)?;
        let category_node = Self::node_of_kind(&tree, category, NodeKind::Category)?;
        self.resolver.remember_vendor(vendor_node, category_node).await
    }

    pub async fn undo(&mut self) -> EngineResult<Option<HistoryOutcome>> {
        let outcome = self.history.undo(self.services.categories.as_ref()).await?;
        if outcome.is_some() {
            self.refresh_quietly().await;
        }
        Ok(outcome)
    }

    pub async fn redo(&mut self) -> EngineResult<Option<HistoryOutcome>> {
        let outcome = self.history.redo(self.services.categories.as_ref()).await?;
        if outcome.is_some() {
            self.refresh_quietly().await;
        }
        Ok(outcome)
    }

    /// Drops cached records and history, e.g. on logout.
    pub fn reset(&mut self) {
        self.store.reset();
        self.history.clear();
        info!("category editor reset");
    }

    async fn move_category(&mut self, request: MoveRequest) -> EngineResult<()> {
        let current = self
            .store
            .category(request.node_id)
            .cloned()
            .ok_or(ValidationError::NodeNotFound(request.node_id))?;
        let record = self
            .services
            .categories
            .update(request.node_id, CategoryPatch::reparent(request.target))
            .await?;
        info!(category = %record.name, "category moved");

        self.store.upsert_category(record);
        self.history.push_command(Command::move_to(
            request.node_id,
            current.parent,
            request.target,
        ));
        self.refresh_quietly().await;
        Ok(())
    }

    /// Creates the rule a remembered vendor move asks for, before anything is
    /// placed. `None` when a persistent rule already files the vendor there.
    async fn rule_for_move(
        &self,
        vendor: &TreeNode,
        target: &TreeNode,
    ) -> EngineResult<Option<VendorRule>> {
        if self.resolver.persistent_rule(&vendor.name, target.id).await?.is_some() {
            debug!(vendor = %vendor.name, "persistent rule already targets the new category");
            return Ok(None);
        }
        self.resolver.remember_vendor(vendor, target).await.map(Some)
    }

    async fn place_vendor(&mut self, vendor_id: Uuid, target: Option<Uuid>) -> EngineResult<()> {
        let previous = self
            .store
            .place_vendor(vendor_id, target)
            .ok_or(ValidationError::NodeNotFound(vendor_id))?;
        if let Err(err) = self.services.vendors.set_parent(vendor_id, target).await {
            self.store.place_vendor(vendor_id, previous);
            return Err(err.into());
        }
        info!(vendor = %vendor_id, "vendor moved");
        Ok(())
    }

    /// Every record visible, so validation sees the whole structure.
    fn structure_tree(&self) -> CategoryTree {
        let options = TreeOptions::default()
            .with_vendors(true)
            .with_transactions(true)
            .with_system_categories(true)
            .with_user_categories(true);
        self.store.build_tree(&options)
    }

    fn node_of_kind(tree: &CategoryTree, id: Uuid, kind: NodeKind) -> EngineResult<&TreeNode> {
        let node = tree.node(id).ok_or(ValidationError::NodeNotFound(id))?;
        if node.kind != kind {
            return Err(ValidationError::InvalidTarget(format!("`{}` is a {}", node.name, node.kind)).into());
        }
        Ok(node)
    }

    async fn refresh_quietly(&mut self) {
        if let Err(err) = self.refresh().await {
            warn!("record refresh after edit failed: {}", err);
        }
    }
}
