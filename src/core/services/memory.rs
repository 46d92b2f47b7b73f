//! Process-local backend used for offline sessions and tests.
//!
//! Enforces the same rules the remote API does (no orphaning deletes, one
//! persistent rule per vendor name) and lets callers inject failures per call
//! site through [`FailPoint`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    CategoryPatch, CategoryRecord, Direction, NewCategory, NewVendorRule, RecordSnapshot,
    RuleFilter, TransactionRecord, VendorRecord, VendorRule, VendorRulePatch,
};

use super::{
    CategoryService, ServiceError, ServiceResult, TransactionSource, VendorDirectory,
    VendorRuleService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    CategoryList,
    CategoryCreate,
    CategoryUpdate,
    CategoryDelete,
    RuleList,
    RuleCreate,
    RuleUpdate,
    RuleDelete,
    VendorList,
    VendorSetParent,
    TransactionList,
}

#[derive(Debug, Default)]
struct MemoryState {
    categories: Vec<CategoryRecord>,
    vendors: Vec<VendorRecord>,
    transactions: Vec<TransactionRecord>,
    rules: Vec<VendorRule>,
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<MemoryState>,
    failures: Mutex<HashMap<FailPoint, ServiceError>>,
    serve_totals: Mutex<bool>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: RecordSnapshot) -> Self {
        let backend = Self::default();
        if let Ok(mut state) = backend.state.lock() {
            state.categories = snapshot.categories;
            state.vendors = snapshot.vendors;
            state.transactions = snapshot.transactions;
            state.rules = snapshot.rules;
        }
        backend
    }

    /// Makes every subsequent call at `point` fail with `error` until [`Self::recover`].
    pub fn fail(&self, point: FailPoint, error: ServiceError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(point, error);
        }
    }

    pub fn recover(&self, point: FailPoint) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(&point);
        }
    }

    /// Toggles the precomputed spending totals fast path.
    pub fn serve_totals(&self, enabled: bool) {
        if let Ok(mut flag) = self.serve_totals.lock() {
            *flag = enabled;
        }
    }

    pub fn snapshot(&self) -> ServiceResult<RecordSnapshot> {
        let state = self.state()?;
        Ok(RecordSnapshot {
            categories: state.categories.clone(),
            vendors: state.vendors.clone(),
            transactions: state.transactions.clone(),
            rules: state.rules.clone(),
        })
    }

    fn check(&self, point: FailPoint) -> ServiceResult<()> {
        let failures = self
            .failures
            .lock()
            .map_err(|_| ServiceError::Transient("failure table poisoned".into()))?;
        match failures.get(&point) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn state(&self) -> ServiceResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| ServiceError::Transient("backend state poisoned".into()))
    }
}

impl MemoryState {
    fn category(&self, id: Uuid) -> ServiceResult<&CategoryRecord> {
        self.categories
            .iter()
            .find(|category| category.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("category {id}")))
    }

    fn ensure_parent(&self, parent: Option<Uuid>) -> ServiceResult<()> {
        match parent {
            Some(parent_id) => self.category(parent_id).map(|_| ()),
            None => Ok(()),
        }
    }

    fn ensure_unique_name(&self, parent: Option<Uuid>, name: &str, exclude: Option<Uuid>) -> ServiceResult<()> {
        let normalized = name.trim().to_lowercase();
        let taken = self.categories.iter().any(|category| {
            category.parent == parent
                && Some(category.id) != exclude
                && category.name.trim().to_lowercase() == normalized
        });
        if taken {
            Err(ServiceError::Conflict(format!(
                "category `{}` already exists under this parent",
                name
            )))
        } else {
            Ok(())
        }
    }

    fn would_cycle(&self, id: Uuid, parent: Option<Uuid>) -> bool {
        let mut cursor = parent;
        let mut steps = 0;
        while let Some(current) = cursor {
            if current == id || steps > self.categories.len() {
                return true;
            }
            cursor = self
                .categories
                .iter()
                .find(|category| category.id == current)
                .and_then(|category| category.parent);
            steps += 1;
        }
        false
    }
}

#[async_trait]
impl CategoryService for InMemoryBackend {
    async fn list(&self) -> ServiceResult<Vec<CategoryRecord>> {
        self.check(FailPoint::CategoryList)?;
        Ok(self.state()?.categories.clone())
    }

    async fn create(&self, category: NewCategory) -> ServiceResult<CategoryRecord> {
        self.check(FailPoint::CategoryCreate)?;
        let mut state = self.state()?;
        state.ensure_parent(category.parent)?;
        state.ensure_unique_name(category.parent, &category.name, None)?;
        let record = CategoryRecord {
            id: Uuid::new_v4(),
            name: category.name,
            parent: category.parent,
            is_custom: true,
            owner_id: None,
            description: category.description,
        };
        state.categories.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, patch: CategoryPatch) -> ServiceResult<CategoryRecord> {
        self.check(FailPoint::CategoryUpdate)?;
        let mut state = self.state()?;
        let current = state.category(id)?.clone();
        let parent = patch.parent.unwrap_or(current.parent);
        let name = patch.name.clone().unwrap_or_else(|| current.name.clone());
        if let Some(new_parent) = patch.parent {
            state.ensure_parent(new_parent)?;
            if state.would_cycle(id, new_parent) {
                return Err(ServiceError::Rejected(
                    "category cannot be moved under itself".into(),
                ));
            }
        }
        state.ensure_unique_name(parent, &name, Some(id))?;
        let record = state
            .categories
            .iter_mut()
            .find(|category| category.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("category {id}")))?;
        record.name = name;
        record.parent = parent;
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        self.check(FailPoint::CategoryDelete)?;
        let mut state = self.state()?;
        state.category(id)?;
        if state.categories.iter().any(|cat| cat.parent == Some(id)) {
            return Err(ServiceError::Rejected(
                "category has child categories".into(),
            ));
        }
        if state
            .transactions
            .iter()
            .any(|txn| txn.category_id == Some(id))
        {
            return Err(ServiceError::Rejected(
                "category has linked transactions".into(),
            ));
        }
        if state.vendors.iter().any(|vendor| vendor.parent == Some(id)) {
            return Err(ServiceError::Rejected("category has filed vendors".into()));
        }
        state.categories.retain(|category| category.id != id);
        Ok(())
    }
}

#[async_trait]
impl VendorRuleService for InMemoryBackend {
    async fn list(&self, filter: Option<RuleFilter>) -> ServiceResult<Vec<VendorRule>> {
        self.check(FailPoint::RuleList)?;
        let state = self.state()?;
        Ok(state
            .rules
            .iter()
            .filter(|rule| filter.as_ref().map_or(true, |f| f.matches(rule)))
            .cloned()
            .collect())
    }

    async fn create(&self, rule: NewVendorRule) -> ServiceResult<VendorRule> {
        self.check(FailPoint::RuleCreate)?;
        let mut state = self.state()?;
        if rule.is_persistent
            && state
                .rules
                .iter()
                .any(|existing| existing.is_persistent && existing.vendor_name == rule.vendor_name)
        {
            return Err(ServiceError::Conflict(format!(
                "a persistent rule for `{}` already exists",
                rule.vendor_name
            )));
        }
        let created = VendorRule {
            id: Uuid::new_v4(),
            vendor_name: rule.vendor_name,
            category_id: rule.category_id,
            priority: rule.priority,
            is_persistent: rule.is_persistent,
        };
        state.rules.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: VendorRulePatch) -> ServiceResult<VendorRule> {
        self.check(FailPoint::RuleUpdate)?;
        let mut state = self.state()?;
        let rule = state
            .rules
            .iter_mut()
            .find(|rule| rule.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("rule {id}")))?;
        if let Some(category_id) = patch.category_id {
            rule.category_id = category_id;
        }
        if let Some(priority) = patch.priority {
            rule.priority = priority;
        }
        if let Some(is_persistent) = patch.is_persistent {
            rule.is_persistent = is_persistent;
        }
        Ok(rule.clone())
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        self.check(FailPoint::RuleDelete)?;
        let mut state = self.state()?;
        let before = state.rules.len();
        state.rules.retain(|rule| rule.id != id);
        if state.rules.len() == before {
            return Err(ServiceError::NotFound(format!("rule {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl VendorDirectory for InMemoryBackend {
    async fn list(&self) -> ServiceResult<Vec<VendorRecord>> {
        self.check(FailPoint::VendorList)?;
        Ok(self.state()?.vendors.clone())
    }

    async fn set_parent(&self, id: Uuid, parent: Option<Uuid>) -> ServiceResult<VendorRecord> {
        self.check(FailPoint::VendorSetParent)?;
        let mut state = self.state()?;
        state.ensure_parent(parent)?;
        let vendor = state
            .vendors
            .iter_mut()
            .find(|vendor| vendor.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("vendor {id}")))?;
        vendor.parent = parent;
        Ok(vendor.clone())
    }
}

#[async_trait]
impl TransactionSource for InMemoryBackend {
    async fn list(&self) -> ServiceResult<Vec<TransactionRecord>> {
        self.check(FailPoint::TransactionList)?;
        Ok(self.state()?.transactions.clone())
    }

    async fn category_spending_totals(&self) -> ServiceResult<Option<HashMap<Uuid, f64>>> {
        let enabled = self
            .serve_totals
            .lock()
            .map(|flag| *flag)
            .unwrap_or(false);
        if !enabled {
            return Ok(None);
        }
        let state = self.state()?;
        let mut totals = HashMap::new();
        for txn in &state.transactions {
            if txn.direction != Direction::Outflow {
                continue;
            }
            if let Some(category_id) = txn.category_id {
                *totals.entry(category_id).or_insert(0.0) += txn.amount;
            }
        }
        Ok(Some(totals))
    }
}
