//! Seams to the remote backend. Everything behind these traits is owned by
//! other components; the engine only consumes the contracts.

pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    CategoryPatch, CategoryRecord, NewCategory, NewVendorRule, RuleFilter, TransactionRecord,
    VendorRecord, VendorRule, VendorRulePatch,
};

pub use memory::{FailPoint, InMemoryBackend};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),
    /// Concurrent modification or duplicate entity reported by the backend.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("backend unavailable: {0}")]
    Transient(String),
}

#[async_trait]
pub trait CategoryService: Send + Sync {
    async fn list(&self) -> ServiceResult<Vec<CategoryRecord>>;
    async fn create(&self, category: NewCategory) -> ServiceResult<CategoryRecord>;
    async fn update(&self, id: Uuid, patch: CategoryPatch) -> ServiceResult<CategoryRecord>;
    /// Fails with [`ServiceError::Rejected`] when the backend refuses to orphan
    /// dependent data.
    async fn delete(&self, id: Uuid) -> ServiceResult<()>;
}

#[async_trait]
pub trait VendorRuleService: Send + Sync {
    async fn list(&self, filter: Option<RuleFilter>) -> ServiceResult<Vec<VendorRule>>;
    /// May return [`ServiceError::Conflict`] when an equivalent persistent rule exists.
    async fn create(&self, rule: NewVendorRule) -> ServiceResult<VendorRule>;
    async fn update(&self, id: Uuid, patch: VendorRulePatch) -> ServiceResult<VendorRule>;
    async fn delete(&self, id: Uuid) -> ServiceResult<()>;
}

/// Persists where a vendor is filed for display.
#[async_trait]
pub trait VendorDirectory: Send + Sync {
    async fn list(&self) -> ServiceResult<Vec<VendorRecord>>;
    async fn set_parent(&self, id: Uuid, parent: Option<Uuid>) -> ServiceResult<VendorRecord>;
}

#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn list(&self) -> ServiceResult<Vec<TransactionRecord>>;

    /// Optional fast path; `None` means totals are computed locally.
    async fn category_spending_totals(&self) -> ServiceResult<Option<HashMap<Uuid, f64>>> {
        Ok(None)
    }
}
