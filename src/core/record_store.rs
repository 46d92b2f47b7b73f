//! Local cache of the records the tree is built from.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::services::{CategoryService, TransactionSource, VendorDirectory};
use crate::core::tree_builder::{build_tree, CategoryTree, TreeOptions};
use crate::domain::{
    find_by_id, CategoryRecord, RecordSnapshot, TransactionRecord, VendorRecord,
};
use crate::errors::EngineResult;

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    categories: Vec<CategoryRecord>,
    vendors: Vec<VendorRecord>,
    transactions: Vec<TransactionRecord>,
    spending_totals: Option<HashMap<Uuid, f64>>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: &RecordSnapshot) -> Self {
        Self {
            categories: snapshot.categories.clone(),
            vendors: snapshot.vendors.clone(),
            transactions: snapshot.transactions.clone(),
            spending_totals: None,
            refreshed_at: Some(Utc::now()),
        }
    }

    /// Reloads every collection. The cache is replaced only when all listings
    /// succeed; a failed totals request just drops the fast path.
    pub async fn refresh(
        &mut self,
        categories: &dyn CategoryService,
        vendors: &dyn VendorDirectory,
        transactions: &dyn TransactionSource,
    ) -> EngineResult<()> {
        let next_categories = categories.list().await?;
        let next_vendors = vendors.list().await?;
        let next_transactions = transactions.list().await?;
        let totals = match transactions.category_spending_totals().await {
            Ok(totals) => totals,
            Err(err) => {
                warn!("spending totals unavailable, computing locally: {}", err);
                None
            }
        };

        self.categories = next_categories;
        self.vendors = next_vendors;
        self.transactions = next_transactions;
        self.spending_totals = totals;
        self.refreshed_at = Some(Utc::now());
        debug!(
            categories = self.categories.len(),
            vendors = self.vendors.len(),
            transactions = self.transactions.len(),
            "record store refreshed"
        );
        Ok(())
    }

    /// Builds from the cached records. Cached totals fill in when the options
    /// carry none.
    pub fn build_tree(&self, options: &TreeOptions) -> CategoryTree {
        if options.category_spending_totals.is_some() || self.spending_totals.is_none() {
            return build_tree(&self.categories, &self.vendors, &self.transactions, options);
        }
        let options = options.clone().with_totals(self.spending_totals.clone());
        build_tree(&self.categories, &self.vendors, &self.transactions, &options)
    }

    pub fn categories(&self) -> &[CategoryRecord] {
        &self.categories
    }

    pub fn vendors(&self) -> &[VendorRecord] {
        &self.vendors
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    pub fn spending_totals(&self) -> Option<&HashMap<Uuid, f64>> {
        self.spending_totals.as_ref()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn category(&self, id: Uuid) -> Option<&CategoryRecord> {
        find_by_id(&self.categories, id)
    }

    pub fn vendor(&self, id: Uuid) -> Option<&VendorRecord> {
        find_by_id(&self.vendors, id)
    }

    /// Replaces the cached copy of `record`, or appends it.
    pub fn upsert_category(&mut self, record: CategoryRecord) {
        match self.categories.iter_mut().find(|c| c.id == record.id) {
            Some(existing) => *existing = record,
            None => self.categories.push(record),
        }
    }

    pub fn remove_category(&mut self, id: Uuid) -> Option<CategoryRecord> {
        let index = self.categories.iter().position(|c| c.id == id)?;
        Some(self.categories.remove(index))
    }

    /// Files a vendor locally and returns its previous parent, or `None` when
    /// the vendor is unknown.
    pub fn place_vendor(&mut self, id: Uuid, parent: Option<Uuid>) -> Option<Option<Uuid>> {
        let vendor = self.vendors.iter_mut().find(|vendor| vendor.id == id)?;
        Some(std::mem::replace(&mut vendor.parent, parent))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
