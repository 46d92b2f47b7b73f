//! Persistent vendor-to-category assignment rules.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Identifiable;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VendorRule {
    pub id: Uuid,
    /// Matched case-sensitively against vendor names.
    pub vendor_name: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub is_persistent: bool,
}

impl VendorRule {
    pub fn persistent(vendor_name: impl Into<String>, category_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            vendor_name: vendor_name.into(),
            category_id,
            priority: 0,
            is_persistent: true,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }
}

impl Identifiable for VendorRule {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewVendorRule {
    #[serde(default)]
    pub vendor_id: Option<Uuid>,
    pub vendor_name: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub priority: i32,
    pub is_persistent: bool,
}

impl From<&VendorRule> for NewVendorRule {
    fn from(rule: &VendorRule) -> Self {
        Self {
            vendor_id: None,
            vendor_name: rule.vendor_name.clone(),
            category_id: rule.category_id,
            priority: rule.priority,
            is_persistent: rule.is_persistent,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VendorRulePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_persistent: Option<bool>,
}

impl VendorRulePatch {
    pub fn repoint(category_id: Uuid) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::default()
        }
    }
}

/// Server-side filter for rule listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleFilter {
    pub vendor_name: Option<String>,
    pub category_id: Option<Uuid>,
}

impl RuleFilter {
    pub fn vendor(name: impl Into<String>) -> Self {
        Self {
            vendor_name: Some(name.into()),
            category_id: None,
        }
    }

    pub fn matches(&self, rule: &VendorRule) -> bool {
        self.vendor_name
            .as_deref()
            .map_or(true, |name| rule.vendor_name == name)
            && self
                .category_id
                .map_or(true, |category| rule.category_id == category)
    }
}
