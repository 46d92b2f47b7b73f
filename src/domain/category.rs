//! Category records as delivered by the category backend.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// A node of the category forest. `parent` chains must terminate at `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub parent: Option<Uuid>,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CategoryRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent: None,
            is_custom: true,
            owner_id: None,
            description: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_parent(mut self, parent: Option<Uuid>) -> Self {
        self.parent = parent;
        self
    }

    /// Marks the record as a built-in category shipped by the backend.
    pub fn system(mut self) -> Self {
        self.is_custom = false;
        self
    }
}

impl Identifiable for CategoryRecord {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for CategoryRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Parented for CategoryRecord {
    fn parent(&self) -> Option<Uuid> {
        self.parent
    }
}

/// Fields accepted by the category backend when creating a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub parent: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, parent: Option<Uuid>) -> Self {
        Self {
            name: name.into(),
            parent,
            description: None,
        }
    }
}

impl From<&CategoryRecord> for NewCategory {
    fn from(record: &CategoryRecord) -> Self {
        Self {
            name: record.name.clone(),
            parent: record.parent,
            description: record.description.clone(),
        }
    }
}

/// Partial update. `parent: Some(None)` moves the category to the root.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Option<Uuid>>,
}

impl CategoryPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            parent: None,
        }
    }

    pub fn reparent(parent: Option<Uuid>) -> Self {
        Self {
            name: None,
            parent: Some(parent),
        }
    }
}
