use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// A merchant filed under a category for display purposes only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VendorRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub is_system_vendor: bool,
    #[serde(default)]
    pub parent: Option<Uuid>,
}

impl VendorRecord {
    pub fn new(name: impl Into<String>, parent: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_system_vendor: false,
            parent,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }
}

impl Identifiable for VendorRecord {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for VendorRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Parented for VendorRecord {
    fn parent(&self) -> Option<Uuid> {
        self.parent
    }
}
