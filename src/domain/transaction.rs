use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Identifiable;

/// Money direction relative to the account holder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inflow,
    Outflow,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Inflow => "inflow",
            Direction::Outflow => "outflow",
        })
    }
}

/// Read-only leaf data used for aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub id: Uuid,
    /// Unsigned magnitude; the sign comes from `direction`.
    pub amount: f64,
    pub direction: Direction,
    pub date: NaiveDate,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<Uuid>,
}

impl TransactionRecord {
    pub fn new(amount: f64, direction: Direction, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount: amount.abs(),
            direction,
            date,
            category_id: None,
            vendor_id: None,
        }
    }

    pub fn outflow(amount: f64, date: NaiveDate) -> Self {
        Self::new(amount, Direction::Outflow, date)
    }

    pub fn inflow(amount: f64, date: NaiveDate) -> Self {
        Self::new(amount, Direction::Inflow, date)
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn at_vendor(mut self, vendor_id: Uuid) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }
}

impl Identifiable for TransactionRecord {
    fn id(&self) -> Uuid {
        self.id
    }
}
