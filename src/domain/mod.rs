pub mod category;
pub mod common;
pub mod rule;
pub mod snapshot;
pub mod transaction;
pub mod vendor;

pub use category::{CategoryPatch, CategoryRecord, NewCategory};
pub use common::{find_by_id, Identifiable, NamedEntity, Parented};
pub use rule::{NewVendorRule, RuleFilter, VendorRule, VendorRulePatch};
pub use snapshot::RecordSnapshot;
pub use transaction::{Direction, TransactionRecord};
pub use vendor::VendorRecord;
