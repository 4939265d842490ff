pub mod account;
pub mod audit;
pub mod building;
pub mod hash_record;

pub use account::{
    Account, AccountResponse, AccountType, ActorStamp, AssignedBuilding, FieldChange, RoleFlags,
};
pub use audit::{AuditAction, AuditOutcome, AuditRecord, ImpactedAccount};
pub use building::{Amenity, Building};
pub use hash_record::HashRecord;
