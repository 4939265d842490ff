//! Services layer: persistence, token issuance, role policy, mail, and the
//! account/building business logic built on top of them.

mod accounts;
mod buildings;
mod database;
mod email;
mod policy;
mod store;
mod token;

pub use accounts::{AccountService, SessionTokens};
pub use buildings::BuildingService;
pub use database::MongoDb;
pub use email::{EmailKind, Mailer, MockMailer, SentEmail, SmtpMailer};
pub use policy::RolePolicy;
pub use store::{
    AccountStore, AuditSink, BuildingStore, HashRecordStore, MemoryAccountStore, MemoryAuditSink,
    MemoryBuildingStore, MemoryHashStore, MongoAccountStore, MongoAuditSink, MongoBuildingStore,
    MongoHashStore,
};
pub use token::{TokenClaims, TokenPurpose, TokenService};
