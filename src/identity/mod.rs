// ABOUTME: Replica identity setup for dlt-loaded destination tables
// ABOUTME: Index naming, DDL rendering, destination store, setter loop, and run report

pub mod report;
pub mod setter;
pub mod store;
pub mod target;

pub use report::{IndexOutcome, RunReport, TableReport};
pub use setter::{set_replica_identity, ReplicaIdentitySetter};
pub use store::{IdentityStore, PgIdentityStore};
pub use target::{index_name_for, IndexTarget};
