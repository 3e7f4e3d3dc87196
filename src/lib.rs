pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use db::{init_db, CommitError, Repository};
pub use domain::{Amount, Donation, EntityKind, LedgerEntity, LedgerUpdate, Project, TimeMs};
pub use engine::{allocate, ConsistencyFault};
pub use error::AppError;
pub use orchestration::AllocationRunner;
