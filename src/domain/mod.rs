//! Domain types for the donation-matching ledger.
//!
//! This module provides:
//! - Integer money and time primitives: Amount, TimeMs
//! - The LedgerEntity capability shared by both entity kinds
//! - The concrete entity types: Project, Donation

pub mod donation;
pub mod ledger;
pub mod primitives;
pub mod project;

pub use donation::Donation;
pub use ledger::{EntityKind, LedgerEntity, LedgerUpdate};
pub use primitives::{Amount, TimeMs};
pub use project::Project;
