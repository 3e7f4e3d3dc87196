//! Coordination of allocation runs against the shared store.

pub mod runner;

pub use runner::{AllocationRunner, RunError};
