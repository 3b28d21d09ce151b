//! Repository Layer
//!
//! The schedule store collaborator and its implementations.

mod firestore;
mod memory;
mod traits;

#[cfg(test)]
mod tests;

pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::{Clock, MemoryStore};
pub use traits::{ScheduleStore, Subscription};
