//! etude-store — Quiz store implementations.
//!
//! Implements the `QuizStore` trait in memory, with JSON snapshot
//! persistence for the CLI and a failure-injecting wrapper for tests.

pub mod flaky;
pub mod memory;
pub mod snapshot;

pub use flaky::FlakyStore;
pub use memory::MemoryStore;
pub use snapshot::StoreSnapshot;
