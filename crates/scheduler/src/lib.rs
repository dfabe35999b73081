//! Bounded-concurrency admission scheduler for batch uploads.
//!
//! Admits tasks from an ordered list into a fixed number of in-flight
//! transfer slots, forwards per-transfer signals as indexed lifecycle
//! events, and emits one aggregate completion signal once every task has
//! settled.

mod batch;

pub use batch::{AdmissionScheduler, BatchReport};
