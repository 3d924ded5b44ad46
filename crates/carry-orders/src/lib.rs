//! Pure construction of entry, protection and exit order batches.
//!
//! Nothing here touches a venue: the builder turns candidates, fills
//! and configuration into fully-specified `OrderRequest`s, and the
//! lifecycle crate owns submission.

pub mod builder;

pub use builder::{ExecutionConfig, OrderBatchBuilder};
