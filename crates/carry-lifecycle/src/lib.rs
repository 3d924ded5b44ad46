//! Timed position lifecycle.
//!
//! One cycle takes a ranked candidate list through batch entry,
//! fill-derived protection, a fixed holding window and a market exit,
//! as a single state machine. Symbols are processed as one batch
//! throughout; no position outlives its cycle.

pub mod coordinator;
pub mod error;
pub mod state;

pub use coordinator::{CycleReport, LifecycleCoordinator};
pub use error::{LifecycleError, LifecycleResult};
pub use state::CycleState;
