//! GridPlace Engine
//!
//! This crate moves establishments between grid cells:
//! - Conflict detection against current occupancy
//! - Two-party swaps (atomic store procedure, compensated sequential fallback)
//! - Move orchestration for the strict and auto-swap entry points
//! - Per-zone serialization of mutations

pub mod conflict;
pub mod error;
pub mod lock;
pub mod orchestrator;
pub mod swap;

pub use conflict::ConflictDetector;
pub use error::{ErrorKind, MoveError};
pub use lock::ZoneLocks;
pub use orchestrator::{Caller, EntryPoint, MoveEngine, MoveOutcome, MoveRequest, SwapTrigger};
pub use swap::{
    restore, Compensation, SequentialStep, SwapExecutor, SwapFailure, SwapOutcome, SwapPlan,
    SwapStrategy, SwappedPair,
};
