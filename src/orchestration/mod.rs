//! # Orchestration Engine
//!
//! The components around the task lifecycle: deciding which machine a task
//! may use, when a machine must leave service for maintenance, how one task's
//! completion cascades into the next, and the audit trail of it all.
//!
//! ## Core Components
//!
//! - **Maintenance evaluator** (`maintenance`): pure due-check plus the lazy
//!   sweep of the idle pool — no background scheduler exists.
//! - **Machine assignment engine** (`assignment`): deterministic selection of
//!   an eligible idle machine and the atomic claim that enforces exclusive
//!   occupancy.
//! - **Order cascade controller** (`cascade`): starts the next queued task on
//!   completion, or completes the order.
//! - **Activity logger** (`audit`): fire-and-forget append of structured
//!   audit records.

pub mod assignment;
pub mod audit;
pub mod cascade;
pub mod maintenance;

pub use assignment::MachineAssigner;
pub use audit::ActivityLogger;
pub use cascade::{CascadeController, CascadeOutcome};
pub use maintenance::{needs_maintenance, sweep_idle_machines};
