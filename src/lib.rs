#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Workshop Core
//!
//! Core engine for tracking manufacturing orders composed of sequential tasks
//! executed on shared machines. It assigns idle machines to pending tasks,
//! enforces maintenance windows, cascades task completion into the next
//! queued task (or order completion), and records an append-only audit trail
//! of every transition.
//!
//! ## Architecture
//!
//! The crate is the decision-making core behind a thin CRUD/API layer.
//! Durable storage is an external collaborator reached through the
//! [`store::EntityStore`] trait; an in-memory reference implementation backs
//! the test suite. Time is injected through [`clock::Clock`] so every
//! maintenance decision is reproducible.
//!
//! ## Module Organization
//!
//! - [`models`] - Orders, machines, tasks and activity log records
//! - [`store`] - Entity store seam and in-memory reference implementation
//! - [`state_machine`] - Task lifecycle transitions and their side effects
//! - [`orchestration`] - Maintenance evaluator, machine assignment, order
//!   cascade and audit logging
//! - [`service`] - The operations exposed to the API layer
//! - [`config`] - Environment-driven runtime configuration
//! - [`error`] - Structured error handling
//!
//! ## Concurrency Model
//!
//! Each operation is a short-lived unit of work. The one contended invariant
//! is exclusive machine occupancy: at most one in-progress task per machine,
//! enforced by an atomic compare-and-set on machine status in the store. Two
//! concurrent starts racing for the same idle machine resolve to exactly one
//! winner; the loser retries once and then reports no machine available.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use workshop_core::clock::SystemClock;
//! use workshop_core::config::WorkshopConfig;
//! use workshop_core::models::{MachineType, NewMachine, NewOrder, NewTask};
//! use workshop_core::service::WorkshopService;
//! use workshop_core::store::InMemoryStore;
//!
//! # async fn example() -> workshop_core::error::Result<()> {
//! let service = WorkshopService::new(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(SystemClock),
//!     WorkshopConfig::default(),
//! );
//!
//! let order = service
//!     .create_order(NewOrder {
//!         name: "Gearbox housing".to_string(),
//!         description: String::new(),
//!     })
//!     .await?;
//!
//! service
//!     .create_machine(NewMachine {
//!         name: "Lathe A".to_string(),
//!         description: String::new(),
//!         machine_type: MachineType::Lathe,
//!         location: "Zone A1".to_string(),
//!         maintenance_gap_days: None,
//!     })
//!     .await?;
//!
//! let task = service
//!     .add_task(NewTask {
//!         order_id: order.order_id,
//!         required_machine_type: MachineType::Lathe,
//!         operation: "rough cut".to_string(),
//!         queue_number: 1,
//!     })
//!     .await?;
//!
//! let started = service.start_task(task.task_id, Some("operator1")).await?;
//! println!("running on {}", started.machine_name);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod service;
pub mod state_machine;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::WorkshopConfig;
pub use error::{Result, WorkshopError};
pub use models::{
    ActivityLog, LogType, Machine, MachineStatus, MachineType, NewMachine, NewOrder, NewTask,
    Order, OrderStatus, Task, TaskStatus,
};
pub use orchestration::{CascadeOutcome, MachineAssigner};
pub use service::{OrderStarted, TaskCompleted, TaskStarted, WorkshopService};
pub use state_machine::{StartedTask, TaskEvent, TaskStateMachine};
pub use store::{EntityStore, InMemoryStore, StoreError};
