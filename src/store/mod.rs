//! # Entity Store
//!
//! Repository seam between the core and its durable storage. The core only
//! ever talks to storage through [`EntityStore`]; the bundled
//! [`InMemoryStore`] is the reference implementation used by the test suite
//! and stands in for an external transactional store.
//!
//! The primitives beyond plain CRUD are [`EntityStore::claim_machine`] and
//! [`EntityStore::claim_task`]: atomic compare-and-sets on machine and task
//! status. Two concurrent starts racing for the same idle machine, or for the
//! same pending task, must resolve to exactly one winner, and that
//! exclusivity lives here, not in the callers.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ActivityLog, LogType, Machine, MachineStatus, MachineType, Order, Task, TaskStatus,
};

pub mod memory;

pub use memory::InMemoryStore;

/// Errors surfaced by store implementations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// A machine compare-and-set observed a status other than the expected
    /// one.
    #[error("machine {id} was not '{expected}' at claim time")]
    Conflict { id: Uuid, expected: MachineStatus },

    /// A task compare-and-set observed a status other than the expected one.
    #[error("task {id} was not '{expected}' at claim time")]
    TaskConflict { id: Uuid, expected: TaskStatus },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Transactional storage for workshop entities.
///
/// List results are deterministically ordered: machines by ascending
/// `machine_id`, tasks by ascending `(queue_number, task_id)`. Callers rely
/// on that order for reproducible assignment and cascade behavior.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn order(&self, id: Uuid) -> StoreResult<Order>;
    async fn machine(&self, id: Uuid) -> StoreResult<Machine>;
    async fn task(&self, id: Uuid) -> StoreResult<Task>;

    async fn insert_order(&self, order: Order) -> StoreResult<()>;
    async fn insert_machine(&self, machine: Machine) -> StoreResult<()>;
    async fn insert_task(&self, task: Task) -> StoreResult<()>;

    async fn update_order(&self, order: &Order) -> StoreResult<()>;
    async fn update_machine(&self, machine: &Machine) -> StoreResult<()>;
    async fn update_task(&self, task: &Task) -> StoreResult<()>;

    /// Machines with the given status, optionally narrowed by type, ordered
    /// by ascending machine id.
    async fn machines_with_status(
        &self,
        status: MachineStatus,
        machine_type: Option<MachineType>,
    ) -> StoreResult<Vec<Machine>>;

    /// All tasks of an order, ordered by ascending `(queue_number, task_id)`.
    async fn tasks_for_order(&self, order_id: Uuid) -> StoreResult<Vec<Task>>;

    /// Atomically move a machine from `from` to `to`.
    ///
    /// Fails with [`StoreError::Conflict`] when the machine's status is no
    /// longer `from`, which is how a lost assignment race is observed.
    async fn claim_machine(
        &self,
        id: Uuid,
        from: MachineStatus,
        to: MachineStatus,
    ) -> StoreResult<Machine>;

    /// Atomically move a task from `from` to `to`.
    ///
    /// Fails with [`StoreError::TaskConflict`] when the task's status is no
    /// longer `from`. This is the authoritative gate on lifecycle
    /// transitions: of two starts racing for the same task, only one moves it
    /// out of pending.
    async fn claim_task(&self, id: Uuid, from: TaskStatus, to: TaskStatus) -> StoreResult<Task>;

    /// Append an audit record. The log is append-only; there is no update.
    async fn append_log(&self, log: ActivityLog) -> StoreResult<()>;

    async fn logs_for_task(&self, task_id: Uuid) -> StoreResult<Vec<ActivityLog>>;
    async fn logs_with_type(&self, log_type: LogType) -> StoreResult<Vec<ActivityLog>>;

    /// Delete an order, cascading to its tasks and their logs.
    async fn delete_order(&self, id: Uuid) -> StoreResult<()>;

    /// Delete a machine, detaching it from any tasks that reference it.
    async fn delete_machine(&self, id: Uuid) -> StoreResult<()>;
}
