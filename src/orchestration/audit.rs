//! # Activity Logger
//!
//! Append-only audit trail writer. Every significant transition (task start,
//! task completion, maintenance begin) lands here as an [`ActivityLog`]
//! record with explicit typed context fields.
//!
//! Appends are fire-and-forget: a store failure is reported through process
//! telemetry and swallowed, so audit logging can never fail a business
//! operation. Failed business attempts are not logged at all — the trail
//! records only transitions that actually happened.

use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::{ActivityLog, LogType, Machine, Order, Task};
use crate::store::EntityStore;

pub struct ActivityLogger<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for ActivityLogger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: EntityStore> ActivityLogger<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Append a record, returning the entry as written.
    pub async fn append(&self, entry: ActivityLog) -> ActivityLog {
        if let Err(err) = self.store.append_log(entry.clone()).await {
            tracing::warn!(
                log_id = %entry.log_id,
                error = %err,
                "failed to append activity log entry"
            );
        }
        entry
    }

    /// Info entry for a task acquiring its machine and starting.
    pub async fn task_started(
        &self,
        task: &Task,
        machine: &Machine,
        acting_user: Option<&str>,
    ) -> ActivityLog {
        self.append(ActivityLog {
            log_id: Uuid::new_v4(),
            task_id: Some(task.task_id),
            order_id: Some(task.order_id),
            machine_id: Some(machine.machine_id),
            machine_name: Some(machine.name.clone()),
            operation: Some(task.operation.clone()),
            time: self.clock.now(),
            message: format!("'{}' started on machine '{}'", task.operation, machine.name),
            log_type: LogType::Info,
            acting_user: acting_user.map(str::to_string),
        })
        .await
    }

    /// Info entry for a completed task.
    pub async fn task_completed(&self, task: &Task, acting_user: Option<&str>) -> ActivityLog {
        self.append(ActivityLog {
            log_id: Uuid::new_v4(),
            task_id: Some(task.task_id),
            order_id: Some(task.order_id),
            machine_id: task.machine_id,
            machine_name: None,
            operation: Some(task.operation.clone()),
            time: self.clock.now(),
            message: format!("'{}' completed", task.operation),
            log_type: LogType::Info,
            acting_user: acting_user.map(str::to_string),
        })
        .await
    }

    /// Error entry for a task that finished unsuccessfully.
    pub async fn task_failed(
        &self,
        task: &Task,
        reason: &str,
        acting_user: Option<&str>,
    ) -> ActivityLog {
        self.append(ActivityLog {
            log_id: Uuid::new_v4(),
            task_id: Some(task.task_id),
            order_id: Some(task.order_id),
            machine_id: task.machine_id,
            machine_name: None,
            operation: Some(task.operation.clone()),
            time: self.clock.now(),
            message: format!("'{}' failed: {}", task.operation, reason),
            log_type: LogType::Error,
            acting_user: acting_user.map(str::to_string),
        })
        .await
    }

    /// Warning entry for a machine pulled out of service.
    ///
    /// `task` is the task that released the machine, or `None` when the
    /// maintenance sweep caught the machine while idle.
    pub async fn machine_maintenance(&self, machine: &Machine, task: Option<&Task>) -> ActivityLog {
        self.append(ActivityLog {
            log_id: Uuid::new_v4(),
            task_id: task.map(|t| t.task_id),
            order_id: task.map(|t| t.order_id),
            machine_id: Some(machine.machine_id),
            machine_name: Some(machine.name.clone()),
            operation: task.map(|t| t.operation.clone()),
            time: self.clock.now(),
            message: format!("machine '{}' is now under maintenance", machine.name),
            log_type: LogType::Warning,
            acting_user: None,
        })
        .await
    }

    /// Info entry for an order cancelled before completion.
    pub async fn order_cancelled(&self, order: &Order, acting_user: Option<&str>) -> ActivityLog {
        self.append(ActivityLog {
            log_id: Uuid::new_v4(),
            task_id: None,
            order_id: Some(order.order_id),
            machine_id: None,
            machine_name: None,
            operation: None,
            time: self.clock.now(),
            message: format!("order '{}' cancelled", order.name),
            log_type: LogType::Info,
            acting_user: acting_user.map(str::to_string),
        })
        .await
    }
}
