//! # Order Cascade Controller
//!
//! Completing a task either starts the next queued task of the same order or
//! completes the order when no pending work remains. Order completion is a
//! success outcome, reported as such to the caller.
//!
//! If the successor cannot start (no eligible machine), the failure
//! propagates and the order simply stays in progress with the completed task
//! on record — the cascade does not mark the order completed.

use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::Result;
use crate::models::{OrderStatus, Task, TaskStatus};
use crate::state_machine::TaskStateMachine;
use crate::store::EntityStore;

/// What `advance` did after a task completed.
#[derive(Debug, Clone, PartialEq)]
pub enum CascadeOutcome {
    /// The next queued task was started on the named machine.
    Started {
        task_id: Uuid,
        machine_name: String,
    },
    /// No pending task remained; the order is now completed.
    OrderCompleted,
    /// Pending work remains but only at queue positions at or before the
    /// completed task, so nothing was started and the order stays open.
    NoSuccessor,
}

pub struct CascadeController<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    lifecycle: TaskStateMachine<S>,
}

impl<S: EntityStore> CascadeController<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, lifecycle: TaskStateMachine<S>) -> Self {
        Self {
            store,
            clock,
            lifecycle,
        }
    }

    /// Find and start the completed task's successor, or complete the order.
    ///
    /// The successor is the pending task with the smallest queue number
    /// strictly greater than the completed task's; the store's
    /// `(queue_number, task_id)` ordering makes the pick deterministic even
    /// if duplicate queue numbers ever slip in. Tasks of other orders and
    /// tasks that are in progress, completed or failed are never candidates.
    pub async fn advance(
        &self,
        completed_task: &Task,
        acting_user: Option<&str>,
    ) -> Result<CascadeOutcome> {
        let tasks = self.store.tasks_for_order(completed_task.order_id).await?;

        let successor = tasks
            .iter()
            .find(|t| t.status == TaskStatus::Pending && t.queue_number > completed_task.queue_number);

        if let Some(next) = successor {
            let started = self.lifecycle.start(next.task_id, acting_user).await?;
            return Ok(CascadeOutcome::Started {
                task_id: started.task.task_id,
                machine_name: started.machine.name,
            });
        }

        if tasks.iter().any(|t| t.status == TaskStatus::Pending) {
            return Ok(CascadeOutcome::NoSuccessor);
        }

        let mut order = self.store.order(completed_task.order_id).await?;
        if order.status.can_transition_to(OrderStatus::Completed) {
            order.status = OrderStatus::Completed;
            order.date_completion = Some(self.clock.now());
            self.store.update_order(&order).await?;
            tracing::info!(
                order_id = %order.order_id,
                order_name = %order.name,
                "order completed"
            );
        }
        Ok(CascadeOutcome::OrderCompleted)
    }
}
