//! # Workshop Service
//!
//! The facade the API layer calls into. It wires the store, clock, audit
//! logger, assignment engine, lifecycle state machine and cascade controller
//! together and exposes the write operations of the core.
//!
//! The `acting_user` passed to these operations is audit attribution only;
//! authorization is the caller's responsibility and happens before the core
//! is reached.

use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::WorkshopConfig;
use crate::error::{Result, WorkshopError};
use crate::models::{Machine, MachineStatus, NewMachine, NewOrder, NewTask, Order, OrderStatus, Task};
use crate::orchestration::{ActivityLogger, CascadeController, CascadeOutcome, MachineAssigner};
use crate::state_machine::TaskStateMachine;
use crate::store::EntityStore;

/// Outcome of a successful `start_task`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStarted {
    pub task_id: Uuid,
    pub machine_name: String,
}

/// Outcome of a successful `complete_task`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCompleted {
    /// Successor task started by the cascade, if any.
    pub next_task_id: Option<Uuid>,
    /// True when this completion closed out the whole order.
    pub order_completed: bool,
}

/// Outcome of a successful `start_order`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStarted {
    pub first_task_id: Option<Uuid>,
    pub message: String,
}

pub struct WorkshopService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: WorkshopConfig,
    lifecycle: TaskStateMachine<S>,
    cascade: CascadeController<S>,
    audit: ActivityLogger<S>,
}

impl<S: EntityStore> WorkshopService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: WorkshopConfig) -> Self {
        let audit = ActivityLogger::new(Arc::clone(&store), Arc::clone(&clock));
        let assigner = MachineAssigner::new(
            Arc::clone(&store),
            audit.clone(),
            config.machine_claim_retries,
        );
        let lifecycle = TaskStateMachine::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            assigner,
            audit.clone(),
        );
        let cascade =
            CascadeController::new(Arc::clone(&store), Arc::clone(&clock), lifecycle.clone());
        Self {
            store,
            clock,
            config,
            lifecycle,
            cascade,
            audit,
        }
    }

    /// Register a new order.
    pub async fn create_order(&self, new: NewOrder) -> Result<Order> {
        let order = new.into_order(self.clock.now());
        self.store.insert_order(order.clone()).await?;
        Ok(order)
    }

    /// Register a new machine. The maintenance window starts at creation and
    /// the gap falls back to the configured default.
    pub async fn create_machine(&self, new: NewMachine) -> Result<Machine> {
        let machine = new.into_machine(self.clock.now(), self.config.default_maintenance_gap_days);
        self.store.insert_machine(machine.clone()).await?;
        Ok(machine)
    }

    /// Queue a task on an existing order.
    pub async fn add_task(&self, new: NewTask) -> Result<Task> {
        // The order must exist; queue numbers are the caller's contract.
        self.store.order(new.order_id).await?;
        let task = new.into_task();
        self.store.insert_task(task.clone()).await?;
        Ok(task)
    }

    /// Start a pending task, auto-assigning a machine of its required type.
    pub async fn start_task(&self, task_id: Uuid, acting_user: Option<&str>) -> Result<TaskStarted> {
        let started = self.lifecycle.start(task_id, acting_user).await?;
        Ok(TaskStarted {
            task_id: started.task.task_id,
            machine_name: started.machine.name,
        })
    }

    /// Complete an in-progress task, release its machine, and advance the
    /// order: either the next queued task starts or the order completes.
    ///
    /// A successor that cannot start (no eligible machine) surfaces as an
    /// error; the completion itself is already persisted and the order stays
    /// in progress.
    pub async fn complete_task(
        &self,
        task_id: Uuid,
        acting_user: Option<&str>,
    ) -> Result<TaskCompleted> {
        let completed = self.lifecycle.complete(task_id, acting_user).await?;
        let outcome = self.cascade.advance(&completed, acting_user).await?;
        Ok(match outcome {
            CascadeOutcome::Started { task_id, .. } => TaskCompleted {
                next_task_id: Some(task_id),
                order_completed: false,
            },
            CascadeOutcome::OrderCompleted => TaskCompleted {
                next_task_id: None,
                order_completed: true,
            },
            CascadeOutcome::NoSuccessor => TaskCompleted {
                next_task_id: None,
                order_completed: false,
            },
        })
    }

    /// Start a pending order by starting its lowest-queue-number task.
    pub async fn start_order(
        &self,
        order_id: Uuid,
        acting_user: Option<&str>,
    ) -> Result<OrderStarted> {
        let order = self.store.order(order_id).await?;
        match order.status {
            OrderStatus::Pending => {}
            OrderStatus::InProgress => {
                return Err(WorkshopError::invalid_state("order is already in progress"));
            }
            OrderStatus::Completed | OrderStatus::Cancelled => {
                return Err(WorkshopError::invalid_state(
                    "cannot start a completed or cancelled order",
                ));
            }
        }

        let tasks = self.store.tasks_for_order(order_id).await?;
        let Some(first) = tasks.first() else {
            return Ok(OrderStarted {
                first_task_id: None,
                message: format!("order '{}' has no tasks to start", order.name),
            });
        };

        let started = self.lifecycle.start(first.task_id, acting_user).await?;
        Ok(OrderStarted {
            first_task_id: Some(started.task.task_id),
            message: format!(
                "task '{}' started on machine '{}'",
                started.task.operation, started.machine.name
            ),
        })
    }

    /// Administrative override of a machine's status, bypassing the
    /// assignment engine. Used for manual recovery, e.g. clearing `error`.
    ///
    /// Taking a machine out of `maintenance` records the service: the
    /// maintenance window restarts at today before the new status is applied.
    pub async fn set_machine_status(
        &self,
        machine_id: Uuid,
        new_status: MachineStatus,
    ) -> Result<Machine> {
        let mut machine = self.store.machine(machine_id).await?;
        if machine.status == new_status {
            return Ok(machine);
        }

        if machine.status == MachineStatus::Maintenance {
            machine.record_maintenance(self.clock.now());
        }
        machine.status = new_status;
        self.store.update_machine(&machine).await?;

        tracing::info!(
            machine_id = %machine.machine_id,
            machine_name = %machine.name,
            status = %new_status,
            "machine status manually overridden"
        );
        Ok(machine)
    }

    /// Cancel a pending or in-progress order.
    pub async fn cancel_order(&self, order_id: Uuid, acting_user: Option<&str>) -> Result<Order> {
        let mut order = self.store.order(order_id).await?;
        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(WorkshopError::invalid_state(format!(
                "cannot cancel an order in '{}'",
                order.status
            )));
        }
        order.status = OrderStatus::Cancelled;
        self.store.update_order(&order).await?;
        self.audit.order_cancelled(&order, acting_user).await;
        Ok(order)
    }

    /// Access to the underlying store, for read-side consumers.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}
