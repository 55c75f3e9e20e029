//! # Task Lifecycle State Machine
//!
//! Governs `pending → in_progress → {completed, failed}` and the side
//! effects each transition has on the task's machine and its order. There is
//! no way out of a terminal status.
//!
//! `start` acquires the machine before anything else: the store-level
//! compare-and-set flips the machine to running, so two concurrent starts can
//! never both observe it idle. A second compare-and-set then moves the task
//! out of pending, so two concurrent starts of the same task resolve to one
//! winner and the loser's machine goes back to the pool. If no machine can be
//! acquired the task and its order are left exactly as they were and nothing
//! is logged; any maintenance sweep that ran during selection keeps its
//! effects.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::events::TaskEvent;
use crate::clock::Clock;
use crate::error::{Result, WorkshopError};
use crate::models::{Machine, MachineStatus, OrderStatus, Task, TaskStatus};
use crate::orchestration::assignment::MachineAssigner;
use crate::orchestration::audit::ActivityLogger;
use crate::orchestration::maintenance;
use crate::store::{EntityStore, StoreError};

/// A successfully started task together with the machine it acquired.
#[derive(Debug, Clone)]
pub struct StartedTask {
    pub task: Task,
    pub machine: Machine,
}

pub struct TaskStateMachine<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    assigner: MachineAssigner<S>,
    audit: ActivityLogger<S>,
}

impl<S> Clone for TaskStateMachine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            assigner: self.assigner.clone(),
            audit: self.audit.clone(),
        }
    }
}

impl<S: EntityStore> TaskStateMachine<S> {
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        assigner: MachineAssigner<S>,
        audit: ActivityLogger<S>,
    ) -> Self {
        Self {
            store,
            clock,
            assigner,
            audit,
        }
    }

    /// Transition table for the task lifecycle. Everything not listed is an
    /// invalid transition.
    fn determine_target_state(current: TaskStatus, event: &TaskEvent) -> Result<TaskStatus> {
        match (current, event) {
            (TaskStatus::Pending, TaskEvent::Start) => Ok(TaskStatus::InProgress),
            (TaskStatus::InProgress, TaskEvent::Complete) => Ok(TaskStatus::Completed),
            (TaskStatus::InProgress, TaskEvent::Fail(_)) => Ok(TaskStatus::Failed),
            (from, event) => Err(WorkshopError::invalid_state(format!(
                "cannot apply '{event}' to a task in '{from}'"
            ))),
        }
    }

    /// Start a pending task, acquiring a machine of its required type.
    ///
    /// A pre-assigned machine is honored only if it is idle and not
    /// maintenance-due; otherwise selection runs the maintenance sweep and
    /// picks deterministically from the idle pool. Starting the first task of
    /// a pending order moves the order to in progress.
    pub async fn start(&self, task_id: Uuid, acting_user: Option<&str>) -> Result<StartedTask> {
        let task = self.store.task(task_id).await?;
        let target = Self::determine_target_state(task.status, &TaskEvent::Start)?;
        let now = self.clock.now();

        let machine = match task.machine_id {
            Some(machine_id) => self.assigner.claim_preassigned(machine_id, now).await?,
            None => self.assigner.assign(task.required_machine_type, now).await?,
        };

        // The status flip is the authoritative gate: of two starts racing
        // past the guard above, only one moves the task out of pending. The
        // loser returns its machine to the pool before surfacing the error.
        let mut task = match self
            .store
            .claim_task(task_id, TaskStatus::Pending, target)
            .await
        {
            Ok(task) => task,
            Err(err @ StoreError::TaskConflict { .. }) => {
                if let Err(release_err) = self
                    .store
                    .claim_machine(machine.machine_id, MachineStatus::Running, MachineStatus::Idle)
                    .await
                {
                    tracing::warn!(
                        machine_id = %machine.machine_id,
                        error = %release_err,
                        "failed to return machine after lost start race"
                    );
                }
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        task.machine_id = Some(machine.machine_id);
        task.start_time = Some(now);
        self.store.update_task(&task).await?;

        // First started task of a pending order flips the order; later starts
        // see the order already in progress and leave it alone.
        let mut order = self.store.order(task.order_id).await?;
        if order.status == OrderStatus::Pending {
            order.status = OrderStatus::InProgress;
            order.date_start = Some(now);
            self.store.update_order(&order).await?;
        }

        tracing::info!(
            task_id = %task.task_id,
            order_id = %task.order_id,
            machine_id = %machine.machine_id,
            operation = %task.operation,
            "task started"
        );
        self.audit.task_started(&task, &machine, acting_user).await;

        Ok(StartedTask { task, machine })
    }

    /// Complete an in-progress task and release its machine.
    ///
    /// The released machine is re-evaluated on the spot: maintenance-due goes
    /// to `maintenance` with a warning entry, otherwise back to `idle`.
    /// Advancing the order is the cascade controller's job, not this one's.
    pub async fn complete(&self, task_id: Uuid, acting_user: Option<&str>) -> Result<Task> {
        let mut task = self.store.task(task_id).await?;
        let target = Self::determine_target_state(task.status, &TaskEvent::Complete)?;
        let now = self.clock.now();

        task.status = target;
        task.finish_time = Some(now);
        self.store.update_task(&task).await?;

        tracing::info!(
            task_id = %task.task_id,
            order_id = %task.order_id,
            operation = %task.operation,
            "task completed"
        );
        self.audit.task_completed(&task, acting_user).await;

        self.release_machine(&task, now).await?;
        Ok(task)
    }

    /// Fail an in-progress task and release its machine.
    ///
    /// Not wired to any public service operation; available for out-of-band
    /// recovery tooling. Failing a task does not advance the order.
    pub async fn fail(
        &self,
        task_id: Uuid,
        reason: &str,
        acting_user: Option<&str>,
    ) -> Result<Task> {
        let mut task = self.store.task(task_id).await?;
        let target =
            Self::determine_target_state(task.status, &TaskEvent::Fail(reason.to_string()))?;
        let now = self.clock.now();

        task.status = target;
        task.finish_time = Some(now);
        self.store.update_task(&task).await?;

        tracing::warn!(
            task_id = %task.task_id,
            order_id = %task.order_id,
            operation = %task.operation,
            reason = %reason,
            "task failed"
        );
        self.audit.task_failed(&task, reason, acting_user).await;

        self.release_machine(&task, now).await?;
        Ok(task)
    }

    /// Re-evaluate a released machine: due machines go straight to
    /// maintenance, everything else returns to the idle pool.
    async fn release_machine(&self, task: &Task, now: DateTime<Utc>) -> Result<()> {
        let Some(machine_id) = task.machine_id else {
            return Ok(());
        };
        let machine = self.store.machine(machine_id).await?;
        if machine.status != MachineStatus::Running {
            // Manual override moved the machine while the task ran; leave it.
            return Ok(());
        }

        let target = if maintenance::needs_maintenance(&machine, now) {
            MachineStatus::Maintenance
        } else {
            MachineStatus::Idle
        };

        match self
            .store
            .claim_machine(machine_id, MachineStatus::Running, target)
            .await
        {
            Ok(machine) => {
                if target == MachineStatus::Maintenance {
                    tracing::warn!(
                        machine_id = %machine.machine_id,
                        machine_name = %machine.name,
                        "machine released into maintenance"
                    );
                    self.audit.machine_maintenance(&machine, Some(task)).await;
                }
                Ok(())
            }
            // Concurrent manual override wins; release becomes a no-op.
            Err(StoreError::Conflict { .. }) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{LogType, MachineType, NewMachine, NewOrder, NewTask};
    use crate::store::InMemoryStore;
    use chrono::Utc;

    fn machinery() -> (Arc<InMemoryStore>, TaskStateMachine<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(Utc::now()));
        let audit = ActivityLogger::new(Arc::clone(&store), Arc::clone(&clock));
        let assigner = MachineAssigner::new(Arc::clone(&store), audit.clone(), 1);
        let sm = TaskStateMachine::new(Arc::clone(&store), clock, assigner, audit);
        (store, sm)
    }

    #[tokio::test]
    async fn test_fail_releases_machine_and_audits_error() {
        let (store, sm) = machinery();
        let now = Utc::now();

        let machine = NewMachine {
            name: "Grinder C".to_string(),
            description: String::new(),
            machine_type: MachineType::Grinder,
            location: String::new(),
            maintenance_gap_days: Some(30),
        }
        .into_machine(now, 10);
        let machine_id = machine.machine_id;
        store.insert_machine(machine).await.unwrap();

        let order = NewOrder {
            name: "Order O".to_string(),
            description: String::new(),
        }
        .into_order(now);
        let order_id = order.order_id;
        store.insert_order(order).await.unwrap();

        let task = NewTask {
            order_id,
            required_machine_type: MachineType::Grinder,
            operation: "surface finish".to_string(),
            queue_number: 1,
        }
        .into_task();
        let task_id = task.task_id;
        store.insert_task(task).await.unwrap();

        sm.start(task_id, None).await.unwrap();
        let failed = sm.fail(task_id, "spindle jammed", Some("operator1")).await.unwrap();

        assert_eq!(failed.status, TaskStatus::Failed);
        assert!(failed.finish_time.is_some());
        // The machine reference survives as historical record.
        assert_eq!(failed.machine_id, Some(machine_id));
        assert_eq!(
            store.machine(machine_id).await.unwrap().status,
            MachineStatus::Idle
        );

        let errors = store.logs_with_type(LogType::Error).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("spindle jammed"));

        // Terminal means terminal: no restart, no second failure.
        assert!(sm.start(task_id, None).await.is_err());
        assert!(sm.fail(task_id, "again", None).await.is_err());
    }

    #[test]
    fn test_transition_table_accepts_lifecycle_path() {
        assert_eq!(
            TaskStateMachine::<crate::store::InMemoryStore>::determine_target_state(
                TaskStatus::Pending,
                &TaskEvent::Start
            )
            .unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!(
            TaskStateMachine::<crate::store::InMemoryStore>::determine_target_state(
                TaskStatus::InProgress,
                &TaskEvent::Complete
            )
            .unwrap(),
            TaskStatus::Completed
        );
        assert_eq!(
            TaskStateMachine::<crate::store::InMemoryStore>::determine_target_state(
                TaskStatus::InProgress,
                &TaskEvent::Fail("jammed".to_string())
            )
            .unwrap(),
            TaskStatus::Failed
        );
    }

    #[test]
    fn test_transition_table_rejects_everything_else() {
        type Sm = TaskStateMachine<crate::store::InMemoryStore>;

        for status in [
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::Failed,
        ] {
            assert!(Sm::determine_target_state(status, &TaskEvent::Start).is_err());
        }
        for status in [TaskStatus::Pending, TaskStatus::Completed, TaskStatus::Failed] {
            assert!(Sm::determine_target_state(status, &TaskEvent::Complete).is_err());
        }
        assert!(
            Sm::determine_target_state(TaskStatus::Completed, &TaskEvent::Fail("x".into())).is_err()
        );
    }
}
