//! Exclusive occupancy under concurrent starts: two racers for one idle
//! machine, or for one pending task, must resolve to exactly one winner.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use common::{fixture, start_instant};
use workshop_core::clock::{Clock, FixedClock};
use workshop_core::config::WorkshopConfig;
use workshop_core::error::WorkshopError;
use workshop_core::models::{
    ActivityLog, LogType, Machine, MachineStatus, MachineType, NewMachine, NewOrder, NewTask,
    Order, Task, TaskStatus,
};
use workshop_core::service::WorkshopService;
use workshop_core::store::{EntityStore, InMemoryStore, StoreResult};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_starts_for_one_machine_yield_exactly_one_winner() {
    for _ in 0..50 {
        let fx = fixture();
        let machine = fx.add_machine("Lathe A", MachineType::Lathe).await;
        let (_, tasks_a) = fx
            .add_order_with_tasks("Order A", &[(1, MachineType::Lathe, "rough cut")])
            .await;
        let (_, tasks_b) = fx
            .add_order_with_tasks("Order B", &[(1, MachineType::Lathe, "bore")])
            .await;

        // Separate spawned tasks on a multi-threaded runtime, so the two
        // claim paths genuinely interleave.
        let service = Arc::clone(&fx.service);
        let task_a = tasks_a[0].task_id;
        let left = tokio::spawn(async move { service.start_task(task_a, None).await });
        let service = Arc::clone(&fx.service);
        let task_b = tasks_b[0].task_id;
        let right = tokio::spawn(async move { service.start_task(task_b, None).await });

        let left = left.await.unwrap();
        let right = right.await.unwrap();

        let successes = [left.is_ok(), right.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(successes, 1, "exactly one racer may win the machine");

        for result in [left, right] {
            if let Err(err) = result {
                assert!(
                    matches!(
                        err,
                        WorkshopError::NoMachineAvailable { .. }
                            | WorkshopError::MachineConflict { .. }
                    ),
                    "loser must see NoMachineAvailable or MachineConflict, got {err}"
                );
            }
        }

        let machine = fx.store.machine(machine.machine_id).await.unwrap();
        assert_eq!(machine.status, MachineStatus::Running);

        let in_progress = [
            fx.store.task(tasks_a[0].task_id).await.unwrap(),
            fx.store.task(tasks_b[0].task_id).await.unwrap(),
        ]
        .iter()
        .filter(|t| t.status == TaskStatus::InProgress)
        .count();
        assert_eq!(in_progress, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_starts_with_enough_machines_both_win() {
    let fx = fixture();
    fx.add_machine("Lathe A", MachineType::Lathe).await;
    fx.add_machine("Lathe B", MachineType::Lathe).await;
    let (_, tasks_a) = fx
        .add_order_with_tasks("Order A", &[(1, MachineType::Lathe, "rough cut")])
        .await;
    let (_, tasks_b) = fx
        .add_order_with_tasks("Order B", &[(1, MachineType::Lathe, "bore")])
        .await;

    let service = Arc::clone(&fx.service);
    let task_a = tasks_a[0].task_id;
    let left = tokio::spawn(async move { service.start_task(task_a, None).await });
    let service = Arc::clone(&fx.service);
    let task_b = tasks_b[0].task_id;
    let right = tokio::spawn(async move { service.start_task(task_b, None).await });

    let left = left.await.unwrap().unwrap();
    let right = right.await.unwrap().unwrap();

    // The lost race falls through to the second lathe.
    assert_ne!(left.machine_name, right.machine_name);
}

/// Store adapter that parks every task read on the scheduler, widening the
/// window between the lifecycle guard check and the status flip so two
/// starts of the same task both get past the guard.
struct StaggeredStore {
    inner: InMemoryStore,
}

#[async_trait]
impl EntityStore for StaggeredStore {
    async fn order(&self, id: Uuid) -> StoreResult<Order> {
        self.inner.order(id).await
    }

    async fn machine(&self, id: Uuid) -> StoreResult<Machine> {
        self.inner.machine(id).await
    }

    async fn task(&self, id: Uuid) -> StoreResult<Task> {
        let task = self.inner.task(id).await;
        tokio::task::yield_now().await;
        task
    }

    async fn insert_order(&self, order: Order) -> StoreResult<()> {
        self.inner.insert_order(order).await
    }

    async fn insert_machine(&self, machine: Machine) -> StoreResult<()> {
        self.inner.insert_machine(machine).await
    }

    async fn insert_task(&self, task: Task) -> StoreResult<()> {
        self.inner.insert_task(task).await
    }

    async fn update_order(&self, order: &Order) -> StoreResult<()> {
        self.inner.update_order(order).await
    }

    async fn update_machine(&self, machine: &Machine) -> StoreResult<()> {
        self.inner.update_machine(machine).await
    }

    async fn update_task(&self, task: &Task) -> StoreResult<()> {
        self.inner.update_task(task).await
    }

    async fn machines_with_status(
        &self,
        status: MachineStatus,
        machine_type: Option<MachineType>,
    ) -> StoreResult<Vec<Machine>> {
        self.inner.machines_with_status(status, machine_type).await
    }

    async fn tasks_for_order(&self, order_id: Uuid) -> StoreResult<Vec<Task>> {
        self.inner.tasks_for_order(order_id).await
    }

    async fn claim_machine(
        &self,
        id: Uuid,
        from: MachineStatus,
        to: MachineStatus,
    ) -> StoreResult<Machine> {
        self.inner.claim_machine(id, from, to).await
    }

    async fn claim_task(&self, id: Uuid, from: TaskStatus, to: TaskStatus) -> StoreResult<Task> {
        self.inner.claim_task(id, from, to).await
    }

    async fn append_log(&self, log: ActivityLog) -> StoreResult<()> {
        self.inner.append_log(log).await
    }

    async fn logs_for_task(&self, task_id: Uuid) -> StoreResult<Vec<ActivityLog>> {
        self.inner.logs_for_task(task_id).await
    }

    async fn logs_with_type(&self, log_type: LogType) -> StoreResult<Vec<ActivityLog>> {
        self.inner.logs_with_type(log_type).await
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<()> {
        self.inner.delete_order(id).await
    }

    async fn delete_machine(&self, id: Uuid) -> StoreResult<()> {
        self.inner.delete_machine(id).await
    }
}

#[tokio::test]
async fn double_start_of_one_task_leaves_no_machine_orphaned() {
    let store = Arc::new(StaggeredStore {
        inner: InMemoryStore::new(),
    });
    let clock = Arc::new(FixedClock::new(start_instant()));
    let service = WorkshopService::new(
        Arc::clone(&store),
        Arc::clone(&clock) as Arc<dyn Clock>,
        WorkshopConfig::default(),
    );

    // Two lathes, so both racers can acquire a machine before the task gate.
    let mut lathes = Vec::new();
    for name in ["Lathe A", "Lathe B"] {
        let lathe = service
            .create_machine(NewMachine {
                name: name.to_string(),
                description: String::new(),
                machine_type: MachineType::Lathe,
                location: "Zone A".to_string(),
                maintenance_gap_days: Some(30),
            })
            .await
            .unwrap();
        lathes.push(lathe);
    }

    let order = service
        .create_order(NewOrder {
            name: "Order A".to_string(),
            description: String::new(),
        })
        .await
        .unwrap();
    let task = service
        .add_task(NewTask {
            order_id: order.order_id,
            required_machine_type: MachineType::Lathe,
            operation: "rough cut".to_string(),
            queue_number: 1,
        })
        .await
        .unwrap();

    let (left, right) = tokio::join!(
        service.start_task(task.task_id, None),
        service.start_task(task.task_id, None),
    );

    let successes = [left.is_ok(), right.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(successes, 1, "exactly one start may move the task");

    for result in [left, right] {
        if let Err(err) = result {
            assert!(
                matches!(err, WorkshopError::InvalidState { .. }),
                "loser must see InvalidState, got {err}"
            );
        }
    }

    // The winner holds one lathe; the loser's claim was rolled back.
    let started = store.task(task.task_id).await.unwrap();
    assert_eq!(started.status, TaskStatus::InProgress);
    let winner_machine = started.machine_id.unwrap();
    for lathe in &lathes {
        let lathe = store.machine(lathe.machine_id).await.unwrap();
        let expected = if lathe.machine_id == winner_machine {
            MachineStatus::Running
        } else {
            MachineStatus::Idle
        };
        assert_eq!(lathe.status, expected);
    }
}
