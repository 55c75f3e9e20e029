//! In-memory reference implementation of the entity store.
//!
//! Backed by `parking_lot` locks; each method is a single critical section,
//! which gives `claim_machine` the read-modify-write atomicity the
//! assignment engine depends on.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::{EntityStore, StoreError, StoreResult};
use crate::models::{
    ActivityLog, LogType, Machine, MachineStatus, MachineType, Order, Task, TaskStatus,
};

/// Reference store used by the test suite and examples.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    orders: RwLock<HashMap<Uuid, Order>>,
    machines: RwLock<HashMap<Uuid, Machine>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
    logs: RwLock<Vec<ActivityLog>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of audit records, for test assertions.
    pub fn log_count(&self) -> usize {
        self.logs.read().len()
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn order(&self, id: Uuid) -> StoreResult<Order> {
        self.orders
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "order", id })
    }

    async fn machine(&self, id: Uuid) -> StoreResult<Machine> {
        self.machines
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "machine", id })
    }

    async fn task(&self, id: Uuid) -> StoreResult<Task> {
        self.tasks
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "task", id })
    }

    async fn insert_order(&self, order: Order) -> StoreResult<()> {
        self.orders.write().insert(order.order_id, order);
        Ok(())
    }

    async fn insert_machine(&self, machine: Machine) -> StoreResult<()> {
        self.machines.write().insert(machine.machine_id, machine);
        Ok(())
    }

    async fn insert_task(&self, task: Task) -> StoreResult<()> {
        self.tasks.write().insert(task.task_id, task);
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> StoreResult<()> {
        let mut orders = self.orders.write();
        if !orders.contains_key(&order.order_id) {
            return Err(StoreError::NotFound {
                entity: "order",
                id: order.order_id,
            });
        }
        orders.insert(order.order_id, order.clone());
        Ok(())
    }

    async fn update_machine(&self, machine: &Machine) -> StoreResult<()> {
        let mut machines = self.machines.write();
        if !machines.contains_key(&machine.machine_id) {
            return Err(StoreError::NotFound {
                entity: "machine",
                id: machine.machine_id,
            });
        }
        machines.insert(machine.machine_id, machine.clone());
        Ok(())
    }

    async fn update_task(&self, task: &Task) -> StoreResult<()> {
        let mut tasks = self.tasks.write();
        if !tasks.contains_key(&task.task_id) {
            return Err(StoreError::NotFound {
                entity: "task",
                id: task.task_id,
            });
        }
        tasks.insert(task.task_id, task.clone());
        Ok(())
    }

    async fn machines_with_status(
        &self,
        status: MachineStatus,
        machine_type: Option<MachineType>,
    ) -> StoreResult<Vec<Machine>> {
        let mut result: Vec<Machine> = self
            .machines
            .read()
            .values()
            .filter(|m| m.status == status)
            .filter(|m| machine_type.map_or(true, |t| m.machine_type == t))
            .cloned()
            .collect();
        result.sort_by_key(|m| m.machine_id);
        Ok(result)
    }

    async fn tasks_for_order(&self, order_id: Uuid) -> StoreResult<Vec<Task>> {
        let mut result: Vec<Task> = self
            .tasks
            .read()
            .values()
            .filter(|t| t.order_id == order_id)
            .cloned()
            .collect();
        result.sort_by_key(|t| (t.queue_number, t.task_id));
        Ok(result)
    }

    async fn claim_machine(
        &self,
        id: Uuid,
        from: MachineStatus,
        to: MachineStatus,
    ) -> StoreResult<Machine> {
        let mut machines = self.machines.write();
        let machine = machines
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "machine", id })?;
        if machine.status != from {
            return Err(StoreError::Conflict { id, expected: from });
        }
        machine.status = to;
        Ok(machine.clone())
    }

    async fn claim_task(&self, id: Uuid, from: TaskStatus, to: TaskStatus) -> StoreResult<Task> {
        let mut tasks = self.tasks.write();
        let task = tasks
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "task", id })?;
        if task.status != from {
            return Err(StoreError::TaskConflict { id, expected: from });
        }
        task.status = to;
        Ok(task.clone())
    }

    async fn append_log(&self, log: ActivityLog) -> StoreResult<()> {
        self.logs.write().push(log);
        Ok(())
    }

    async fn logs_for_task(&self, task_id: Uuid) -> StoreResult<Vec<ActivityLog>> {
        Ok(self
            .logs
            .read()
            .iter()
            .filter(|l| l.task_id == Some(task_id))
            .cloned()
            .collect())
    }

    async fn logs_with_type(&self, log_type: LogType) -> StoreResult<Vec<ActivityLog>> {
        Ok(self
            .logs
            .read()
            .iter()
            .filter(|l| l.log_type == log_type)
            .cloned()
            .collect())
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<()> {
        let removed = self.orders.write().remove(&id);
        if removed.is_none() {
            return Err(StoreError::NotFound { entity: "order", id });
        }

        let mut tasks = self.tasks.write();
        let doomed: Vec<Uuid> = tasks
            .values()
            .filter(|t| t.order_id == id)
            .map(|t| t.task_id)
            .collect();
        for task_id in &doomed {
            tasks.remove(task_id);
        }

        self.logs.write().retain(|l| {
            l.order_id != Some(id) && !l.task_id.map(|t| doomed.contains(&t)).unwrap_or(false)
        });
        Ok(())
    }

    async fn delete_machine(&self, id: Uuid) -> StoreResult<()> {
        let removed = self.machines.write().remove(&id);
        if removed.is_none() {
            return Err(StoreError::NotFound { entity: "machine", id });
        }

        // Historical task references are detached rather than deleted.
        let mut tasks = self.tasks.write();
        for task in tasks.values_mut() {
            if task.machine_id == Some(id) {
                task.machine_id = None;
            }
        }
        Ok(())
    }
}
