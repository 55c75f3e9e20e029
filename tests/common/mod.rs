//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use chrono::{DateTime, Days, TimeZone, Utc};
use std::sync::Arc;

use workshop_core::clock::{Clock, FixedClock};
use workshop_core::config::WorkshopConfig;
use workshop_core::models::{
    Machine, MachineType, NewMachine, NewOrder, NewTask, Order, Task,
};
use workshop_core::service::WorkshopService;
use workshop_core::store::{EntityStore, InMemoryStore};

/// A service wired to an in-memory store and a fixed clock.
pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    pub service: Arc<WorkshopService<InMemoryStore>>,
}

/// Monday 2025-06-02, 08:00 UTC.
pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap()
}

pub fn fixture() -> Fixture {
    workshop_core::logging::init_telemetry();
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::new(start_instant()));
    let service = Arc::new(WorkshopService::new(
        Arc::clone(&store),
        Arc::clone(&clock) as Arc<dyn Clock>,
        WorkshopConfig::default(),
    ));
    Fixture {
        store,
        clock,
        service,
    }
}

impl Fixture {
    /// A freshly serviced machine (maintenance window starts today).
    pub async fn add_machine(&self, name: &str, machine_type: MachineType) -> Machine {
        self.service
            .create_machine(NewMachine {
                name: name.to_string(),
                description: String::new(),
                machine_type,
                location: "Zone A".to_string(),
                maintenance_gap_days: Some(30),
            })
            .await
            .unwrap()
    }

    /// A machine whose maintenance window has already elapsed.
    pub async fn add_machine_overdue(
        &self,
        name: &str,
        machine_type: MachineType,
        last_maintenance_days_ago: u64,
        gap_days: u32,
    ) -> Machine {
        let mut machine = self
            .service
            .create_machine(NewMachine {
                name: name.to_string(),
                description: String::new(),
                machine_type,
                location: "Zone A".to_string(),
                maintenance_gap_days: Some(gap_days),
            })
            .await
            .unwrap();
        machine.last_maintenance =
            self.clock.now().date_naive() - Days::new(last_maintenance_days_ago);
        self.store.update_machine(&machine).await.unwrap();
        machine
    }

    pub async fn add_order(&self, name: &str) -> Order {
        self.service
            .create_order(NewOrder {
                name: name.to_string(),
                description: String::new(),
            })
            .await
            .unwrap()
    }

    /// An order with tasks at the given `(queue_number, type, operation)`
    /// positions.
    pub async fn add_order_with_tasks(
        &self,
        name: &str,
        tasks: &[(u32, MachineType, &str)],
    ) -> (Order, Vec<Task>) {
        let order = self.add_order(name).await;
        let mut created = Vec::new();
        for (queue_number, machine_type, operation) in tasks {
            let task = self
                .service
                .add_task(NewTask {
                    order_id: order.order_id,
                    required_machine_type: *machine_type,
                    operation: operation.to_string(),
                    queue_number: *queue_number,
                })
                .await
                .unwrap();
            created.push(task);
        }
        (order, created)
    }
}
