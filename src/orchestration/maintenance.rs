//! # Maintenance Evaluator
//!
//! Decides when a machine is due for maintenance and sweeps due machines out
//! of the idle pool. There is no background scheduler: the sweep runs lazily
//! inside machine selection and the due-check again at task release, the two
//! points where a machine's workload changes. A machine that becomes due
//! while sitting idle stays marked idle until the next sweep touches it —
//! an accepted staleness window, covered by the test suite.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::audit::ActivityLogger;
use crate::error::Result;
use crate::models::{Machine, MachineStatus};
use crate::store::{EntityStore, StoreError};

/// Pure due-check: true iff `now`'s date has reached the machine's next
/// maintenance date.
pub fn needs_maintenance(machine: &Machine, now: DateTime<Utc>) -> bool {
    now.date_naive() >= machine.next_maintenance()
}

/// Move every maintenance-due idle machine to `maintenance`, emitting a
/// warning audit entry per machine swept. Returns the ids of swept machines.
///
/// Each machine is claimed with a compare-and-set so a concurrent start that
/// grabbed the machine first simply drops it out of the sweep.
pub async fn sweep_idle_machines<S: EntityStore>(
    store: &S,
    audit: &ActivityLogger<S>,
    now: DateTime<Utc>,
) -> Result<Vec<Uuid>> {
    let idle = store.machines_with_status(MachineStatus::Idle, None).await?;

    let mut swept = Vec::new();
    for machine in idle {
        if !needs_maintenance(&machine, now) {
            continue;
        }
        match store
            .claim_machine(machine.machine_id, MachineStatus::Idle, MachineStatus::Maintenance)
            .await
        {
            Ok(machine) => {
                tracing::warn!(
                    machine_id = %machine.machine_id,
                    machine_name = %machine.name,
                    next_maintenance = %machine.next_maintenance(),
                    "machine swept into maintenance"
                );
                audit.machine_maintenance(&machine, None).await;
                swept.push(machine.machine_id);
            }
            // Someone else moved the machine first; nothing to sweep.
            Err(StoreError::Conflict { .. }) => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(swept)
}
