//! # Machine Assignment Engine
//!
//! Selects an eligible idle machine for a task and claims it atomically.
//!
//! Selection is deterministic: candidates are taken in ascending machine id,
//! a stable total order, so the same store state always yields the same
//! assignment. Maintenance-due machines are swept out of the idle pool as
//! part of selection rather than by any scheduled job.
//!
//! Claiming uses the store's compare-and-set (idle → running). A lost race is
//! retried transparently against the remaining candidates up to the
//! configured budget; past that, the engine reports no machine available.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::audit::ActivityLogger;
use super::maintenance;
use crate::error::{Result, WorkshopError};
use crate::models::{Machine, MachineStatus, MachineType};
use crate::store::{EntityStore, StoreError};

pub struct MachineAssigner<S> {
    store: Arc<S>,
    audit: ActivityLogger<S>,
    claim_retries: u32,
}

impl<S> Clone for MachineAssigner<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            audit: self.audit.clone(),
            claim_retries: self.claim_retries,
        }
    }
}

impl<S: EntityStore> MachineAssigner<S> {
    pub fn new(store: Arc<S>, audit: ActivityLogger<S>, claim_retries: u32) -> Self {
        Self {
            store,
            audit,
            claim_retries,
        }
    }

    /// Sweep the idle pool, then claim the lowest-id eligible machine of the
    /// required type.
    pub async fn assign(&self, required_type: MachineType, now: DateTime<Utc>) -> Result<Machine> {
        maintenance::sweep_idle_machines(self.store.as_ref(), &self.audit, now).await?;

        let candidates = self
            .store
            .machines_with_status(MachineStatus::Idle, Some(required_type))
            .await?;

        let mut conflicts = 0u32;
        for candidate in candidates {
            // A machine released back to idle after the sweep ran is still
            // checked here, and swept if due.
            if maintenance::needs_maintenance(&candidate, now) {
                if let Ok(machine) = self
                    .store
                    .claim_machine(
                        candidate.machine_id,
                        MachineStatus::Idle,
                        MachineStatus::Maintenance,
                    )
                    .await
                {
                    self.audit.machine_maintenance(&machine, None).await;
                }
                continue;
            }

            match self
                .store
                .claim_machine(
                    candidate.machine_id,
                    MachineStatus::Idle,
                    MachineStatus::Running,
                )
                .await
            {
                Ok(machine) => {
                    tracing::debug!(
                        machine_id = %machine.machine_id,
                        machine_name = %machine.name,
                        machine_type = %required_type,
                        "machine claimed for assignment"
                    );
                    return Ok(machine);
                }
                Err(StoreError::Conflict { .. }) => {
                    conflicts += 1;
                    if conflicts > self.claim_retries {
                        return Err(WorkshopError::NoMachineAvailable {
                            machine_type: required_type,
                        });
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(WorkshopError::NoMachineAvailable {
            machine_type: required_type,
        })
    }

    /// Claim a specific pre-assigned machine.
    ///
    /// The machine must be idle and not maintenance-due; a due machine is
    /// swept into maintenance on the spot. A lost claim race is retried once
    /// before surfacing as no machine available.
    pub async fn claim_preassigned(&self, machine_id: Uuid, now: DateTime<Utc>) -> Result<Machine> {
        let mut attempts = 0u32;
        loop {
            let machine = self.store.machine(machine_id).await?;

            if maintenance::needs_maintenance(&machine, now) {
                if machine.status == MachineStatus::Idle {
                    if let Ok(machine) = self
                        .store
                        .claim_machine(machine_id, MachineStatus::Idle, MachineStatus::Maintenance)
                        .await
                    {
                        self.audit.machine_maintenance(&machine, None).await;
                    }
                }
                return Err(WorkshopError::NoMachineAvailable {
                    machine_type: machine.machine_type,
                });
            }

            if machine.status != MachineStatus::Idle {
                return Err(WorkshopError::NoMachineAvailable {
                    machine_type: machine.machine_type,
                });
            }

            match self
                .store
                .claim_machine(machine_id, MachineStatus::Idle, MachineStatus::Running)
                .await
            {
                Ok(machine) => return Ok(machine),
                Err(StoreError::Conflict { .. }) => {
                    attempts += 1;
                    if attempts > self.claim_retries {
                        return Err(WorkshopError::NoMachineAvailable {
                            machine_type: machine.machine_type,
                        });
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
