//! # Machine Model
//!
//! A machine is a shared physical resource that executes tasks. At most one
//! task may hold a machine while that task is in progress; the assignment
//! engine enforces this through an atomic status claim on the store.
//!
//! Maintenance is tracked as a calendar window: `last_maintenance` plus
//! `maintenance_gap_days` gives the date on which the machine becomes due.
//! The window is evaluated lazily, at assignment time and at task release.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Machine type definitions, matching the workshop floor inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineType {
    Lathe,
    Mill,
    Grinder,
    Other,
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lathe => write!(f, "lathe"),
            Self::Mill => write!(f, "mill"),
            Self::Grinder => write!(f, "grinder"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for MachineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lathe" => Ok(Self::Lathe),
            "mill" => Ok(Self::Mill),
            "grinder" => Ok(Self::Grinder),
            "other" => Ok(Self::Other),
            _ => Err(format!("Invalid machine type: {s}")),
        }
    }
}

/// Machine status definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    /// Ready to accept work.
    Idle,
    /// Occupied by exactly one in-progress task.
    Running,
    /// Pulled out of service until maintenance is recorded.
    Maintenance,
    /// Faulted; cleared only by manual override.
    Error,
}

impl MachineStatus {
    /// Check if the machine can be handed new work.
    pub fn is_assignable(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl Default for MachineStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Maintenance => write!(f, "maintenance"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for MachineStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "running" => Ok(Self::Running),
            "maintenance" => Ok(Self::Maintenance),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid machine status: {s}")),
        }
    }
}

/// A physical resource that executes tasks with exclusive occupancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub machine_id: Uuid,
    pub name: String,
    pub description: String,
    pub machine_type: MachineType,
    pub status: MachineStatus,
    pub location: String,
    pub last_maintenance: NaiveDate,
    pub maintenance_gap_days: u32,
}

impl Machine {
    /// Date on which the machine becomes maintenance-due.
    pub fn next_maintenance(&self) -> NaiveDate {
        self.last_maintenance + Days::new(u64::from(self.maintenance_gap_days))
    }

    /// Record a maintenance service: the window restarts today and the
    /// machine returns to the idle pool.
    pub fn record_maintenance(&mut self, now: DateTime<Utc>) {
        self.last_maintenance = now.date_naive();
        self.status = MachineStatus::Idle;
    }
}

/// New machine for creation (without generated fields).
///
/// A machine without an explicit `maintenance_gap_days` takes the configured
/// default; `last_maintenance` starts at the creation date since a new machine
/// arrives freshly serviced from the manufacturer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMachine {
    pub name: String,
    pub description: String,
    pub machine_type: MachineType,
    pub location: String,
    pub maintenance_gap_days: Option<u32>,
}

impl NewMachine {
    pub fn into_machine(self, now: DateTime<Utc>, default_gap_days: u32) -> Machine {
        Machine {
            machine_id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            machine_type: self.machine_type,
            status: MachineStatus::Idle,
            location: self.location,
            last_maintenance: now.date_naive(),
            maintenance_gap_days: self.maintenance_gap_days.unwrap_or(default_gap_days),
        }
    }
}
