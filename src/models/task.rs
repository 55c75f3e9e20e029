//! # Task Model
//!
//! A task is a single operation within an order, requiring a machine of a
//! given type. Tasks execute strictly in ascending `queue_number` within
//! their order; queue numbers are unique per order but not necessarily
//! contiguous.
//!
//! Once a machine has been assigned the reference is never cleared, even
//! after completion — it is the historical record of where the operation ran.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::machine::MachineType;

/// Task status definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Initial status; waiting in the order's queue.
    Pending,
    /// Holding a machine and executing.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Finished unsuccessfully.
    Failed,
}

impl TaskStatus {
    /// Check if this is a terminal status (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if the task currently holds its machine exclusively.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}

/// A single operation within an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Uuid,
    pub order_id: Uuid,
    pub required_machine_type: MachineType,
    /// Set when a machine is first assigned; never cleared afterwards.
    pub machine_id: Option<Uuid>,
    pub operation: String,
    pub queue_number: u32,
    pub status: TaskStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
}

/// New task for creation (without generated fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub order_id: Uuid,
    pub required_machine_type: MachineType,
    pub operation: String,
    pub queue_number: u32,
}

impl NewTask {
    pub fn into_task(self) -> Task {
        Task {
            task_id: Uuid::new_v4(),
            order_id: self.order_id,
            required_machine_type: self.required_machine_type,
            machine_id: None,
            operation: self.operation,
            queue_number: self.queue_number,
            status: TaskStatus::Pending,
            start_time: None,
            finish_time: None,
        }
    }
}
