//! # Order Model
//!
//! An order is the lifecycle root of a manufacturing job: it owns an ordered
//! queue of tasks and is the unit the customer-facing layer reasons about.
//! Deleting an order cascades to its tasks and their activity logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order status definitions.
///
/// Valid transitions are `pending → in_progress → completed`, with
/// `cancelled` reachable from `pending` or `in_progress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Check if this is a terminal status (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Check whether the status machine permits moving to `target`.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::Pending, Self::Cancelled)
                | (Self::InProgress, Self::Cancelled)
        )
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid order status: {s}")),
        }
    }
}

/// A unit of work composed of an ordered sequence of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    pub name: String,
    pub description: String,
    pub status: OrderStatus,
    pub date_creation: DateTime<Utc>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_completion: Option<DateTime<Utc>>,
}

/// New order for creation (without generated fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub name: String,
    pub description: String,
}

impl NewOrder {
    pub fn into_order(self, now: DateTime<Utc>) -> Order {
        Order {
            order_id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            status: OrderStatus::Pending,
            date_creation: now,
            date_start: None,
            date_completion: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::InProgress));
        assert!(OrderStatus::InProgress.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::InProgress.can_transition_to(OrderStatus::Cancelled));

        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::InProgress));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_order_status_string_conversion() {
        assert_eq!(OrderStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            "cancelled".parse::<OrderStatus>().unwrap(),
            OrderStatus::Cancelled
        );
        assert!("bogus".parse::<OrderStatus>().is_err());
    }
}
