// Data layer for the workshop core.
//
// Each entity carries its status enum alongside it, with serde, Display and
// FromStr conversions so the API layer and audit trail share one canonical
// string form per status.

pub mod activity_log;
pub mod machine;
pub mod order;
pub mod task;

pub use activity_log::{ActivityLog, LogType};
pub use machine::{Machine, MachineStatus, MachineType, NewMachine};
pub use order::{NewOrder, Order, OrderStatus};
pub use task::{NewTask, Task, TaskStatus};
