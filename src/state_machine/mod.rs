// Task lifecycle state machine.
//
// Status enums live with their entities in `models`; this module owns the
// transition table, the events that drive it, and the side effects a
// transition has on machines and orders.

pub mod events;
pub mod task_state_machine;

pub use events::TaskEvent;
pub use task_state_machine::{StartedTask, TaskStateMachine};
