pub mod waiter;

pub use waiter::{OperationWaiter, PollConfig};
