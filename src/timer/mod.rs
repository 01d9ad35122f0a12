//! Interval timer: Focus/Relax countdown running in its own task.

mod engine;
mod error;
mod handle;

pub use engine::{TimerCommand, TimerEngine, TimerEvent, TimerRequest};
pub use error::TimerError;
pub use handle::TimerHandle;
