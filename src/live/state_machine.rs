//! Live session lifecycle state machine
//!
//! Pure transitions in the Elm style: the manager feeds events in and
//! executes the returned effects, so every protocol rule is testable without I/O.

mod effect;
mod event;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::SessionEvent;
pub use state::SessionState;
pub use transition::{transition, TransitionError, TransitionResult};
