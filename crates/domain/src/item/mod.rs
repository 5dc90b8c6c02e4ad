//! Items and their status state machine.

mod model;
mod state;
mod transitions;

pub use model::{Item, ItemDraft};
pub use state::{ItemStatus, UnknownStatus};
pub use transitions::{ItemStateMachine, Transition};
