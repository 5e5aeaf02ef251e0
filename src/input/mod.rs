//! Input Layer
//!
//! Turns raw switch hardware into clean, typed events: the port-wide
//! debouncer, the edge-event vocabulary consumed by the controller, and
//! the rotary-encoder selection-mode state machine.

pub mod debounce;
pub mod events;
pub mod mode;

pub use debounce::{Debouncer, SwitchPins};
pub use events::{Edge, InputEvent, InputSource};
pub use mode::{ModeSelect, SelectionMode};
