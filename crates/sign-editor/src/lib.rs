//! Signature pad engine: pointer input, stroke state machine and surface
//! management (clear, undo, resize, export).

pub mod input;
pub mod pad;

pub use input::InputEvent;
pub use pad::{PadState, SignPad};
