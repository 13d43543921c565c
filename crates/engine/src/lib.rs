//! # medwing Engine
//!
//! The turn execution engine: the control loop that drives one
//! conversational exchange with a completion provider, dispatches
//! requested tool calls, applies agent-to-agent handoffs, and settles when
//! the model stops requesting tools.

pub mod handoff;
pub mod turn;

pub use handoff::HandoffTool;
pub use turn::{EngineSettings, TurnEngine, TurnResponse};
