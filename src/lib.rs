//! Grid snake with a fixed-tick engine and a pluggable autopilot.
//!
//! [`engine::Engine`] is the whole game; everything else in the crate is a
//! collaborator the terminal binary plugs into it.

pub mod app;
pub mod autopilot;
pub mod clock;
pub mod config;
pub mod engine;
pub mod grid;
pub mod high_score;
pub mod input;
pub mod render;
pub mod snek;
pub mod ticker;

pub use autopilot::{Autopilot, AutopilotFault, Hint, Probe};
pub use engine::{Engine, EngineEvent, EndReason, SpeedChange, Status, TickOutcome};
pub use grid::{Cell, Delta, Direction, GridSize};
pub use high_score::{FileStore, HighScoreStore, MemoryStore, StoreError};
