//! The playback state machine and its process-wide factory.

mod engine;
pub mod factory;
mod state;

pub use engine::{PlaybackEngine, TsPlayer};
pub use state::{PlaybackState, TrickMode, TrickPlayController};
