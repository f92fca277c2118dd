//! # tsplayer - MPEG-TS playback control engine
//!
//! `tsplayer` is the control plane of a hardware-accelerated transport
//! stream player on an embedded display device (set-top box class). It
//! sits between an application that demuxes a TS stream and a vendor
//! decode pipeline (hardware decoders plus display compositor) which it
//! drives through a narrow trait but does not implement.
//!
//! ## What it provides
//!
//! - A playback state machine (Idle / Configured / Playing / Paused /
//!   Trick / Stopped) with validated transitions for start, pause,
//!   resume, trick play, seek and stop
//! - Stream parameter validation and ownership of audio codec side-data
//! - A bounded, backpressure-aware ingest port for continuous TS payload,
//!   fed from a thread independent of the control path
//! - Display presentation control: window geometry, color-key
//!   compositing, aspect-ratio policy, EPG canvas sizing
//! - Audio routing: volume (clamped 0..=100) and channel balance
//!
//! Demuxing, PID filtering and codec bitstream handling stay upstream and
//! downstream of this crate respectively.
//!
//! ## Quick start
//!
//! ```rust
//! use tsplayer::player::{PlaybackEngine, PlaybackState, TsPlayer};
//! use tsplayer::pipeline::StubPipeline;
//! use tsplayer::stream::{AudioFormat, AudioParams, VideoFormat, VideoParams};
//!
//! fn main() -> tsplayer::Result<()> {
//!     // In production the pipeline is the vendor driver binding; the
//!     // stub stands in for it here.
//!     let player = PlaybackEngine::new(StubPipeline::boxed());
//!
//!     player.init_video(
//!         VideoParams::new(0x100, VideoFormat::H264)
//!             .with_resolution(1920, 1080)
//!             .with_frame_rate(30),
//!     )?;
//!     player.init_audio(
//!         AudioParams::new(0x101, AudioFormat::Aac).with_layout(2, 48000),
//!     )?;
//!     player.start_play()?;
//!     assert_eq!(player.play_mode(), PlaybackState::Playing);
//!
//!     // Feeder path, normally a separate thread: retry partial accepts.
//!     let packet = [0x47u8; 188];
//!     let mut offset = 0;
//!     while offset < packet.len() {
//!         offset += player.write(&packet[offset..]);
//!     }
//!
//!     player.stop()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module overview
//!
//! - `player`: the [`player::TsPlayer`] control surface, the
//!   [`player::PlaybackEngine`] state machine, trick-play tracking and the
//!   process-wide [`player::factory`]
//! - `stream`: video/audio stream parameters with validation, and the
//!   presentation/routing configuration they feed
//! - `pipeline`: the [`pipeline::DecodePipeline`] seam to the vendor
//!   decoder, the bounded ingest queue and the software stub
//! - `error`: error types and the crate `Result` alias

/// Error types and utilities
pub mod error;

/// The narrow seam to the vendor decode/render pipeline
pub mod pipeline;

/// Playback state machine, control surface and factory
pub mod player;

/// Stream parameters and per-stream configuration
pub mod stream;

pub use error::{PlayerError, Result};
