//! Stream parameter types and per-stream pipeline configuration.

mod audio;
mod types;
mod video;

pub use audio::{AudioBalance, AudioPipelineConfig, VOLUME_MAX, VOLUME_MIN};
pub use types::{
    AudioFormat, AudioParams, VideoFormat, VideoParams, PID_MAX, PID_NULL, TS_PACKET_SIZE,
};
pub use video::{RatioMode, VideoPipelineConfig, WindowRect};
