use crate::error::{PlayerError, Result};
use bytes::Bytes;

// PIDs are 13 bits; 0x1fff is the null packet PID and never carries an
// elementary stream.
pub const PID_MAX: u16 = 0x1ffe;
pub const PID_NULL: u16 = 0x1fff;

/// TS packet size, the natural write granularity of the feeder.
pub const TS_PACKET_SIZE: usize = 188;

/// Video elementary-stream formats accepted by the decode pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFormat {
    Mpeg2,
    Mpeg4,
    H264,
    Hevc,
    Vc1,
    Avs,
}

/// Audio elementary-stream formats accepted by the decode pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mpeg,
    Aac,
    Ac3,
    Dts,
    Pcm,
}

/// Per-stream video decode parameters.
///
/// Built with the `with_*` methods and handed to `init_video`; immutable
/// once playback starts. `codec_tag` is an opaque codec-variant tag passed
/// through to the driver unchecked.
#[derive(Debug, Clone)]
pub struct VideoParams {
    pub pid: u16,
    pub width: i32,
    pub height: i32,
    pub frame_rate: i32,
    pub format: VideoFormat,
    pub codec_tag: u32,
}

impl VideoParams {
    pub fn new(pid: u16, format: VideoFormat) -> Self {
        Self {
            pid,
            width: 0,
            height: 0,
            frame_rate: 0,
            format,
            codec_tag: 0,
        }
    }

    pub fn with_resolution(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: i32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_codec_tag(mut self, tag: u32) -> Self {
        self.codec_tag = tag;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_pid(self.pid)?;
        if self.width <= 0 || self.height <= 0 {
            return Err(PlayerError::InvalidParameter(format!(
                "video resolution {}x{}",
                self.width, self.height
            )));
        }
        if self.frame_rate <= 0 {
            return Err(PlayerError::InvalidParameter(format!(
                "frame rate {}",
                self.frame_rate
            )));
        }
        Ok(())
    }
}

/// Per-stream audio decode parameters.
///
/// `extra` is codec side-data (e.g. an AudioSpecificConfig). It is copied
/// out of the caller's buffer by `with_extra_data`, so the engine owns its
/// lifetime and the caller's buffer may be reused immediately after
/// `init_audio` returns.
#[derive(Debug, Clone)]
pub struct AudioParams {
    pub pid: u16,
    pub channels: i32,
    pub sample_rate: i32,
    pub format: AudioFormat,
    pub extra: Bytes,
}

impl AudioParams {
    pub fn new(pid: u16, format: AudioFormat) -> Self {
        Self {
            pid,
            channels: 0,
            sample_rate: 0,
            format,
            extra: Bytes::new(),
        }
    }

    pub fn with_layout(mut self, channels: i32, sample_rate: i32) -> Self {
        self.channels = channels;
        self.sample_rate = sample_rate;
        self
    }

    /// Deep-copies `data` into engine-owned storage.
    pub fn with_extra_data(mut self, data: &[u8]) -> Self {
        self.extra = Bytes::copy_from_slice(data);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_pid(self.pid)?;
        if self.channels < 1 {
            return Err(PlayerError::InvalidParameter(format!(
                "channel count {}",
                self.channels
            )));
        }
        if self.sample_rate <= 0 {
            return Err(PlayerError::InvalidParameter(format!(
                "sample rate {}",
                self.sample_rate
            )));
        }
        Ok(())
    }
}

fn validate_pid(pid: u16) -> Result<()> {
    if pid > PID_MAX {
        return Err(PlayerError::InvalidParameter(format!("pid {:#06x}", pid)));
    }
    Ok(())
}
