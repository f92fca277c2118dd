//! The narrow seam to the vendor decode/render pipeline.
//!
//! The hardware video/audio decoders and the display compositor are opaque
//! external resources. [`DecodePipeline`] is the full extent of what the
//! engine asks of them; everything behind it (driver ioctls, decode
//! cadence, composition) is out of scope. [`StubPipeline`] is the in-tree
//! software implementation used by tests and as the factory fallback when
//! no vendor pipeline is installed.

mod ingest;
mod stub;

pub use ingest::{IngestQueue, DEFAULT_CAPACITY as DEFAULT_INGEST_CAPACITY};
pub use stub::{StubHandle, StubPipeline, StubState};

use crate::error::{PlayerError, Result};
use crate::player::TrickMode;
use crate::stream::{AudioBalance, AudioParams, RatioMode, VideoParams, WindowRect};

/// Opaque handle to the platform presentation surface.
///
/// The engine never frees the underlying surface; the external owner must
/// keep it alive for the engine's whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceHandle(u64);

impl SurfaceHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }
}

/// Commands the engine issues to the decode pipeline.
///
/// All methods are dispatch points: success means the driver accepted the
/// command for execution, not that it completed on screen. Implementations
/// must not block the caller beyond command submission.
pub trait DecodePipeline: Send {
    fn bind_surface(&mut self, surface: SurfaceHandle) -> Result<()>;

    /// Opens a decode session for the given streams.
    fn start(&mut self, video: &VideoParams, audio: &AudioParams) -> Result<()>;

    fn pause(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;
    fn set_trick_mode(&mut self, mode: TrickMode) -> Result<()>;
    fn seek(&mut self) -> Result<()>;

    /// Tears down the session and discards any queued data.
    fn stop(&mut self) -> Result<()>;

    /// Feeds TS payload into the driver FIFO; returns bytes accepted,
    /// which may be less than `data.len()` when the FIFO is full.
    fn push(&mut self, data: &[u8]) -> usize;

    fn set_window(&mut self, rect: WindowRect) -> Result<()>;
    fn set_color_key(&mut self, key: Option<u16>) -> Result<()>;
    fn set_visible(&mut self, visible: bool) -> Result<()>;
    fn set_ratio(&mut self, mode: RatioMode) -> Result<()>;
    fn set_epg_size(&mut self, width: i32, height: i32);

    fn set_volume(&mut self, volume: i32) -> Result<()>;
    fn set_balance(&mut self, balance: AudioBalance) -> Result<()>;

    /// Actual decoded resolution, once known from the bitstream.
    fn video_pixels(&self) -> (i32, i32);

    /// Whether scaling happens in software composition rather than the
    /// hardware scaler.
    fn is_soft_fit(&self) -> bool;
}

/// One-shot binding between the engine and the platform surface.
#[derive(Debug, Default)]
pub struct DisplaySurfaceBinding {
    surface: Option<SurfaceHandle>,
}

impl DisplaySurfaceBinding {
    /// Attaches the surface. Exactly one binding may exist per engine
    /// lifetime; a second call is rejected regardless of playback state.
    pub fn bind(&mut self, surface: SurfaceHandle) -> Result<()> {
        if self.surface.is_some() {
            return Err(PlayerError::InvalidState(
                "display surface already bound".into(),
            ));
        }
        self.surface = Some(surface);
        Ok(())
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    pub fn is_bound(&self) -> bool {
        self.surface.is_some()
    }
}
