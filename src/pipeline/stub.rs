use crate::error::{PlayerError, Result};
use crate::pipeline::{DecodePipeline, SurfaceHandle};
use crate::player::TrickMode;
use crate::stream::{AudioBalance, AudioParams, RatioMode, VideoParams, WindowRect};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared, inspectable handle to a [`StubPipeline`]'s state.
pub type StubHandle = Arc<Mutex<StubState>>;

/// Everything a [`StubPipeline`] has been told, for assertion in tests.
#[derive(Debug)]
pub struct StubState {
    pub surface: Option<SurfaceHandle>,
    pub started: bool,
    pub paused: bool,
    pub trick: TrickMode,
    pub window: WindowRect,
    pub color_key: Option<u16>,
    pub visible: bool,
    pub ratio: RatioMode,
    pub epg_size: (i32, i32),
    pub volume: i32,
    pub balance: AudioBalance,
    pub pixels: (i32, i32),
    pub bytes_pushed: usize,
    pub seeks: u32,
    pub stops: u32,
    /// Simulated driver FIFO headroom; `push` accepts at most this much.
    pub fifo_free: usize,
    /// Failure injection for the resource-unavailable path.
    pub fail_start: bool,
    pub fail_seek: bool,
    pub fail_bind: bool,
    pub fail_trick: bool,
    pub fail_pause: bool,
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            surface: None,
            started: false,
            paused: false,
            trick: TrickMode::None,
            window: WindowRect::default(),
            color_key: None,
            visible: false,
            ratio: RatioMode::Original,
            epg_size: (0, 0),
            volume: 0,
            balance: AudioBalance::Stereo,
            pixels: (0, 0),
            bytes_pushed: 0,
            seeks: 0,
            stops: 0,
            fifo_free: usize::MAX,
            fail_start: false,
            fail_seek: false,
            fail_bind: false,
            fail_trick: false,
            fail_pause: false,
        }
    }
}

/// Software stand-in for the vendor decode pipeline.
///
/// Records every command into shared state and simulates a driver FIFO
/// with configurable headroom. Used by the test suite and by the factory
/// when no vendor pipeline has been installed.
#[derive(Default)]
pub struct StubPipeline {
    state: StubHandle,
}

impl StubPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clones the shared state handle for later inspection.
    pub fn handle(&self) -> StubHandle {
        Arc::clone(&self.state)
    }

    pub fn boxed() -> Box<dyn DecodePipeline> {
        Box::new(Self::new())
    }
}

impl DecodePipeline for StubPipeline {
    fn bind_surface(&mut self, surface: SurfaceHandle) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_bind {
            return Err(PlayerError::Unavailable("surface rejected".into()));
        }
        state.surface = Some(surface);
        Ok(())
    }

    fn start(&mut self, video: &VideoParams, audio: &AudioParams) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_start {
            return Err(PlayerError::Unavailable("decoder open failed".into()));
        }
        debug_assert!(audio.channels >= 1);
        state.started = true;
        state.paused = false;
        // The stub "discovers" the stream resolution instantly.
        state.pixels = (video.width, video.height);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_pause {
            return Err(PlayerError::Unavailable("pause rejected".into()));
        }
        state.paused = true;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.state.lock().paused = false;
        Ok(())
    }

    fn set_trick_mode(&mut self, mode: TrickMode) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_trick {
            return Err(PlayerError::Unavailable("trick mode rejected".into()));
        }
        state.trick = mode;
        Ok(())
    }

    fn seek(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_seek {
            return Err(PlayerError::Unavailable("seek rejected".into()));
        }
        state.seeks += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.started = false;
        state.paused = false;
        state.trick = TrickMode::None;
        state.stops += 1;
        Ok(())
    }

    fn push(&mut self, data: &[u8]) -> usize {
        let mut state = self.state.lock();
        let take = state.fifo_free.min(data.len());
        state.bytes_pushed += take;
        if state.fifo_free != usize::MAX {
            state.fifo_free -= take;
        }
        take
    }

    fn set_window(&mut self, rect: WindowRect) -> Result<()> {
        self.state.lock().window = rect;
        Ok(())
    }

    fn set_color_key(&mut self, key: Option<u16>) -> Result<()> {
        self.state.lock().color_key = key;
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> Result<()> {
        self.state.lock().visible = visible;
        Ok(())
    }

    fn set_ratio(&mut self, mode: RatioMode) -> Result<()> {
        self.state.lock().ratio = mode;
        Ok(())
    }

    fn set_epg_size(&mut self, width: i32, height: i32) {
        self.state.lock().epg_size = (width, height);
    }

    fn set_volume(&mut self, volume: i32) -> Result<()> {
        self.state.lock().volume = volume;
        Ok(())
    }

    fn set_balance(&mut self, balance: AudioBalance) -> Result<()> {
        self.state.lock().balance = balance;
        Ok(())
    }

    fn video_pixels(&self) -> (i32, i32) {
        self.state.lock().pixels
    }

    fn is_soft_fit(&self) -> bool {
        // The stub composes in software.
        true
    }
}
