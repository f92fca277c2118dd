use crate::error::{PlayerError, Result};
use crate::pipeline::{
    DecodePipeline, DisplaySurfaceBinding, IngestQueue, SurfaceHandle, DEFAULT_INGEST_CAPACITY,
};
use crate::player::state::{PlaybackState, TrickMode, TrickPlayController};
use crate::stream::{
    AudioBalance, AudioParams, AudioPipelineConfig, RatioMode, VideoParams, VideoPipelineConfig,
    WindowRect,
};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long the pump waits for a chunk before rechecking the state.
const POP_WAIT: Duration = Duration::from_millis(20);
/// Poll interval while delivery is withheld (Paused).
const PAUSE_POLL: Duration = Duration::from_millis(10);
/// Backoff between retries when the driver FIFO is full.
const PUSH_BACKOFF: Duration = Duration::from_millis(5);

/// The playback control surface of a TS player.
///
/// Mirrors the state machine in the crate docs: control operations are
/// synchronous, serialized against each other, and report failure through
/// [`PlayerError`]; success means the decode pipeline accepted the command
/// for execution, not that the effect is already on screen.
pub trait TsPlayer: Send + Sync {
    /// Current playback state. Never fails, has no side effects.
    fn play_mode(&self) -> PlaybackState;

    /// Stores and validates the video decode parameters. Last write wins
    /// until `start_play`; rejected while a session is active.
    fn init_video(&self, params: VideoParams) -> Result<()>;

    /// Stores and validates the audio decode parameters, taking ownership
    /// of the codec extra-data copy. Same lifecycle as `init_video`.
    fn init_audio(&self, params: AudioParams) -> Result<()>;

    /// Opens the decode session. Requires both parameter sets.
    fn start_play(&self) -> Result<()>;

    /// Appends TS payload toward the decode pipeline, returning how many
    /// bytes were accepted (possibly fewer than `data.len()`, possibly 0
    /// under backpressure — the caller retries the remainder).
    ///
    /// Callable from a feeder thread independent of the control thread.
    /// Accepts data only in Playing, Paused and Trick; while Paused the
    /// data is buffered and delivery resumes on `resume`. Returns 0 in
    /// every other state, including after a concurrent `stop`.
    fn write(&self, data: &[u8]) -> usize;

    fn pause(&self) -> Result<()>;
    fn resume(&self) -> Result<()>;

    /// Enters fast forward/backward trick play from Playing or Paused.
    fn fast(&self) -> Result<()>;

    /// Leaves trick play, restoring the state held before `fast`.
    fn stop_fast(&self) -> Result<()>;

    /// Releases the session, flushes buffered data and terminalizes into
    /// Stopped. Idempotent from Stopped; a new session requires both
    /// `init_video` and `init_audio` again.
    fn stop(&self) -> Result<()>;

    /// Requests a position change from the pipeline; valid in Playing,
    /// Paused and Trick, never changes the playback state.
    fn seek(&self) -> Result<()>;

    fn set_video_window(&self, x: i32, y: i32, width: i32, height: i32) -> Result<()>;

    /// Color-key punch-through for 16-bit graphics planes; `key565` is an
    /// RGB565-packed value.
    fn set_color_key(&self, enable: bool, key565: u16) -> Result<()>;

    /// Shows the video layer. Requires a bound display surface.
    fn video_show(&self) -> Result<()>;

    /// Hides the video layer without tearing down decode state.
    fn video_hide(&self) -> Result<()>;

    /// Selects the scaling policy; `mode` is a raw [`RatioMode`] value.
    fn set_ratio(&self, mode: i32) -> Result<()>;

    /// Sets the output volume, clamping into 0..=100.
    fn set_volume(&self, volume: i32) -> Result<()>;
    fn volume(&self) -> i32;

    /// Selects channel routing; `balance` is a raw [`AudioBalance`] value
    /// and out-of-range input is rejected.
    fn set_audio_balance(&self, balance: i32) -> Result<()>;
    fn audio_balance(&self) -> i32;

    /// Actual decoded resolution once known, else the requested one.
    fn video_pixels(&self) -> (i32, i32);

    /// Whether scaling happens in software composition.
    fn is_soft_fit(&self) -> bool;

    /// Announces the EPG overlay canvas size used for composition layout.
    fn set_epg_size(&self, width: i32, height: i32);
}

/// State shared with the pump thread, outside the control mutex.
struct Shared {
    /// Mirror of the control state's `PlaybackState`, so the data path and
    /// `play_mode` never contend with control operations.
    state: AtomicU8,
    ingest: IngestQueue,
    pipeline: Mutex<Box<dyn DecodePipeline>>,
}

impl Shared {
    fn state(&self) -> PlaybackState {
        PlaybackState::from_code(self.state.load(Ordering::Acquire))
    }
}

struct ControlState {
    state: PlaybackState,
    trick: TrickPlayController,
    video: VideoPipelineConfig,
    audio: AudioPipelineConfig,
    display: DisplaySurfaceBinding,
}

/// The production TS player: a state machine over an injected
/// [`DecodePipeline`].
///
/// Two independent call paths exist concurrently: the control path
/// (everything but `write`) is serialized by one mutex; the data path
/// (`write`) goes through the bounded ingest queue and a pump thread that
/// feeds the pipeline, so stream-rate writes never block behind control
/// operations.
pub struct PlaybackEngine {
    shared: Arc<Shared>,
    control: Mutex<ControlState>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackEngine {
    pub fn new(pipeline: Box<dyn DecodePipeline>) -> Self {
        Self::with_ingest_capacity(pipeline, DEFAULT_INGEST_CAPACITY)
    }

    pub fn with_ingest_capacity(pipeline: Box<dyn DecodePipeline>, capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: AtomicU8::new(PlaybackState::Idle.code()),
                ingest: IngestQueue::new(capacity),
                pipeline: Mutex::new(pipeline),
            }),
            control: Mutex::new(ControlState {
                state: PlaybackState::Idle,
                trick: TrickPlayController::default(),
                video: VideoPipelineConfig::default(),
                audio: AudioPipelineConfig::default(),
                display: DisplaySurfaceBinding::default(),
            }),
            pump: Mutex::new(None),
        }
    }

    /// Attaches the platform display surface. Exactly one binding may
    /// exist per engine lifetime; rebinding is rejected. Must precede the
    /// first `video_show`.
    pub fn bind_surface(&self, surface: SurfaceHandle) -> Result<()> {
        let mut cs = self.control.lock();
        if cs.display.is_bound() {
            return Err(PlayerError::InvalidState(
                "display surface already bound".into(),
            ));
        }
        // The compositor must accept the surface before the engine
        // records the binding; otherwise `video_show` would pass its gate
        // against a compositor that never took the surface, and the
        // one-binding rule would block the corrective retry.
        self.shared.pipeline.lock().bind_surface(surface)?;
        cs.display.bind(surface)?;
        info!("display surface bound: {:#x}", surface.as_raw());
        Ok(())
    }

    fn set_state(&self, cs: &mut ControlState, next: PlaybackState) {
        if cs.state != next {
            info!("playback state {:?} -> {:?}", cs.state, next);
        }
        cs.state = next;
        self.shared.state.store(next.code(), Ordering::Release);
    }

    fn invalid(&self, op: &str, state: PlaybackState) -> PlayerError {
        warn!("{} rejected while {:?}", op, state);
        PlayerError::InvalidState(format!("{} while {:?}", op, state))
    }

    /// Recomputes Idle/Configured after an accepted init call.
    fn after_init(&self, cs: &mut ControlState) {
        let next = if cs.video.is_configured() && cs.audio.is_configured() {
            PlaybackState::Configured
        } else {
            PlaybackState::Idle
        };
        self.set_state(cs, next);
    }

    fn spawn_pump(&self) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("tsplayer-pump".into())
            .spawn(move || pump_loop(shared))
            .map_err(|e| PlayerError::Unavailable(format!("pump thread: {}", e)))?;
        *self.pump.lock() = Some(handle);
        Ok(())
    }

    fn join_pump(&self) {
        if let Some(handle) = self.pump.lock().take() {
            let _ = handle.join();
        }
    }
}

/// Best-effort rollback after a rejected command mid-way out of Trick:
/// the engine is still in Trick, so the pipeline should be too.
fn restore_trick_mode(pipeline: &mut dyn DecodePipeline) {
    if let Err(e) = pipeline.set_trick_mode(TrickMode::FastForwardFastBackward) {
        warn!("trick mode restore: {}", e);
    }
}

/// Drains the ingest queue into the decode pipeline.
///
/// Runs from `start_play` until the state leaves {Playing, Paused, Trick}.
/// While Paused it holds buffered chunks instead of delivering them. A
/// chunk is retried against the driver FIFO with a short backoff until
/// fully pushed or the session ends.
fn pump_loop(shared: Arc<Shared>) {
    debug!("pump started");
    loop {
        let state = shared.state();
        if !state.accepts_data() {
            break;
        }
        if !state.delivers_data() {
            thread::sleep(PAUSE_POLL);
            continue;
        }
        let Some(chunk) = shared.ingest.pop(POP_WAIT) else {
            continue;
        };
        let mut rest = &chunk[..];
        while !rest.is_empty() {
            let state = shared.state();
            if !state.accepts_data() {
                // Session ended; the queue is being flushed anyway.
                break;
            }
            if !state.delivers_data() {
                thread::sleep(PAUSE_POLL);
                continue;
            }
            let pushed = shared.pipeline.lock().push(rest);
            if pushed == 0 {
                thread::sleep(PUSH_BACKOFF);
                continue;
            }
            rest = &rest[pushed..];
        }
    }
    debug!("pump exited");
}

impl TsPlayer for PlaybackEngine {
    fn play_mode(&self) -> PlaybackState {
        self.shared.state()
    }

    fn init_video(&self, params: VideoParams) -> Result<()> {
        let mut cs = self.control.lock();
        match cs.state {
            PlaybackState::Idle | PlaybackState::Configured | PlaybackState::Stopped => {}
            state => return Err(self.invalid("init_video", state)),
        }
        debug!(
            "init_video pid={:#05x} {}x{}@{} {:?}",
            params.pid, params.width, params.height, params.frame_rate, params.format
        );
        cs.video.set_params(params)?;
        self.after_init(&mut cs);
        Ok(())
    }

    fn init_audio(&self, params: AudioParams) -> Result<()> {
        let mut cs = self.control.lock();
        match cs.state {
            PlaybackState::Idle | PlaybackState::Configured | PlaybackState::Stopped => {}
            state => return Err(self.invalid("init_audio", state)),
        }
        debug!(
            "init_audio pid={:#05x} ch={} rate={} {:?} extra={}B",
            params.pid,
            params.channels,
            params.sample_rate,
            params.format,
            params.extra.len()
        );
        cs.audio.set_params(params)?;
        self.after_init(&mut cs);
        Ok(())
    }

    fn start_play(&self) -> Result<()> {
        let mut cs = self.control.lock();
        if cs.state != PlaybackState::Configured {
            return Err(self.invalid("start_play", cs.state));
        }
        let (video, audio) = match (cs.video.params(), cs.audio.params()) {
            (Some(v), Some(a)) => (v.clone(), a.clone()),
            _ => {
                return Err(PlayerError::InvalidState(
                    "start_play without stream parameters".into(),
                ))
            }
        };
        self.shared.pipeline.lock().start(&video, &audio)?;
        self.shared.ingest.open();
        self.set_state(&mut cs, PlaybackState::Playing);
        self.spawn_pump()
    }

    fn write(&self, data: &[u8]) -> usize {
        if !self.shared.state().accepts_data() {
            return 0;
        }
        self.shared.ingest.push(data)
    }

    fn pause(&self) -> Result<()> {
        let mut cs = self.control.lock();
        match cs.state {
            PlaybackState::Playing => {
                self.shared.pipeline.lock().pause()?;
            }
            PlaybackState::Trick => {
                // Leaving Trick: the mode must be None outside that state.
                // Trick state is cleared only after the pipeline accepted
                // both commands; a rejected pause puts its trick mode back
                // so pipeline and engine stay in agreement.
                let mut pipeline = self.shared.pipeline.lock();
                pipeline.set_trick_mode(TrickMode::None)?;
                if let Err(e) = pipeline.pause() {
                    restore_trick_mode(&mut **pipeline);
                    return Err(e);
                }
                drop(pipeline);
                cs.trick.clear();
            }
            state => return Err(self.invalid("pause", state)),
        }
        self.set_state(&mut cs, PlaybackState::Paused);
        Ok(())
    }

    fn resume(&self) -> Result<()> {
        let mut cs = self.control.lock();
        if cs.state != PlaybackState::Paused {
            return Err(self.invalid("resume", cs.state));
        }
        self.shared.pipeline.lock().resume()?;
        self.set_state(&mut cs, PlaybackState::Playing);
        Ok(())
    }

    fn fast(&self) -> Result<()> {
        let mut cs = self.control.lock();
        let prior = match cs.state {
            PlaybackState::Playing | PlaybackState::Paused => cs.state,
            state => return Err(self.invalid("fast", state)),
        };
        {
            let mut pipeline = self.shared.pipeline.lock();
            pipeline.set_trick_mode(TrickMode::FastForwardFastBackward)?;
            if prior == PlaybackState::Paused {
                // Trick decode runs even when entered from Paused.
                pipeline.resume()?;
            }
        }
        cs.trick.enter_fast(prior);
        self.set_state(&mut cs, PlaybackState::Trick);
        Ok(())
    }

    fn stop_fast(&self) -> Result<()> {
        let mut cs = self.control.lock();
        if cs.state != PlaybackState::Trick {
            return Err(self.invalid("stop_fast", cs.state));
        }
        // Peek the resume target; the memo is consumed only once the
        // pipeline has accepted every command, so a rejected call leaves
        // the engine in Trick with the memo intact for a retry.
        let prior = cs.trick.resume_target();
        {
            let mut pipeline = self.shared.pipeline.lock();
            pipeline.set_trick_mode(TrickMode::None)?;
            if prior == PlaybackState::Paused {
                if let Err(e) = pipeline.pause() {
                    restore_trick_mode(&mut **pipeline);
                    return Err(e);
                }
            }
        }
        cs.trick.leave_fast();
        self.set_state(&mut cs, prior);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        let mut cs = self.control.lock();
        match cs.state {
            PlaybackState::Idle => return Err(self.invalid("stop", cs.state)),
            PlaybackState::Stopped => return Ok(()),
            _ => {}
        }
        // Terminalize first so a concurrent write sees Stopped and
        // returns 0 before we flush.
        self.set_state(&mut cs, PlaybackState::Stopped);
        self.shared.ingest.close();
        self.shared.ingest.flush();
        cs.trick.clear();
        cs.video.clear_params();
        cs.audio.clear_params();
        if let Err(e) = self.shared.pipeline.lock().stop() {
            warn!("pipeline stop: {}", e);
        }
        drop(cs);
        self.join_pump();
        Ok(())
    }

    fn seek(&self) -> Result<()> {
        let cs = self.control.lock();
        match cs.state {
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Trick => {}
            state => return Err(self.invalid("seek", state)),
        }
        self.shared.pipeline.lock().seek()
    }

    fn set_video_window(&self, x: i32, y: i32, width: i32, height: i32) -> Result<()> {
        let rect = WindowRect::new(x, y, width, height)?;
        let mut cs = self.control.lock();
        cs.video.set_window(rect);
        self.shared.pipeline.lock().set_window(rect)
    }

    fn set_color_key(&self, enable: bool, key565: u16) -> Result<()> {
        let key = enable.then_some(key565);
        let mut cs = self.control.lock();
        cs.video.set_color_key(key);
        self.shared.pipeline.lock().set_color_key(key)
    }

    fn video_show(&self) -> Result<()> {
        let mut cs = self.control.lock();
        if !cs.display.is_bound() {
            warn!("video_show before surface binding");
            return Err(PlayerError::SurfaceNotBound);
        }
        self.shared.pipeline.lock().set_visible(true)?;
        cs.video.set_visible(true);
        Ok(())
    }

    fn video_hide(&self) -> Result<()> {
        let mut cs = self.control.lock();
        self.shared.pipeline.lock().set_visible(false)?;
        cs.video.set_visible(false);
        Ok(())
    }

    fn set_ratio(&self, mode: i32) -> Result<()> {
        let ratio = RatioMode::try_from(mode)?;
        let mut cs = self.control.lock();
        cs.video.set_ratio(ratio);
        self.shared.pipeline.lock().set_ratio(ratio)
    }

    fn set_volume(&self, volume: i32) -> Result<()> {
        let mut cs = self.control.lock();
        let clamped = cs.audio.set_volume(volume);
        self.shared.pipeline.lock().set_volume(clamped)
    }

    fn volume(&self) -> i32 {
        self.control.lock().audio.volume()
    }

    fn set_audio_balance(&self, balance: i32) -> Result<()> {
        let balance = AudioBalance::try_from(balance)?;
        let mut cs = self.control.lock();
        cs.audio.set_balance(balance);
        self.shared.pipeline.lock().set_balance(balance)
    }

    fn audio_balance(&self) -> i32 {
        self.control.lock().audio.balance() as i32
    }

    fn video_pixels(&self) -> (i32, i32) {
        let cs = self.control.lock();
        let actual = self.shared.pipeline.lock().video_pixels();
        if actual == (0, 0) {
            cs.video.requested_pixels()
        } else {
            actual
        }
    }

    fn is_soft_fit(&self) -> bool {
        self.shared.pipeline.lock().is_soft_fit()
    }

    fn set_epg_size(&self, width: i32, height: i32) {
        let mut cs = self.control.lock();
        cs.video.set_epg_size(width, height);
        self.shared.pipeline.lock().set_epg_size(width, height);
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.shared
            .state
            .store(PlaybackState::Stopped.code(), Ordering::Release);
        self.shared.ingest.close();
        self.join_pump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{StubHandle, StubPipeline};
    use crate::stream::{AudioFormat, VideoFormat};
    use pretty_assertions::assert_eq;

    fn engine() -> (PlaybackEngine, StubHandle) {
        let stub = StubPipeline::new();
        let handle = stub.handle();
        (PlaybackEngine::new(Box::new(stub)), handle)
    }

    fn video_params() -> VideoParams {
        VideoParams::new(0x100, VideoFormat::H264)
            .with_resolution(1920, 1080)
            .with_frame_rate(30)
    }

    fn audio_params() -> AudioParams {
        AudioParams::new(0x101, AudioFormat::Aac).with_layout(2, 48000)
    }

    fn configured() -> (PlaybackEngine, StubHandle) {
        let (player, handle) = engine();
        player.init_video(video_params()).unwrap();
        player.init_audio(audio_params()).unwrap();
        (player, handle)
    }

    fn playing() -> (PlaybackEngine, StubHandle) {
        let (player, handle) = configured();
        player.start_play().unwrap();
        (player, handle)
    }

    #[test]
    fn configure_then_start_reaches_playing() {
        let (player, handle) = engine();
        player
            .init_video(
                VideoParams::new(0x100, VideoFormat::H264)
                    .with_resolution(1920, 1080)
                    .with_frame_rate(30),
            )
            .unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Idle);
        player
            .init_audio(AudioParams::new(0x101, AudioFormat::Aac).with_layout(2, 48000))
            .unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Configured);
        player.start_play().unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Playing);
        assert!(handle.lock().started);
        player.stop().unwrap();
    }

    #[test]
    fn start_requires_both_param_sets() {
        let (player, _) = engine();
        assert!(player.start_play().is_err());
        player.init_video(video_params()).unwrap();
        assert!(player.start_play().is_err());
        player.init_audio(audio_params()).unwrap();
        player.start_play().unwrap();
        player.stop().unwrap();
    }

    #[test]
    fn pause_while_idle_is_rejected() {
        let (player, _) = engine();
        assert!(matches!(
            player.pause(),
            Err(PlayerError::InvalidState(_))
        ));
        assert_eq!(player.play_mode(), PlaybackState::Idle);
    }

    #[test]
    fn fast_then_stop_fast_round_trip() {
        let (player, handle) = playing();
        player.fast().unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Trick);
        assert_eq!(
            handle.lock().trick,
            TrickMode::FastForwardFastBackward
        );
        player.stop_fast().unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Playing);
        assert_eq!(handle.lock().trick, TrickMode::None);
        player.stop().unwrap();
    }

    #[test]
    fn stop_fast_restores_paused() {
        let (player, handle) = playing();
        player.pause().unwrap();
        player.fast().unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Trick);
        player.stop_fast().unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Paused);
        assert!(handle.lock().paused);
        player.stop().unwrap();
    }

    #[test]
    fn stop_fast_retry_restores_pre_fast_pause() {
        let (player, handle) = playing();
        player.pause().unwrap();
        player.fast().unwrap();
        handle.lock().fail_trick = true;
        assert!(matches!(
            player.stop_fast(),
            Err(PlayerError::Unavailable(_))
        ));
        // Driver rejection: still in Trick, resume memo intact.
        assert_eq!(player.play_mode(), PlaybackState::Trick);
        handle.lock().fail_trick = false;
        player.stop_fast().unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Paused);
        player.stop().unwrap();
    }

    #[test]
    fn rejected_pause_leaving_trick_rolls_back() {
        let (player, handle) = playing();
        player.fast().unwrap();
        handle.lock().fail_pause = true;
        assert!(matches!(player.pause(), Err(PlayerError::Unavailable(_))));
        assert_eq!(player.play_mode(), PlaybackState::Trick);
        // The pipeline's trick mode was put back to match the engine.
        assert_eq!(
            handle.lock().trick,
            TrickMode::FastForwardFastBackward
        );
        handle.lock().fail_pause = false;
        player.pause().unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Paused);
        assert_eq!(handle.lock().trick, TrickMode::None);
        player.stop().unwrap();
    }

    #[test]
    fn rejected_bind_leaves_surface_unbound() {
        let (player, handle) = engine();
        handle.lock().fail_bind = true;
        assert!(matches!(
            player.bind_surface(SurfaceHandle::from_raw(0x77)),
            Err(PlayerError::Unavailable(_))
        ));
        // The engine must not consider itself bound, and the one-binding
        // rule must not block the corrective retry.
        assert!(matches!(
            player.video_show(),
            Err(PlayerError::SurfaceNotBound)
        ));
        handle.lock().fail_bind = false;
        player.bind_surface(SurfaceHandle::from_raw(0x77)).unwrap();
        player.video_show().unwrap();
        assert!(handle.lock().visible);
    }

    #[test]
    fn pause_from_trick_clears_mode() {
        let (player, handle) = playing();
        player.fast().unwrap();
        player.pause().unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Paused);
        assert_eq!(handle.lock().trick, TrickMode::None);
        // Trick was left through pause; stop_fast no longer applies.
        assert!(player.stop_fast().is_err());
        player.stop().unwrap();
    }

    #[test]
    fn stop_is_idempotent_and_clears_config() {
        let (player, _) = playing();
        player.stop().unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Stopped);
        player.stop().unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Stopped);
        // A new session needs both inits again.
        assert!(player.start_play().is_err());
        player.init_video(video_params()).unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Idle);
        player.init_audio(audio_params()).unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Configured);
        player.start_play().unwrap();
        player.stop().unwrap();
    }

    #[test]
    fn stop_from_idle_is_rejected() {
        let (player, _) = engine();
        assert!(player.stop().is_err());
        assert_eq!(player.play_mode(), PlaybackState::Idle);
    }

    #[test]
    fn init_rejected_during_session() {
        let (player, _) = playing();
        assert!(player.init_video(video_params()).is_err());
        assert!(player.init_audio(audio_params()).is_err());
        player.pause().unwrap();
        assert!(player.init_video(video_params()).is_err());
        player.stop().unwrap();
    }

    #[test]
    fn start_fails_when_pipeline_rejects() {
        let (player, handle) = configured();
        handle.lock().fail_start = true;
        assert!(matches!(
            player.start_play(),
            Err(PlayerError::Unavailable(_))
        ));
        assert_eq!(player.play_mode(), PlaybackState::Configured);
    }

    #[test]
    fn write_gated_by_state() {
        let (player, _) = configured();
        let packet = [0x47u8; 188];
        assert_eq!(player.write(&packet), 0);
        player.start_play().unwrap();
        assert_eq!(player.write(&packet), 188);
        player.stop().unwrap();
        assert_eq!(player.write(&packet), 0);
    }

    #[test]
    fn write_buffered_while_paused() {
        let (player, _) = playing();
        let packet = [0x47u8; 188];
        assert_eq!(player.write(&packet), 188);
        player.pause().unwrap();
        // Paused accepts and buffers; delivery waits for resume.
        assert_eq!(player.write(&packet), 188);
        player.resume().unwrap();
        assert_eq!(player.play_mode(), PlaybackState::Playing);
        player.stop().unwrap();
    }

    #[test]
    fn pump_delivers_to_pipeline() {
        let (player, handle) = playing();
        let packet = [0x47u8; 188];
        for _ in 0..16 {
            assert_eq!(player.write(&packet), 188);
        }
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while handle.lock().bytes_pushed < 188 * 16 {
            assert!(std::time::Instant::now() < deadline, "pump stalled");
            thread::sleep(Duration::from_millis(5));
        }
        player.stop().unwrap();
        assert_eq!(handle.lock().bytes_pushed, 188 * 16);
    }

    #[test]
    fn partial_accept_near_capacity() {
        let stub = StubPipeline::new();
        // Keep the driver FIFO shut so the queue fills up.
        stub.handle().lock().fifo_free = 0;
        let player = PlaybackEngine::with_ingest_capacity(Box::new(stub), 200);
        player.init_video(video_params()).unwrap();
        player.init_audio(audio_params()).unwrap();
        player.start_play().unwrap();
        let packet = [0x47u8; 188];
        // Queue capacity (200) plus the one chunk the pump may hold in
        // flight bounds total acceptance at 388 bytes, so writing four
        // packets must hit a partial accept.
        let accepts: Vec<usize> = (0..4).map(|_| player.write(&packet)).collect();
        let total: usize = accepts.iter().sum();
        assert!(accepts.iter().all(|&k| k <= 188));
        assert!(total <= 200 + 188, "accepted {} bytes: {:?}", total, accepts);
        assert!(accepts.iter().any(|&k| k < 188));
        player.stop().unwrap();
    }

    #[test]
    fn seek_valid_in_trick() {
        let (player, handle) = playing();
        player.seek().unwrap();
        player.fast().unwrap();
        player.seek().unwrap();
        assert_eq!(handle.lock().seeks, 2);
        assert_eq!(player.play_mode(), PlaybackState::Trick);
        player.stop().unwrap();
    }

    #[test]
    fn seek_surfaces_pipeline_rejection() {
        let (player, handle) = playing();
        handle.lock().fail_seek = true;
        assert!(matches!(player.seek(), Err(PlayerError::Unavailable(_))));
        assert_eq!(player.play_mode(), PlaybackState::Playing);
        player.stop().unwrap();
    }

    #[test]
    fn video_show_requires_surface() {
        let (player, handle) = engine();
        assert!(matches!(
            player.video_show(),
            Err(PlayerError::SurfaceNotBound)
        ));
        player.bind_surface(SurfaceHandle::from_raw(0x1000)).unwrap();
        player.video_show().unwrap();
        assert!(handle.lock().visible);
        player.video_hide().unwrap();
        assert!(!handle.lock().visible);
    }

    #[test]
    fn surface_rebind_rejected() {
        let (player, _) = engine();
        player.bind_surface(SurfaceHandle::from_raw(1)).unwrap();
        assert!(player.bind_surface(SurfaceHandle::from_raw(2)).is_err());
    }

    #[test]
    fn volume_clamped_not_rejected() {
        let (player, handle) = engine();
        player.set_volume(-5).unwrap();
        assert_eq!(player.volume(), 0);
        player.set_volume(250).unwrap();
        assert_eq!(player.volume(), 100);
        assert_eq!(handle.lock().volume, 100);
    }

    #[test]
    fn balance_out_of_range_rejected() {
        let (player, _) = engine();
        assert!(matches!(
            player.set_audio_balance(7),
            Err(PlayerError::InvalidParameter(_))
        ));
        player.set_audio_balance(1).unwrap();
        assert_eq!(player.audio_balance(), 1);
    }

    #[test]
    fn window_and_compositing_forwarded() {
        let (player, handle) = engine();
        player.set_video_window(10, 20, 720, 576).unwrap();
        player.set_color_key(true, 0x07e0).unwrap();
        player.set_ratio(2).unwrap();
        player.set_epg_size(1280, 720);
        let state = handle.lock();
        assert_eq!(state.window, WindowRect::new(10, 20, 720, 576).unwrap());
        assert_eq!(state.color_key, Some(0x07e0));
        assert_eq!(state.ratio, RatioMode::Letterbox);
        assert_eq!(state.epg_size, (1280, 720));
        drop(state);
        assert!(player.set_video_window(0, 0, -1, 576).is_err());
        assert!(player.set_ratio(9).is_err());
    }

    #[test]
    fn video_pixels_falls_back_to_request() {
        let (player, handle) = configured();
        assert_eq!(player.video_pixels(), (1920, 1080));
        player.start_play().unwrap();
        handle.lock().pixels = (1440, 1080);
        assert_eq!(player.video_pixels(), (1440, 1080));
        player.stop().unwrap();
    }

    #[test]
    fn soft_fit_reported_from_pipeline() {
        let (player, _) = engine();
        assert!(player.is_soft_fit());
    }
}
