use crate::error::{PlayerError, Result};

/// Playback state machine states.
///
/// Created Idle, driven only by [`crate::player::PlaybackEngine`]
/// operations, terminal in Stopped until the engine is reconfigured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No stream parameters accepted yet.
    Idle,
    /// Both video and audio parameters accepted; ready for `start_play`.
    Configured,
    /// Normal-speed playback.
    Playing,
    /// Playback paused; ingested data is buffered, not delivered.
    Paused,
    /// Trick-mode playback (fast forward / fast backward).
    Trick,
    /// Terminal until reconfigured through `init_video` + `init_audio`.
    Stopped,
}

impl PlaybackState {
    /// States in which the ingest port accepts data.
    pub fn accepts_data(self) -> bool {
        matches!(
            self,
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Trick
        )
    }

    /// States in which buffered data is delivered to the decoder.
    pub fn delivers_data(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Trick)
    }

    pub(crate) fn code(self) -> u8 {
        match self {
            PlaybackState::Idle => 0,
            PlaybackState::Configured => 1,
            PlaybackState::Playing => 2,
            PlaybackState::Paused => 3,
            PlaybackState::Trick => 4,
            PlaybackState::Stopped => 5,
        }
    }

    pub(crate) fn from_code(code: u8) -> PlaybackState {
        match code {
            0 => PlaybackState::Idle,
            1 => PlaybackState::Configured,
            2 => PlaybackState::Playing,
            3 => PlaybackState::Paused,
            4 => PlaybackState::Trick,
            _ => PlaybackState::Stopped,
        }
    }
}

/// Trick-play mode.
///
/// The wire representation uses the driver's bit flags (0x00, 0x01, 0x02)
/// but only these three values are legal; this is a closed enumeration,
/// not a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrickMode {
    #[default]
    None = 0x00,
    IFrameOnly = 0x01,
    FastForwardFastBackward = 0x02,
}

impl TryFrom<u8> for TrickMode {
    type Error = PlayerError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(TrickMode::None),
            0x01 => Ok(TrickMode::IFrameOnly),
            0x02 => Ok(TrickMode::FastForwardFastBackward),
            _ => Err(PlayerError::InvalidParameter(format!(
                "trick mode flags {:#04x}",
                value
            ))),
        }
    }
}

/// Tracks the current trick mode and the state to restore when trick play
/// ends.
///
/// Invariant: the mode is `None` whenever the engine is outside the Trick
/// state.
#[derive(Debug, Default)]
pub struct TrickPlayController {
    mode: TrickMode,
    resume: Option<PlaybackState>,
}

impl TrickPlayController {
    pub fn mode(&self) -> TrickMode {
        self.mode
    }

    /// Enters fast forward/backward, remembering `prior` (Playing or
    /// Paused) for `leave_fast`.
    pub fn enter_fast(&mut self, prior: PlaybackState) {
        self.mode = TrickMode::FastForwardFastBackward;
        self.resume = Some(prior);
    }

    /// State that `leave_fast` will restore, without consuming the memo.
    /// Lets callers issue fallible pipeline commands first and keep the
    /// memo intact for a retry when one is rejected.
    pub fn resume_target(&self) -> PlaybackState {
        self.resume.unwrap_or(PlaybackState::Playing)
    }

    /// Leaves trick play and returns the state held before `enter_fast`.
    pub fn leave_fast(&mut self) -> PlaybackState {
        self.mode = TrickMode::None;
        self.resume.take().unwrap_or(PlaybackState::Playing)
    }

    /// Drops trick state without restoring (pause from Trick, stop).
    pub fn clear(&mut self) {
        self.mode = TrickMode::None;
        self.resume = None;
    }
}
