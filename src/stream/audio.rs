use crate::error::{PlayerError, Result};
use crate::stream::types::AudioParams;

/// Volume domain accepted by `set_volume`; out-of-range input is clamped.
pub const VOLUME_MIN: i32 = 0;
pub const VOLUME_MAX: i32 = 100;

/// Channel routing for the audio output.
///
/// Raw control values: 0 = stereo, 1 = left only, 2 = right only. Anything
/// else is rejected, not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioBalance {
    #[default]
    Stereo = 0,
    Left = 1,
    Right = 2,
}

impl TryFrom<i32> for AudioBalance {
    type Error = PlayerError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(AudioBalance::Stereo),
            1 => Ok(AudioBalance::Left),
            2 => Ok(AudioBalance::Right),
            _ => Err(PlayerError::InvalidParameter(format!(
                "audio balance {}",
                value
            ))),
        }
    }
}

/// Audio-side configuration: decode parameters plus output routing.
///
/// The decode parameters carry the engine-owned copy of the codec
/// extra-data; replacing them drops the previous copy.
#[derive(Debug)]
pub struct AudioPipelineConfig {
    params: Option<AudioParams>,
    volume: i32,
    balance: AudioBalance,
}

impl Default for AudioPipelineConfig {
    fn default() -> Self {
        Self {
            params: None,
            volume: VOLUME_MAX,
            balance: AudioBalance::Stereo,
        }
    }
}

impl AudioPipelineConfig {
    pub fn set_params(&mut self, params: AudioParams) -> Result<()> {
        params.validate()?;
        self.params = Some(params);
        Ok(())
    }

    pub fn params(&self) -> Option<&AudioParams> {
        self.params.as_ref()
    }

    pub fn clear_params(&mut self) {
        self.params = None;
    }

    pub fn is_configured(&self) -> bool {
        self.params.is_some()
    }

    /// Clamps into `VOLUME_MIN..=VOLUME_MAX` and returns the stored value.
    pub fn set_volume(&mut self, volume: i32) -> i32 {
        self.volume = volume.clamp(VOLUME_MIN, VOLUME_MAX);
        self.volume
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }

    pub fn set_balance(&mut self, balance: AudioBalance) {
        self.balance = balance;
    }

    pub fn balance(&self) -> AudioBalance {
        self.balance
    }
}
