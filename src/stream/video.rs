use crate::error::{PlayerError, Result};
use crate::stream::types::VideoParams;

/// Aspect-ratio / scaling policy for the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatioMode {
    /// Keep the stream's native aspect ratio.
    #[default]
    Original = 0,
    /// Stretch to fill the video window.
    FullStretch = 1,
    /// Fit with black bars.
    Letterbox = 2,
}

impl TryFrom<i32> for RatioMode {
    type Error = PlayerError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(RatioMode::Original),
            1 => Ok(RatioMode::FullStretch),
            2 => Ok(RatioMode::Letterbox),
            _ => Err(PlayerError::InvalidParameter(format!(
                "ratio mode {}",
                value
            ))),
        }
    }
}

/// On-screen video window geometry, in EPG canvas coordinates when the
/// pipeline scales in software.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Result<Self> {
        if width < 0 || height < 0 {
            return Err(PlayerError::InvalidParameter(format!(
                "window {}x{}",
                width, height
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }
}

/// Presentation-side video configuration.
///
/// Holds the requested decode parameters plus the compositor state the
/// application may mutate at any time: window rectangle, color-key
/// punch-through, visibility, scaling policy, and the EPG overlay canvas
/// the window coordinates are expressed in.
#[derive(Debug)]
pub struct VideoPipelineConfig {
    params: Option<VideoParams>,
    window: WindowRect,
    color_key: Option<u16>,
    visible: bool,
    ratio: RatioMode,
    epg_size: (i32, i32),
}

impl Default for VideoPipelineConfig {
    fn default() -> Self {
        Self {
            params: None,
            window: WindowRect::default(),
            color_key: None,
            visible: false,
            ratio: RatioMode::Original,
            epg_size: (0, 0),
        }
    }
}

impl VideoPipelineConfig {
    /// Stores validated decode parameters. Last write wins until playback
    /// starts; the engine gates calls after that.
    pub fn set_params(&mut self, params: VideoParams) -> Result<()> {
        params.validate()?;
        self.params = Some(params);
        Ok(())
    }

    pub fn params(&self) -> Option<&VideoParams> {
        self.params.as_ref()
    }

    pub fn clear_params(&mut self) {
        self.params = None;
    }

    pub fn is_configured(&self) -> bool {
        self.params.is_some()
    }

    pub fn set_window(&mut self, rect: WindowRect) {
        self.window = rect;
    }

    pub fn window(&self) -> WindowRect {
        self.window
    }

    /// `key565` is an RGB565-packed punch-through value; `None` disables
    /// color keying.
    pub fn set_color_key(&mut self, key: Option<u16>) {
        self.color_key = key;
    }

    pub fn color_key(&self) -> Option<u16> {
        self.color_key
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_ratio(&mut self, ratio: RatioMode) {
        self.ratio = ratio;
    }

    pub fn ratio(&self) -> RatioMode {
        self.ratio
    }

    pub fn set_epg_size(&mut self, width: i32, height: i32) {
        self.epg_size = (width, height);
    }

    pub fn epg_size(&self) -> (i32, i32) {
        self.epg_size
    }

    /// Requested resolution, before the stream's real resolution is known.
    pub fn requested_pixels(&self) -> (i32, i32) {
        self.params
            .as_ref()
            .map(|p| (p.width, p.height))
            .unwrap_or((0, 0))
    }
}
