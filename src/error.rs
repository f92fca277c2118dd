use thiserror::Error;

/// Errors reported by the playback control surface.
///
/// The engine never panics on misuse; every control operation reports
/// failure through one of these variants. Backpressure on the data path is
/// not an error — `write` signals it with a partial accept count instead.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// Operation invoked while the state machine does not permit it.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed stream parameters or an out-of-range control value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The decode pipeline or its driver rejected the request.
    #[error("pipeline unavailable: {0}")]
    Unavailable(String),

    /// A display-dependent operation ran before `bind_surface`.
    #[error("display surface not bound")]
    SurfaceNotBound,
}

pub type Result<T> = std::result::Result<T, PlayerError>;
