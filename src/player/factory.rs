use crate::error::{PlayerError, Result};
use crate::pipeline::{DecodePipeline, StubPipeline, SurfaceHandle};
use crate::player::engine::{PlaybackEngine, TsPlayer};
use lazy_static::lazy_static;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

struct Registry {
    engine: Option<Arc<PlaybackEngine>>,
    pipeline: Option<Box<dyn DecodePipeline>>,
    surface: Option<SurfaceHandle>,
}

lazy_static! {
    static ref REGISTRY: Mutex<Registry> = Mutex::new(Registry {
        engine: None,
        pipeline: None,
        surface: None,
    });
}

/// Returns the one playback engine for this process, creating it on first
/// access. The first-use race is resolved by the registry lock: exactly
/// one engine is ever built.
///
/// The engine is wired to the pipeline registered via
/// [`install_pipeline`], or to a [`StubPipeline`] when none was installed.
/// A surface previously registered with [`set_surface`] is bound during
/// creation.
pub fn ts_player() -> Arc<dyn TsPlayer> {
    let mut registry = REGISTRY.lock();
    if let Some(engine) = &registry.engine {
        return Arc::clone(engine) as Arc<dyn TsPlayer>;
    }
    let pipeline = registry
        .pipeline
        .take()
        .unwrap_or_else(StubPipeline::boxed);
    let engine = Arc::new(PlaybackEngine::new(pipeline));
    if let Some(surface) = registry.surface {
        // A pipeline rejection leaves the engine unbound and the surface
        // registered, so a later set_surface can retry the bind.
        if let Err(e) = engine.bind_surface(surface) {
            warn!("surface bind deferred: {}", e);
        }
    }
    info!("playback engine created");
    registry.engine = Some(Arc::clone(&engine));
    engine as Arc<dyn TsPlayer>
}

/// Registers the vendor decode pipeline the engine will drive. Must be
/// called before the first [`ts_player`] access.
pub fn install_pipeline(pipeline: Box<dyn DecodePipeline>) -> Result<()> {
    let mut registry = REGISTRY.lock();
    if registry.engine.is_some() {
        return Err(PlayerError::InvalidState(
            "pipeline installed after engine creation".into(),
        ));
    }
    registry.pipeline = Some(pipeline);
    Ok(())
}

/// Attaches the platform display surface, independent of engine creation
/// order. Must precede any `video_show`. When the engine already exists
/// the surface is bound immediately, subject to the one-binding rule.
pub fn set_surface(surface: SurfaceHandle) -> Result<()> {
    let mut registry = REGISTRY.lock();
    if let Some(engine) = &registry.engine {
        engine.bind_surface(surface)?;
    }
    registry.surface = Some(surface);
    Ok(())
}

/// Stops the engine if one exists and drops the singleton, along with any
/// registered pipeline and surface.
pub fn shutdown() {
    let mut registry = REGISTRY.lock();
    if let Some(engine) = registry.engine.take() {
        let _ = engine.stop();
        info!("playback engine shut down");
    }
    registry.pipeline = None;
    registry.surface = None;
}
