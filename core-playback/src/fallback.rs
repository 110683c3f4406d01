//! # Playback Fallback Orchestrator
//!
//! Sequences the recovery tiers after the playback surface reports that it
//! cannot render an asset:
//!
//! ```text
//! Idle ──assign──▶ NativeAttempt ──error signal──▶ Repairing ──ok──▶ Ready
//!                                                      │
//!                                                      └─err─▶ Transcoding ──ok──▶ Ready
//!                                                                   │
//!                                                                   └─err─▶ Failed
//! ```
//!
//! `Ready` and `Failed` are terminal for an asset; only a new [`assign`] or
//! [`teardown`] moves the machine again. Each tier runs at most once per
//! asset.
//!
//! ## Generations
//!
//! Every assignment and teardown bumps an [`AssetGeneration`]. Error signals
//! and decode results carrying an older generation are dropped, so a slow
//! transcode of a previous asset can never replace the current one.
//!
//! ## Resources
//!
//! Playable resources live in [`PlayableResource`] guards that release
//! themselves on drop. The orchestrator holds at most one at a time and
//! swapping it is a plain assignment, so every acquire is matched by exactly
//! one release on every path.
//!
//! [`assign`]: PlaybackFallback::assign
//! [`teardown`]: PlaybackFallback::teardown

use crate::config::FallbackConfig;
use crate::container::CanonicalContainer;
use crate::error::{PlaybackError, RepairError, Result, TranscodeError};
use crate::repair::HeaderRepair;
use crate::transcode::Transcoder;
use crate::traits::{AudioDecoder, SourceAsset};
use bridge_traits::{PlaybackSurface, ResourceUrl};
use bytes::Bytes;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

// ============================================================================
// State
// ============================================================================

/// Where the orchestrator is in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    /// No asset assigned.
    Idle,
    /// The surface is playing (or trying to play) the unmodified bytes.
    NativeAttempt,
    /// Header repair in progress.
    Repairing,
    /// Full decode and re-encode in progress.
    Transcoding,
    /// A repaired or transcoded resource is installed on the surface.
    Ready,
    /// Every tier failed; the error message is set.
    Failed,
}

impl PlaybackState {
    /// `Ready` and `Failed` end the chain for the current asset.
    pub fn is_terminal(self) -> bool {
        matches!(self, PlaybackState::Ready | PlaybackState::Failed)
    }

    /// A tier is running.
    pub fn is_recovering(self) -> bool {
        matches!(self, PlaybackState::Repairing | PlaybackState::Transcoding)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::NativeAttempt => "native-attempt",
            PlaybackState::Repairing => "repairing",
            PlaybackState::Transcoding => "transcoding",
            PlaybackState::Ready => "ready",
            PlaybackState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Monotonic tag of one asset assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssetGeneration(u64);

impl AssetGeneration {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for AssetGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Playable Resource
// ============================================================================

/// A resource acquired from the playback surface, released on drop.
pub struct PlayableResource {
    surface: Arc<dyn PlaybackSurface>,
    url: ResourceUrl,
}

impl PlayableResource {
    /// Register `data` with the surface.
    pub fn acquire(
        surface: Arc<dyn PlaybackSurface>,
        data: Bytes,
        media_type: &str,
    ) -> Result<Self> {
        let url = surface.create_resource(data, media_type)?;
        debug!(url = %url, media_type, "Acquired playable resource");
        Ok(Self { surface, url })
    }

    pub fn url(&self) -> &ResourceUrl {
        &self.url
    }

    /// Point the surface at this resource.
    pub fn load(&self) -> Result<()> {
        Ok(self.surface.load(&self.url)?)
    }
}

impl fmt::Debug for PlayableResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayableResource")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl Drop for PlayableResource {
    fn drop(&mut self) {
        debug!(url = %self.url, "Releasing playable resource");
        self.surface.release_resource(&self.url);
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

struct Inner {
    state: PlaybackState,
    generation: AssetGeneration,
    asset: Option<SourceAsset>,
    resource: Option<PlayableResource>,
    error_message: Option<String>,
}

impl Inner {
    fn is_current(&self, generation: AssetGeneration) -> bool {
        self.generation == generation
    }

    /// Stop playback, release the resource and invalidate in-flight work.
    fn reset(&mut self, surface: &dyn PlaybackSurface) {
        surface.stop();
        self.resource = None;
        self.asset = None;
        self.error_message = None;
        self.generation = self.generation.next();
        self.state = PlaybackState::Idle;
    }
}

/// Playback fallback state machine for one playback surface.
///
/// The host calls [`assign`](Self::assign) for every new asset and forwards
/// the surface's error signal to [`on_playback_error`](Self::on_playback_error).
/// Internal state sits behind a mutex that is never held across the decoder
/// call, so the host may reassign while a transcode is suspended.
///
/// The surface must not call back into the orchestrator synchronously from
/// its own methods.
pub struct PlaybackFallback {
    surface: Arc<dyn PlaybackSurface>,
    transcoder: Transcoder,
    config: FallbackConfig,
    inner: Mutex<Inner>,
}

impl PlaybackFallback {
    /// Create an orchestrator.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::InvalidConfig`] if `config` does not validate.
    pub fn new(
        surface: Arc<dyn PlaybackSurface>,
        decoder: Arc<dyn AudioDecoder>,
        config: FallbackConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            surface,
            transcoder: Transcoder::new(decoder),
            config,
            inner: Mutex::new(Inner {
                state: PlaybackState::Idle,
                generation: AssetGeneration::default(),
                asset: None,
                resource: None,
                error_message: None,
            }),
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.lock().state
    }

    pub fn generation(&self) -> AssetGeneration {
        self.inner.lock().generation
    }

    /// User-facing message, set once the chain has failed.
    pub fn error_message(&self) -> Option<String> {
        self.inner.lock().error_message.clone()
    }

    /// Reference currently installed on the surface.
    pub fn current_url(&self) -> Option<ResourceUrl> {
        self.inner
            .lock()
            .resource
            .as_ref()
            .map(|r| r.url().clone())
    }

    pub fn config(&self) -> &FallbackConfig {
        &self.config
    }

    /// Hand a new asset to the surface unmodified.
    ///
    /// Stops playback and releases the previous resource first. The returned
    /// generation identifies this asset in later error signals.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::Surface`] if the surface refuses to create or load the
    /// resource. The orchestrator is left `Idle` with nothing acquired.
    #[instrument(skip(self, asset), fields(len = asset.len(), media_type = ?asset.declared_media_type()))]
    pub fn assign(&self, asset: SourceAsset) -> Result<AssetGeneration> {
        let mut inner = self.inner.lock();
        inner.reset(self.surface.as_ref());
        let generation = inner.generation;

        let resource = PlayableResource::acquire(
            Arc::clone(&self.surface),
            asset.data().clone(),
            asset.declared_media_type().unwrap_or_default(),
        )?;
        resource.load()?;

        inner.asset = Some(asset);
        inner.resource = Some(resource);
        inner.state = PlaybackState::NativeAttempt;
        info!(%generation, "Assigned asset, attempting native playback");

        Ok(generation)
    }

    /// Stop playback and release everything. Any decode still in flight is
    /// discarded when it completes.
    pub fn teardown(&self) {
        let mut inner = self.inner.lock();
        inner.reset(self.surface.as_ref());
        debug!(generation = %inner.generation, "Torn down");
    }

    /// Handle the surface's error signal for `generation`.
    ///
    /// Runs the fallback chain once and returns the state it ended in. Signals
    /// for an older generation, or that arrive while the chain is running or
    /// finished, are ignored and the current state is returned unchanged.
    #[instrument(skip(self), fields(generation = %generation))]
    pub async fn on_playback_error(&self, generation: AssetGeneration) -> PlaybackState {
        let asset = {
            let mut inner = self.inner.lock();
            if !inner.is_current(generation) {
                debug!(current = %inner.generation, "Ignoring playback error for a replaced asset");
                return inner.state;
            }
            if inner.state.is_recovering() {
                debug!(state = %inner.state, "Fallback chain already running, ignoring playback error");
                return inner.state;
            }
            if inner.state != PlaybackState::NativeAttempt {
                debug!(state = %inner.state, "Ignoring playback error");
                return inner.state;
            }
            let Some(asset) = inner.asset.clone() else {
                return inner.state;
            };

            if asset.len() > self.config.max_source_bytes {
                let err = PlaybackError::SourceTooLarge {
                    size: asset.len(),
                    limit: self.config.max_source_bytes,
                };
                return self.fail(&mut inner, &err);
            }

            inner.state = PlaybackState::Repairing;
            asset
        };
        info!("Native playback failed, starting fallback chain");

        match self.run_repair(&asset) {
            Ok(container) => {
                let mut inner = self.inner.lock();
                if let Some(state) = self.install(&mut inner, generation, container) {
                    return state;
                }
            }
            Err(e) => debug!(error = %e, "Header repair not applicable, escalating"),
        }

        {
            let mut inner = self.inner.lock();
            if !inner.is_current(generation) {
                return inner.state;
            }
            inner.state = PlaybackState::Transcoding;
        }

        let result = self.run_transcode(&asset).await;

        let mut inner = self.inner.lock();
        if !inner.is_current(generation) {
            debug!(current = %inner.generation, "Discarding stale transcode result");
            return inner.state;
        }

        match result {
            Ok(container) => self
                .install(&mut inner, generation, container)
                .unwrap_or(inner.state),
            Err(e) => self.fail(&mut inner, &e.into()),
        }
    }

    fn run_repair(&self, asset: &SourceAsset) -> std::result::Result<CanonicalContainer, RepairError> {
        if !self.config.enable_header_repair {
            return Err(RepairError::Disabled);
        }
        HeaderRepair::repair(asset.data())
    }

    async fn run_transcode(
        &self,
        asset: &SourceAsset,
    ) -> std::result::Result<CanonicalContainer, TranscodeError> {
        if !self.config.enable_transcode {
            return Err(TranscodeError::Disabled);
        }
        self.transcoder.transcode(asset).await
    }

    /// Install `container` as the new resource and enter `Ready`.
    ///
    /// Returns `None` when the repaired bytes could not be installed so the
    /// caller escalates, `Some(state)` otherwise.
    fn install(
        &self,
        inner: &mut Inner,
        generation: AssetGeneration,
        container: CanonicalContainer,
    ) -> Option<PlaybackState> {
        if !inner.is_current(generation) {
            debug!("Discarding stale container");
            return Some(inner.state);
        }

        let installed = PlayableResource::acquire(
            Arc::clone(&self.surface),
            container.into_bytes(),
            &self.config.output_media_type,
        )
        .and_then(|resource| resource.load().map(|()| resource));

        match installed {
            Ok(resource) => {
                info!(url = %resource.url(), tier = %inner.state, "Installed recovered audio");
                // Replacing the guard releases the previous resource.
                inner.resource = Some(resource);
                inner.state = PlaybackState::Ready;
                Some(PlaybackState::Ready)
            }
            Err(e) => {
                warn!(error = %e, "Surface refused recovered audio");
                if inner.state == PlaybackState::Transcoding {
                    Some(self.fail(inner, &e))
                } else {
                    None
                }
            }
        }
    }

    fn fail(&self, inner: &mut Inner, cause: &PlaybackError) -> PlaybackState {
        error!(error = %cause, "Audio could not be recovered");
        inner.state = PlaybackState::Failed;
        inner.error_message = Some(self.config.unsupported_message.clone());
        PlaybackState::Failed
    }
}

impl Drop for PlaybackFallback {
    fn drop(&mut self) {
        self.inner.get_mut().reset(self.surface.as_ref());
    }
}

impl fmt::Debug for PlaybackFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PlaybackFallback")
            .field("state", &inner.state)
            .field("generation", &inner.generation)
            .field("resource", &inner.resource)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
