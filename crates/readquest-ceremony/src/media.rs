//! Audio narration port and the global stop-all-audio bus.
//!
//! Playback is best-effort: a missing asset or a device error never stops
//! a ceremony.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

/// Errors a narration player may report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    /// The asset does not exist.
    #[error("audio asset not found: {0}")]
    NotFound(String),

    /// The asset exists but could not be played.
    #[error("playback failed: {0}")]
    Playback(String),
}

/// A playing sound.
pub trait PlaybackHandle: Send + Sync {
    /// Stops playback. Calling it more than once is harmless.
    fn stop(&self);
}

/// Plays narration assets.
#[async_trait]
pub trait NarrationPlayer: Send + Sync {
    /// Starts playing `asset` and returns a handle to stop it.
    async fn play(&self, asset: &str) -> Result<Box<dyn PlaybackHandle>, MediaError>;
}

/// Narration asset for a completed level.
#[must_use]
pub fn level_narration_asset(level: u32) -> String {
    format!("audio/levels/level-{level}-complete.mp3")
}

/// Owns at most one playback and stops it when released or dropped.
#[derive(Default)]
pub struct OwnedPlayback {
    handle: Option<Box<dyn PlaybackHandle>>,
}

impl OwnedPlayback {
    /// Takes ownership of `handle`, stopping any previous playback.
    pub fn replace(&mut self, handle: Box<dyn PlaybackHandle>) {
        self.release();
        self.handle = Some(handle);
    }

    /// Whether a playback is currently held.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops and forgets the held playback, if any.
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

impl Drop for OwnedPlayback {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for OwnedPlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedPlayback")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Signals carried by the [`AudioBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSignal {
    /// Every owner must release its playback.
    StopAll,
}

/// Process-wide broadcast every playback owner listens on.
#[derive(Debug, Clone)]
pub struct AudioBus {
    sender: broadcast::Sender<AudioSignal>,
}

impl AudioBus {
    /// Creates a bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    /// Subscribes to future signals.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AudioSignal> {
        self.sender.subscribe()
    }

    /// Asks every owner to stop; returns how many listeners were reached.
    pub fn stop_all(&self) -> usize {
        self.sender.send(AudioSignal::StopAll).unwrap_or_else(|_| {
            debug!("stop-all sent with no listeners");
            0
        })
    }
}

impl Default for AudioBus {
    fn default() -> Self {
        Self::new()
    }
}
