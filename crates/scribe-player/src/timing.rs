//! Animation speed, per-replay timing, and the pacing abstraction.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// User-facing animation speed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl AnimationSpeed {
    /// Delay between two typed or deleted characters.
    pub fn typing_delay(self) -> Duration {
        match self {
            Self::Slow => Duration::from_millis(25),
            Self::Normal => Duration::from_millis(10),
            Self::Fast => Duration::from_millis(5),
        }
    }

    /// Coarser pause used around whole file operations by orchestration code.
    pub fn operation_pause(self) -> Duration {
        match self {
            Self::Slow => Duration::from_millis(1000),
            Self::Normal => Duration::from_millis(500),
            Self::Fast => Duration::from_millis(200),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Normal => "normal",
            Self::Fast => "fast",
        }
    }
}

impl fmt::Display for AnimationSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown animation speed '{0}' (expected slow, normal or fast)")]
pub struct ParseSpeedError(pub String);

impl FromStr for AnimationSpeed {
    type Err = ParseSpeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(Self::Slow),
            "normal" => Ok(Self::Normal),
            "fast" => Ok(Self::Fast),
            _ => Err(ParseSpeedError(s.to_string())),
        }
    }
}

/// Timing for one replay call. Copied into the player and never mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationTiming {
    /// When `false` the player writes the target text in one edit.
    pub enabled: bool,
    pub per_unit_delay: Duration,
}

impl AnimationTiming {
    pub fn new(enabled: bool, per_unit_delay: Duration) -> Self {
        Self {
            enabled,
            per_unit_delay,
        }
    }

    pub fn from_speed(enabled: bool, speed: AnimationSpeed) -> Self {
        Self::new(enabled, speed.typing_delay())
    }

    /// Animated, but without waiting between units.
    pub fn instant() -> Self {
        Self::new(true, Duration::ZERO)
    }

    pub fn disabled() -> Self {
        Self::new(false, Duration::ZERO)
    }

    /// Pause taken once per unchanged run.
    pub fn equal_pause(&self) -> Duration {
        self.per_unit_delay / 5
    }
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self::from_speed(true, AnimationSpeed::default())
    }
}

/// Suspends the replay between steps.
///
/// The player never sleeps directly so that hosts can drive it from their
/// own timer and tests can observe pacing without waiting.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// [`Pacer`] backed by `tokio::time::sleep`.
///
/// A zero delay still yields to the scheduler so other tasks make progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
    }
}
