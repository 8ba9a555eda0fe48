//! Executor settings, loadable from a TOML file.
//!
//! Missing keys fall back to their defaults: animation on at normal speed,
//! and execution continuing past failed operations.

use std::path::Path;
use std::time::Duration;

use scribe_player::{AnimationSpeed, AnimationTiming};
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};

/// Animation settings as the user configures them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub enabled: bool,
    pub speed: AnimationSpeed,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: AnimationSpeed::Normal,
        }
    }
}

impl AnimationSettings {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Per-character timing handed to the player.
    pub fn timing(&self) -> AnimationTiming {
        AnimationTiming::from_speed(self.enabled, self.speed)
    }

    /// Pause between whole file operations; zero when animation is off.
    pub fn operation_pause(&self) -> Duration {
        if self.enabled {
            self.speed.operation_pause()
        } else {
            Duration::ZERO
        }
    }
}

/// Configuration for the [`PlanExecutor`](crate::PlanExecutor).
///
/// Loaded from TOML:
///
/// ```toml
/// continue_on_error = true
///
/// [animation]
/// enabled = true
/// speed = "fast"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub animation: AnimationSettings,
    /// Keep applying later operations after one fails.
    pub continue_on_error: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            animation: AnimationSettings::default(),
            continue_on_error: true,
        }
    }
}

impl ExecutorConfig {
    pub fn from_toml_str(s: &str) -> PlanResult<Self> {
        toml::from_str(s).map_err(|e| PlanError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> PlanResult<String> {
        toml::to_string_pretty(self).map_err(|e| PlanError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> PlanResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PlanError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ExecutorConfig::default();
        assert!(c.animation.enabled);
        assert_eq!(c.animation.speed, AnimationSpeed::Normal);
        assert!(c.continue_on_error);
        assert_eq!(c.animation.timing().per_unit_delay, Duration::from_millis(10));
        assert_eq!(c.animation.operation_pause(), Duration::from_millis(500));
    }

    #[test]
    fn parses_partial_toml() {
        let c = ExecutorConfig::from_toml_str("[animation]\nspeed = \"fast\"\n").unwrap();
        assert!(c.animation.enabled);
        assert_eq!(c.animation.speed, AnimationSpeed::Fast);
        assert!(c.continue_on_error);
    }

    #[test]
    fn unknown_speed_is_config_error() {
        let err = ExecutorConfig::from_toml_str("[animation]\nspeed = \"ludicrous\"\n").unwrap_err();
        assert!(matches!(err, PlanError::Config(_)));
    }

    #[test]
    fn disabled_animation_has_no_pauses() {
        let settings = AnimationSettings::disabled();
        assert!(!settings.timing().enabled);
        assert_eq!(settings.operation_pause(), Duration::ZERO);
    }

    #[test]
    fn toml_round_trip() {
        let c = ExecutorConfig {
            animation: AnimationSettings {
                enabled: false,
                speed: AnimationSpeed::Slow,
            },
            continue_on_error: false,
        };
        let back = ExecutorConfig::from_toml_str(&c.to_toml_string().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scribe.toml");
        std::fs::write(&path, "continue_on_error = false\n").unwrap();
        let c = ExecutorConfig::load(&path).unwrap();
        assert!(!c.continue_on_error);

        assert!(matches!(
            ExecutorConfig::load(&dir.path().join("missing.toml")),
            Err(PlanError::Config(_))
        ));
    }
}
