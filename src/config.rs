//! Transition tuning, loaded once at startup
//!
//! Stored as TOML at `~/.local/state/flick/transitions.toml`. Every section
//! and field is optional; missing values take the defaults below.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::state::FixedGeometry;

/// Feature switches, read by reference wherever behaviour is optional
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Dwell mid-swipe peeks the overview, releasing while paused opens it
    pub pause_to_overview: bool,
    pub haptics: bool,
    /// Staggered row animation when settling back home
    pub staggered_home: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            pause_to_overview: true,
            haptics: true,
            staggered_home: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionPauseConfig {
    /// Below this speed (px/ms) the finger counts as slow
    pub pause_speed_threshold: f32,
    /// Speed (px/ms) needed to leave the paused state
    pub resume_speed_threshold: f32,
    /// How long the finger must stay slow before pausing
    pub pause_duration_ms: u64,
    /// No samples for this long while dragging forces a pause
    pub force_pause_timeout_ms: u64,
}

impl Default for MotionPauseConfig {
    fn default() -> Self {
        Self {
            pause_speed_threshold: 0.1,
            resume_speed_threshold: 1.0,
            pause_duration_ms: 100,
            force_pause_timeout_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Minimum movement before a drag starts, also the lower pause band
    pub touch_slop: f32,
    /// Upper pause band as a fraction of screen height
    pub max_displacement_percent: f32,
    pub peek_in_duration_ms: u64,
    pub peek_out_duration_ms: u64,
    pub pause_to_overview_duration_ms: u64,
    pub settle_base_duration_ms: u64,
    pub settle_min_duration_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            touch_slop: 24.0,
            max_displacement_percent: 0.75,
            peek_in_duration_ms: 240,
            peek_out_duration_ms: 100,
            pause_to_overview_duration_ms: 300,
            settle_base_duration_ms: 1200,
            settle_min_duration_ms: 100,
        }
    }
}

/// Thresholds deciding where a released swipe settles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Release speed (px/ms) counted as a fling
    pub fling_velocity_threshold: f32,
    /// Progress past which a slow release commits to the target
    pub commit_progress_threshold: f32,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            fling_velocity_threshold: 1.0,
            commit_progress_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaggeredConfig {
    pub row_duration_ms: u64,
    /// Delay between consecutive rows
    pub row_stagger_ms: u64,
    pub scrim_fade_ms: u64,
}

impl Default for StaggeredConfig {
    fn default() -> Self {
        Self {
            row_duration_ms: 350,
            row_stagger_ms: 40,
            scrim_fade_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub features: FeatureFlags,
    pub motion_pause: MotionPauseConfig,
    pub gesture: GestureConfig,
    pub resolution: ResolutionConfig,
    pub staggered: StaggeredConfig,
    /// Geometry used by the demo runner
    pub display: FixedGeometry,
}

impl TransitionConfig {
    pub fn config_path() -> Option<PathBuf> {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".local/state/flick/transitions.toml"))
    }

    /// Load from `path` (or the default location), defaults when missing
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::config_path) {
            Some(path) => path,
            None => {
                tracing::info!("No HOME set, using default transition config");
                return Ok(Self::default());
            }
        };

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No transition config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded transition config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let mp = &self.motion_pause;
        if mp.pause_speed_threshold <= 0.0 {
            return Err(Error::InvalidConfig(
                "motion_pause.pause_speed_threshold must be positive".into(),
            ));
        }
        if mp.resume_speed_threshold <= mp.pause_speed_threshold {
            return Err(Error::InvalidConfig(format!(
                "motion_pause.resume_speed_threshold ({}) must exceed pause_speed_threshold ({})",
                mp.resume_speed_threshold, mp.pause_speed_threshold
            )));
        }

        let percent = self.gesture.max_displacement_percent;
        if !(percent > 0.0 && percent <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "gesture.max_displacement_percent ({}) must be in (0, 1]",
                percent
            )));
        }

        let commit = self.resolution.commit_progress_threshold;
        if !(0.0..=1.0).contains(&commit) {
            return Err(Error::InvalidConfig(format!(
                "resolution.commit_progress_threshold ({}) must be in [0, 1]",
                commit
            )));
        }

        if self.display.height <= 0.0 || self.display.swipe_height <= 0.0 {
            return Err(Error::InvalidConfig(
                "display.height and display.swipe_height must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(TransitionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = TransitionConfig::from_toml_str(
            r#"
            [features]
            haptics = false

            [motion_pause]
            pause_duration_ms = 150
            "#,
        )
        .unwrap();
        assert!(!config.features.haptics);
        assert!(config.features.pause_to_overview);
        assert_eq!(config.motion_pause.pause_duration_ms, 150);
        assert_eq!(config.motion_pause.resume_speed_threshold, 1.0);
        assert_eq!(config.gesture, GestureConfig::default());
    }

    #[test]
    fn test_rejects_inverted_hysteresis() {
        let err = TransitionConfig::from_toml_str(
            r#"
            [motion_pause]
            pause_speed_threshold = 0.5
            resume_speed_threshold = 0.5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_bad_percent() {
        let mut config = TransitionConfig::default();
        config.gesture.max_displacement_percent = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error() {
        let err = TransitionConfig::from_toml_str("[gesture\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("flick-transitions-no-such-config.toml");
        let config = TransitionConfig::load(Some(&path)).unwrap();
        assert_eq!(config, TransitionConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = TransitionConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(TransitionConfig::from_toml_str(&text).unwrap(), config);
    }
}
