use crate::error::{OrbitError, Result};
use crate::game::judgment::JudgeWindows;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::Path;

/// Typed gameplay configuration, pre-populated with the shipping defaults
/// and optionally overridden from an INI file. Components receive a
/// reference to this rather than reaching into a process-wide blackboard.
#[derive(Debug, Clone)]
pub struct GameConfig {
    // Timing windows (seconds)
    pub perfect_threshold_seconds: f32,
    pub near_perfect_threshold_seconds: f32,
    pub accepted_threshold_seconds: f32,
    pub death_threshold_seconds: f32,
    /// Systemic audio latency compensation applied to beat queries.
    pub input_delay_seconds: f32,

    // Gameplay
    pub overload_threshold: i32,
    pub autoplay: bool,
    pub nofail: bool,
    /// Grace period after a state transition during which rearm taps are
    /// discarded.
    pub input_lock_seconds: f64,

    // Scoring
    pub perfect_multiplier: f32,
    pub near_perfect_multiplier: f32,
    pub non_perfect_multiplier: f32,
    pub checkpoint_score_penalty: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            perfect_threshold_seconds: 0.05,
            near_perfect_threshold_seconds: 0.25,
            accepted_threshold_seconds: 0.40,
            death_threshold_seconds: 0.40,
            input_delay_seconds: 0.0,
            overload_threshold: 5,
            autoplay: false,
            nofail: false,
            input_lock_seconds: 1.0,
            perfect_multiplier: 1.0,
            near_perfect_multiplier: 1.0,
            non_perfect_multiplier: 0.5,
            checkpoint_score_penalty: 0.9,
        }
    }
}

impl GameConfig {
    /// Loads configuration from an INI file. A missing or unreadable file
    /// is a hard failure; individual malformed values fall back to their
    /// defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        ini.load(path)
            .map_err(|e| OrbitError::Config(format!("failed to load {:?}: {}", path, e)))?;

        let defaults = Self::default();
        let mut config = Self::default();

        let float = |section: &str, key: &str, target: &mut f32, default: f32| {
            match ini.getfloat(section, key) {
                Ok(Some(value)) => *target = value as f32,
                Ok(None) => *target = default,
                Err(e) => {
                    warn!("Bad value for [{}] {}: {}; using default.", section, key, e);
                    *target = default;
                }
            }
        };

        float(
            "timing",
            "perfect_threshold_seconds",
            &mut config.perfect_threshold_seconds,
            defaults.perfect_threshold_seconds,
        );
        float(
            "timing",
            "near_perfect_threshold_seconds",
            &mut config.near_perfect_threshold_seconds,
            defaults.near_perfect_threshold_seconds,
        );
        float(
            "timing",
            "accepted_threshold_seconds",
            &mut config.accepted_threshold_seconds,
            defaults.accepted_threshold_seconds,
        );
        float(
            "timing",
            "death_threshold_seconds",
            &mut config.death_threshold_seconds,
            defaults.death_threshold_seconds,
        );
        float(
            "timing",
            "input_delay_seconds",
            &mut config.input_delay_seconds,
            defaults.input_delay_seconds,
        );
        float(
            "score",
            "perfect_multiplier",
            &mut config.perfect_multiplier,
            defaults.perfect_multiplier,
        );
        float(
            "score",
            "near_perfect_multiplier",
            &mut config.near_perfect_multiplier,
            defaults.near_perfect_multiplier,
        );
        float(
            "score",
            "non_perfect_multiplier",
            &mut config.non_perfect_multiplier,
            defaults.non_perfect_multiplier,
        );
        float(
            "score",
            "checkpoint_score_penalty",
            &mut config.checkpoint_score_penalty,
            defaults.checkpoint_score_penalty,
        );

        config.overload_threshold = match ini.getint("gameplay", "overload_threshold") {
            Ok(Some(value)) => value as i32,
            Ok(None) => defaults.overload_threshold,
            Err(e) => {
                warn!("Bad value for [gameplay] overload_threshold: {}; using default.", e);
                defaults.overload_threshold
            }
        };
        config.autoplay = match ini.getbool("gameplay", "autoplay") {
            Ok(Some(value)) => value,
            _ => defaults.autoplay,
        };
        config.nofail = match ini.getbool("gameplay", "nofail") {
            Ok(Some(value)) => value,
            _ => defaults.nofail,
        };
        config.input_lock_seconds = match ini.getfloat("gameplay", "input_lock_seconds") {
            Ok(Some(value)) => value,
            Ok(None) => defaults.input_lock_seconds,
            Err(e) => {
                warn!("Bad value for [gameplay] input_lock_seconds: {}; using default.", e);
                defaults.input_lock_seconds
            }
        };

        info!("Loaded game config from {:?}", path);
        Ok(config)
    }

    /// Loads from `path`, writing a default config file first if none
    /// exists.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("Config file not found, creating defaults at {:?}.", path);
            Self::default().write(path)?;
        }
        Self::load(path)
    }

    /// Writes this configuration out as an INI file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut ini = Ini::new();
        let mut set_f32 = |section: &str, key: &str, value: f32| {
            ini.set(section, key, Some(value.to_string()));
        };
        set_f32("timing", "perfect_threshold_seconds", self.perfect_threshold_seconds);
        set_f32(
            "timing",
            "near_perfect_threshold_seconds",
            self.near_perfect_threshold_seconds,
        );
        set_f32("timing", "accepted_threshold_seconds", self.accepted_threshold_seconds);
        set_f32("timing", "death_threshold_seconds", self.death_threshold_seconds);
        set_f32("timing", "input_delay_seconds", self.input_delay_seconds);
        set_f32("score", "perfect_multiplier", self.perfect_multiplier);
        set_f32("score", "near_perfect_multiplier", self.near_perfect_multiplier);
        set_f32("score", "non_perfect_multiplier", self.non_perfect_multiplier);
        set_f32("score", "checkpoint_score_penalty", self.checkpoint_score_penalty);

        ini.set(
            "gameplay",
            "overload_threshold",
            Some(self.overload_threshold.to_string()),
        );
        ini.set("gameplay", "autoplay", Some(self.autoplay.to_string()));
        ini.set("gameplay", "nofail", Some(self.nofail.to_string()));
        ini.set(
            "gameplay",
            "input_lock_seconds",
            Some(self.input_lock_seconds.to_string()),
        );

        ini.write(path)?;
        Ok(())
    }

    /// The judgement windows this configuration describes.
    pub fn judge_windows(&self) -> JudgeWindows {
        JudgeWindows {
            perfect: self.perfect_threshold_seconds,
            near_perfect: self.near_perfect_threshold_seconds,
            acceptable: self.accepted_threshold_seconds,
            death: self.death_threshold_seconds,
        }
    }
}
