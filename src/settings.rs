//! Game settings and tuning
//!
//! Loaded from an optional JSON file; any field left out keeps its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::GameError;

/// Window / frame pacing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Throttle target; the loop sleeps when a frame finishes early
    pub target_fps: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            title: WINDOW_TITLE.to_string(),
            target_fps: TARGET_FPS,
        }
    }
}

/// Gameplay tuning handed to entities and states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gameplay {
    pub initial_lives: u32,
    /// Milliseconds the game-over banner stays before returning to the menu
    pub game_over_timeout_ms: i64,
    pub ball_launch_speed: f32,
    pub ball_max_speed: f32,
    pub paddle_max_speed: f32,
    pub paddle_accel_divisor: f32,
}

impl Default for Gameplay {
    fn default() -> Self {
        Self {
            initial_lives: INITIAL_LIVES,
            game_over_timeout_ms: GAME_OVER_TIMEOUT_MS,
            ball_launch_speed: BALL_LAUNCH_SPEED,
            ball_max_speed: BALL_MAX_SPEED,
            paddle_max_speed: PADDLE_MAX_SPEED,
            paddle_accel_divisor: PADDLE_ACCEL_DIVISOR,
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub display: DisplaySettings,
    pub gameplay: Gameplay,
    /// Seed for level layout
    pub seed: u64,
    /// Where the high-score table lives (in-memory only when unset)
    pub highscores_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display: DisplaySettings::default(),
            gameplay: Gameplay::default(),
            seed: 0x00A7_B10C,
            highscores_path: None,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON file
    pub fn load_from(path: &Path) -> Result<Self, GameError> {
        let json = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        Ok(settings.sanitized())
    }

    /// Load settings, falling back to defaults on any problem
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("Using default settings");
            return Self::default();
        };

        match Self::load_from(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save_to(&self, path: &Path) -> Result<(), GameError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Clamp values that would break the simulation
    fn sanitized(mut self) -> Self {
        let defaults = Gameplay::default();
        let g = &mut self.gameplay;
        if !(g.paddle_accel_divisor.is_finite() && g.paddle_accel_divisor > 0.0) {
            g.paddle_accel_divisor = defaults.paddle_accel_divisor;
        }
        for (value, fallback) in [
            (&mut g.ball_launch_speed, defaults.ball_launch_speed),
            (&mut g.ball_max_speed, defaults.ball_max_speed),
            (&mut g.paddle_max_speed, defaults.paddle_max_speed),
        ] {
            if !(value.is_finite() && *value >= 0.0) {
                *value = fallback;
            }
        }
        self.display.target_fps = self.display.target_fps.max(1);
        self
    }
}
