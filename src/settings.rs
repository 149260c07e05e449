//! Game settings and preferences
//!
//! Persisted as JSON next to the level files; a missing or unreadable file
//! falls back to defaults.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::input::HoverConfig;

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // === Visual Effects ===
    /// Ball trail
    pub trails: bool,
    /// Particle effects (brick explosions, impact sparks)
    pub particles: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Input ===
    /// Milliseconds the mouse must rest on a target before hover fires
    pub hover_delay_ms: u64,
    /// Milliseconds of further rest before the hover times out
    pub hover_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trails: true,
            particles: true,
            show_fps: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            hover_delay_ms: 1000,
            hover_timeout_ms: 2000,
        }
    }
}

impl Settings {
    /// Load from a JSON file, falling back to defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    log::warn!("settings file {} is invalid: {err}", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("no settings file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }

    /// Hover tuning for the input dispatcher.
    pub fn hover_config(&self) -> HoverConfig {
        HoverConfig {
            delay_ms: self.hover_delay_ms,
            timeout_ms: self.hover_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings {
            show_fps: true,
            master_volume: 0.5,
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert!(back.show_fps);
        assert_eq!(back.master_volume, 0.5);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load_or_default(Path::new("/nonexistent/settings.json"));
        assert_eq!(settings.hover_delay_ms, 1000);
        assert!(settings.trails);
    }
}
