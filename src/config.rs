// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

const ENV_PREFIX: &str = "GESTURE_PILOT__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Process camera frames at all.
    pub enabled: bool,
    /// Track the index fingertip as a pointer and allow click-through.
    pub enable_pointer: bool,
    /// Wrist displacement (normalized units) between frames that counts as a swipe.
    pub swipe_threshold: f64,
    /// Thumb-to-index distance (normalized units) under which the hand is pinching.
    pub pinch_threshold: f64,
    /// How long an emitted gesture stays current before reverting to none.
    pub dwell_ms: u64,
    pub scroll_throttle_ms: u64,
    /// Pixels per swipe scroll.
    pub scroll_amount: f64,
    pub click_cooldown_ms: u64,
    /// Nodes inspected when looking for something clickable under the pointer,
    /// the hit element included.
    pub click_search_depth: usize,
    pub press_feedback_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_pointer: true,
            swipe_threshold: 0.12,
            pinch_threshold: 0.08,
            dwell_ms: 800,
            scroll_throttle_ms: 400,
            scroll_amount: 250.0,
            click_cooldown_ms: 300,
            click_search_depth: 5,
            press_feedback_ms: 150,
        }
    }
}

impl GestureConfig {
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn scroll_throttle(&self) -> Duration {
        Duration::from_millis(self.scroll_throttle_ms)
    }

    pub fn click_cooldown(&self) -> Duration {
        Duration::from_millis(self.click_cooldown_ms)
    }

    pub fn press_feedback(&self) -> Duration {
        Duration::from_millis(self.press_feedback_ms)
    }

    /// Defaults, then the JSON file (explicit path, or `config.json` in the
    /// platform config dir when it exists), then `GESTURE_PILOT__*` env vars.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_overrides(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading gesture config from {}", path.display());
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `GESTURE_PILOT__<FIELD>` pairs; unrelated variables are ignored.
    pub fn apply_overrides<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(field) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let field = field.to_ascii_lowercase();
            let bad = || ConfigError::InvalidOverride {
                key: key.clone(),
                value: value.clone(),
            };

            match field.as_str() {
                "enabled" => self.enabled = parse_bool(&value).ok_or_else(bad)?,
                "enable_pointer" => self.enable_pointer = parse_bool(&value).ok_or_else(bad)?,
                "swipe_threshold" => self.swipe_threshold = value.parse().map_err(|_| bad())?,
                "pinch_threshold" => self.pinch_threshold = value.parse().map_err(|_| bad())?,
                "dwell_ms" => self.dwell_ms = value.parse().map_err(|_| bad())?,
                "scroll_throttle_ms" => self.scroll_throttle_ms = value.parse().map_err(|_| bad())?,
                "scroll_amount" => self.scroll_amount = value.parse().map_err(|_| bad())?,
                "click_cooldown_ms" => self.click_cooldown_ms = value.parse().map_err(|_| bad())?,
                "click_search_depth" => self.click_search_depth = value.parse().map_err(|_| bad())?,
                "press_feedback_ms" => self.press_feedback_ms = value.parse().map_err(|_| bad())?,
                _ => debug!("Ignoring unknown override {}", key),
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be positive, got {v}")))
            }
        };
        positive("swipe_threshold", self.swipe_threshold)?;
        positive("pinch_threshold", self.pinch_threshold)?;
        positive("scroll_amount", self.scroll_amount)?;

        if self.dwell_ms == 0 {
            return Err(ConfigError::Invalid("dwell_ms must be non-zero".into()));
        }
        if self.click_search_depth == 0 {
            return Err(ConfigError::Invalid(
                "click_search_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "gesture-pilot").map(|dirs| dirs.config_dir().join("config.json"))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
