use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use gaze_core::PipelineConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// File name of the settings file inside the base directory.
pub const SETTINGS_FILE: &str = "settings.toml";

/// Default base directory for settings and the stats database.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".gaze-gallery")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Pipeline tunables loaded from TOML.
///
/// ```toml
/// [gaze]
/// min_confidence = 0.6
///
/// [resolver]
/// max_distance = 10.0
/// plane_miss = "absorb"
///
/// [dwell]
/// pre_hold_secs = 2.0
/// fill_secs = 3.0
/// rearm = "require_exit"
///
/// [scene.layout]
/// columns = 3
/// ```
///
/// Every table and key is optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    pub pipeline: PipelineConfig,
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StoreError::InvalidData(format!("failed to read {}: {e}", path.display()))
        })?;
        let settings = Self::from_toml(&content)?;
        tracing::info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Explicit `path` must exist. Otherwise `<base>/settings.toml` is used
    /// when present, defaults when not.
    pub fn resolve(path: Option<&Path>, base_dir: &Path) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = base_dir.join(SETTINGS_FILE);
        if default_path.is_file() {
            Self::load(&default_path)
        } else {
            tracing::debug!("no settings file at {}; using defaults", default_path.display());
            Ok(Self::default())
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let p = &self.pipeline;
        let min_conf = p.gaze.min_confidence;
        if !(0.0..=1.0).contains(&min_conf) {
            return Err(invalid(format!(
                "gaze.min_confidence must be within [0, 1], got {min_conf}"
            )));
        }
        if !(p.dwell.pre_hold_secs.is_finite() && p.dwell.pre_hold_secs >= 0.0) {
            return Err(invalid(format!(
                "dwell.pre_hold_secs must be a non-negative number, got {}",
                p.dwell.pre_hold_secs
            )));
        }
        if !(p.dwell.fill_secs.is_finite() && p.dwell.fill_secs > 0.0) {
            return Err(invalid(format!(
                "dwell.fill_secs must be positive, got {}",
                p.dwell.fill_secs
            )));
        }
        if !(p.resolver.max_distance.is_finite() && p.resolver.max_distance > 0.0) {
            return Err(invalid(format!(
                "resolver.max_distance must be positive, got {}",
                p.resolver.max_distance
            )));
        }
        if !(p.highlight.scale_up > 0.0 && p.highlight.lerp_speed >= 0.0) {
            return Err(invalid(
                "highlight.scale_up must be positive and lerp_speed non-negative".into(),
            ));
        }
        if p.scene.layout.columns == 0 {
            return Err(invalid("scene.layout.columns must be at least 1".into()));
        }
        if p.scene.surface.axes().is_none() || !(p.scene.surface.scale > 0.0) {
            return Err(invalid(
                "scene.surface needs non-parallel axes and a positive scale".into(),
            ));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> StoreError {
    StoreError::InvalidData(msg)
}
