//! Configuration file loading with precedence handling.

use super::{EngineConfig, OverscrollMode, StretchMode};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A resolved value is outside what the engine accepts.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted name of the offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/scrollcell/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// `[gesture]` table.
    #[serde(default)]
    pub gesture: Option<GestureSection>,

    /// `[scroll]` table.
    #[serde(default)]
    pub scroll: Option<ScrollSection>,

    /// `[thumb]` table.
    #[serde(default)]
    pub thumb: Option<ThumbSection>,

    /// `[grid]` table.
    #[serde(default)]
    pub grid: Option<GridSection>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// `[gesture]` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GestureSection {
    /// Overrides `touch_slop`.
    pub touch_slop: Option<f32>,
    /// Overrides `min_fling_velocity`.
    pub min_fling_velocity: Option<f32>,
    /// Overrides `max_fling_velocity`.
    pub max_fling_velocity: Option<f32>,
    /// Overrides `tap_timeout_ms`.
    pub tap_timeout_ms: Option<u64>,
    /// Overrides `jump_tap_timeout_ms`.
    pub jump_tap_timeout_ms: Option<u64>,
    /// Overrides `long_press_timeout_ms`.
    pub long_press_timeout_ms: Option<u64>,
    /// Overrides `double_tap_timeout_ms`.
    pub double_tap_timeout_ms: Option<u64>,
    /// Overrides `pressed_state_ms`.
    pub pressed_state_ms: Option<u64>,
    /// Overrides `velocity_window_ms`.
    pub velocity_window_ms: Option<u64>,
}

/// `[scroll]` table.
///
/// ```toml
/// [scroll]
/// overscroll_height = 120
/// vertical_overscroll = "auto"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScrollSection {
    /// Overrides `overscroll_width`.
    pub overscroll_width: Option<i32>,
    /// Overrides `overscroll_height`.
    pub overscroll_height: Option<i32>,
    /// Overrides `horizontal_overscroll`.
    pub horizontal_overscroll: Option<OverscrollMode>,
    /// Overrides `vertical_overscroll`.
    pub vertical_overscroll: Option<OverscrollMode>,
    /// Overrides `fling_decay_ms`.
    pub fling_decay_ms: Option<f32>,
    /// Overrides `fling_stop_velocity`.
    pub fling_stop_velocity: Option<f32>,
    /// Overrides `smooth_duration_ms`.
    pub smooth_duration_ms: Option<u64>,
    /// Overrides `spring_back_ms`.
    pub spring_back_ms: Option<u64>,
    /// Overrides `scroll_order`.
    pub scroll_order: Option<u32>,
}

/// `[thumb]` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ThumbSection {
    /// Overrides `enabled`.
    pub enabled: Option<bool>,
    /// Overrides `seek_enabled`.
    pub seek_enabled: Option<bool>,
    /// Overrides `keep_visible_ms`.
    pub keep_visible_ms: Option<u64>,
    /// Overrides `fade_ms`.
    pub fade_ms: Option<u64>,
    /// Overrides `min_extent`.
    pub min_extent: Option<i32>,
    /// Overrides `thickness`.
    pub thickness: Option<i32>,
    /// Overrides `seek_length`.
    pub seek_length: Option<i32>,
}

/// `[grid]` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GridSection {
    /// Overrides `num_columns`.
    pub num_columns: Option<usize>,
    /// Overrides `desired_column_width`.
    pub desired_column_width: Option<i32>,
    /// Overrides `desired_column_spacing`.
    pub desired_column_spacing: Option<i32>,
    /// Overrides `row_spacing`.
    pub row_spacing: Option<i32>,
    /// Overrides `stretch_mode`.
    pub stretch_mode: Option<StretchMode>,
    /// Overrides `preview_width`.
    pub preview_width: Option<i32>,
    /// Overrides `preview_height`.
    pub preview_height: Option<i32>,
}

/// Overrides coming from command-line flags.
///
/// `None` means the flag was not given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    /// `--columns`
    pub columns: Option<usize>,
    /// `--overscroll`, applied to both axes.
    pub overscroll: Option<i32>,
    /// `--log-file`
    pub log_file_path: Option<PathBuf>,
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/scrollcell/scrollcell.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("scrollcell").join("scrollcell.log")
    } else {
        PathBuf::from("scrollcell.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
/// Returns `Err` if file exists but cannot be read or parsed.
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/scrollcell/config.toml` on Unix, appropriate path on
/// other platforms. Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scrollcell").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `SCROLLCELL_CONFIG` environment variable
/// 3. Default path `~/.config/scrollcell/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var("SCROLLCELL_CONFIG") {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `SCROLLCELL_TOUCH_SLOP`: touch slop in pixels
/// - `SCROLLCELL_OVERSCROLL`: overscroll slack for both axes
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when a variable is set but does not
/// parse as a number.
pub fn apply_env_overrides(mut config: EngineConfig) -> Result<EngineConfig, ConfigError> {
    if let Ok(raw) = std::env::var("SCROLLCELL_TOUCH_SLOP") {
        config.gesture.touch_slop = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            field: "SCROLLCELL_TOUCH_SLOP".to_string(),
            reason: format!("not a number: {raw:?}"),
        })?;
    }

    if let Ok(raw) = std::env::var("SCROLLCELL_OVERSCROLL") {
        let slack: i32 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            field: "SCROLLCELL_OVERSCROLL".to_string(),
            reason: format!("not an integer: {raw:?}"),
        })?;
        config.scroll.overscroll_width = slack;
        config.scroll.overscroll_height = slack;
    }

    Ok(config)
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> EngineConfig {
    let mut config = EngineConfig::with_default_log_path();

    let Some(file) = config_file else {
        return config;
    };

    if let Some(g) = file.gesture {
        let out = &mut config.gesture;
        out.touch_slop = g.touch_slop.unwrap_or(out.touch_slop);
        out.min_fling_velocity = g.min_fling_velocity.unwrap_or(out.min_fling_velocity);
        out.max_fling_velocity = g.max_fling_velocity.unwrap_or(out.max_fling_velocity);
        out.tap_timeout_ms = g.tap_timeout_ms.unwrap_or(out.tap_timeout_ms);
        out.jump_tap_timeout_ms = g.jump_tap_timeout_ms.unwrap_or(out.jump_tap_timeout_ms);
        out.long_press_timeout_ms = g.long_press_timeout_ms.unwrap_or(out.long_press_timeout_ms);
        out.double_tap_timeout_ms = g.double_tap_timeout_ms.unwrap_or(out.double_tap_timeout_ms);
        out.pressed_state_ms = g.pressed_state_ms.unwrap_or(out.pressed_state_ms);
        out.velocity_window_ms = g.velocity_window_ms.unwrap_or(out.velocity_window_ms);
    }

    if let Some(s) = file.scroll {
        let out = &mut config.scroll;
        out.overscroll_width = s.overscroll_width.unwrap_or(out.overscroll_width);
        out.overscroll_height = s.overscroll_height.unwrap_or(out.overscroll_height);
        out.horizontal_overscroll = s.horizontal_overscroll.unwrap_or(out.horizontal_overscroll);
        out.vertical_overscroll = s.vertical_overscroll.unwrap_or(out.vertical_overscroll);
        out.fling_decay_ms = s.fling_decay_ms.unwrap_or(out.fling_decay_ms);
        out.fling_stop_velocity = s.fling_stop_velocity.unwrap_or(out.fling_stop_velocity);
        out.smooth_duration_ms = s.smooth_duration_ms.unwrap_or(out.smooth_duration_ms);
        out.spring_back_ms = s.spring_back_ms.unwrap_or(out.spring_back_ms);
        out.scroll_order = s.scroll_order.unwrap_or(out.scroll_order);
    }

    if let Some(t) = file.thumb {
        let out = &mut config.thumb;
        out.enabled = t.enabled.unwrap_or(out.enabled);
        out.seek_enabled = t.seek_enabled.unwrap_or(out.seek_enabled);
        out.keep_visible_ms = t.keep_visible_ms.unwrap_or(out.keep_visible_ms);
        out.fade_ms = t.fade_ms.unwrap_or(out.fade_ms);
        out.min_extent = t.min_extent.unwrap_or(out.min_extent);
        out.thickness = t.thickness.unwrap_or(out.thickness);
        out.seek_length = t.seek_length.or(out.seek_length);
    }

    if let Some(g) = file.grid {
        let out = &mut config.grid;
        out.num_columns = g.num_columns.unwrap_or(out.num_columns);
        out.desired_column_width = g.desired_column_width.unwrap_or(out.desired_column_width);
        out.desired_column_spacing = g
            .desired_column_spacing
            .unwrap_or(out.desired_column_spacing);
        out.row_spacing = g.row_spacing.unwrap_or(out.row_spacing);
        out.stretch_mode = g.stretch_mode.unwrap_or(out.stretch_mode);
        out.preview_width = g.preview_width.unwrap_or(out.preview_width);
        out.preview_height = g.preview_height.unwrap_or(out.preview_height);
    }

    if let Some(path) = file.log_file_path {
        config.log_file_path = path;
    }

    config
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(mut config: EngineConfig, overrides: CliOverrides) -> EngineConfig {
    if let Some(columns) = overrides.columns {
        config.grid.num_columns = columns;
    }

    if let Some(slack) = overrides.overscroll {
        config.scroll.overscroll_width = slack;
        config.scroll.overscroll_height = slack;
    }

    if let Some(path) = overrides.log_file_path {
        config.log_file_path = path;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;

#[cfg(test)]
mod log_path_tests {
    use super::*;

    #[test]
    fn default_log_path_ends_with_scrollcell_log() {
        let path = default_log_path();
        assert!(
            path.to_string_lossy().ends_with("scrollcell.log"),
            "Default log path should end with 'scrollcell.log', got: {:?}",
            path
        );
    }

    #[test]
    fn merged_default_includes_log_path() {
        let config = merge_config(None);
        assert!(
            !config.log_file_path.as_os_str().is_empty(),
            "Default config should have non-empty log_file_path"
        );
    }

    #[test]
    fn config_file_log_path_overrides_default() {
        let custom_path = PathBuf::from("/custom/path/to/app.log");
        let config_file = ConfigFile {
            log_file_path: Some(custom_path.clone()),
            ..ConfigFile::default()
        };

        let resolved = merge_config(Some(config_file));
        assert_eq!(
            resolved.log_file_path, custom_path,
            "Config file log_file_path should override default"
        );
    }

    #[test]
    fn missing_config_file_log_path_uses_default() {
        let resolved = merge_config(Some(ConfigFile::default()));
        assert_eq!(
            resolved.log_file_path,
            default_log_path(),
            "Missing log_file_path in config should use default"
        );
    }
}
