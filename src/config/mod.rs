//! Engine configuration.
//!
//! [`EngineConfig`] carries every tunable the engine reads: gesture
//! thresholds and timeouts, scroll physics, thumb appearance and grid layout.
//! The [`loader`] module builds one from defaults, a TOML file, environment
//! variables and command-line flags. [`keybindings`] holds the demo host's
//! key map.

pub mod keybindings;
pub mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_config_path, default_log_path,
    load_config_file, load_config_with_precedence, merge_config, CliOverrides, ConfigError,
    ConfigFile,
};

use serde::Deserialize;
use std::path::PathBuf;

/// Gesture recognition thresholds and timeouts.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    /// Travel in pixels before a touch counts as movement.
    pub touch_slop: f32,
    /// Fling velocities below this (px/s) are treated as zero.
    pub min_fling_velocity: f32,
    /// Fling velocities are clamped to this (px/s).
    pub max_fling_velocity: f32,
    /// Delay before a touched item shows as pressed.
    pub tap_timeout_ms: u64,
    /// Longest press that still counts as a tap.
    pub jump_tap_timeout_ms: u64,
    /// Hold time that triggers a long press.
    pub long_press_timeout_ms: u64,
    /// How long a delayed touch-up is held back.
    pub double_tap_timeout_ms: u64,
    /// How long pressed feedback stays visible after a tap.
    pub pressed_state_ms: u64,
    /// Trailing window used by the fling velocity tracker.
    pub velocity_window_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            touch_slop: 8.0,
            min_fling_velocity: 50.0,
            max_fling_velocity: 8000.0,
            tap_timeout_ms: 100,
            jump_tap_timeout_ms: 500,
            long_press_timeout_ms: 500,
            double_tap_timeout_ms: 300,
            pressed_state_ms: 64,
            velocity_window_ms: 300,
        }
    }
}

/// When an axis may be pulled past its content edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverscrollMode {
    /// Always allow the configured slack.
    #[default]
    Always,
    /// Allow slack only when the content is larger than the viewport.
    Auto,
    /// Never overscroll.
    Never,
}

/// Scroll physics and overscroll settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollConfig {
    /// Maximum horizontal overscroll in pixels.
    pub overscroll_width: i32,
    /// Maximum vertical overscroll in pixels.
    pub overscroll_height: i32,
    /// Horizontal overscroll mode.
    pub horizontal_overscroll: OverscrollMode,
    /// Vertical overscroll mode.
    pub vertical_overscroll: OverscrollMode,
    /// Time constant of the exponential fling decay, in milliseconds.
    pub fling_decay_ms: f32,
    /// Velocity (px/s) at which a fling is considered exhausted.
    pub fling_stop_velocity: f32,
    /// Default duration of smooth scrolls.
    pub smooth_duration_ms: u64,
    /// Duration of the spring-back ease.
    pub spring_back_ms: u64,
    /// Translate steps to skip after the drag is recognized.
    pub scroll_order: u32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            overscroll_width: 0,
            overscroll_height: 0,
            horizontal_overscroll: OverscrollMode::Always,
            vertical_overscroll: OverscrollMode::Always,
            fling_decay_ms: 325.0,
            fling_stop_velocity: 20.0,
            smooth_duration_ms: 250,
            spring_back_ms: 250,
            scroll_order: 0,
        }
    }
}

/// Scrollbar thumb settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbConfig {
    /// Draw thumbs at all.
    pub enabled: bool,
    /// Allow dragging a seek thumb.
    pub seek_enabled: bool,
    /// Time thumbs stay fully visible after scrolling stops.
    pub keep_visible_ms: u64,
    /// Fade-out duration once the keep-visible time has passed.
    pub fade_ms: u64,
    /// Shortest thumb along the scroll axis.
    pub min_extent: i32,
    /// Thumb thickness across the scroll axis.
    pub thickness: i32,
    /// Length of the seek thumb along the scroll axis, if one is available.
    pub seek_length: Option<i32>,
}

impl Default for ThumbConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            seek_enabled: false,
            keep_visible_ms: 1000,
            fade_ms: 200,
            min_extent: 5,
            thickness: 5,
            seek_length: None,
        }
    }
}

/// How a grid distributes leftover row width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StretchMode {
    /// Columns keep their width and spacing.
    None,
    /// Leftover width goes into the spacing between columns.
    ColumnSpacing,
    /// Leftover width goes into the columns.
    #[default]
    ColumnWidth,
}

/// Grid layout settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Fixed column count, 0 to derive it from the width.
    pub num_columns: usize,
    /// Desired column width, 0 to use the first item's width.
    pub desired_column_width: i32,
    /// Desired spacing between columns.
    pub desired_column_spacing: i32,
    /// Spacing between rows.
    pub row_spacing: i32,
    /// Stretch mode.
    pub stretch_mode: StretchMode,
    /// Extra width around the viewport whose cells stay materialized.
    pub preview_width: i32,
    /// Extra height around the viewport whose cells stay materialized.
    pub preview_height: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            num_columns: 0,
            desired_column_width: 0,
            desired_column_spacing: 0,
            row_spacing: 0,
            stretch_mode: StretchMode::ColumnWidth,
            preview_width: 0,
            preview_height: 0,
        }
    }
}

/// Resolved engine configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    /// Gesture thresholds.
    pub gesture: GestureConfig,
    /// Scroll physics.
    pub scroll: ScrollConfig,
    /// Thumb appearance.
    pub thumb: ThumbConfig,
    /// Grid layout.
    pub grid: GridConfig,
    /// Path of the tracing log file.
    pub log_file_path: PathBuf,
}

impl EngineConfig {
    /// Default configuration with the platform log path.
    pub fn with_default_log_path() -> Self {
        Self {
            log_file_path: default_log_path(),
            ..Self::default()
        }
    }

    /// Rejects values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.gesture;
        let positive_timeouts = [
            ("gesture.tap_timeout_ms", g.tap_timeout_ms),
            ("gesture.jump_tap_timeout_ms", g.jump_tap_timeout_ms),
            ("gesture.long_press_timeout_ms", g.long_press_timeout_ms),
            ("gesture.double_tap_timeout_ms", g.double_tap_timeout_ms),
            ("gesture.pressed_state_ms", g.pressed_state_ms),
            ("gesture.velocity_window_ms", g.velocity_window_ms),
            ("scroll.smooth_duration_ms", self.scroll.smooth_duration_ms),
            ("scroll.spring_back_ms", self.scroll.spring_back_ms),
        ];
        for (field, value) in positive_timeouts {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }

        if !(g.touch_slop >= 0.0) {
            return Err(invalid("gesture.touch_slop", "must not be negative"));
        }
        if !(g.min_fling_velocity >= 0.0) {
            return Err(invalid("gesture.min_fling_velocity", "must not be negative"));
        }
        if !(g.max_fling_velocity > 0.0) || g.max_fling_velocity < g.min_fling_velocity {
            return Err(invalid(
                "gesture.max_fling_velocity",
                "must be positive and at least min_fling_velocity",
            ));
        }
        if !(self.scroll.fling_decay_ms > 0.0) {
            return Err(invalid("scroll.fling_decay_ms", "must be greater than zero"));
        }
        if !(self.scroll.fling_stop_velocity > 0.0) {
            return Err(invalid("scroll.fling_stop_velocity", "must be greater than zero"));
        }
        if self.scroll.overscroll_width < 0 || self.scroll.overscroll_height < 0 {
            return Err(invalid("scroll.overscroll", "must not be negative"));
        }
        if self.thumb.min_extent < 0 || self.thumb.thickness <= 0 {
            return Err(invalid("thumb", "min_extent must be >= 0 and thickness > 0"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn default_gesture_thresholds() {
        let g = GestureConfig::default();
        assert_eq!(g.touch_slop, 8.0);
        assert_eq!(g.min_fling_velocity, 50.0);
        assert_eq!(g.max_fling_velocity, 8000.0);
        assert_eq!(g.double_tap_timeout_ms, 300);
    }

    #[test]
    fn default_has_no_overscroll_slack() {
        let s = ScrollConfig::default();
        assert_eq!(s.overscroll_width, 0);
        assert_eq!(s.overscroll_height, 0);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = EngineConfig::default();
        config.gesture.long_press_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "gesture.long_press_timeout_ms"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn max_velocity_below_min_is_rejected() {
        let mut config = EngineConfig::default();
        config.gesture.max_fling_velocity = 10.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn nan_slop_is_rejected() {
        let mut config = EngineConfig::default();
        config.gesture.touch_slop = f32::NAN;
        assert!(config.validate().is_err());
    }
}
