//! Tests for configuration file loading.

use super::*;
use serial_test::serial;
use std::env;
use std::fs;

fn temp_config(name: &str, contents: &str) -> PathBuf {
    let path = env::temp_dir().join(name);
    fs::write(&path, contents).expect("Failed to write test config");
    path
}

#[test]
fn default_config_path_contains_scrollcell_config_toml() {
    let Some(path) = default_config_path() else {
        return;
    };
    let path_str = path.to_string_lossy();
    assert!(
        path_str.contains("scrollcell") && path_str.ends_with("config.toml"),
        "Path should contain 'scrollcell' and end with 'config.toml', got: {}",
        path_str
    );
}

#[test]
fn load_config_file_returns_ok_none_for_missing_file() {
    let result = load_config_file("/nonexistent/path/to/config.toml");
    assert_eq!(
        result,
        Ok(None),
        "Missing config file should return Ok(None), not an error"
    );
}

#[test]
fn load_config_file_parses_all_tables() {
    let config_path = temp_config(
        "scrollcell_test_config.toml",
        r#"
log_file_path = "/tmp/scrollcell-test.log"

[gesture]
touch_slop = 12.5
long_press_timeout_ms = 650

[scroll]
overscroll_height = 120
vertical_overscroll = "auto"

[thumb]
enabled = true
seek_length = 40

[grid]
num_columns = 4
stretch_mode = "column_spacing"
"#,
    );

    let config = load_config_file(&config_path)
        .expect("Should successfully parse valid TOML")
        .expect("Should return Some(ConfigFile) for existing file");

    let gesture = config.gesture.expect("gesture table");
    assert_eq!(gesture.touch_slop, Some(12.5));
    assert_eq!(gesture.long_press_timeout_ms, Some(650));
    assert_eq!(gesture.tap_timeout_ms, None);

    let scroll = config.scroll.expect("scroll table");
    assert_eq!(scroll.overscroll_height, Some(120));
    assert_eq!(scroll.vertical_overscroll, Some(OverscrollMode::Auto));

    let thumb = config.thumb.expect("thumb table");
    assert_eq!(thumb.enabled, Some(true));
    assert_eq!(thumb.seek_length, Some(40));

    let grid = config.grid.expect("grid table");
    assert_eq!(grid.num_columns, Some(4));
    assert_eq!(grid.stretch_mode, Some(StretchMode::ColumnSpacing));

    assert_eq!(
        config.log_file_path,
        Some(PathBuf::from("/tmp/scrollcell-test.log"))
    );

    fs::remove_file(config_path).ok();
}

#[test]
fn load_config_file_returns_error_for_invalid_toml() {
    let config_path = temp_config("scrollcell_test_invalid.toml", "this is not valid TOML ][}{");

    let result = load_config_file(&config_path);
    match result {
        Err(ConfigError::ParseError { path, reason: _ }) => {
            assert_eq!(path, config_path);
        }
        _ => panic!("Expected ParseError, got {:?}", result),
    }

    fs::remove_file(config_path).ok();
}

#[test]
fn load_config_file_rejects_unknown_fields() {
    let config_path = temp_config(
        "scrollcell_test_unknown.toml",
        r#"
[gesture]
touch_slope = 4.0
"#,
    );

    let result = load_config_file(&config_path);
    assert!(
        matches!(result, Err(ConfigError::ParseError { .. })),
        "Misspelled key should be rejected, got {:?}",
        result
    );

    fs::remove_file(config_path).ok();
}

#[test]
fn load_config_file_rejects_unknown_overscroll_mode() {
    let config_path = temp_config(
        "scrollcell_test_bad_mode.toml",
        r#"
[scroll]
horizontal_overscroll = "sometimes"
"#,
    );

    assert!(load_config_file(&config_path).is_err());

    fs::remove_file(config_path).ok();
}

#[test]
fn merge_config_none_is_defaults() {
    let resolved = merge_config(None);
    assert_eq!(resolved, EngineConfig::with_default_log_path());
}

#[test]
fn merge_config_overrides_only_given_fields() {
    let file = ConfigFile {
        gesture: Some(GestureSection {
            touch_slop: Some(3.0),
            ..GestureSection::default()
        }),
        grid: Some(GridSection {
            row_spacing: Some(6),
            ..GridSection::default()
        }),
        ..ConfigFile::default()
    };

    let resolved = merge_config(Some(file));
    let defaults = EngineConfig::with_default_log_path();

    assert_eq!(resolved.gesture.touch_slop, 3.0);
    assert_eq!(
        resolved.gesture.long_press_timeout_ms,
        defaults.gesture.long_press_timeout_ms
    );
    assert_eq!(resolved.grid.row_spacing, 6);
    assert_eq!(resolved.grid.stretch_mode, defaults.grid.stretch_mode);
    assert_eq!(resolved.scroll, defaults.scroll);
    assert_eq!(resolved.thumb, defaults.thumb);
}

#[test]
fn merge_config_keeps_seek_length_unset_by_default() {
    let file = ConfigFile {
        thumb: Some(ThumbSection {
            enabled: Some(true),
            ..ThumbSection::default()
        }),
        ..ConfigFile::default()
    };
    let resolved = merge_config(Some(file));
    assert!(resolved.thumb.enabled);
    assert_eq!(resolved.thumb.seek_length, None);
}

/// RAII guard to ensure environment variable cleanup even under test parallelism.
/// Removes the var on drop, preventing test pollution in parallel execution.
struct EnvGuard(&'static str);

impl EnvGuard {
    fn new(name: &'static str) -> Self {
        env::remove_var(name);
        EnvGuard(name)
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        env::remove_var(self.0);
    }
}

#[test]
#[serial(scrollcell_env)]
fn apply_env_overrides_respects_touch_slop() {
    let _guard = EnvGuard::new("SCROLLCELL_TOUCH_SLOP");

    env::set_var("SCROLLCELL_TOUCH_SLOP", "14");

    let result = apply_env_overrides(EngineConfig::default()).expect("valid override");
    assert_eq!(result.gesture.touch_slop, 14.0);
}

#[test]
#[serial(scrollcell_env)]
fn apply_env_overrides_sets_both_overscroll_axes() {
    let _guard = EnvGuard::new("SCROLLCELL_OVERSCROLL");

    env::set_var("SCROLLCELL_OVERSCROLL", " 80 ");

    let result = apply_env_overrides(EngineConfig::default()).expect("valid override");
    assert_eq!(result.scroll.overscroll_width, 80);
    assert_eq!(result.scroll.overscroll_height, 80);
    assert_eq!(result.gesture, EngineConfig::default().gesture);
}

#[test]
#[serial(scrollcell_env)]
fn apply_env_overrides_reports_garbage() {
    let _guard = EnvGuard::new("SCROLLCELL_TOUCH_SLOP");

    env::set_var("SCROLLCELL_TOUCH_SLOP", "wide");

    let result = apply_env_overrides(EngineConfig::default());
    assert!(
        matches!(result, Err(ConfigError::InvalidValue { ref field, .. }) if field == "SCROLLCELL_TOUCH_SLOP"),
        "unexpected result: {:?}",
        result
    );
}

#[test]
#[serial(scrollcell_env)]
fn apply_env_overrides_no_change_when_env_var_not_set() {
    let _slop = EnvGuard::new("SCROLLCELL_TOUCH_SLOP");
    let _overscroll = EnvGuard::new("SCROLLCELL_OVERSCROLL");

    let base = EngineConfig::default();
    let result = apply_env_overrides(base.clone()).expect("no overrides");

    assert_eq!(result, base, "Config should be unchanged when no env var is set");
}

#[test]
#[serial(scrollcell_config)]
fn load_config_with_precedence_explicit_path_wins_over_env() {
    let _guard = EnvGuard::new("SCROLLCELL_CONFIG");

    let env_path = temp_config(
        "scrollcell_test_env.toml",
        "[grid]\nnum_columns = 2\n",
    );
    let explicit_path = temp_config(
        "scrollcell_test_explicit.toml",
        "[grid]\nnum_columns = 7\n",
    );
    env::set_var("SCROLLCELL_CONFIG", &env_path);

    let config = load_config_with_precedence(Some(explicit_path.clone()))
        .expect("parse")
        .expect("file exists");
    assert_eq!(config.grid.and_then(|g| g.num_columns), Some(7));

    fs::remove_file(env_path).ok();
    fs::remove_file(explicit_path).ok();
}

#[test]
#[serial(scrollcell_config)]
fn load_config_with_precedence_uses_env_path() {
    let _guard = EnvGuard::new("SCROLLCELL_CONFIG");

    let env_path = temp_config(
        "scrollcell_test_env_only.toml",
        "[scroll]\nspring_back_ms = 400\n",
    );
    env::set_var("SCROLLCELL_CONFIG", &env_path);

    let config = load_config_with_precedence(None)
        .expect("parse")
        .expect("file exists");
    assert_eq!(config.scroll.and_then(|s| s.spring_back_ms), Some(400));

    fs::remove_file(env_path).ok();
}

#[test]
#[serial(scrollcell_config)]
fn load_config_with_precedence_missing_env_file_is_none() {
    let _guard = EnvGuard::new("SCROLLCELL_CONFIG");
    env::set_var("SCROLLCELL_CONFIG", "/nonexistent/scrollcell/config.toml");

    assert_eq!(load_config_with_precedence(None), Ok(None));
}

#[test]
fn apply_cli_overrides_replaces_given_flags() {
    let base = EngineConfig::default();
    let overrides = CliOverrides {
        columns: Some(5),
        overscroll: Some(40),
        log_file_path: Some(PathBuf::from("/tmp/cli.log")),
    };

    let result = apply_cli_overrides(base, overrides);
    assert_eq!(result.grid.num_columns, 5);
    assert_eq!(result.scroll.overscroll_width, 40);
    assert_eq!(result.scroll.overscroll_height, 40);
    assert_eq!(result.log_file_path, PathBuf::from("/tmp/cli.log"));
}

#[test]
fn apply_cli_overrides_without_flags_is_identity() {
    let base = merge_config(None);
    let result = apply_cli_overrides(base.clone(), CliOverrides::default());
    assert_eq!(result, base);
}

#[test]
fn full_precedence_chain_cli_beats_file() {
    let file = ConfigFile {
        grid: Some(GridSection {
            num_columns: Some(3),
            ..GridSection::default()
        }),
        ..ConfigFile::default()
    };
    let merged = merge_config(Some(file));
    assert_eq!(merged.grid.num_columns, 3);

    let result = apply_cli_overrides(
        merged,
        CliOverrides {
            columns: Some(9),
            ..CliOverrides::default()
        },
    );
    assert_eq!(result.grid.num_columns, 9);
}
