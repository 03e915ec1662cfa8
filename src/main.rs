//! scrollcell demo - Entry Point

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Scrollable, virtualized grid of labels in the terminal
#[derive(Parser, Debug)]
#[command(name = "scrollcell")]
#[command(version)]
#[command(about = "Terminal demo of momentum scrolling over a virtualized item grid")]
pub struct Args {
    /// Number of items to show
    #[arg(short = 'n', long, default_value = "1000")]
    pub items: usize,

    /// Fixed column count (0 derives it from the item width)
    #[arg(short, long)]
    pub columns: Option<usize>,

    /// Overscroll slack in pixels on both axes
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..))]
    pub overscroll: Option<i32>,

    /// Path of the log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = scrollcell::config::load_config_with_precedence(args.config.clone())?;
        let merged = scrollcell::config::merge_config(config_file);
        let with_env = scrollcell::config::apply_env_overrides(merged)?;
        scrollcell::config::apply_cli_overrides(
            with_env,
            scrollcell::config::CliOverrides {
                columns: args.columns,
                overscroll: args.overscroll,
                log_file_path: args.log_file.clone(),
            },
        )
    };
    config.validate()?;

    scrollcell::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        items = args.items,
        "Configuration loaded and resolved"
    );

    scrollcell::host::run_demo(&config, args.items)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_help_does_not_error() {
        let result = Args::try_parse_from(["scrollcell", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_does_not_error() {
        let result = Args::try_parse_from(["scrollcell", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_no_args_defaults() {
        let args = Args::parse_from(["scrollcell"]);
        assert_eq!(args.items, 1000);
        assert_eq!(args.columns, None);
        assert_eq!(args.overscroll, None);
        assert_eq!(args.log_file, None);
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_items_short_and_long() {
        assert_eq!(Args::parse_from(["scrollcell", "-n", "50"]).items, 50);
        assert_eq!(Args::parse_from(["scrollcell", "--items", "0"]).items, 0);
    }

    #[test]
    fn test_overscroll_rejects_negative() {
        let result = Args::try_parse_from(["scrollcell", "--overscroll", "-5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_combined_flags() {
        let args = Args::parse_from([
            "scrollcell",
            "--columns",
            "3",
            "--overscroll",
            "40",
            "--log-file",
            "/tmp/demo.log",
            "--config",
            "/custom/config.toml",
        ]);
        assert_eq!(args.columns, Some(3));
        assert_eq!(args.overscroll, Some(40));
        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/demo.log")));
        assert_eq!(args.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_cli_columns_override_config_file() {
        use scrollcell::config::loader::GridSection;
        use scrollcell::config::{apply_cli_overrides, merge_config, CliOverrides, ConfigFile};

        let config_file = ConfigFile {
            grid: Some(GridSection {
                num_columns: Some(2),
                ..GridSection::default()
            }),
            ..ConfigFile::default()
        };

        let merged = merge_config(Some(config_file));
        assert_eq!(merged.grid.num_columns, 2);

        let with_cli = apply_cli_overrides(
            merged,
            CliOverrides {
                columns: Some(4),
                ..CliOverrides::default()
            },
        );
        assert_eq!(with_cli.grid.num_columns, 4);
    }
}
