//! Dropcombo: drag a token through the board, line up three or more, chain combos.

mod app;
mod combat;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use dropcombo::BoardConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;
    let theme = theme::Theme::load(args.theme.as_deref()).unwrap_or_else(|err| {
        warn!(%err, "theme not loaded, using defaults");
        theme::Theme::default()
    });
    let config = BoardConfig {
        rows: args.rows,
        cols: args.cols,
        settle_delay: Duration::from_millis(args.settle_delay_ms),
        replenish_delay: Duration::from_millis(args.replenish_delay_ms),
        skyfall: args.skyfall,
        seed: args.seed,
    };
    config.validate()?;
    let mut app = App::new(config, theme, args.tick_rate)?;
    app.run()?;
    Ok(())
}

/// Log to a file; the terminal belongs to the UI. `RUST_LOG` overrides the level.
fn init_logging(path: &Path) -> Result<()> {
    let log_file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

/// Drag-and-match drop puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "dropcombo",
    version,
    about = "Drag-and-match drop puzzle in the terminal. Line up three or more tokens; cleared tokens fall and chain into combos.",
    long_about = "Dropcombo is a drag-and-match puzzle.\n\n\
        Pick up a token and drag it around the board; every cell it passes swaps with it. \
        When you let go, runs of three or more of a kind clear, the tokens above fall and \
        any new runs clear too. Each cleared group adds to the combo, and the finished \
        combo hits the boss.\n\n\
        CONTROLS:\n  Mouse        Press, drag, release\n  Arrows/hjkl  Move cursor (drags while holding)\n  \
        Space/Enter  Pick up / drop\n  e            Edit mode (Space paints)\n  1-6          Select paint token\n  \
        s            Toggle skyfall\n  r            New battle\n  q / Esc      Quit"
)]
pub struct Args {
    /// Board rows (1..=16).
    #[arg(long, default_value = "5", value_name = "ROWS")]
    pub rows: usize,

    /// Board columns (1..=16).
    #[arg(long, default_value = "6", value_name = "COLS")]
    pub cols: usize,

    /// Start with skyfall on: new tokens drop in from the top as cells empty.
    #[arg(long)]
    pub skyfall: bool,

    /// Pause after clearing matched tokens, before they fall.
    #[arg(long, default_value = "300", value_name = "MS")]
    pub settle_delay_ms: u64,

    /// Pause before empty cells are refilled all at once (skyfall off).
    #[arg(long, default_value = "500", value_name = "MS")]
    pub replenish_delay_ms: u64,

    /// Seed for a reproducible board.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Engine ticks per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Path to theme file (btop-style theme[key]="value"); token_fire .. token_heart set token colours.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Log file (RUST_LOG sets the level, default info).
    #[arg(long, default_value = "dropcombo.log", value_name = "FILE")]
    pub log_file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["dropcombo"]).unwrap();
        assert_eq!((args.rows, args.cols), (5, 6));
        assert!(!args.skyfall);
        assert_eq!(args.settle_delay_ms, 300);
        assert_eq!(args.replenish_delay_ms, 500);
        assert_eq!(args.seed, None);
    }

    #[test]
    fn test_args_overrides() {
        let args =
            Args::try_parse_from(["dropcombo", "--rows", "8", "--skyfall", "--seed", "42"]).unwrap();
        assert_eq!(args.rows, 8);
        assert!(args.skyfall);
        assert_eq!(args.seed, Some(42));
    }
}
