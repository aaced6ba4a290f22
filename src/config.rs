//! Board configuration: grid size, cascade delays, refill policy, seed.

use std::time::Duration;
use thiserror::Error;

/// Largest accepted row/column count.
pub const MAX_DIM: usize = 16;

pub const DEFAULT_ROWS: usize = 5;
pub const DEFAULT_COLS: usize = 6;
/// Pause between clearing matched tokens and the first gravity pass.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);
/// Pause between deciding to batch-replenish and applying it.
pub const DEFAULT_REPLENISH_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub rows: usize,
    pub cols: usize,
    pub settle_delay: Duration,
    pub replenish_delay: Duration,
    /// Start with skyfall (continuous top refill) enabled.
    pub skyfall: bool,
    /// Seed for the default random token source; `None` = OS entropy.
    pub seed: Option<u64>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            settle_delay: DEFAULT_SETTLE_DELAY,
            replenish_delay: DEFAULT_REPLENISH_DELAY,
            skyfall: false,
            seed: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rows must be in 1..=16, got {0}")]
    Rows(usize),
    #[error("cols must be in 1..=16, got {0}")]
    Cols(usize),
}

impl BoardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_DIM).contains(&self.rows) {
            return Err(ConfigError::Rows(self.rows));
        }
        if !(1..=MAX_DIM).contains(&self.cols) {
            return Err(ConfigError::Cols(self.cols));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_five_by_six() {
        let config = BoardConfig::default();
        assert_eq!((config.rows, config.cols), (5, 6));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_and_oversized_dims() {
        let config = BoardConfig {
            rows: 0,
            ..BoardConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Rows(0)));
        let config = BoardConfig {
            cols: MAX_DIM + 1,
            ..BoardConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Cols(MAX_DIM + 1)));
    }
}
