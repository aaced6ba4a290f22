//! Dropcombo: a drag-and-match drop puzzle board.
//!
//! The library is the board engine alone: a grid of typed tokens, drag input
//! that swaps the held token through the grid, and the tick-driven resolution
//! loop (match, clear, fall, refill, re-match) that accumulates a combo and
//! reports it once per settled cascade. Rendering, input devices and whatever
//! reacts to combos live outside; see the `dropcombo` binary for a terminal
//! front end.
//!
//! # Example
//!
//! ```
//! use dropcombo::{BoardConfig, BoardEngine, EngineState, Pos};
//! use std::time::{Duration, Instant};
//!
//! let config = BoardConfig { seed: Some(7), ..BoardConfig::default() };
//! let mut engine = BoardEngine::new(config).unwrap();
//!
//! engine.press_cell(Pos::new(0, 0));
//! engine.move_to_cell(Pos::new(0, 1));
//! engine.release();
//!
//! let mut now = Instant::now();
//! while engine.state() != EngineState::Idle {
//!     engine.update(now);
//!     now += Duration::from_millis(16);
//! }
//! assert!(!engine.board().has_run());
//! ```

pub mod board;
pub mod config;
pub mod engine;
pub mod source;
pub mod token;

pub use board::{Board, MatchGroup, Pos};
pub use config::{BoardConfig, ConfigError};
pub use engine::{BoardEngine, BoardEvent, CellMetrics, ComboSink, EngineState};
pub use source::{RandomTokens, ScriptedTokens, TokenSource};
pub use token::{Cell, TOKEN_KINDS, TokenKind};
