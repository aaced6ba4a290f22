//! Board engine: drag input, match resolution, gravity and refill, driven by ticks.
//!
//! A cascade runs `Matching -> (clear, wait) -> Falling -> ... -> Matching`
//! until a matching pass finds nothing, then the engine returns to `Idle` and
//! reports the accumulated combo once. The two waits (after clearing, before a
//! batch replenish) are scheduled continuations checked at the start of each
//! [`BoardEngine::update`]; once scheduled they always fire.

use crate::board::{Board, Pos};
use crate::config::{BoardConfig, ConfigError};
use crate::source::{RandomTokens, TokenSource};
use crate::token::{Cell, TOKEN_KINDS, TokenKind};
use std::time::Instant;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Waiting for a press.
    Idle,
    /// A token is held; pointer moves swap it through the grid.
    Dragging,
    /// Run match detection on the next tick.
    Matching,
    /// A continuation is scheduled; ticks only check whether it is due.
    Animating,
    /// One gravity pass per tick until nothing moves.
    Falling,
    /// Presses paint the selected token; nothing is matched.
    Edit,
}

/// Observer notifications, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    StateChanged(EngineState),
    ComboChanged(u32),
    TokenCountsChanged([u32; TOKEN_KINDS]),
    /// A cascade settled with this many groups cleared (always >= 1).
    ComboResolved(u32),
}

/// Receives the combo of each settled cascade.
pub trait ComboSink {
    fn on_combo_resolved(&mut self, combo: u32);
}

/// Pixel-to-cell mapping supplied by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub cell_width: f32,
    pub cell_height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl CellMetrics {
    pub fn square(size: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            cell_width: size,
            cell_height: size,
            offset_x,
            offset_y,
        }
    }

    /// Cell under a grid-local point. `None` above/left of the grid or when the
    /// metrics are degenerate; callers still bounds-check against the board.
    pub fn cell_at(&self, x: f32, y: f32) -> Option<Pos> {
        if self.cell_width <= 0.0 || self.cell_height <= 0.0 {
            return None;
        }
        let col = ((x - self.offset_x) / self.cell_width).floor();
        let row = ((y - self.offset_y) / self.cell_height).floor();
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        Some(Pos::new(row as usize, col as usize))
    }

    /// Centre of a cell in grid-local coordinates.
    pub fn center_of(&self, pos: Pos) -> (f32, f32) {
        (
            self.offset_x + (pos.col as f32 + 0.5) * self.cell_width,
            self.offset_y + (pos.row as f32 + 0.5) * self.cell_height,
        )
    }
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self::square(1.0, 0.0, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    /// Cleared cells have been shown long enough; start falling.
    BeginFalling,
    /// Fill every empty cell, then run a falling pass.
    ReplenishThenFall,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    due: Instant,
    action: Continuation,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    cell: Pos,
    point: (f32, f32),
}

pub struct BoardEngine<S = RandomTokens> {
    board: Board,
    source: S,
    config: BoardConfig,
    state: EngineState,
    combo: u32,
    skyfall: bool,
    /// A batch replenish was decided and not yet resolved.
    replenishing: bool,
    selected: TokenKind,
    metrics: CellMetrics,
    drag: Option<Drag>,
    scheduled: Option<Scheduled>,
    counts: [u32; TOKEN_KINDS],
    events: Vec<BoardEvent>,
}

impl BoardEngine<RandomTokens> {
    /// Engine with a random source, seeded from `config.seed` when set.
    pub fn new(config: BoardConfig) -> Result<Self, ConfigError> {
        let source = match config.seed {
            Some(seed) => RandomTokens::seeded(seed),
            None => RandomTokens::from_entropy(),
        };
        Self::with_source(config, source)
    }
}

impl<S: TokenSource> BoardEngine<S> {
    /// Engine over a fresh no-run random board drawn from `source`.
    pub fn with_source(config: BoardConfig, mut source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let board = Board::random(config.rows, config.cols, &mut source);
        Ok(Self::with_board(config, board, source))
    }

    /// Engine over a prepared board; the board's size wins over the config's.
    pub fn with_board(mut config: BoardConfig, board: Board, source: S) -> Self {
        config.rows = board.rows();
        config.cols = board.cols();
        let counts = board.token_counts();
        debug!(
            rows = config.rows,
            cols = config.cols,
            skyfall = config.skyfall,
            "board engine created"
        );
        Self {
            board,
            source,
            skyfall: config.skyfall,
            config,
            state: EngineState::Idle,
            combo: 0,
            replenishing: false,
            selected: TokenKind::Fire,
            metrics: CellMetrics::default(),
            drag: None,
            scheduled: None,
            counts,
            events: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Owned row-major copy of the grid.
    pub fn snapshot(&self) -> Vec<Vec<Cell>> {
        self.board.to_rows()
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn token_counts(&self) -> [u32; TOKEN_KINDS] {
        self.counts
    }

    pub fn skyfall(&self) -> bool {
        self.skyfall
    }

    pub fn is_replenishing(&self) -> bool {
        self.replenishing
    }

    pub fn selected_token(&self) -> TokenKind {
        self.selected
    }

    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    /// Cell currently under the held token, while dragging.
    pub fn drag_cell(&self) -> Option<Pos> {
        self.drag.map(|d| d.cell)
    }

    /// Last pointer position while dragging.
    pub fn drag_point(&self) -> Option<(f32, f32)> {
        self.drag.map(|d| d.point)
    }

    /// When the outstanding continuation fires, if one is scheduled.
    pub fn pending_until(&self) -> Option<Instant> {
        self.scheduled.map(|s| s.due)
    }

    /// True while a cascade is being resolved.
    pub fn is_resolving(&self) -> bool {
        matches!(
            self.state,
            EngineState::Matching | EngineState::Animating | EngineState::Falling
        )
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, BoardEvent> {
        self.events.drain(..)
    }

    /// Drain events, forwarding every `ComboResolved` to `sink`. Returns all
    /// drained events so presentation code can react to the rest.
    pub fn dispatch_combos<K: ComboSink + ?Sized>(&mut self, sink: &mut K) -> Vec<BoardEvent> {
        let events: Vec<BoardEvent> = self.events.drain(..).collect();
        for event in &events {
            if let BoardEvent::ComboResolved(combo) = event {
                sink.on_combo_resolved(*combo);
            }
        }
        events
    }

    pub fn set_metrics(&mut self, metrics: CellMetrics) {
        self.metrics = metrics;
    }

    pub fn set_skyfall(&mut self, enabled: bool) {
        if self.skyfall != enabled {
            debug!(enabled, state = ?self.state, "skyfall toggled");
        }
        self.skyfall = enabled;
    }

    pub fn toggle_skyfall(&mut self) -> bool {
        self.set_skyfall(!self.skyfall);
        self.skyfall
    }

    // --- ticking ---

    /// Advance one tick: fire a due continuation, then run the handler for
    /// the current state.
    pub fn update(&mut self, now: Instant) {
        if let Some(scheduled) = self.scheduled {
            if now >= scheduled.due {
                self.scheduled = None;
                self.fire(scheduled.action);
            }
        }
        match self.state {
            EngineState::Matching => self.handle_matching(now),
            EngineState::Falling => self.handle_falling(),
            EngineState::Idle
            | EngineState::Dragging
            | EngineState::Animating
            | EngineState::Edit => {}
        }
    }

    fn schedule(&mut self, due: Instant, action: Continuation) {
        debug!(?action, "continuation scheduled");
        self.scheduled = Some(Scheduled { due, action });
    }

    fn fire(&mut self, action: Continuation) {
        debug!(?action, "continuation fired");
        match action {
            Continuation::BeginFalling => {}
            Continuation::ReplenishThenFall => {
                let filled = self.board.replenish(&mut self.source);
                debug!(filled, "batch replenish applied");
                self.refresh_counts();
            }
        }
        self.set_state(EngineState::Falling);
    }

    fn handle_matching(&mut self, now: Instant) {
        // Guard first so nothing re-enters matching while a continuation is pending.
        self.set_state(EngineState::Animating);

        let groups = self.board.find_matches();
        if !groups.is_empty() {
            // Any pending refill has landed by now; the next settle decides afresh.
            self.replenishing = false;
            self.combo += groups.len() as u32;
            debug!(groups = groups.len(), combo = self.combo, "matches cleared");
            self.events.push(BoardEvent::ComboChanged(self.combo));
            self.board.clear_groups(&groups);
            self.refresh_counts();
            self.schedule(now + self.config.settle_delay, Continuation::BeginFalling);
        } else if !self.skyfall && self.board.has_empty() && !self.replenishing {
            self.replenishing = true;
            self.schedule(now + self.config.replenish_delay, Continuation::ReplenishThenFall);
        } else {
            self.finish_cascade();
        }
    }

    fn handle_falling(&mut self) {
        let refill: Option<&mut dyn TokenSource> = if self.skyfall {
            Some(&mut self.source)
        } else {
            None
        };
        if self.board.gravity_pass(refill) {
            self.refresh_counts();
            return;
        }

        if self.skyfall || !self.replenishing {
            self.set_state(EngineState::Matching);
        } else if self.board.has_run() {
            // Replenished tokens lined up; resolve them before going idle.
            self.replenishing = false;
            self.set_state(EngineState::Matching);
        } else {
            self.finish_cascade();
        }
    }

    fn finish_cascade(&mut self) {
        self.replenishing = false;
        self.set_state(EngineState::Idle);
        if self.combo > 0 {
            info!(combo = self.combo, "combo resolved");
            self.events.push(BoardEvent::ComboResolved(self.combo));
        }
    }

    // --- input ---

    /// Pointer down at a grid-local point.
    pub fn press(&mut self, x: f32, y: f32) {
        match self.metrics.cell_at(x, y) {
            Some(pos) => self.press_at(pos, (x, y)),
            None => trace!(x, y, "press outside grid ignored"),
        }
    }

    /// Pointer down on a resolved cell.
    pub fn press_cell(&mut self, pos: Pos) {
        let point = self.metrics.center_of(pos);
        self.press_at(pos, point);
    }

    fn press_at(&mut self, pos: Pos, point: (f32, f32)) {
        if !self.board.contains(pos) {
            trace!(?pos, "press outside grid ignored");
            return;
        }
        match self.state {
            EngineState::Idle => {
                self.drag = Some(Drag { cell: pos, point });
                self.reset_combo();
                self.set_state(EngineState::Dragging);
            }
            EngineState::Edit => {
                self.paint(pos, self.selected);
            }
            _ => trace!(state = ?self.state, "press ignored"),
        }
    }

    /// Pointer moved to a grid-local point.
    pub fn move_to(&mut self, x: f32, y: f32) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        drag.point = (x, y);
        if let Some(pos) = self.metrics.cell_at(x, y) {
            self.drag_over(pos);
        }
    }

    /// Pointer moved onto a resolved cell.
    pub fn move_to_cell(&mut self, pos: Pos) {
        let point = self.metrics.center_of(pos);
        if let Some(drag) = self.drag.as_mut() {
            drag.point = point;
            self.drag_over(pos);
        }
    }

    /// Swap the held token into `pos` when the pointer enters a new cell.
    fn drag_over(&mut self, pos: Pos) {
        if self.state != EngineState::Dragging || !self.board.contains(pos) {
            return;
        }
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        if drag.cell == pos {
            return;
        }
        if !drag.cell.is_adjacent(pos) {
            debug!(from = ?drag.cell, to = ?pos, "pointer jumped; swapping non-adjacent cells");
        }
        self.board.swap(drag.cell, pos);
        drag.cell = pos;
    }

    /// Pointer up: end the drag and start resolving.
    pub fn release(&mut self) {
        if self.state != EngineState::Dragging {
            return;
        }
        self.drag = None;
        self.set_state(EngineState::Matching);
    }

    // --- edit mode ---

    pub fn enter_edit(&mut self) {
        if self.state != EngineState::Idle {
            trace!(state = ?self.state, "enter edit ignored");
            return;
        }
        self.reset_combo();
        self.set_state(EngineState::Edit);
    }

    pub fn exit_edit(&mut self) {
        if self.state == EngineState::Edit {
            self.set_state(EngineState::Idle);
        }
    }

    pub fn select_token(&mut self, kind: TokenKind) {
        self.selected = kind;
    }

    /// Write `kind` into `pos` without any match check. Only in edit mode;
    /// returns whether the cell was painted.
    pub fn paint(&mut self, pos: Pos, kind: TokenKind) -> bool {
        if self.state != EngineState::Edit || !self.board.set(pos, Cell::Token(kind)) {
            return false;
        }
        self.refresh_counts();
        true
    }

    // --- bookkeeping ---

    fn set_state(&mut self, next: EngineState) {
        if self.state == next {
            return;
        }
        debug!(from = ?self.state, to = ?next, "state change");
        self.state = next;
        self.events.push(BoardEvent::StateChanged(next));
    }

    fn reset_combo(&mut self) {
        if self.combo != 0 {
            self.combo = 0;
            self.events.push(BoardEvent::ComboChanged(0));
        }
    }

    fn refresh_counts(&mut self) {
        let counts = self.board.token_counts();
        if counts != self.counts {
            self.counts = counts;
            self.events.push(BoardEvent::TokenCountsChanged(counts));
        }
    }
}
