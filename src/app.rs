//! App: terminal init, fixed-rate tick loop, key and mouse handling.

use crate::combat::Combat;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui;
use anyhow::{Result, bail};
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use dropcombo::{BoardConfig, BoardEngine, BoardEvent, EngineState, Pos};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::info;

pub struct App {
    theme: Theme,
    engine: BoardEngine,
    combat: Combat,
    tick_interval: Duration,
    last_tick: Instant,
    cursor: Pos,
    message: String,
}

impl App {
    pub fn new(config: BoardConfig, theme: Theme, tick_rate: f64) -> Result<Self> {
        if !(tick_rate.is_finite() && tick_rate > 0.0) {
            bail!("tick rate must be a positive number, got {tick_rate}");
        }
        let engine = BoardEngine::new(config.clone())?;
        let now = Instant::now();
        info!(
            rows = config.rows,
            cols = config.cols,
            skyfall = config.skyfall,
            "board ready"
        );
        Ok(Self {
            theme,
            engine,
            combat: Combat::new(now),
            tick_interval: Duration::from_secs_f64(1.0 / tick_rate),
            last_tick: now,
            cursor: Pos::new(0, 0),
            message: String::new(),
        })
    }

    /// New board and a fresh battle; the current skyfall setting carries over.
    fn restart(&mut self) -> Result<()> {
        let config = BoardConfig {
            skyfall: self.engine.skyfall(),
            ..self.engine.config().clone()
        };
        self.engine = BoardEngine::new(config)?;
        self.combat = Combat::new(Instant::now());
        self.cursor = Pos::new(0, 0);
        self.message.clear();
        info!("restarted");
        Ok(())
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal = DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;
        terminal.show_cursor()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let view = ui::View {
                engine: &self.engine,
                combat: &self.combat,
                theme: &self.theme,
                cursor: self.cursor,
                message: &self.message,
            };
            let mut metrics = self.engine.metrics();
            terminal.draw(|f| metrics = ui::draw(f, &view))?;
            self.engine.set_metrics(metrics);

            let timeout = self.tick_interval.saturating_sub(self.last_tick.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if self.apply_action(key_to_action(key))? {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => self.apply_mouse(mouse),
                        _ => {}
                    }
                }
            }

            if self.last_tick.elapsed() >= self.tick_interval {
                let now = Instant::now();
                self.last_tick = now;
                self.tick(now);
            }
        }
    }

    fn tick(&mut self, now: Instant) {
        self.combat.tick(now);
        self.engine.update(now);
        for event in self.engine.dispatch_combos(&mut self.combat) {
            self.on_board_event(event);
        }
        if self.engine.state() == EngineState::Animating && self.engine.is_replenishing() {
            self.message = "Replenishing...".to_string();
        }
    }

    fn on_board_event(&mut self, event: BoardEvent) {
        match event {
            BoardEvent::StateChanged(EngineState::Dragging) => {
                self.message = "Moving...".to_string();
            }
            BoardEvent::StateChanged(EngineState::Matching) if self.engine.combo() == 0 => {
                self.message = "Matching...".to_string();
            }
            BoardEvent::StateChanged(EngineState::Edit) => {
                self.message = "Edit Mode".to_string();
            }
            BoardEvent::ComboChanged(combo) if combo > 0 => {
                self.message = format!("{combo} Combo!");
            }
            BoardEvent::ComboResolved(combo) => {
                self.message = format!("{combo} Combo!");
            }
            _ => {}
        }
    }

    /// Returns true when the app should quit.
    fn apply_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::Quit => return Ok(true),
            Action::Restart => self.restart()?,
            Action::Grab if self.engine.state() == EngineState::Dragging => self.engine.release(),
            // The battle is over; only restart, quit or letting go.
            _ if self.combat.outcome().is_some() => {}
            Action::CursorLeft => self.move_cursor(0, -1),
            Action::CursorRight => self.move_cursor(0, 1),
            Action::CursorUp => self.move_cursor(-1, 0),
            Action::CursorDown => self.move_cursor(1, 0),
            Action::Grab => self.engine.press_cell(self.cursor),
            Action::ToggleEdit => {
                if self.engine.state() == EngineState::Edit {
                    self.engine.exit_edit();
                    self.message.clear();
                } else {
                    self.engine.enter_edit();
                }
            }
            Action::ToggleSkyfall => {
                let on = self.engine.toggle_skyfall();
                info!(skyfall = on, "skyfall toggled");
            }
            Action::Select(kind) => self.engine.select_token(kind),
            Action::None => {}
        }
        Ok(false)
    }

    fn move_cursor(&mut self, d_row: isize, d_col: isize) {
        let board = self.engine.board();
        let row = self
            .cursor
            .row
            .saturating_add_signed(d_row)
            .min(board.rows().saturating_sub(1));
        let col = self
            .cursor
            .col
            .saturating_add_signed(d_col)
            .min(board.cols().saturating_sub(1));
        self.cursor = Pos::new(row, col);
        self.engine.move_to_cell(self.cursor);
    }

    fn apply_mouse(&mut self, mouse: MouseEvent) {
        // A drag cut short by the battle ending must still be let go.
        if self.combat.outcome().is_some() {
            if let MouseEventKind::Up(MouseButton::Left) = mouse.kind {
                self.engine.release();
            }
            return;
        }
        let x = f32::from(mouse.column);
        let y = f32::from(mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.engine.press(x, y),
            // Dragging in edit mode paints a stroke.
            MouseEventKind::Drag(MouseButton::Left) if self.engine.state() == EngineState::Edit => {
                self.engine.press(x, y);
            }
            MouseEventKind::Drag(MouseButton::Left) => self.engine.move_to(x, y),
            MouseEventKind::Up(MouseButton::Left) => self.engine.release(),
            _ => return,
        }
        if let Some(pos) = self.engine.metrics().cell_at(x, y) {
            if self.engine.board().contains(pos) {
                self.cursor = pos;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn app() -> App {
        let config = BoardConfig {
            seed: Some(3),
            ..BoardConfig::default()
        };
        App::new(config, Theme::default(), 60.0).unwrap()
    }

    fn mouse(kind: MouseEventKind) -> MouseEvent {
        MouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_rejects_bad_tick_rate() {
        let result = App::new(BoardConfig::default(), Theme::default(), 0.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_mouse_up_releases_drag_after_defeat() {
        let mut app = app();
        app.apply_mouse(mouse(MouseEventKind::Down(MouseButton::Left)));
        assert_eq!(app.engine.state(), EngineState::Dragging);

        app.combat.player_hp = 0;
        app.apply_mouse(mouse(MouseEventKind::Down(MouseButton::Left)));
        app.apply_mouse(mouse(MouseEventKind::Up(MouseButton::Left)));
        assert_eq!(app.engine.state(), EngineState::Matching);
    }

    #[test]
    fn test_grab_key_releases_drag_after_defeat() {
        let mut app = app();
        assert!(!app.apply_action(Action::Grab).unwrap());
        assert_eq!(app.engine.state(), EngineState::Dragging);

        app.combat.player_hp = 0;
        app.apply_action(Action::CursorRight).unwrap();
        assert_eq!(app.cursor, Pos::new(0, 0));
        app.apply_action(Action::Grab).unwrap();
        assert_eq!(app.engine.state(), EngineState::Matching);
    }
}
