//! Layout and drawing: board, battle gauges, combo, token counts, palette.

use crate::combat::{Combat, Outcome};
use crate::theme::Theme;
use dropcombo::{BoardEngine, Cell, CellMetrics, EngineState, Pos, TokenKind};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget};

/// Terminal cells per board cell.
const CELL_WIDTH: u16 = 4;
const CELL_HEIGHT: u16 = 2;
const SIDEBAR_WIDTH: u16 = 28;
const SIDEBAR_HEIGHT: u16 = 25;

/// Heart is drawn square, every other kind round.
const ROUND: [&str; 2] = ["▗██▖", "▝██▘"];
const SQUARE: [&str; 2] = ["▐██▌", "▐██▌"];
const EMPTY: [&str; 2] = ["    ", "    "];

/// Everything one frame needs.
pub struct View<'a> {
    pub engine: &'a BoardEngine,
    pub combat: &'a Combat,
    pub theme: &'a Theme,
    /// Keyboard cursor.
    pub cursor: Pos,
    pub message: &'a str,
}

fn glyph(kind: TokenKind) -> [&'static str; 2] {
    if kind == TokenKind::Heart {
        SQUARE
    } else {
        ROUND
    }
}

/// Short palette glyph, same shape rule as the board.
fn mini_glyph(kind: TokenKind) -> &'static str {
    if kind == TokenKind::Heart { "■" } else { "●" }
}

/// Board panel size in terminal cells, border included.
fn board_panel_size(rows: usize, cols: usize) -> (u16, u16) {
    let rows = u16::try_from(rows).unwrap_or(u16::MAX);
    let cols = u16::try_from(cols).unwrap_or(u16::MAX);
    (
        cols.saturating_mul(CELL_WIDTH).saturating_add(2),
        rows.saturating_mul(CELL_HEIGHT).saturating_add(2),
    )
}

/// Draw the whole screen and return the pointer mapping for the board as drawn.
pub fn draw(frame: &mut Frame, view: &View<'_>) -> CellMetrics {
    let area = frame.area();
    let board = view.engine.board();
    let (pw, ph) = board_panel_size(board.rows(), board.cols());
    let total_w = pw.saturating_add(SIDEBAR_WIDTH);
    let total_h = ph.max(SIDEBAR_HEIGHT);

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    // Center horizontally
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(outer[0]);
    // Center vertically
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let board_area = Rect {
        height: ph.min(columns[0].height),
        ..columns[0]
    };

    let metrics = draw_board(frame, view, board_area);
    draw_sidebar(frame, view, columns[1]);
    draw_help(frame, view.theme, outer[1]);
    if let Some(outcome) = view.combat.outcome() {
        draw_outcome(frame, view.theme, outcome, area);
    }
    metrics
}

fn draw_board(frame: &mut Frame, view: &View<'_>, area: Rect) -> CellMetrics {
    let theme = view.theme;
    let engine = view.engine;
    let title_style = if engine.state() == EngineState::Edit {
        Style::default().fg(Color::Black).bg(theme.title)
    } else {
        Style::default().fg(theme.title)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Dropcombo ", title_style));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let held = engine.drag_cell();
    let show_cursor = !engine.is_resolving();
    let buf = frame.buffer_mut();
    let board = engine.board();
    for row in 0..board.rows() {
        for col in 0..board.cols() {
            let pos = Pos::new(row, col);
            let (Ok(r), Ok(c)) = (u16::try_from(row), u16::try_from(col)) else {
                continue;
            };
            let x = inner.x + c * CELL_WIDTH;
            let y = inner.y + r * CELL_HEIGHT;
            if x + CELL_WIDTH > inner.right() || y + CELL_HEIGHT > inner.bottom() {
                continue;
            }
            let bg = if held == Some(pos) {
                theme.main_fg
            } else if show_cursor && view.cursor == pos {
                theme.div_line
            } else {
                theme.bg
            };
            let (lines, fg) = match board.get(pos) {
                Some(Cell::Token(kind)) => (glyph(kind), theme.token_color(kind)),
                _ => (EMPTY, theme.bg),
            };
            let style = Style::default().fg(fg).bg(bg);
            for (dy, line) in (0..CELL_HEIGHT).zip(lines) {
                buf.set_string(x, y + dy, line, style);
            }
        }
    }

    CellMetrics {
        cell_width: f32::from(CELL_WIDTH),
        cell_height: f32::from(CELL_HEIGHT),
        offset_x: f32::from(inner.x),
        offset_y: f32::from(inner.y),
    }
}

fn sidebar_block(theme: &Theme, title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(theme.title),
        ))
}

fn draw_sidebar(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Battle (enemy + player gauges)
            Constraint::Length(5), // Combo, skyfall, message
            Constraint::Length(8), // Token counts
            Constraint::Length(3), // Palette
        ])
        .split(area);
    draw_battle(frame, view, chunks[0]);
    draw_status(frame, view, chunks[1]);
    draw_counts(frame, view, chunks[2]);
    draw_palette(frame, view, chunks[3]);
}

fn draw_battle(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let combat = view.combat;
    let block = sidebar_block(theme, "Battle");
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1); 4])
        .split(inner);
    let fg = Style::default().fg(theme.main_fg);

    let enemy_label = match combat.last_damage {
        Some(damage) => format!("{}  -{damage}", combat.enemy_name),
        None => combat.enemy_name.to_string(),
    };
    Paragraph::new(Line::from(Span::styled(enemy_label, fg))).render(rows[0], frame.buffer_mut());
    Gauge::default()
        .ratio(combat.enemy_ratio().clamp(0.0, 1.0))
        .label(format!("{}", combat.enemy_hp))
        .gauge_style(Style::default().fg(Color::Red).bg(theme.bg))
        .render(rows[1], frame.buffer_mut());
    Paragraph::new(Line::from(Span::styled("You", fg))).render(rows[2], frame.buffer_mut());
    Gauge::default()
        .ratio(combat.player_ratio().clamp(0.0, 1.0))
        .label(format!("{}", combat.player_hp))
        .gauge_style(Style::default().fg(Color::Green).bg(theme.bg))
        .render(rows[3], frame.buffer_mut());
}

fn draw_status(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let engine = view.engine;
    let block = sidebar_block(theme, "Combo");
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let (skyfall, skyfall_color) = if engine.skyfall() {
        ("ON", Color::Green)
    } else {
        ("OFF", theme.inactive_fg)
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("Combo: ", title_style),
            Span::styled(engine.combo().to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Skyfall: ", title_style),
            Span::styled(skyfall, Style::default().fg(skyfall_color)),
        ]),
        Line::from(Span::styled(
            view.message.to_string(),
            fg_style.add_modifier(Modifier::BOLD),
        )),
    ];
    Paragraph::new(Text::from(lines)).render(inner, frame.buffer_mut());
}

fn draw_counts(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let block = sidebar_block(theme, "Tokens");
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());
    let fg_style = Style::default().fg(theme.main_fg);
    let lines: Vec<Line> = TokenKind::ALL
        .iter()
        .zip(view.engine.token_counts())
        .filter(|(_, count)| *count > 0)
        .map(|(&kind, count)| {
            Line::from(vec![
                Span::styled(
                    mini_glyph(kind),
                    Style::default().fg(theme.token_color(kind)),
                ),
                Span::styled(format!(" {:<6}{count:>3}", kind.name()), fg_style),
            ])
        })
        .collect();
    Paragraph::new(Text::from(lines)).render(inner, frame.buffer_mut());
}

fn draw_palette(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let editing = view.engine.state() == EngineState::Edit;
    let block = sidebar_block(theme, if editing { "Palette [edit]" } else { "Palette" });
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());
    let selected = view.engine.selected_token();
    let mut spans = Vec::with_capacity(TokenKind::ALL.len() * 2);
    for (i, &kind) in TokenKind::ALL.iter().enumerate() {
        let mut style = Style::default().fg(theme.token_color(kind));
        if kind == selected {
            style = style.bg(theme.div_line).add_modifier(Modifier::BOLD);
        }
        spans.push(Span::styled(format!("{}{}", i + 1, mini_glyph(kind)), style));
        spans.push(Span::raw(" "));
    }
    Paragraph::new(Line::from(spans)).render(inner, frame.buffer_mut());
}

fn draw_help(frame: &mut Frame, theme: &Theme, area: Rect) {
    let help = "mouse/arrows+space drag  e edit  1-6 token  s skyfall  r restart  q quit";
    Paragraph::new(Line::from(Span::styled(
        help,
        Style::default().fg(theme.inactive_fg),
    )))
    .alignment(Alignment::Center)
    .render(area, frame.buffer_mut());
}

fn draw_outcome(frame: &mut Frame, theme: &Theme, outcome: Outcome, area: Rect) {
    let popup_w = 30u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let (text, color) = match outcome {
        Outcome::Victory => (" Victory! ", Color::Yellow),
        Outcome::Defeat => (" Game Over... ", Color::Red),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            text,
            Style::default().fg(Color::Black).bg(color),
        )),
        Line::from(Span::styled(
            " R  New battle    Q  Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_panel_size_includes_border() {
        assert_eq!(board_panel_size(5, 6), (6 * CELL_WIDTH + 2, 5 * CELL_HEIGHT + 2));
    }

    #[test]
    fn test_heart_is_square() {
        assert_eq!(glyph(TokenKind::Heart), SQUARE);
        assert_eq!(glyph(TokenKind::Fire), ROUND);
        assert_eq!(mini_glyph(TokenKind::Heart), "■");
    }
}
