//! Layout and drawing: well, sidebar (next pairs, score), pause and game-over popups, pop fade.

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH};
use crate::piece::{PieceColor, PieceState};
use crate::resolve::Popped;
use crate::snapshot::Snapshot;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal cells per board cell, horizontally; keeps blobs roughly square.
const CELL_WIDTH: u16 = 2;
const CELL_HEIGHT: u16 = 1;
const BLOB: &str = "██";
const SIDEBAR_WIDTH: u16 = 22;
const POP_FADE_MS: u32 = 300;

/// Well size in terminal cells, border included.
fn well_size() -> (u16, u16) {
    (
        BOARD_WIDTH as u16 * CELL_WIDTH + 2,
        BOARD_HEIGHT as u16 * CELL_HEIGHT + 2,
    )
}

/// Everything the frame needs besides the snapshot.
pub struct Hud<'a> {
    pub theme: &'a Theme,
    pub next: &'a [(PieceColor, PieceColor)],
    pub best: u32,
    pub paused: bool,
}

/// Fade-out of the blobs removed by the latest resolution round.
#[derive(Default)]
pub struct PopAnimation {
    cells: Vec<Popped>,
    effect: Option<Effect>,
    last_process: Option<Instant>,
}

impl PopAnimation {
    /// Replace whatever is fading with a fresh set of popped blobs.
    pub fn start(&mut self, popped: Vec<Popped>) {
        self.cells = popped;
        self.effect = None;
        self.last_process = None;
    }

    pub fn is_active(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Drop the animation once its effect has run out.
    pub fn finish_if_done(&mut self) {
        if self.effect.as_ref().is_some_and(Effect::done) {
            *self = Self::default();
        }
    }
}

/// Well rect (border included) and sidebar rect, centred in `area`.
fn layout(area: Rect) -> (Rect, Rect) {
    let (ww, wh) = well_size();
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ww + SIDEBAR_WIDTH),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(wh.max(17)),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(ww), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let well = Rect {
        height: wh.min(inner[0].height),
        ..inner[0]
    };
    (well, inner[1])
}

/// Terminal position of the left half of board cell (col, row), if it is on screen.
fn cell_origin(board_rect: Rect, col: i32, row: i32) -> Option<(u16, u16)> {
    let col = u16::try_from(col).ok()?;
    let row = u16::try_from(row).ok()?;
    let x = board_rect.x + col * CELL_WIDTH;
    let y = board_rect.y + row * CELL_HEIGHT;
    (x + CELL_WIDTH <= board_rect.right() && y < board_rect.bottom()).then_some((x, y))
}

fn popped_buffer_positions(board_rect: Rect, cells: &[Popped]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for p in cells {
        if let Some((x0, y0)) = cell_origin(board_rect, p.col, p.row) {
            for dx in 0..CELL_WIDTH {
                set.insert((x0 + dx, y0));
            }
        }
    }
    set
}

/// Draw one frame: well, sidebar, then overlays. Drives the pop fade unless `animate` is off.
pub fn draw(
    frame: &mut Frame,
    snapshot: &Snapshot,
    hud: &Hud<'_>,
    pop: &mut PopAnimation,
    animate: bool,
    now: Instant,
) {
    let area = frame.area();
    let (well_area, sidebar_area) = layout(area);
    let board_rect = draw_well(frame, snapshot, hud.theme, well_area);
    if animate && pop.is_active() {
        apply_pop_effect(frame, hud.theme, board_rect, pop, now);
    }
    draw_sidebar(frame, snapshot, hud, sidebar_area);

    if snapshot.game_over {
        draw_game_over(frame, snapshot, hud, area);
    } else if hud.paused {
        draw_pause_overlay(frame, hud.theme, area);
    }
}

/// Bordered well with every visible piece; returns the inner board rect.
fn draw_well(frame: &mut Frame, snapshot: &Snapshot, theme: &Theme, area: Rect) -> Rect {
    let title = if snapshot.chain_level > 1 {
        format!(" Puyotui  {} chain! ", snapshot.chain_level)
    } else {
        " Puyotui ".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, theme.title));
    let board_rect = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for y in board_rect.top()..board_rect.bottom() {
        for x in board_rect.left()..board_rect.right() {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(theme.bg));
        }
    }

    for piece in snapshot.visible() {
        let Some((x, y)) = cell_origin(board_rect, piece.col, piece.row) else {
            continue;
        };
        let color = theme.blob_color(piece.color);
        // The controlled pair is drawn a shade brighter than the stack.
        let style = if piece.state == PieceState::Initial {
            Style::default().fg(color).bg(theme.bg).bold()
        } else {
            Style::default().fg(color).bg(theme.bg)
        };
        buf.set_string(x, y, BLOB, style);
    }
    board_rect
}

/// Paint the popped blobs back in and fade them to the background (TachyonFX).
fn apply_pop_effect(
    frame: &mut Frame,
    theme: &Theme,
    board_rect: Rect,
    pop: &mut PopAnimation,
    now: Instant,
) {
    let delta = pop
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = u32::try_from(delta.as_millis()).unwrap_or(u32::MAX);
    pop.last_process = Some(now);

    for p in &pop.cells {
        if let Some((x, y)) = cell_origin(board_rect, p.col, p.row) {
            let style = Style::default().fg(theme.blob_color(p.color)).bg(theme.bg);
            frame.buffer_mut().set_string(x, y, BLOB, style);
        }
    }

    if pop.effect.is_none() {
        let popped_set = popped_buffer_positions(board_rect, &pop.cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            popped_set.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_to(theme.bg, theme.bg, (POP_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board_rect);
        pop.effect = Some(effect);
    }

    if let Some(effect) = pop.effect.as_mut() {
        frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_sidebar(frame: &mut Frame, snapshot: &Snapshot, hud: &Hud<'_>, area: Rect) {
    let theme = hud.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Next (border + title + two pairs)
            Constraint::Length(5), // Stats (border + score, chain, best)
            Constraint::Length(6), // Keys
        ])
        .split(area);

    // --- Next ---
    let next_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Next ", title_style));
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    draw_next_preview(frame, theme, hud.next, next_inner);

    // --- Stats ---
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[1]);
    stats_block.render(chunks[1], frame.buffer_mut());
    let stat = |label: &'static str, value: u32| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value.to_string(), fg_style),
        ])
    };
    Paragraph::new(vec![
        stat("Score: ", snapshot.score),
        stat("Chain: ", snapshot.chain_level),
        stat("Best:  ", hud.best.max(snapshot.score)),
    ])
    .render(stats_inner, frame.buffer_mut());

    // --- Keys ---
    let hint = Style::default().fg(theme.inactive_fg);
    Paragraph::new(vec![
        Line::from(Span::styled(" ←→↓ / hjl  move", hint)),
        Line::from(Span::styled(" z / u      rotate ⟲", hint)),
        Line::from(Span::styled(" x ↑ / k    rotate ⟳", hint)),
        Line::from(Span::styled(" p pause  q quit", hint)),
    ])
    .render(chunks[2], frame.buffer_mut());
}

/// Pairs side by side, partner on top like at spawn.
fn draw_next_preview(
    frame: &mut Frame,
    theme: &Theme,
    next: &[(PieceColor, PieceColor)],
    area: Rect,
) {
    let buf = frame.buffer_mut();
    for (i, &(primary, partner)) in next.iter().enumerate() {
        let x = area.x + 1 + i as u16 * (CELL_WIDTH * 3);
        if x + CELL_WIDTH > area.right() || area.height < 3 {
            break;
        }
        let y = area.y + 1;
        buf.set_string(x, y, BLOB, Style::default().fg(theme.blob_color(partner)));
        buf.set_string(x, y + 1, BLOB, Style::default().fg(theme.blob_color(primary)));
    }
}

/// Centered popup rect of at most `w`×`h` inside `area`.
fn popup_rect(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = popup_rect(area, 28, 5);
    Clear.render(popup, frame.buffer_mut());
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(theme.title),
        )),
        Line::from(Span::styled(
            " P: Resume    Q: Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .style(Style::default().bg(theme.bg))
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, snapshot: &Snapshot, hud: &Hud<'_>, area: Rect) {
    let theme = hud.theme;
    let popup = popup_rect(area, 30, 7);
    Clear.render(popup, frame.buffer_mut());
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(Span::styled(" Game Over ", Style::default().fg(Color::Black).bg(theme.title))),
        Line::from(""),
        Line::from(Span::styled(format!("Score: {}", snapshot.score), fg)),
    ];
    if snapshot.score > 0 && snapshot.score >= hud.best {
        lines.push(Line::from(Span::styled("New best!", Style::default().fg(theme.title).bold())));
    } else {
        lines.push(Line::from(Span::styled(format!("Best: {}", hud.best), fg)));
    }
    lines.push(Line::from(Span::styled(
        "R: Restart   Q: Quit",
        Style::default().fg(theme.inactive_fg),
    )));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.title).bg(theme.bg)),
        )
        .style(Style::default().bg(theme.bg))
        .render(popup, frame.buffer_mut());
}
