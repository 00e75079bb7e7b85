//! Terminal painting. Nothing here changes game state.

use crate::engine::{EndReason, Status};
use crate::grid::{Cell, GridSize};
use crate::snek::Snek;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

/// Terminal columns per grid cell; rows are about twice as tall as columns
/// are wide, so two columns keep cells roughly square.
pub const CELL_COLUMNS: u16 = 2;

const FOOD_SYMBOL: &str = "♦";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Ready,
    Playing,
    Paused,
    Over(EndReason),
}

/// The playing field: cells of the grid mapped onto the widget area.
pub struct Board<'a> {
    pub snake: &'a Snek,
    pub food: Cell,
    pub grid: GridSize,
}

impl Board<'_> {
    fn paint(buf: &mut Buffer, area: Rect, cell: Cell, symbol: &str, style: Style) {
        let x = area.x + cell.x * CELL_COLUMNS;
        let y = area.y + cell.y;
        if y >= area.bottom() {
            return;
        }
        for (i, column) in (x..x + CELL_COLUMNS).enumerate() {
            if column >= area.right() {
                break;
            }
            if let Some(slot) = buf.cell_mut((column, y)) {
                slot.set_symbol(if i == 0 { symbol } else { " " }).set_style(style);
            }
        }
    }
}

impl Widget for &Board<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Board::paint(buf, area, self.food, FOOD_SYMBOL, Style::new().fg(Color::LightRed));

        for (i, cell) in self.snake.iter().enumerate() {
            let style = if i == 0 {
                Style::new().bg(Color::Yellow)
            } else {
                Style::new().bg(Color::Green)
            };
            Board::paint(buf, area, *cell, " ", style);
        }
    }
}

/// Everything one frame shows.
pub struct Scene<'a> {
    pub board: Board<'a>,
    pub status: Status,
    pub phase: Phase,
    pub interval_ms: u128,
    pub clock: String,
    pub autopilot: Option<(&'a str, bool)>,
}

/// Draws a frame and returns the room available for the board, measured in
/// terminal cells, so the caller can size the grid to it.
pub fn draw(frame: &mut Frame, scene: &Scene<'_>) -> Rect {
    let layout = Layout::default()
        .direction(layout::Direction::Vertical)
        .constraints([
            Constraint::Length(3), // scores
            Constraint::Min(0),    // game area
            Constraint::Length(1), // key help
        ])
        .split(frame.area());

    frame.render_widget(
        Paragraph::new(hud_line(scene))
            .alignment(Alignment::Left)
            .block(Block::default().title("SNEK").borders(Borders::ALL)),
        layout[0],
    );

    let room = Block::default().borders(Borders::ALL).inner(layout[1]);
    let board_area = board_rect(layout[1], scene.board.grid);

    let title = match scene.phase {
        Phase::Ready => "Ready",
        Phase::Playing => "Playing",
        Phase::Paused => "Paused. Press SPACE to continue",
        Phase::Over(_) => "Game over",
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(board_area);
    frame.render_widget(block, board_area);
    frame.render_widget(&scene.board, inner);

    match scene.phase {
        Phase::Ready => overlay(frame, inner, "Press SPACE to start".to_string()),
        Phase::Over(reason) => overlay(
            frame,
            inner,
            format!(
                "GAME OVER\n{}\nFinal Score: {}\nPress R to reset",
                describe(reason),
                scene.status.score
            ),
        ),
        Phase::Playing | Phase::Paused => {}
    }

    frame.render_widget(
        Paragraph::new("arrows/wasd steer  space pause  r reset  +/- speed  p autopilot  q quit")
            .style(Style::new().fg(Color::DarkGray)),
        layout[2],
    );

    room
}

fn hud_line(scene: &Scene<'_>) -> String {
    let pilot = match scene.autopilot {
        Some((name, true)) => format!("Autopilot: {}", name),
        Some((name, false)) => format!("Autopilot: {} (off)", name),
        None => "Autopilot: none".to_string(),
    };
    format!(
        "Score: {}    High Score: {}    Length: {}    Speed: {}ms    Time: {}    {}",
        scene.status.score,
        scene.status.high_score,
        scene.status.snake_len,
        scene.interval_ms,
        scene.clock,
        pilot
    )
}

fn describe(reason: EndReason) -> &'static str {
    match reason {
        EndReason::Wall => "Hit the wall",
        EndReason::SelfCollision => "Bit your own tail",
        EndReason::BoardFilled => "Board filled!",
    }
}

/// The bordered board, centred in `area` and clipped to it.
fn board_rect(area: Rect, grid: GridSize) -> Rect {
    let width = grid.width.saturating_mul(CELL_COLUMNS).saturating_add(2);
    let height = grid.height.saturating_add(2);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height).intersection(area)
}

fn overlay(frame: &mut Frame, area: Rect, text: String) {
    let lines = text.lines().count() as u16;
    let width = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(lines + 2) / 2,
        width,
        lines + 2,
    )
    .intersection(area);

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        popup,
    );
}
