use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use minesweep_engine::{Board, Coordinate, Difficulty, Error, RevealOutcome, Settings, Status, Value};
use num_traits::ToPrimitive;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const CELL_WIDTH: usize = 3;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    Continue,
    Quit,
}

pub(crate) struct App {
    board: Board,
    difficulty: Difficulty,
    // only the first game uses a caller supplied seed
    seed: Option<u64>,
    cursor: Coordinate,
    message: Option<String>,
}

impl App {
    pub(crate) fn new(difficulty: Difficulty, seed: Option<u64>) -> Self {
        let mut app = Self {
            board: Board::new(difficulty),
            difficulty,
            seed,
            cursor: (0, 0),
            message: None,
        };
        app.new_game();
        app
    }

    pub(crate) fn board(&self) -> &Board {
        &self.board
    }

    fn new_game(&mut self) {
        let settings = Settings::builder()
            .difficulty(self.difficulty)
            .seed(self.seed.take())
            .build();
        self.board = Board::with_settings(settings);
        self.cursor = (self.board.rows() / 2, self.board.columns() / 2);
        self.message = None;
        tracing::info!(difficulty = %self.difficulty, seed = ?self.board.seed(), "new game");
    }

    fn move_cursor(&mut self, rows: isize, columns: isize) {
        let (r, c) = self.cursor;
        self.cursor = (
            r.saturating_add_signed(rows).min(self.board.rows() - 1),
            c.saturating_add_signed(columns).min(self.board.columns() - 1),
        );
    }

    fn reveal(&mut self) {
        self.message = match self.board.reveal_at(self.cursor) {
            Ok(RevealOutcome::MineHit) => Some("Boom! You hit a mine.".to_owned()),
            Ok(RevealOutcome::AlreadyOver) => Some("The game is over.".to_owned()),
            Ok(RevealOutcome::Unflagged) => Some("Flag removed.".to_owned()),
            Ok(_) if self.board.won() => Some("You win!".to_owned()),
            Ok(_) => None,
            Err(err) => Some(err.to_string()),
        };
    }

    fn flag(&mut self) {
        let result = self
            .board
            .index_of(self.cursor)
            .and_then(|index| self.board.toggle_flag(index));
        self.message = match result {
            Ok(_) => None,
            Err(Error::NoFlagsRemaining) => Some("No flags left.".to_owned()),
            Err(err) => Some(err.to_string()),
        };
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Action::Quit
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1, 0),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1, 0),
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(0, -1),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(0, 1),
            KeyCode::Char(' ') | KeyCode::Enter => self.reveal(),
            KeyCode::Char('f') => self.flag(),
            KeyCode::Char('n') => self.new_game(),
            _ => {}
        }
        Action::Continue
    }

    fn status_line(&self) -> Line<'static> {
        let (text, color) = match self.board.status() {
            Status::InProgress => ("playing", Color::White),
            Status::Won => ("won", Color::Green),
            Status::Lost => ("lost", Color::Red),
        };
        Line::from(vec![
            Span::raw(format!(
                "{}  flags: {}  tiles: {}  ",
                self.difficulty,
                self.board.flags_remaining(),
                self.board.tiles_remaining()
            )),
            Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ])
    }

    fn cell(&self, coord: Coordinate) -> Span<'static> {
        let Ok(tile) = self.board.tile_at(coord) else {
            return Span::raw(" ".repeat(CELL_WIDTH));
        };
        let over = self.board.is_over();
        let (symbol, style) = if tile.revealed() || (over && tile.is_mine()) {
            match tile.value() {
                Value::Mine => ('*', Style::default().fg(Color::Red)),
                Value::Proximity(0) => (' ', Style::default()),
                Value::Proximity(n) => (char::from(b'0' + n), Style::default().fg(number_color(n))),
            }
        } else if tile.flagged() {
            ('F', Style::default().fg(Color::Yellow))
        } else {
            ('·', Style::default().fg(Color::DarkGray))
        };
        let style = if coord == self.cursor {
            style.add_modifier(Modifier::REVERSED)
        } else {
            style
        };
        Span::styled(format!(" {symbol} "), style)
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.size());

        let mut header = vec![self.status_line()];
        if let Some(message) = &self.message {
            header.push(Line::from(message.clone()));
        }
        frame.render_widget(Paragraph::new(header).alignment(Alignment::Center), chunks[0]);

        let grid = (0..self.board.rows())
            .map(|r| {
                (0..self.board.columns())
                    .map(|c| self.cell((r, c)))
                    .collect::<Vec<_>>()
            })
            .map(Line::from)
            .collect::<Vec<_>>();
        let width = (self.board.columns() * CELL_WIDTH + 2).to_u16().unwrap_or(u16::MAX);
        let height = (self.board.rows() + 2).to_u16().unwrap_or(u16::MAX);
        frame.render_widget(
            Paragraph::new(grid).block(Block::default().borders(Borders::ALL).title(" minesweep ")),
            centered(chunks[1], width, height),
        );

        frame.render_widget(
            Paragraph::new("arrows/hjkl move  space reveal  f flag  n new game  q quit")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray)),
            chunks[2],
        );
    }
}

fn number_color(n: u8) -> Color {
    match n {
        1 => Color::Blue,
        2 => Color::Green,
        3 => Color::Red,
        4 => Color::Magenta,
        5 => Color::LightRed,
        6 => Color::Cyan,
        _ => Color::White,
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
