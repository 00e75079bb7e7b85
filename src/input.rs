use crate::grid::Direction;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Everything a player can ask of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Steer(Direction),
    TogglePause,
    Start,
    Reset,
    Faster,
    Slower,
    ToggleAutopilot,
    Quit,
}

impl Command {
    pub fn from_key(key: KeyEvent) -> Option<Command> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Command::Quit);
        }

        let command = match key.code {
            KeyCode::Up => Command::Steer(Direction::North),
            KeyCode::Down => Command::Steer(Direction::South),
            KeyCode::Left => Command::Steer(Direction::West),
            KeyCode::Right => Command::Steer(Direction::East),
            KeyCode::Enter => Command::Start,
            KeyCode::Esc => Command::Quit,
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'w' => Command::Steer(Direction::North),
                's' => Command::Steer(Direction::South),
                'a' => Command::Steer(Direction::West),
                'd' => Command::Steer(Direction::East),
                ' ' => Command::TogglePause,
                'r' => Command::Reset,
                '+' | '=' => Command::Faster,
                '-' | '_' => Command::Slower,
                'p' => Command::ToggleAutopilot,
                'q' => Command::Quit,
                _ => return None,
            },
            _ => return None,
        };
        Some(command)
    }
}
