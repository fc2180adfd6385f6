/// Key bindings.
///
/// Front-ends translate device events into `KeyInput`s; this module turns
/// them into game `Command`s through the active `ControlScheme`. Each scheme
/// is a pair of lookup tables (movement keys and color keys), so adding a
/// scheme is data, not code.

use crate::domain::color::Color;
use crate::domain::entity::Direction;
use super::world::GameState;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    W,
    A,
    S,
    D,
    Enter,
    Escape,
    R,
    One,
    Two,
    Comma,
    Period,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyAction {
    Press,
    Release,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Modifiers {
    pub shift: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct KeyInput {
    pub key: Key,
    pub action: KeyAction,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn press(key: Key) -> Self {
        KeyInput { key, action: KeyAction::Press, modifiers: Modifiers::default() }
    }

    pub fn release(key: Key) -> Self {
        KeyInput { key, action: KeyAction::Release, modifiers: Modifiers::default() }
    }

    pub fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Direction),
    Shift(Color),
    Confirm,
    Back,
    UseScheme(ControlScheme),
    Reset,
    SlowDown,
    SpeedUp,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ControlScheme {
    #[default]
    Wasd,
    Arrows,
}

const WASD_MOVES: [(Key, Direction); 4] = [
    (Key::W, Direction::Up),
    (Key::S, Direction::Down),
    (Key::A, Direction::Left),
    (Key::D, Direction::Right),
];

const ARROW_MOVES: [(Key, Direction); 4] = [
    (Key::Up, Direction::Up),
    (Key::Down, Direction::Down),
    (Key::Left, Direction::Left),
    (Key::Right, Direction::Right),
];

const ARROW_COLORS: [(Key, Color); 4] = [
    (Key::Up, Color::Red),
    (Key::Down, Color::Green),
    (Key::Left, Color::Blue),
    (Key::Right, Color::Yellow),
];

const WASD_COLORS: [(Key, Color); 4] = [
    (Key::W, Color::Red),
    (Key::S, Color::Green),
    (Key::A, Color::Blue),
    (Key::D, Color::Yellow),
];

impl ControlScheme {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "wasd" => Some(ControlScheme::Wasd),
            "arrows" => Some(ControlScheme::Arrows),
            _ => None,
        }
    }

    fn moves(self) -> &'static [(Key, Direction)] {
        match self {
            ControlScheme::Wasd => &WASD_MOVES,
            ControlScheme::Arrows => &ARROW_MOVES,
        }
    }

    /// Color keys are whichever cluster the scheme does not move with.
    fn colors(self) -> &'static [(Key, Color)] {
        match self {
            ControlScheme::Wasd => &ARROW_COLORS,
            ControlScheme::Arrows => &WASD_COLORS,
        }
    }

    pub fn direction_for(self, key: Key) -> Option<Direction> {
        self.moves().iter().find(|(k, _)| *k == key).map(|&(_, d)| d)
    }

    pub fn color_for(self, key: Key) -> Option<Color> {
        self.colors().iter().find(|(k, _)| *k == key).map(|&(_, c)| c)
    }
}

/// Map a key to a command. Menus accept both Up/W and Down/S for
/// navigation regardless of scheme.
pub fn command_for(scheme: ControlScheme, state: GameState, input: &KeyInput) -> Option<Command> {
    match input.key {
        Key::Enter => return Some(Command::Confirm),
        Key::Escape => return Some(Command::Back),
        Key::One => return Some(Command::UseScheme(ControlScheme::Wasd)),
        Key::Two => return Some(Command::UseScheme(ControlScheme::Arrows)),
        _ => {}
    }

    if state != GameState::Level1 {
        return match input.key {
            Key::Up | Key::W => Some(Command::Move(Direction::Up)),
            Key::Down | Key::S => Some(Command::Move(Direction::Down)),
            _ => None,
        };
    }

    match input.key {
        Key::R => Some(Command::Reset),
        Key::Comma if input.modifiers.shift => Some(Command::SlowDown),
        Key::Period if input.modifiers.shift => Some(Command::SpeedUp),
        key => scheme
            .direction_for(key)
            .map(Command::Move)
            .or_else(|| scheme.color_for(key).map(Command::Shift)),
    }
}
