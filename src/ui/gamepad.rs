/// Gamepad input via gilrs, translated into the same `Command`s the
/// keyboard produces.
///
/// Button mapping is loaded from config.toml. Default mapping:
///   D-pad / Left Stick    →  Movement (menu navigation outside the level)
///   B / A / X / Y         →  Red / Green / Blue / Yellow
///   Start                 →  Confirm
///   Select                →  Back to the start screen

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
use tracing::info;

use crate::config::GamepadConfig;
use crate::domain::color::Color;
use crate::domain::entity::Direction;
use crate::sim::controls::{Command, KeyAction};

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

const DIRECTIONS: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2 => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    colors: Vec<(Btn, Color)>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            colors: vec![
                (Btn::B, Color::Red),
                (Btn::A, Color::Green),
                (Btn::X, Color::Blue),
                (Btn::Y, Color::Yellow),
            ],
            confirm: vec![Btn::Start],
            cancel: vec![Btn::Select],
        }
    }
}

impl ActionMap {
    fn command_for(&self, btn: Btn) -> Option<Command> {
        if self.confirm.contains(&btn) {
            return Some(Command::Confirm);
        }
        if self.cancel.contains(&btn) {
            return Some(Command::Back);
        }
        self.colors.iter().find(|(b, _)| *b == btn).map(|&(_, c)| Command::Shift(c))
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// D-pad held, indexed like `DIRECTIONS`.
    dpad: [bool; 4],
    stick_x: f32,
    stick_y: f32,
    /// Combined direction state reported last frame.
    reported: [bool; 4],

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(_) => (None, false),
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        if connected {
            info!("gamepad connected");
        }

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            dpad: [false; 4],
            stick_x: 0.0,
            stick_y: 0.0,
            reported: [false; 4],
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Empty or unparseable lists keep
    /// the default binding.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let lists = [
            (&cfg.red, Color::Red),
            (&cfg.green, Color::Green),
            (&cfg.blue, Color::Blue),
            (&cfg.yellow, Color::Yellow),
        ];
        for (names, color) in lists {
            let btns = parse_list(names);
            if !btns.is_empty() {
                map.colors.retain(|(_, c)| *c != color);
                map.colors.extend(btns.into_iter().map(|b| (b, color)));
            }
        }
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() { map.confirm = cf; }
        let ca = parse_list(&cfg.cancel);
        if !ca.is_empty() { map.cancel = ca; }
    }

    /// Poll the pad and return the commands it produced this frame.
    pub fn update(&mut self) -> Vec<(Command, KeyAction)> {
        #[allow(unused_mut)]
        let mut out = vec![];

        #[cfg(feature = "gamepad")]
        self.poll_gilrs(&mut out);

        self.direction_edges(&mut out);
        out
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self, out: &mut Vec<(Command, KeyAction)>) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.button(btn, KeyAction::Press, out);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.button(btn, KeyAction::Release, out);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    info!("gamepad disconnected");
                    self.connected = false;
                    self.dpad = [false; 4];
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn button(&mut self, gilrs_btn: Button, action: KeyAction, out: &mut Vec<(Command, KeyAction)>) {
        let held = action == KeyAction::Press;
        // D-pad feeds the direction state; edges are emitted once per frame
        match gilrs_btn {
            Button::DPadUp => self.dpad[0] = held,
            Button::DPadDown => self.dpad[1] = held,
            Button::DPadLeft => self.dpad[2] = held,
            Button::DPadRight => self.dpad[3] = held,
            other => {
                if let Some(cmd) = Btn::from_gilrs(other).and_then(|b| self.action_map.command_for(b)) {
                    out.push((cmd, action));
                }
            }
        }
    }

    /// Combine D-pad and stick, and report directions that changed.
    fn direction_edges(&mut self, out: &mut Vec<(Command, KeyAction)>) {
        let stick = [
            self.stick_y > STICK_DEADZONE,
            self.stick_y < -STICK_DEADZONE,
            self.stick_x < -STICK_DEADZONE,
            self.stick_x > STICK_DEADZONE,
        ];
        for (i, dir) in DIRECTIONS.iter().enumerate() {
            let now = self.dpad[i] || stick[i];
            if now != self.reported[i] {
                let action = if now { KeyAction::Press } else { KeyAction::Release };
                out.push((Command::Move(*dir), action));
                self.reported[i] = now;
            }
        }
    }
}
