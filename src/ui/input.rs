/// Keyboard input: crossterm events turned into `KeyInput`s.
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't
/// support it: a key with no Press/Repeat for `HOLD_TIMEOUT` is reported
/// released.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::sim::controls::{Key, KeyAction, KeyInput, Modifiers};

/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Held keys with the time of their last Press/Repeat.
    last_active: HashMap<Key, (Instant, Modifiers)>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

/// Map a terminal key to a game key. `<` and `>` are the shifted comma
/// and period on most layouts.
fn translate(code: KeyCode, mods: KeyModifiers) -> Option<(Key, Modifiers)> {
    let shift = Modifiers { shift: mods.contains(KeyModifiers::SHIFT) };
    let key = match code {
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Key::W,
            'a' => Key::A,
            's' => Key::S,
            'd' => Key::D,
            'r' => Key::R,
            '1' => Key::One,
            '2' => Key::Two,
            ',' => Key::Comma,
            '.' => Key::Period,
            '<' => return Some((Key::Comma, Modifiers { shift: true })),
            '>' => return Some((Key::Period, Modifiers { shift: true })),
            _ => return None,
        },
        _ => return None,
    };
    Some((key, shift))
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per loop iteration.
    pub fn drain_events(&mut self) -> Vec<KeyInput> {
        self.raw_events.clear();
        let mut out = vec![];

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.raw_events.push(key);
                self.handle(key, Instant::now(), &mut out);
            }
        }

        self.expire(Instant::now(), &mut out);
        out
    }

    fn handle(&mut self, key: KeyEvent, now: Instant, out: &mut Vec<KeyInput>) {
        let Some((k, modifiers)) = translate(key.code, key.modifiers) else { return };
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                if self.last_active.remove(&k).is_some() {
                    out.push(KeyInput { key: k, action: KeyAction::Release, modifiers });
                }
            }
            // without enhancement, releases come from the timeout instead
            KeyEventKind::Release => {}
            _ => {
                if self.last_active.insert(k, (now, modifiers)).is_none() {
                    out.push(KeyInput { key: k, action: KeyAction::Press, modifiers });
                }
            }
        }
    }

    /// Synthesize releases for keys that went quiet.
    fn expire(&mut self, now: Instant, out: &mut Vec<KeyInput>) {
        if self.honor_release {
            return;
        }
        let mut expired: Vec<(Key, Modifiers)> = self
            .last_active
            .iter()
            .filter(|(_, (t, _))| now.duration_since(*t) >= HOLD_TIMEOUT)
            .map(|(k, (_, m))| (*k, *m))
            .collect();
        expired.sort_by_key(|(k, _)| *k as u8);
        for (key, modifiers) in expired {
            self.last_active.remove(&key);
            out.push(KeyInput { key, action: KeyAction::Release, modifiers });
        }
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    #[test]
    fn repeats_do_not_press_twice() {
        let mut input = InputState::new();
        let now = Instant::now();
        let mut out = vec![];
        input.handle(ev(KeyCode::Char('w'), KeyEventKind::Press), now, &mut out);
        input.handle(ev(KeyCode::Char('w'), KeyEventKind::Repeat), now, &mut out);
        assert_eq!(out, vec![KeyInput::press(Key::W)]);
    }

    #[test]
    fn quiet_keys_release_after_timeout() {
        let mut input = InputState::new();
        let start = Instant::now();
        let mut out = vec![];
        input.handle(ev(KeyCode::Left, KeyEventKind::Press), start, &mut out);
        out.clear();
        input.expire(start + Duration::from_millis(50), &mut out);
        assert!(out.is_empty());
        input.expire(start + HOLD_TIMEOUT, &mut out);
        assert_eq!(out, vec![KeyInput::release(Key::Left)]);
    }

    #[test]
    fn explicit_releases_when_enhanced() {
        let mut input = InputState::new();
        input.honor_release = true;
        let now = Instant::now();
        let mut out = vec![];
        input.handle(ev(KeyCode::Enter, KeyEventKind::Press), now, &mut out);
        input.handle(ev(KeyCode::Enter, KeyEventKind::Release), now, &mut out);
        input.expire(now + Duration::from_secs(5), &mut out);
        assert_eq!(out, vec![KeyInput::press(Key::Enter), KeyInput::release(Key::Enter)]);
    }

    #[test]
    fn angle_brackets_are_shifted_punctuation() {
        assert_eq!(
            translate(KeyCode::Char('<'), KeyModifiers::NONE),
            Some((Key::Comma, Modifiers { shift: true }))
        );
        assert_eq!(translate(KeyCode::Char('D'), KeyModifiers::SHIFT).map(|(k, _)| k), Some(Key::D));
        assert_eq!(translate(KeyCode::Tab, KeyModifiers::NONE), None);
    }
}
