#![forbid(unsafe_code)]

//! Keys a list controller reacts to.
//!
//! List controllers only consume navigation and activation keys. Text
//! entry, pointer and focus stay with the host's input element, so the key
//! set here is deliberately narrow and anything else maps to `None`.

use bitflags::bitflags;

/// A navigation or activation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable key; only `' '` activates.
    Char(char),
    Enter,
    Escape,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
}

/// Press, auto-repeat or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

bitflags! {
    /// Held modifier keys.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const ALT = 1 << 1;
        const CTRL = 1 << 2;
        /// Super, Meta, Hyper or Command.
        const META = 1 << 3;
    }
}

/// One key delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// An unmodified press of `code`.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Presses and repeats act; releases are ignored.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        !matches!(self.kind, KeyEventKind::Release)
    }

    /// No modifier is held.
    #[must_use]
    pub const fn is_plain(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Translate a crossterm key. Keys a list does not handle give `None`.
    #[cfg(feature = "crossterm")]
    #[must_use]
    pub fn from_crossterm(event: crossterm::event::KeyEvent) -> Option<Self> {
        use crossterm::event::{KeyCode as Ct, KeyEventKind as CtKind, KeyModifiers as CtMods};

        let code = match event.code {
            Ct::Char(c) => KeyCode::Char(c),
            Ct::Enter => KeyCode::Enter,
            Ct::Esc => KeyCode::Escape,
            Ct::Up => KeyCode::Up,
            Ct::Down => KeyCode::Down,
            Ct::Home => KeyCode::Home,
            Ct::End => KeyCode::End,
            Ct::PageUp => KeyCode::PageUp,
            Ct::PageDown => KeyCode::PageDown,
            _ => return None,
        };
        let kind = match event.kind {
            CtKind::Press => KeyEventKind::Press,
            CtKind::Repeat => KeyEventKind::Repeat,
            CtKind::Release => KeyEventKind::Release,
        };
        let pairs = [
            (CtMods::SHIFT, Modifiers::SHIFT),
            (CtMods::ALT, Modifiers::ALT),
            (CtMods::CONTROL, Modifiers::CTRL),
            (CtMods::SUPER | CtMods::HYPER | CtMods::META, Modifiers::META),
        ];
        let modifiers = pairs
            .into_iter()
            .filter(|(ct, _)| event.modifiers.intersects(*ct))
            .fold(Modifiers::empty(), |acc, (_, m)| acc | m);

        Some(Self {
            code,
            modifiers,
            kind,
        })
    }
}

impl From<KeyCode> for KeyEvent {
    fn from(code: KeyCode) -> Self {
        Self::new(code)
    }
}

/// How the host receives input.
///
/// Touch hosts pop a virtual keyboard when an entry becomes active, so
/// controllers must not auto-activate the first entry in that mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputMode {
    /// Physical keyboard.
    #[default]
    Keyboard,
    /// Touch screen or virtual keyboard.
    Touch,
}

impl InputMode {
    /// Whether the first entry should become active on (re)build.
    #[must_use]
    pub const fn auto_activates(self) -> bool {
        matches!(self, Self::Keyboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn releases_do_not_act() {
        let down = KeyEvent::new(KeyCode::Down);
        assert!(down.is_actionable());
        assert!(down.with_kind(KeyEventKind::Repeat).is_actionable());
        assert!(!down.with_kind(KeyEventKind::Release).is_actionable());
    }

    #[test]
    fn plain_means_no_modifiers() {
        let space = KeyEvent::from(KeyCode::Char(' '));
        assert!(space.is_plain());
        assert_eq!(space.kind, KeyEventKind::Press);
        assert!(!space.with_modifiers(Modifiers::CTRL).is_plain());
    }

    #[test]
    fn touch_mode_never_auto_activates() {
        assert_eq!(InputMode::default(), InputMode::Keyboard);
        assert!(InputMode::Keyboard.auto_activates());
        assert!(!InputMode::Touch.auto_activates());
    }

    #[cfg(feature = "crossterm")]
    #[test]
    fn crossterm_keys_translate() {
        use crossterm::event::{KeyCode as Ct, KeyEvent as CtEvent, KeyModifiers as CtMods};

        let esc = KeyEvent::from_crossterm(CtEvent::new(Ct::Esc, CtMods::NONE)).unwrap();
        assert_eq!(esc.code, KeyCode::Escape);
        assert!(esc.is_plain());

        let up = KeyEvent::from_crossterm(CtEvent::new(Ct::Up, CtMods::CONTROL | CtMods::META))
            .unwrap();
        assert_eq!(up.modifiers, Modifiers::CTRL | Modifiers::META);

        assert!(KeyEvent::from_crossterm(CtEvent::new(Ct::F(1), CtMods::NONE)).is_none());
        assert!(KeyEvent::from_crossterm(CtEvent::new(Ct::Tab, CtMods::NONE)).is_none());
    }
}
