use crate::Vec2;
use bitflags::bitflags;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,   // Left mouse, touch
    Secondary, // Right mouse
    Tertiary,  // Middle mouse
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEventKind {
    Down,
    Up,
    Move,
    Cancel,
}

#[derive(Clone, Debug)]
pub struct PointerEvent {
    pub id: PointerId,
    pub kind: PointerEventKind,
    pub button: PointerButton,
    pub position: Vec2,
    pub is_primary: bool,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Primary-button event at `position`, no modifiers. The common case in
    /// both production dispatch and tests.
    pub fn primary(id: PointerId, kind: PointerEventKind, position: Vec2) -> Self {
        Self {
            id,
            kind,
            button: PointerButton::Primary,
            position,
            is_primary: true,
            modifiers: Modifiers::empty(),
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL  = 1 << 1;
        const ALT   = 1 << 2;
        /// Cmd on macOS, Win key elsewhere.
        const META  = 1 << 3;
    }
}

impl Modifiers {
    /// The platform multi-select modifier (Ctrl, or Cmd on macOS hosts that
    /// map it through META).
    pub fn is_action(&self) -> bool {
        self.intersects(Modifiers::CTRL | Modifiers::META)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Character(char),
    Enter,
    Escape,
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
}

#[derive(Clone, Debug)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub is_repeat: bool,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
            is_repeat: false,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers,
            is_repeat: false,
        }
    }
}

/// Mouse wheel / trackpad scroll input, in pixels.
#[derive(Clone, Copy, Debug)]
pub struct WheelEvent {
    pub delta: Vec2,
    pub position: Vec2,
}
