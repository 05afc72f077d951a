//! Event types delivered by the dispatch loop.
//!
//! Every queued event is a value: the platform, timers and
//! [`ObjectContext::update`](crate::ObjectContext::update) build an [`Event`],
//! move it into the [`EventQueue`](crate::EventQueue) together with its
//! target, and the loop hands it to the target's
//! [`Object::event`](crate::Object::event) handler before dropping it.

use std::any::{Any, TypeId};
use std::fmt;

use kestrel_render::{Point, Rect, Size};

use crate::timer::TimerId;

/// Keyboard modifiers that may be held during input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        control: true,
        ..Self::NONE
    };

    /// Alt modifier only.
    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Additional button (e.g. browser back).
    Back,
    /// Additional button (e.g. browser forward).
    Forward,
}

/// Keyboard keys.
///
/// Printable input arrives as text on [`KeyEvent::text`]; the key itself only
/// matters for editing and navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Numbers (main keyboard)
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Navigation
    ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
    Home, End,

    // Editing
    Backspace, Delete, Enter, Tab, Escape, Space,

    // Modifiers
    Shift, Control, Alt,

    /// A key the toolkit has no name for, with its native code.
    Other(u32),
}

/// Discriminant of an [`Event`], used for logging and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Paint,
    MouseButton,
    MouseMove,
    Key,
    Timer,
    Resize,
    Close,
    Hover,
    Focus,
    Custom,
}

/// Paint event, sent when a widget needs to be repainted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintEvent {
    /// The region to repaint, in widget-local coordinates. `None` means the
    /// whole widget.
    pub region: Option<Rect>,
}

impl PaintEvent {
    /// A request to repaint the whole widget.
    pub const fn full() -> Self {
        Self { region: None }
    }

    pub const fn region(rect: Rect) -> Self {
        Self { region: Some(rect) }
    }
}

/// What happened to a mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButtonAction {
    Press,
    Release,
    DoubleClick,
}

/// Mouse button event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseButtonEvent {
    pub action: MouseButtonAction,
    pub button: MouseButton,
    /// Position in target-local coordinates.
    pub position: Point,
    pub modifiers: KeyboardModifiers,
}

impl MouseButtonEvent {
    pub fn press(button: MouseButton, position: Point) -> Self {
        Self {
            action: MouseButtonAction::Press,
            button,
            position,
            modifiers: KeyboardModifiers::NONE,
        }
    }

    pub fn release(button: MouseButton, position: Point) -> Self {
        Self {
            action: MouseButtonAction::Release,
            button,
            position,
            modifiers: KeyboardModifiers::NONE,
        }
    }

    pub fn double_click(button: MouseButton, position: Point) -> Self {
        Self {
            action: MouseButtonAction::DoubleClick,
            button,
            position,
            modifiers: KeyboardModifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: KeyboardModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Pointer motion event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseMoveEvent {
    /// Position in target-local coordinates.
    pub position: Point,
    /// Buttons held during the motion.
    pub buttons: Option<MouseButton>,
    pub modifiers: KeyboardModifiers,
}

impl MouseMoveEvent {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            buttons: None,
            modifiers: KeyboardModifiers::NONE,
        }
    }
}

/// Key press or release.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub pressed: bool,
    pub key: Key,
    pub modifiers: KeyboardModifiers,
    /// The text produced by this key press, empty for non-printable keys.
    pub text: String,
}

impl KeyEvent {
    /// A key press with no text.
    pub fn press(key: Key) -> Self {
        Self {
            pressed: true,
            key,
            modifiers: KeyboardModifiers::NONE,
            text: String::new(),
        }
    }

    /// A key press that produces text.
    pub fn text(key: Key, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::press(key)
        }
    }

    pub fn release(key: Key) -> Self {
        Self {
            pressed: false,
            ..Self::press(key)
        }
    }

    pub fn with_modifiers(mut self, modifiers: KeyboardModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Timer event, sent to the owner when one of its timers fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub id: TimerId,
}

/// Resize event, carrying the new size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEvent {
    pub size: Size,
}

/// Close request.
///
/// Close events start accepted; a handler calls [`ignore`](Self::ignore) to
/// veto the close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseEvent {
    accepted: bool,
}

impl CloseEvent {
    pub fn new() -> Self {
        Self { accepted: true }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn accept(&mut self) {
        self.accepted = true;
    }

    pub fn ignore(&mut self) {
        self.accepted = false;
    }
}

impl Default for CloseEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// Pointer entered or left the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverEvent {
    pub entered: bool,
}

/// Keyboard focus gained or lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusEvent {
    pub focused: bool,
}

/// A user-defined event.
///
/// The payload is type-erased; an event whose payload is missing is treated
/// as malformed and dropped by the dispatch loop.
pub struct CustomEvent {
    /// Application-defined discriminator.
    pub kind: u32,
    payload: Option<Box<dyn Any + Send>>,
}

impl CustomEvent {
    /// Create a custom event with the given payload.
    pub fn new<T: Any + Send>(kind: u32, payload: T) -> Self {
        Self {
            kind,
            payload: Some(Box::new(payload)),
        }
    }

    /// Create a custom event without a payload.
    pub fn empty(kind: u32) -> Self {
        Self {
            kind,
            payload: None,
        }
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// TypeId of the payload, if any.
    pub fn payload_type_id(&self) -> Option<TypeId> {
        self.payload.as_deref().map(|p| (p as &dyn Any).type_id())
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.payload.as_deref_mut()?.downcast_mut::<T>()
    }

    /// Take the payload out of the event.
    pub fn take<T: Any>(&mut self) -> Option<T> {
        let payload = self.payload.take()?;
        match payload.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(payload) => {
                self.payload = Some(payload);
                None
            }
        }
    }
}

impl fmt::Debug for CustomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomEvent")
            .field("kind", &self.kind)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

/// Why an event was rejected by [`Event::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedEvent {
    /// A custom event arrived without a payload.
    MissingPayload,
    /// A resize carried a negative or non-finite size.
    InvalidSize,
    /// A pointer event carried non-finite coordinates.
    InvalidPosition,
}

impl fmt::Display for MalformedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPayload => write!(f, "custom event without payload"),
            Self::InvalidSize => write!(f, "resize with invalid size"),
            Self::InvalidPosition => write!(f, "pointer event with non-finite position"),
        }
    }
}

/// An event addressed to an object.
#[derive(Debug)]
pub enum Event {
    Paint(PaintEvent),
    MouseButton(MouseButtonEvent),
    MouseMove(MouseMoveEvent),
    Key(KeyEvent),
    Timer(TimerEvent),
    Resize(ResizeEvent),
    Close(CloseEvent),
    Hover(HoverEvent),
    Focus(FocusEvent),
    Custom(CustomEvent),
}

impl Event {
    /// The kind tag of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Paint(_) => EventKind::Paint,
            Self::MouseButton(_) => EventKind::MouseButton,
            Self::MouseMove(_) => EventKind::MouseMove,
            Self::Key(_) => EventKind::Key,
            Self::Timer(_) => EventKind::Timer,
            Self::Resize(_) => EventKind::Resize,
            Self::Close(_) => EventKind::Close,
            Self::Hover(_) => EventKind::Hover,
            Self::Focus(_) => EventKind::Focus,
            Self::Custom(_) => EventKind::Custom,
        }
    }

    /// Check the payload before dispatch.
    pub fn validate(&self) -> Result<(), MalformedEvent> {
        match self {
            Self::Custom(custom) if !custom.has_payload() => Err(MalformedEvent::MissingPayload),
            Self::Resize(resize) if !resize.size.is_valid() => Err(MalformedEvent::InvalidSize),
            Self::MouseButton(e) if !e.position.is_finite() => Err(MalformedEvent::InvalidPosition),
            Self::MouseMove(e) if !e.position.is_finite() => Err(MalformedEvent::InvalidPosition),
            _ => Ok(()),
        }
    }

    /// Shorthand for a full-widget paint event.
    pub fn paint() -> Self {
        Self::Paint(PaintEvent::full())
    }

    pub fn close() -> Self {
        Self::Close(CloseEvent::new())
    }

    pub fn resize(size: Size) -> Self {
        Self::Resize(ResizeEvent { size })
    }
}
