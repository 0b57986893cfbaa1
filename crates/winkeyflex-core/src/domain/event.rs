//! The event model.
//!
//! # Events vs. notifications
//!
//! An [`Event`] is the typed unit that travels from the WinKeyer reader to the
//! relay.  It carries its payload in a shape the relay can act on (a raw
//! character byte, a speed value, the completed text of a keying burst).
//!
//! A [`Notification`] is the flattened `{source, kind, text}` form handed to
//! the display layer.  The display never needs to match on payload variants;
//! it only shows text and decides which panel (WinKeyer or Flex) to update
//! from `source`.
//!
//! ```text
//! WinKeyer bytes ──decode──▶ Event ──relay──▶ FlexCommand + Notification
//! ```

use std::fmt;

use serde::Serialize;

// ── Source ────────────────────────────────────────────────────────────────────

/// Which physical endpoint produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// The K1EL WinKeyer attached to the operator's paddles.
    HardwareKeyer,
    /// The FlexRadio virtual keyer port.
    RadioKeyer,
}

impl Source {
    /// Short label used in logs and on the display panels.
    pub fn label(self) -> &'static str {
        match self {
            Source::HardwareKeyer => "winkeyer",
            Source::RadioKeyer => "flex",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Kinds and payloads ────────────────────────────────────────────────────────

/// Payload-free tag of a [`KeyerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Version,
    Ready,
    KeyStart,
    KeyStop,
    PotChange,
    Echo,
    TransportError,
}

impl EventKind {
    /// Status word shown to the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Version => "version",
            EventKind::Ready => "ready",
            EventKind::KeyStart => "keystart",
            EventKind::KeyStop => "keystop",
            EventKind::PotChange => "pot",
            EventKind::Echo => "echo",
            EventKind::TransportError => "serial",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded happening on a serial line, with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyerEvent {
    /// Firmware version byte returned by the open handshake.
    Version(u8),
    /// The keyer reported it is ready.
    Ready,
    /// The operator started keying.
    KeyStart,
    /// The operator stopped keying; carries the text keyed since `KeyStart`.
    KeyStop(String),
    /// The speed pot moved (or was polled); value in `0..=63`.
    PotChange(u8),
    /// One literal character echoed by the keyer.
    Echo(u8),
    /// The serial line failed; carries a human-readable detail.
    TransportError(String),
}

impl KeyerEvent {
    /// Returns the payload-free kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            KeyerEvent::Version(_) => EventKind::Version,
            KeyerEvent::Ready => EventKind::Ready,
            KeyerEvent::KeyStart => EventKind::KeyStart,
            KeyerEvent::KeyStop(_) => EventKind::KeyStop,
            KeyerEvent::PotChange(_) => EventKind::PotChange,
            KeyerEvent::Echo(_) => EventKind::Echo,
            KeyerEvent::TransportError(_) => EventKind::TransportError,
        }
    }

    /// Renders the payload as display text.
    ///
    /// Numbers are shown in decimal, an echo as its character, and errors are
    /// prefixed with `error: `.
    pub fn text(&self) -> String {
        match self {
            KeyerEvent::Version(v) => v.to_string(),
            KeyerEvent::PotChange(speed) => speed.to_string(),
            KeyerEvent::Echo(ch) => char::from(*ch).to_string(),
            KeyerEvent::KeyStop(text) => text.clone(),
            KeyerEvent::TransportError(detail) => format!("error: {detail}"),
            KeyerEvent::Ready | KeyerEvent::KeyStart => String::new(),
        }
    }
}

// ── Event ─────────────────────────────────────────────────────────────────────

/// A [`KeyerEvent`] tagged with the side of the bridge it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub source: Source,
    pub payload: KeyerEvent,
}

impl Event {
    /// Creates an event produced by the WinKeyer side.
    pub fn hardware(payload: KeyerEvent) -> Self {
        Self {
            source: Source::HardwareKeyer,
            payload,
        }
    }

    /// Creates an event produced by the Flex side.
    pub fn radio(payload: KeyerEvent) -> Self {
        Self {
            source: Source::RadioKeyer,
            payload,
        }
    }

    /// Kind of the carried payload.
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

// ── Notification ──────────────────────────────────────────────────────────────

/// Display-facing form of an event.
///
/// # Serde representation
///
/// ```json
/// {"source":"hardware_keyer","kind":"echo","text":"K","relayed":true}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Which panel this belongs to.
    pub source: Source,
    /// What happened.
    pub kind: EventKind,
    /// Payload rendered as text; empty for `Ready` and `KeyStart`.
    pub text: String,
    /// `true` once the matching radio write has succeeded.
    ///
    /// Only echo and pot notifications can be relayed.  Everything else is
    /// display-only and stays `false`.
    pub relayed: bool,
}

impl Notification {
    /// Marks the notification as successfully applied to the radio.
    pub fn mark_relayed(mut self) -> Self {
        self.relayed = true;
        self
    }
}

impl From<&Event> for Notification {
    fn from(event: &Event) -> Self {
        Self {
            source: event.source,
            kind: event.kind(),
            text: event.payload.text(),
            relayed: false,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.kind, self.text, self.source)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
