//! # winkeyflex-core
//!
//! Shared library for winkeyflex containing the WinKeyer byte decoder, the
//! Flex keyer command encoder, and the event model that flows between them.
//!
//! This crate has zero dependencies on serial ports, threads, or async
//! runtimes.  Everything in it can be exercised with plain byte slices.
//!
//! # Architecture overview (for beginners)
//!
//! winkeyflex mirrors a physical K1EL WinKeyer into the virtual keyer port of
//! a FlexRadio.  Whatever the operator sends with the paddles is echoed back by
//! the WinKeyer one character at a time; winkeyflex copies those characters to
//! the radio, and copies speed-knob changes across as a speed-set command.
//!
//! This crate (`winkeyflex-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – The bytes on both serial lines.  `protocol::winkeyer`
//!   classifies every byte the WinKeyer sends by its two high "tag" bits and
//!   turns it into a typed event.  `protocol::flex` builds the bytes written
//!   to the radio.
//!
//! - **`domain`** – The event and notification types.  An [`Event`] is one
//!   decoded happening on one side of the bridge; a [`Notification`] is the
//!   human-readable form handed to whatever display is attached.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `winkeyflex_core::Event` instead of `winkeyflex_core::domain::event::Event`.
pub use domain::event::{Event, EventKind, KeyerEvent, Notification, Source};
pub use protocol::flex::FlexCommand;
pub use protocol::winkeyer::{ByteClass, ProtocolAnomaly, StatusCode, WinkeyerDecoder};
pub use protocol::{HOST_CLOSE, HOST_OPEN};
