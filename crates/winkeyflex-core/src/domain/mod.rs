//! Domain types shared by the decoder, the relay and the display layer.
//!
//! Nothing here performs I/O.  The types describe *what happened* on either
//! serial line; the bridge crate decides what to do about it.

pub mod event;

pub use event::{Event, EventKind, KeyerEvent, Notification, Source};
