//! Application layer for winkeyflex-bridge.
//!
//! The application layer knows *what* to do with a decoded event, but
//! delegates *how* to do it (serial writes, channel sends) to the
//! infrastructure layer.
//!
//! # What does NOT belong here?
//!
//! - Opening serial ports (that is infrastructure)
//! - Thread or task spawning
//! - Byte-level decoding (that is `winkeyflex-core`)

pub mod relay;

pub use relay::{translate, RelayStep};
