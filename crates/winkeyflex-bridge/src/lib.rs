//! winkeyflex-bridge library crate.
//!
//! This crate relays a K1EL WinKeyer to a FlexRadio virtual keyer port: every
//! character the operator keys on the paddles is copied to the radio, and
//! every turn of the WinKeyer speed knob becomes a radio speed-set command.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! WinKeyer (serial, 1200-8-2-N)
//!         ↓
//! [winkeyflex-bridge]
//!   ├── domain/           Pure types: BridgeConfig, LineSettings, LinkState
//!   ├── application/      Translation: decoded event → Flex command + notification
//!   └── infrastructure/
//!         ├── serial/           OS serial ports (serialport)
//!         ├── connection/       Open/handshake/close guard per port
//!         ├── winkeyer_reader/  Blocking decode loop (winkeyflex-core decoder)
//!         ├── flex_writer/      Blocking relay loop + display notifications
//!         └── bridge/           start / stop / join on tokio blocking tasks
//!         ↓
//! FlexRadio virtual keyer (serial)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async, no frameworks).
//! - `application` depends on `domain` and `winkeyflex-core` only.
//! - `infrastructure` depends on all other layers plus `tokio` and `serialport`.
//!
//! # For beginners: why this structure?
//!
//! Clean architecture separates *what the program does* (domain + application)
//! from *how it does it* (infrastructure).  The relay rules can be tested with
//! plain values, and the serial loops can be tested against scripted ports
//! without a WinKeyer or a radio attached.

/// Domain layer: configuration and lifecycle types (no I/O).
pub mod domain;

/// Application layer: event-to-command translation.
pub mod application;

/// Infrastructure layer: serial ports, the two relay loops, and lifecycle.
pub mod infrastructure;
