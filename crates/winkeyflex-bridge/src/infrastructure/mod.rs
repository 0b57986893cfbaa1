//! Infrastructure layer for winkeyflex-bridge.
//!
//! The infrastructure layer handles all I/O: opening serial ports, running the
//! two blocking serial loops, and wiring them together with bounded queues.
//!
//! # Responsibilities
//!
//! - Opening and configuring serial ports (`serial`)
//! - Owning each open port and guaranteeing its close handshake (`connection`)
//! - Reading and decoding the WinKeyer byte stream (`winkeyer_reader`)
//! - Writing Flex commands and emitting display notifications (`flex_writer`)
//! - Spawning both loops and handling shutdown (`bridge`)
//!
//! # What does NOT belong here?
//!
//! - Deciding what an event means for the radio (that is the application layer)
//! - Byte classification (that is `winkeyflex-core`)
//! - Configuration parsing (that is done in `main.rs`)

pub mod bridge;
pub mod connection;
pub mod flex_writer;
pub mod mock;
pub mod serial;
pub mod transport;
pub mod winkeyer_reader;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use bridge::{start_bridge, BridgeHandle, BridgeOutcome};
pub use serial::SerialPortOpener;
pub use transport::{PortOpener, Transport, TransportError};
