//! Domain layer for winkeyflex-bridge.
//!
//! The domain layer contains pure types that have no dependencies on serial
//! ports, threads, or async runtimes.
//!
//! # What belongs in the domain layer?
//!
//! - Configuration structures
//! - The per-side lifecycle state machine
//!
//! # What does NOT belong here?
//!
//! - Any `serialport`, `tokio`, or channel types
//! - Environment variable reading
//! - Anything that could block or fail due to external state

pub mod config;
pub mod link;

pub use config::{BridgeConfig, LineSettings, Parity};
pub use link::{LinkExit, LinkState, LinkStateError};
