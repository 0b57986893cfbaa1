//! Serial protocol module: WinKeyer decoding and Flex command encoding.
//!
//! Both ends of the bridge speak the same host-mode framing for opening and
//! closing a session, so those two commands live here rather than in either
//! side's module.

pub mod flex;
pub mod winkeyer;

pub use flex::FlexCommand;
pub use winkeyer::{ByteClass, ProtocolAnomaly, StatusCode, WinkeyerDecoder};

/// Host-mode open command, written first on both serial lines.
pub const HOST_OPEN: [u8; 2] = [0x00, 0x02];

/// Host-mode close command, written last on both serial lines before the port
/// is released.
pub const HOST_CLOSE: [u8; 2] = [0x00, 0x03];
