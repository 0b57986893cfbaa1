//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! It is constructed from CLI arguments in `main.rs` or from defaults in tests.
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! variable reads in here) makes the bridge easy to drive from tests and from
//! any front end that wants to embed it.

use std::fmt;
use std::time::Duration;

// ── Serial line settings ──────────────────────────────────────────────────────

/// Parity setting of a serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Line configuration used to open both serial ports.
///
/// Both the WinKeyer and the Flex virtual keyer run at 1200 baud, 8 data bits,
/// 2 stop bits, no parity.  The fields exist so tests and unusual adapters can
/// say so explicitly, not because other values are expected to work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud_rate: u32,
    /// Data bits per character (5–8).
    pub data_bits: u8,
    /// Stop bits per character (1 or 2).
    pub stop_bits: u8,
    pub parity: Parity,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            baud_rate: 1200,
            data_bits: 8,
            stop_bits: 2,
            parity: Parity::None,
        }
    }
}

impl fmt::Display for LineSettings {
    /// Formats as the usual `baud-data-stop-parity` shorthand, e.g. `1200-8-2-N`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        write!(
            f,
            "{}-{}-{}-{}",
            self.baud_rate, self.data_bits, self.stop_bits, parity
        )
    }
}

// ── Bridge configuration ──────────────────────────────────────────────────────

/// All runtime configuration for one bridge run.
///
/// # Example
///
/// ```rust
/// use winkeyflex_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.event_queue_capacity, 10);
/// assert_eq!(cfg.line.to_string(), "1200-8-2-N");
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Serial port of the hardware WinKeyer (e.g. `/dev/ttyUSB0`, `COM3`).
    ///
    /// `None` means the hardware side is not started.  `Some("")` is a
    /// configuration error, reported as a transport error notification.
    pub winkey_port: Option<String>,

    /// Serial port of the Flex virtual keyer.
    ///
    /// `None` runs the relay in monitor mode: WinKeyer events are shown but
    /// nothing is written to a radio.
    pub flex_port: Option<String>,

    /// Line settings used for both ports.
    pub line: LineSettings,

    /// Capacity of the reader → relay event queue.
    ///
    /// Small on purpose: when the radio side cannot keep up, the WinKeyer
    /// reader blocks instead of buffering keystrokes without bound.
    pub event_queue_capacity: usize,

    /// Capacity of the relay → display notification queue.
    pub notification_queue_capacity: usize,

    /// Serial read timeout.
    ///
    /// A read that times out is treated like a zero-length read: nothing is
    /// emitted and the shutdown flag is checked again.  Inactivity itself is
    /// never an error.
    pub read_poll_interval: Duration,
}

impl Default for BridgeConfig {
    /// | Field                        | Default      |
    /// |------------------------------|--------------|
    /// | winkey_port                  | none         |
    /// | flex_port                    | none         |
    /// | line                         | `1200-8-2-N` |
    /// | event_queue_capacity         | 10           |
    /// | notification_queue_capacity  | 100          |
    /// | read_poll_interval           | 100 ms       |
    fn default() -> Self {
        Self {
            winkey_port: None,
            flex_port: None,
            line: LineSettings::default(),
            event_queue_capacity: 10,
            notification_queue_capacity: 100,
            read_poll_interval: Duration::from_millis(100),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
