//! Byte-level serial transport seam.
//!
//! The bridge never touches an OS serial handle directly.  It goes through two
//! small traits:
//!
//! - [`PortOpener`] turns a port name into a live connection.
//! - [`Transport`] is that connection: blocking single-byte reads, whole-slice
//!   writes, and an explicit close.
//!
//! The real implementation lives in [`crate::infrastructure::serial`]; tests
//! use the scripted one in [`crate::infrastructure::mock`].
//!
//! # Error taxonomy
//!
//! | Variant            | When                                         |
//! |--------------------|----------------------------------------------|
//! | `InvalidPortName`  | empty port name; raised before any I/O       |
//! | `Open`             | the OS refused to open or configure the port |
//! | `Io`               | a read or write failed on an open port       |

use thiserror::Error;

use crate::domain::config::LineSettings;

/// Errors raised by a serial transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The port name was empty or blank.
    #[error("invalid port name {0:?}")]
    InvalidPortName(String),

    /// The port could not be opened or configured.
    #[error("could not open {port}: {reason}")]
    Open { port: String, reason: String },

    /// A read or write failed after the port was opened.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// An open, exclusively owned serial connection.
///
/// Implementations are moved into exactly one loop and are never shared, so
/// the methods take `&mut self` and need no internal locking.
pub trait Transport: Send {
    /// Reads at most one byte, blocking until data arrives or the read
    /// timeout expires.
    ///
    /// Returns `Ok(None)` for a zero-length read (including a timeout).  The
    /// caller treats that as a spurious wake-up, not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the underlying read fails.
    fn read_byte(&mut self) -> Result<Option<u8>, TransportError>;

    /// Writes every byte of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the write fails.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Releases the OS resource.  Called exactly once, after the protocol
    /// close command.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the release itself fails.
    fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens named serial ports.
#[cfg_attr(test, mockall::automock)]
pub trait PortOpener: Send + Sync {
    /// Opens `port_name` with the given line settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Open`] if the port does not exist, is busy,
    /// or rejects the line settings.
    fn open(
        &self,
        port_name: &str,
        line: &LineSettings,
    ) -> Result<Box<dyn Transport>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_port_name_message() {
        let err = TransportError::InvalidPortName(String::new());
        assert_eq!(err.to_string(), "invalid port name \"\"");
    }

    #[test]
    fn test_open_error_names_the_port() {
        let err = TransportError::Open {
            port: "/dev/ttyUSB9".to_string(),
            reason: "No such file or directory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "could not open /dev/ttyUSB9: No such file or directory"
        );
    }

    #[test]
    fn test_io_error_converts_with_question_mark() {
        fn fails() -> Result<(), TransportError> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device disconnected",
            ))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
        assert_eq!(err.to_string(), "device disconnected");
    }
}
