//! Real serial ports, backed by the `serialport` crate.
//!
//! # Blocking reads with a poll timeout
//!
//! `serialport` reads are blocking with a configurable timeout.  The bridge
//! sets that timeout to [`BridgeConfig::read_poll_interval`] and maps
//! `TimedOut` to "no byte yet" (`Ok(None)`), so the reader loop wakes up
//! periodically to check the shutdown flag without ever treating silence on
//! the line as an error.
//!
//! # Portability note
//!
//! `serialport` covers Windows (`COM3`), Linux (`/dev/ttyUSB0`) and macOS
//! (`/dev/cu.usbserial-*`) through one API; nothing here is platform-specific.
//!
//! [`BridgeConfig::read_poll_interval`]: crate::domain::BridgeConfig::read_poll_interval

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, SerialPort, StopBits};
use tracing::debug;

use crate::domain::config::{LineSettings, Parity};
use crate::infrastructure::transport::{PortOpener, Transport, TransportError};

/// Opens OS serial ports.
#[derive(Debug, Clone)]
pub struct SerialPortOpener {
    read_timeout: Duration,
}

impl SerialPortOpener {
    /// Creates an opener whose ports time out reads after `read_timeout`.
    pub fn new(read_timeout: Duration) -> Self {
        Self { read_timeout }
    }
}

impl PortOpener for SerialPortOpener {
    fn open(
        &self,
        port_name: &str,
        line: &LineSettings,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let open_error = |reason: String| TransportError::Open {
            port: port_name.to_string(),
            reason,
        };

        let data_bits = match line.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            other => return Err(open_error(format!("unsupported data bits: {other}"))),
        };
        let stop_bits = match line.stop_bits {
            1 => StopBits::One,
            2 => StopBits::Two,
            other => return Err(open_error(format!("unsupported stop bits: {other}"))),
        };
        let parity = match line.parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        };

        let port = serialport::new(port_name, line.baud_rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(parity)
            .flow_control(FlowControl::None)
            .timeout(self.read_timeout)
            .open()
            .map_err(|e| open_error(e.to_string()))?;

        debug!("opened serial port {port_name} at {line}");

        Ok(Box::new(SerialTransport {
            name: port_name.to_string(),
            port: Some(port),
        }))
    }
}

/// One open OS serial port.
///
/// The handle is held in an `Option` so [`Transport::close`] can drop it
/// (which releases the OS descriptor) while the struct itself lives on.
pub struct SerialTransport {
    name: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or_else(|| {
            TransportError::Io(std::io::Error::new(
                ErrorKind::NotConnected,
                format!("serial port {} is closed", self.name),
            ))
        })
    }
}

impl Transport for SerialTransport {
    fn read_byte(&mut self) -> Result<Option<u8>, TransportError> {
        let mut buf = [0u8; 1];
        match self.port()?.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            // A timeout or signal interruption just means "nothing yet".
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = self.port()?;
        // `write_all` keeps writing until every byte is accepted, even if the
        // OS takes a partial write first.
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        // Dropping the boxed port closes the OS handle.
        if self.port.take().is_some() {
            debug!("released serial port {}", self.name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_stop_bits_rejected_before_open() {
        // Arrange: the port name does not exist, but validation happens first
        let opener = SerialPortOpener::new(Duration::from_millis(10));
        let line = LineSettings {
            stop_bits: 3,
            ..LineSettings::default()
        };

        // Act
        let result = opener.open("/dev/winkeyflex-does-not-exist", &line);

        // Assert
        match result {
            Err(TransportError::Open { reason, .. }) => {
                assert!(reason.contains("stop bits"), "got: {reason}")
            }
            Err(other) => panic!("expected Open error, got {other}"),
            Ok(_) => panic!("expected Open error, got a transport"),
        }
    }

    #[test]
    fn test_unsupported_data_bits_rejected_before_open() {
        let opener = SerialPortOpener::new(Duration::from_millis(10));
        let line = LineSettings {
            data_bits: 9,
            ..LineSettings::default()
        };
        assert!(matches!(
            opener.open("/dev/winkeyflex-does-not-exist", &line),
            Err(TransportError::Open { .. })
        ));
    }

    #[test]
    fn test_missing_port_is_an_open_error() {
        let opener = SerialPortOpener::new(Duration::from_millis(10));
        let result = opener.open("/dev/winkeyflex-does-not-exist", &LineSettings::default());
        match result {
            Err(TransportError::Open { port, .. }) => {
                assert_eq!(port, "/dev/winkeyflex-does-not-exist")
            }
            Err(other) => panic!("expected Open error, got {other}"),
            Ok(_) => panic!("a nonexistent port must not open"),
        }
    }
}
