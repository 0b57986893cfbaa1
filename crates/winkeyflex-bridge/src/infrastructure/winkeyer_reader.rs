//! The WinKeyer side of the bridge: open, handshake, decode, forward.
//!
//! [`run_winkeyer_reader`] is a blocking loop.  It is meant to run on its own
//! thread (the bridge uses `tokio::task::spawn_blocking`) because serial reads
//! block until a byte arrives or the read timeout expires.
//!
//! # Startup sequence
//!
//! ```text
//! host            WinKeyer
//!  │── 00 02 ──────▶│   host open
//!  │◀── version ────│
//!  │── 0E 40 ──────▶│   echo keyed characters back to the host
//!  │── 02 00 ──────▶│   take speed from the pot
//!  │── 07 ─────────▶│   request the current pot speed (best effort)
//! ```
//!
//! After that every byte read is fed to a [`WinkeyerDecoder`] and each event
//! is pushed onto the event queue.  The queue is bounded: if the Flex side
//! falls behind, `blocking_send` parks this thread, which in turn stops reading
//! from the keyer.  That is the bridge's only backpressure.
//!
//! # Exit paths
//!
//! | Cause                           | Exit                 |
//! |---------------------------------|----------------------|
//! | `running` cleared               | `Shutdown`           |
//! | event queue consumer gone       | `RelayClosed`        |
//! | bad port name, open/I/O failure | `Failed`             |
//!
//! A failure emits exactly one `TransportError` event first.  Every path that
//! got as far as opening the port writes `00 03` and releases the port on the
//! way out.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use winkeyflex_core::protocol::winkeyer::{ENABLE_ECHO, REQUEST_POT_SPEED, SPEED_FROM_POT};
use winkeyflex_core::{Event, KeyerEvent, Source, WinkeyerDecoder};

use crate::domain::config::LineSettings;
use crate::domain::link::LinkExit;
use crate::infrastructure::connection::KeyerConnection;
use crate::infrastructure::transport::{PortOpener, TransportError};

/// Runs the WinKeyer side until shutdown, failure, or loss of the consumer.
///
/// # Parameters
///
/// - `port_name` – OS name of the WinKeyer serial port.
/// - `opener`    – Opens the port (real serial or scripted).
/// - `line`      – Line settings, normally 1200-8-2-N.
/// - `events`    – Producer end of the event queue.  Dropped on return, which
///   tells the Flex side there is nothing more to relay.
/// - `running`   – Cleared by the bridge to request shutdown.  Checked after
///   every read, including reads that time out.
pub fn run_winkeyer_reader(
    port_name: &str,
    opener: &dyn PortOpener,
    line: &LineSettings,
    events: mpsc::Sender<Event>,
    running: &AtomicBool,
) -> LinkExit {
    let mut conn = match KeyerConnection::open(opener, Source::HardwareKeyer, port_name, line) {
        Ok(conn) => conn,
        Err(e) => return fail(&events, e),
    };

    let version = match conn.handshake(running) {
        Ok(Some(version)) => version,
        Ok(None) => return LinkExit::Shutdown,
        Err(e) => return fail(&events, e),
    };
    if events
        .blocking_send(Event::hardware(KeyerEvent::Version(version)))
        .is_err()
    {
        return LinkExit::RelayClosed;
    }

    if let Err(e) = conn.write(&ENABLE_ECHO) {
        return fail(&events, e);
    }
    if let Err(e) = conn.write(&SPEED_FROM_POT) {
        return fail(&events, e);
    }
    // The reply, if any, arrives later as an ordinary pot byte.
    if let Err(e) = conn.write(&REQUEST_POT_SPEED) {
        warn!("winkeyer: pot speed request to {port_name} failed: {e}");
    }

    let exit = relay_bytes(&mut conn, &events, running);
    info!("winkeyer: reader for {port_name} finished ({exit})");
    exit
}

/// The main decode loop.  Returns when the loop should stop; the caller's
/// connection guard then runs the close handshake.
fn relay_bytes(
    conn: &mut KeyerConnection,
    events: &mpsc::Sender<Event>,
    running: &AtomicBool,
) -> LinkExit {
    let mut decoder = WinkeyerDecoder::new();

    while running.load(Ordering::SeqCst) {
        if events.is_closed() {
            return LinkExit::RelayClosed;
        }

        let byte = match conn.read_byte() {
            Ok(Some(byte)) => byte,
            // Read timeout: nothing arrived, go round and re-check the flags.
            Ok(None) => continue,
            Err(e) => return fail(events, e),
        };

        match decoder.decode(byte) {
            Ok(Some(event)) => {
                debug!("winkeyer: {} {:?}", conn.port_name(), event);
                if events.blocking_send(Event::hardware(event)).is_err() {
                    return LinkExit::RelayClosed;
                }
            }
            Ok(None) => {}
            Err(anomaly) => warn!("winkeyer: {}: {anomaly}, byte dropped", conn.port_name()),
        }
    }

    LinkExit::Shutdown
}

/// Logs `e`, emits the one `TransportError` event for this run, and builds
/// the matching exit.
fn fail(events: &mpsc::Sender<Event>, e: TransportError) -> LinkExit {
    error!("winkeyer: {e}");
    let detail = e.to_string();
    // Nobody listening is fine here; the exit value still records the error.
    let _ = events.blocking_send(Event::hardware(KeyerEvent::TransportError(
        detail.clone(),
    )));
    LinkExit::Failed(detail)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::sync::Arc;
    use std::thread;

    use winkeyflex_core::{HOST_CLOSE, HOST_OPEN};

    use super::*;
    use crate::infrastructure::mock::{ScriptStep, ScriptedOpener, ScriptedTransport};
    use crate::infrastructure::transport::MockPortOpener;

    const PORT: &str = "/dev/ttyUSB0";

    /// Starts the reader on a plain thread, the way `spawn_blocking` would.
    fn spawn_reader(
        opener: ScriptedOpener,
        capacity: usize,
    ) -> (
        thread::JoinHandle<LinkExit>,
        mpsc::Receiver<Event>,
        Arc<AtomicBool>,
    ) {
        let (tx, rx) = mpsc::channel(capacity);
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::spawn(move || {
            run_winkeyer_reader(PORT, &opener, &LineSettings::default(), tx, &flag)
        });
        (handle, rx, running)
    }

    fn payloads(rx: &mut mpsc::Receiver<Event>, n: usize) -> Vec<KeyerEvent> {
        (0..n)
            .map(|_| rx.blocking_recv().expect("reader ended early").payload)
            .collect()
    }

    #[test]
    fn test_handshake_then_decoded_burst() {
        // Arrange: version 31, then "CQ" keyed as one burst
        let keyer = ScriptedTransport::from_bytes(&[31, 0xC6, b'C', b'Q', 0xC4]);
        let log = keyer.log();
        let (handle, mut rx, running) =
            spawn_reader(ScriptedOpener::new().with_port(PORT, keyer), 10);

        // Act
        let events = payloads(&mut rx, 5);
        running.store(false, Ordering::SeqCst);
        let exit = handle.join().unwrap();

        // Assert
        assert_eq!(
            events,
            vec![
                KeyerEvent::Version(31),
                KeyerEvent::KeyStart,
                KeyerEvent::Echo(b'C'),
                KeyerEvent::Echo(b'Q'),
                KeyerEvent::KeyStop("CQ".to_string()),
            ]
        );
        assert_eq!(exit, LinkExit::Shutdown);
        assert_eq!(
            log.writes(),
            vec![
                HOST_OPEN.to_vec(),
                ENABLE_ECHO.to_vec(),
                SPEED_FROM_POT.to_vec(),
                REQUEST_POT_SPEED.to_vec(),
                HOST_CLOSE.to_vec(),
            ]
        );
        assert_eq!(log.close_calls(), 1);
    }

    #[test]
    fn test_events_are_tagged_hardware() {
        let keyer = ScriptedTransport::from_bytes(&[30]);
        let (handle, mut rx, running) =
            spawn_reader(ScriptedOpener::new().with_port(PORT, keyer), 10);

        let event = rx.blocking_recv().unwrap();
        running.store(false, Ordering::SeqCst);
        handle.join().unwrap();

        assert_eq!(event.source, Source::HardwareKeyer);
    }

    #[test]
    fn test_read_failure_emits_exactly_one_transport_error() {
        // Arrange
        let keyer = ScriptedTransport::new([
            ScriptStep::Byte(31),
            ScriptStep::Byte(b'E'),
            ScriptStep::Fail(ErrorKind::BrokenPipe),
            ScriptStep::Byte(b'T'),
        ]);
        let log = keyer.log();
        let (handle, mut rx, _running) =
            spawn_reader(ScriptedOpener::new().with_port(PORT, keyer), 10);

        // Act: the reader exits on its own
        let exit = handle.join().unwrap();
        let mut received = Vec::new();
        while let Some(event) = rx.blocking_recv() {
            received.push(event.payload);
        }

        // Assert
        assert!(matches!(exit, LinkExit::Failed(_)));
        let errors = received
            .iter()
            .filter(|p| matches!(p, KeyerEvent::TransportError(_)))
            .count();
        assert_eq!(errors, 1);
        assert!(matches!(received.last(), Some(KeyerEvent::TransportError(_))));
        assert!(!received.contains(&KeyerEvent::Echo(b'T')), "no reads after failure");
        assert_eq!(log.writes().last(), Some(&HOST_CLOSE.to_vec()));
        assert_eq!(log.close_calls(), 1);
    }

    #[test]
    fn test_failed_pot_request_is_not_fatal() {
        // Arrange: the fourth write (07) fails
        let keyer = ScriptedTransport::from_bytes(&[31, 0x97]).fail_write(3);
        let (handle, mut rx, running) =
            spawn_reader(ScriptedOpener::new().with_port(PORT, keyer), 10);

        // Act
        let events = payloads(&mut rx, 2);
        running.store(false, Ordering::SeqCst);

        // Assert
        assert_eq!(events, vec![KeyerEvent::Version(31), KeyerEvent::PotChange(23)]);
        assert_eq!(handle.join().unwrap(), LinkExit::Shutdown);
    }

    #[test]
    fn test_failed_echo_enable_is_fatal() {
        let keyer = ScriptedTransport::from_bytes(&[31]).fail_write(1);
        let log = keyer.log();
        let (handle, mut rx, _running) =
            spawn_reader(ScriptedOpener::new().with_port(PORT, keyer), 10);

        let exit = handle.join().unwrap();

        assert!(matches!(exit, LinkExit::Failed(_)));
        assert_eq!(rx.blocking_recv().unwrap().payload, KeyerEvent::Version(31));
        assert!(matches!(
            rx.blocking_recv().unwrap().payload,
            KeyerEvent::TransportError(_)
        ));
        assert_eq!(log.close_calls(), 1);
    }

    #[test]
    fn test_unknown_status_code_is_dropped_and_loop_continues() {
        // Arrange: 0xEA carries status code 0x2A
        let keyer = ScriptedTransport::from_bytes(&[31, 0xEA, b'K']);
        let (handle, mut rx, running) =
            spawn_reader(ScriptedOpener::new().with_port(PORT, keyer), 10);

        // Act
        let events = payloads(&mut rx, 2);
        running.store(false, Ordering::SeqCst);

        // Assert
        assert_eq!(events, vec![KeyerEvent::Version(31), KeyerEvent::Echo(b'K')]);
        assert_eq!(handle.join().unwrap(), LinkExit::Shutdown);
    }

    #[test]
    fn test_empty_port_name_reports_error_without_opening() {
        // Arrange
        let mut opener = MockPortOpener::new();
        opener.expect_open().never();
        let (tx, mut rx) = mpsc::channel(10);
        let running = AtomicBool::new(true);

        // Act
        let exit = run_winkeyer_reader("", &opener, &LineSettings::default(), tx, &running);

        // Assert
        assert!(matches!(exit, LinkExit::Failed(_)));
        let event = rx.blocking_recv().unwrap();
        assert_eq!(event.source, Source::HardwareKeyer);
        assert!(matches!(event.payload, KeyerEvent::TransportError(_)));
        assert!(rx.blocking_recv().is_none());
    }

    #[test]
    fn test_open_failure_reports_error() {
        let (tx, mut rx) = mpsc::channel(10);
        let running = AtomicBool::new(true);

        let exit = run_winkeyer_reader(
            "COM9",
            &ScriptedOpener::new(),
            &LineSettings::default(),
            tx,
            &running,
        );

        assert!(matches!(exit, LinkExit::Failed(ref d) if d.contains("COM9")));
        assert!(matches!(
            rx.blocking_recv().unwrap().payload,
            KeyerEvent::TransportError(_)
        ));
    }

    #[test]
    fn test_dropped_consumer_closes_the_port() {
        // Arrange
        let keyer = ScriptedTransport::from_bytes(&[31]);
        let log = keyer.log();
        let (handle, mut rx, _running) =
            spawn_reader(ScriptedOpener::new().with_port(PORT, keyer), 10);

        // Act
        assert_eq!(rx.blocking_recv().unwrap().payload, KeyerEvent::Version(31));
        drop(rx);
        let exit = handle.join().unwrap();

        // Assert
        assert_eq!(exit, LinkExit::RelayClosed);
        assert_eq!(log.writes().last(), Some(&HOST_CLOSE.to_vec()));
        assert_eq!(log.close_calls(), 1);
    }
}
