//! The Flex side of the bridge: consume events, write commands, notify.
//!
//! [`run_flex_writer`] owns the radio's virtual keyer port.  For every event
//! taken off the event queue it:
//!
//! 1. asks [`translate`] what to do;
//! 2. writes the resulting command (if any) to the radio;
//! 3. hands the notification to the display queue, marked relayed when the
//!    write succeeded.
//!
//! Events are handled strictly one at a time, so keyed characters reach the
//! radio in exactly the order the operator sent them.
//!
//! # Monitor mode
//!
//! With no Flex port configured the writer still translates and notifies,
//! but writes nothing.  Every notification then reports `relayed = false`.
//!
//! # The display queue never blocks keying
//!
//! Notifications go out with `try_send`.  If the display is lagging and its
//! queue is full, the notification is dropped with a warning; the radio write
//! has already happened by then.
//!
//! Error notifications are the exception.  They are always the last thing a
//! run sends, so they wait for room in the queue instead of being dropped.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use winkeyflex_core::{Event, KeyerEvent, Notification, Source};

use crate::application::relay::translate;
use crate::domain::config::LineSettings;
use crate::domain::link::LinkExit;
use crate::infrastructure::connection::KeyerConnection;
use crate::infrastructure::transport::{PortOpener, TransportError};

/// Runs the Flex side until the event queue closes, a terminal event
/// arrives, or a radio write fails.
///
/// # Parameters
///
/// - `port_name`     – Flex virtual keyer port, or `None` for monitor mode.
/// - `opener`        – Opens the port (real serial or scripted).
/// - `line`          – Line settings, normally 1200-8-2-N.
/// - `events`        – Consumer end of the event queue.  Dropped on return,
///   which stops the WinKeyer side at its next read.
/// - `notifications` – Producer end of the display queue.
/// - `running`       – Shutdown flag; only consulted while waiting for the
///   radio's version byte.
pub fn run_flex_writer(
    port_name: Option<&str>,
    opener: &dyn PortOpener,
    line: &LineSettings,
    mut events: mpsc::Receiver<Event>,
    notifications: mpsc::Sender<Notification>,
    running: &AtomicBool,
) -> LinkExit {
    let mut radio = match port_name {
        Some(name) => match open_radio(name, opener, line, &notifications, running) {
            Ok(Some(conn)) => Some(conn),
            Ok(None) => return LinkExit::Shutdown,
            Err(exit) => return exit,
        },
        None => {
            info!("flex: no port configured, relaying to the display only");
            None
        }
    };

    while let Some(event) = events.blocking_recv() {
        let step = translate(&event);
        let mut notification = step.notification;

        if let (Some(command), Some(conn)) = (step.command, radio.as_mut()) {
            if let Err(e) = conn.write(&command.encode()) {
                return fail(&notifications, e);
            }
            debug!("flex: {} <- {command:?}", conn.port_name());
            notification = notification.mark_relayed();
        }

        if step.terminal {
            info!("flex: upstream reported a transport error, stopping relay");
            report(&notifications, notification);
            return LinkExit::Completed;
        }

        notify(&notifications, notification);
    }

    if running.load(Ordering::SeqCst) {
        LinkExit::Completed
    } else {
        LinkExit::Shutdown
    }
}

/// Opens and handshakes the radio port, announcing its version.
///
/// `Ok(None)` means shutdown was requested mid-handshake.
fn open_radio(
    port_name: &str,
    opener: &dyn PortOpener,
    line: &LineSettings,
    notifications: &mpsc::Sender<Notification>,
    running: &AtomicBool,
) -> Result<Option<KeyerConnection>, LinkExit> {
    let mut conn = KeyerConnection::open(opener, Source::RadioKeyer, port_name, line)
        .map_err(|e| fail(notifications, e))?;

    match conn.handshake(running) {
        Ok(Some(version)) => {
            notify(
                notifications,
                Notification::from(&Event::radio(KeyerEvent::Version(version))),
            );
            Ok(Some(conn))
        }
        Ok(None) => Ok(None),
        Err(e) => Err(fail(notifications, e)),
    }
}

/// Logs `e`, tells the display, and builds the matching exit.
fn fail(notifications: &mpsc::Sender<Notification>, e: TransportError) -> LinkExit {
    error!("flex: {e}");
    let detail = e.to_string();
    report(
        notifications,
        Notification::from(&Event::radio(KeyerEvent::TransportError(detail.clone()))),
    );
    LinkExit::Failed(detail)
}

/// Blocking hand-off for the final notification of a run.
///
/// Waits for the display to make room.  Only a closed display queue loses it.
fn report(notifications: &mpsc::Sender<Notification>, notification: Notification) {
    if let Err(e) = notifications.blocking_send(notification) {
        debug!("flex: display gone, not shown: {}", e.0);
    }
}

/// Non-blocking hand-off to the display queue.
pub(crate) fn notify(notifications: &mpsc::Sender<Notification>, notification: Notification) {
    match notifications.try_send(notification) {
        Ok(()) => {}
        Err(TrySendError::Full(dropped)) => {
            warn!("display queue full, dropping notification {dropped}")
        }
        // No display attached any more; keying carries on regardless.
        Err(TrySendError::Closed(_)) => {}
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
