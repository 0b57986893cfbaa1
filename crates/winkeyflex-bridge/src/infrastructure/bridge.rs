//! Bridge lifecycle: start both sides, stop them, collect how they ended.
//!
//! ```text
//!                 event queue (cap 10)          display queue (cap 100)
//! WinKeyer ─▶ [reader] ───────────────▶ [writer] ──────────────────▶ display
//!              blocking                  blocking ─▶ Flex radio
//! ```
//!
//! Both sides are blocking loops over serial ports, so each runs on
//! `tokio::task::spawn_blocking`.  They share nothing except the event queue
//! and one `running` flag.
//!
//! # Shutdown sequence
//!
//! 1. [`BridgeHandle::stop`] clears `running`.
//! 2. The reader sees it at its next read wake-up, closes the WinKeyer port
//!    and drops its end of the event queue.
//! 3. The writer drains what is left, sees the queue close, closes the Flex
//!    port and drops its end of the display queue.
//! 4. The display consumer sees its queue close.
//!
//! The same chain runs in reverse when the writer stops first: dropping the
//! event queue consumer makes the reader exit at its next wake-up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span};
use uuid::Uuid;

use winkeyflex_core::{Event, Notification};

use crate::domain::config::BridgeConfig;
use crate::domain::link::LinkExit;
use crate::infrastructure::flex_writer::run_flex_writer;
use crate::infrastructure::transport::PortOpener;
use crate::infrastructure::winkeyer_reader::run_winkeyer_reader;

/// How both sides of one bridge run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOutcome {
    pub reader: LinkExit,
    pub writer: LinkExit,
}

/// Control handle for a running bridge.
pub struct BridgeHandle {
    session_id: Uuid,
    running: Arc<AtomicBool>,
    reader: Option<JoinHandle<LinkExit>>,
    writer: JoinHandle<LinkExit>,
}

/// Starts the bridge described by `config`.
///
/// Returns the control handle and the display end of the notification queue.
/// Must be called from inside a Tokio runtime.
///
/// A side whose port is `None` is not started.  Without a WinKeyer port the
/// event queue is closed from the outset, so the writer finishes right after
/// its own handshake.  Without a Flex port the writer runs in monitor mode.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use winkeyflex_bridge::domain::BridgeConfig;
/// use winkeyflex_bridge::infrastructure::{start_bridge, SerialPortOpener};
///
/// # async fn example() {
/// let config = BridgeConfig {
///     winkey_port: Some("/dev/ttyUSB0".to_string()),
///     flex_port: Some("/dev/ttyS10".to_string()),
///     ..BridgeConfig::default()
/// };
/// let opener = Arc::new(SerialPortOpener::new(config.read_poll_interval));
/// let (handle, mut notifications) = start_bridge(&config, opener);
/// while let Some(n) = notifications.recv().await {
///     println!("{n}");
/// }
/// let outcome = handle.join().await;
/// # let _ = outcome;
/// # }
/// ```
pub fn start_bridge(
    config: &BridgeConfig,
    opener: Arc<dyn PortOpener>,
) -> (BridgeHandle, mpsc::Receiver<Notification>) {
    let session_id = Uuid::new_v4();
    let running = Arc::new(AtomicBool::new(true));

    // `mpsc::channel` panics on zero; the CLI rejects zero before we get here.
    let (event_tx, event_rx) = mpsc::channel::<Event>(config.event_queue_capacity.max(1));
    let (note_tx, note_rx) = mpsc::channel(config.notification_queue_capacity.max(1));

    info!(
        %session_id,
        "starting bridge: winkeyer={:?} flex={:?} line={}",
        config.winkey_port, config.flex_port, config.line
    );

    let reader = match config.winkey_port.clone() {
        Some(port) => {
            let opener = Arc::clone(&opener);
            let running = Arc::clone(&running);
            let line = config.line;
            let span = info_span!("winkeyer", session = %session_id, port = %port);
            Some(tokio::task::spawn_blocking(move || {
                let _entered = span.enter();
                run_winkeyer_reader(&port, opener.as_ref(), &line, event_tx, &running)
            }))
        }
        None => {
            info!(%session_id, "no winkeyer port configured");
            drop(event_tx);
            None
        }
    };

    let writer = {
        let running = Arc::clone(&running);
        let line = config.line;
        let port = config.flex_port.clone();
        let span = info_span!("flex", session = %session_id, port = ?port);
        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            run_flex_writer(
                port.as_deref(),
                opener.as_ref(),
                &line,
                event_rx,
                note_tx,
                &running,
            )
        })
    };

    let handle = BridgeHandle {
        session_id,
        running,
        reader,
        writer,
    };
    (handle, note_rx)
}

impl BridgeHandle {
    /// Session id attached to every log line of this run.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// `true` until [`stop`](Self::stop) is called.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Requests shutdown.  Returns immediately; await [`join`](Self::join)
    /// to wait for both ports to close.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!(session_id = %self.session_id, "stop requested");
        }
    }

    /// Waits for both sides to finish.
    pub async fn join(self) -> BridgeOutcome {
        let reader = match self.reader {
            Some(handle) => exit_of("winkeyer", handle.await),
            None => LinkExit::NotStarted,
        };
        let writer = exit_of("flex", self.writer.await);

        info!(
            session_id = %self.session_id,
            "bridge finished: winkeyer {reader}, flex {writer}"
        );
        BridgeOutcome { reader, writer }
    }
}

fn exit_of(side: &str, result: Result<LinkExit, tokio::task::JoinError>) -> LinkExit {
    result.unwrap_or_else(|e| {
        error!("{side}: task ended abnormally: {e}");
        LinkExit::Failed(format!("{side} task ended abnormally: {e}"))
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
