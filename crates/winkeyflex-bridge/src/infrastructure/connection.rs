//! One open keyer port and its protocol session.
//!
//! [`KeyerConnection`] owns a [`Transport`] for as long as one side of the
//! bridge is running.  It tracks the side's [`LinkState`] and guarantees the
//! close handshake:
//!
//! 1. write the host-close command (`00 03`), ignoring a failure beyond a log
//!    line;
//! 2. release the transport.
//!
//! Both steps run exactly once, either from [`KeyerConnection::close`] or from
//! `Drop`, so every exit path (normal completion, shutdown, I/O failure, a
//! panic unwinding through the loop) leaves the device closed.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use winkeyflex_core::{Source, HOST_CLOSE, HOST_OPEN};

use crate::domain::config::LineSettings;
use crate::domain::link::LinkState;
use crate::infrastructure::transport::{PortOpener, Transport, TransportError};

/// An open keyer port.  Closing it is automatic.
pub struct KeyerConnection {
    transport: Box<dyn Transport>,
    source: Source,
    port_name: String,
    state: LinkState,
    closed: bool,
}

impl KeyerConnection {
    /// Validates `port_name` and opens it through `opener`.
    ///
    /// # Errors
    ///
    /// - [`TransportError::InvalidPortName`] if the name is empty or blank.
    ///   `opener` is not called in that case.
    /// - Whatever `opener` returns if the open itself fails.
    pub fn open(
        opener: &dyn PortOpener,
        source: Source,
        port_name: &str,
        line: &LineSettings,
    ) -> Result<Self, TransportError> {
        if port_name.trim().is_empty() {
            return Err(TransportError::InvalidPortName(port_name.to_string()));
        }

        let mut state = LinkState::Closed;
        advance(source, &mut state, LinkState::Opening);
        debug!("{source}: opening {port_name} ({line})");

        let transport = match opener.open(port_name, line) {
            Ok(transport) => transport,
            Err(e) => {
                advance(source, &mut state, LinkState::Closing);
                advance(source, &mut state, LinkState::Closed);
                return Err(e);
            }
        };
        info!("{source}: opened {port_name}");
        advance(source, &mut state, LinkState::Handshaking);

        Ok(Self {
            transport,
            source,
            port_name: port_name.to_string(),
            state,
            closed: false,
        })
    }

    /// Sends the host-open command and waits for the version byte.
    ///
    /// Zero-length reads are retried for as long as `running` stays set.
    /// Returns `Ok(None)` if shutdown was requested before the version
    /// arrived; the caller should then just close.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the write or a read fails.
    pub fn handshake(&mut self, running: &AtomicBool) -> Result<Option<u8>, TransportError> {
        self.transport.write(&HOST_OPEN)?;

        while running.load(Ordering::SeqCst) {
            if let Some(version) = self.transport.read_byte()? {
                info!("{}: {} reports version {version}", self.source, self.port_name);
                self.enter(LinkState::Relaying);
                return Ok(Some(version));
            }
        }
        Ok(None)
    }

    /// Reads at most one byte (`Ok(None)` on a read timeout).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the read fails.
    pub fn read_byte(&mut self) -> Result<Option<u8>, TransportError> {
        self.transport.read_byte()
    }

    /// Writes `bytes` to the port.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the write fails.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.transport.write(bytes)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Runs the close handshake now instead of at drop.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.enter(LinkState::Closing);

        if let Err(e) = self.transport.write(&HOST_CLOSE) {
            warn!(
                "{}: close command to {} failed: {e}",
                self.source, self.port_name
            );
        }
        if let Err(e) = self.transport.close() {
            warn!("{}: releasing {} failed: {e}", self.source, self.port_name);
        }

        self.enter(LinkState::Closed);
        info!("{}: closed {}", self.source, self.port_name);
    }

    fn enter(&mut self, next: LinkState) {
        advance(self.source, &mut self.state, next);
    }
}

/// Moves `state` to `next` if the lifecycle allows it.  An illegal move is
/// logged and leaves `state` unchanged.
fn advance(source: Source, state: &mut LinkState, next: LinkState) {
    match state.transition(next) {
        Ok(entered) => {
            debug!("{source}: {state:?} -> {entered:?}");
            *state = entered;
        }
        Err(e) => warn!("{source}: {e}"),
    }
}

impl Drop for KeyerConnection {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
