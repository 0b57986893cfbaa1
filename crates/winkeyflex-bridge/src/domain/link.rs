//! Lifecycle state of one side of the bridge.
//!
//! Each serial side (WinKeyer reader, Flex writer) walks the same path:
//!
//! ```text
//! Closed → Opening → Handshaking → Relaying → Closing → Closed
//!             │           │                      ▲
//!             └───────────┴──── failure ─────────┘
//! ```
//!
//! - `Opening → Handshaking` needs a valid port name and a successful open.
//! - `Handshaking → Relaying` needs the version byte.
//! - `Relaying → Closing` happens on upstream stream closure, a fatal I/O error,
//!   or a shutdown request.
//! - `Closing` always attempts the close command before reaching `Closed`.

use std::fmt;

use thiserror::Error;

/// Where one side of the bridge is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Closed,
    Opening,
    Handshaking,
    Relaying,
    Closing,
}

/// A transition the lifecycle does not allow.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("illegal link transition: {from:?} -> {to:?}")]
pub struct LinkStateError {
    pub from: LinkState,
    pub to: LinkState,
}

impl LinkState {
    /// Returns `true` if the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: LinkState) -> bool {
        use LinkState::*;
        matches!(
            (self, next),
            (Closed, Opening)
                | (Opening, Handshaking)
                | (Opening, Closing)
                | (Handshaking, Relaying)
                | (Handshaking, Closing)
                | (Relaying, Closing)
                | (Closing, Closed)
        )
    }

    /// Checked transition.
    ///
    /// # Errors
    ///
    /// Returns [`LinkStateError`] if the move skips or reverses a step.
    pub fn transition(self, next: LinkState) -> Result<LinkState, LinkStateError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(LinkStateError {
                from: self,
                to: next,
            })
        }
    }
}

/// How one side of the bridge finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkExit {
    /// The upstream stream ended (or delivered a terminal error) and the side
    /// closed normally.
    Completed,
    /// A stop was requested.
    Shutdown,
    /// The downstream consumer went away, so there was nobody left to relay to.
    RelayClosed,
    /// The side stopped on an error; carries the detail.
    Failed(String),
    /// No port was configured for this side.
    NotStarted,
}

impl fmt::Display for LinkExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkExit::Completed => f.write_str("completed"),
            LinkExit::Shutdown => f.write_str("shut down"),
            LinkExit::RelayClosed => f.write_str("relay closed"),
            LinkExit::Failed(detail) => write!(f, "failed: {detail}"),
            LinkExit::NotStarted => f.write_str("not started"),
        }
    }
}
