//! Event → command translation.
//!
//! This module decides, for each decoded WinKeyer event, what (if anything)
//! the radio should be told and what the display should show.  It is a pure
//! function: no I/O, no channels, no state.  The Flex writer loop applies the
//! result.
//!
//! ```text
//! Echo(c)          → Transmit(c)   + notification "c"
//! PotChange(s)     → SetSpeed(s)   + notification "s"
//! KeyStart         →               + notification (start of burst)
//! KeyStop(text)    →               + notification "text"
//! Version / Ready  →               + notification
//! TransportError   →               + notification, session ends
//! ```
//!
//! Every event yields exactly one notification, so nothing that reaches the
//! relay is silently dropped.  Order is preserved because the writer handles
//! one step at a time, in arrival order.

use winkeyflex_core::{Event, FlexCommand, KeyerEvent, Notification};

/// What the relay does with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayStep {
    /// Command to apply to the radio, if the event is relayable.
    pub command: Option<FlexCommand>,
    /// Display notification.  The writer marks it relayed once `command`
    /// has been written successfully.
    pub notification: Notification,
    /// `true` when the event ends the relay for this session.
    pub terminal: bool,
}

/// Translates one event into a [`RelayStep`].
///
/// # Example
///
/// ```rust
/// use winkeyflex_bridge::application::translate;
/// use winkeyflex_core::{Event, FlexCommand, KeyerEvent};
///
/// let step = translate(&Event::hardware(KeyerEvent::PotChange(23)));
/// assert_eq!(step.command, Some(FlexCommand::SetSpeed(23)));
/// assert_eq!(step.notification.text, "23");
/// ```
pub fn translate(event: &Event) -> RelayStep {
    let command = match event.payload {
        KeyerEvent::Echo(ch) => Some(FlexCommand::Transmit(ch)),
        KeyerEvent::PotChange(speed) => Some(FlexCommand::SetSpeed(speed)),
        KeyerEvent::Version(_)
        | KeyerEvent::Ready
        | KeyerEvent::KeyStart
        | KeyerEvent::KeyStop(_)
        | KeyerEvent::TransportError(_) => None,
    };

    RelayStep {
        command,
        notification: Notification::from(event),
        terminal: matches!(event.payload, KeyerEvent::TransportError(_)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
