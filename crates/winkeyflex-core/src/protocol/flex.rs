//! Commands written to the FlexRadio virtual keyer port.
//!
//! The Flex keyer emulates the WinKeyer host interface, so the radio side
//! accepts a small subset of the same bytes:
//!
//! ```text
//! 00 02          open (see protocol::HOST_OPEN)
//! 00 03          close (see protocol::HOST_CLOSE)
//! <char>         key one literal character
//! 02 <speed>     set keying speed
//! ```

/// First byte of the set-speed command.
pub const SET_SPEED: u8 = 0x02;

/// One command for the radio-side keyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexCommand {
    /// Key one literal character, written as its raw byte.
    Transmit(u8),
    /// Set the keying speed to a pot value.
    ///
    /// The value is written verbatim.  Pot values from the WinKeyer are at
    /// most 63, so they always fit in the second byte.
    SetSpeed(u8),
}

impl FlexCommand {
    /// Encodes the command into the bytes written to the radio.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use winkeyflex_core::FlexCommand;
    ///
    /// assert_eq!(FlexCommand::Transmit(b'K').encode(), vec![0x4B]);
    /// assert_eq!(FlexCommand::SetSpeed(23).encode(), vec![0x02, 0x17]);
    /// ```
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            FlexCommand::Transmit(ch) => vec![ch],
            FlexCommand::SetSpeed(speed) => vec![SET_SPEED, speed],
        }
    }
}
