//! Scripted serial transport for testing.
//!
//! # Why a scripted transport?
//!
//! The real transport needs a WinKeyer or a Flex virtual port plugged in, and
//! nothing it writes can be observed from test code.  [`ScriptedTransport`]
//! replaces the wire with:
//!
//! - a script of read results (bytes, silent reads, failures), played in
//!   order, then silence forever, like an idle keyer;
//! - a shared [`TransportLog`] that records every successful write, every byte
//!   read and every close, so assertions can inspect exactly what went out and
//!   in what order.
//!
//! [`ScriptedOpener`] hands scripted transports out by port name.
//!
//! # Usage in tests
//!
//! ```rust
//! use winkeyflex_bridge::infrastructure::mock::{ScriptStep, ScriptedOpener, ScriptedTransport};
//!
//! let winkeyer = ScriptedTransport::from_bytes(&[0x1F, b'K']);
//! let log = winkeyer.log();
//! let opener = ScriptedOpener::new().with_port("wk", winkeyer);
//! // ... run the reader against `opener`, then inspect `log.writes()`.
//! # let _ = (log, opener, ScriptStep::Silence);
//! ```

use std::collections::{HashMap, VecDeque};
use std::io::ErrorKind;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::domain::config::LineSettings;
use crate::infrastructure::transport::{PortOpener, Transport, TransportError};

/// How long an exhausted script sleeps per read, standing in for the serial
/// read timeout.
const IDLE_READ: Duration = Duration::from_millis(2);

/// One scripted read result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStep {
    /// The read returns this byte.
    Byte(u8),
    /// The read returns nothing (zero-length read / timeout).
    Silence,
    /// The read fails with an I/O error of this kind.
    Fail(ErrorKind),
}

// ── Shared log ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct LogInner {
    writes: Vec<Vec<u8>>,
    bytes_read: usize,
    close_calls: usize,
}

/// Records what a [`ScriptedTransport`] did.
///
/// Cloning shares the same record, so a test can keep one handle while the
/// transport itself is moved into a reader or writer loop.
#[derive(Debug, Clone, Default)]
pub struct TransportLog {
    inner: Arc<Mutex<LogInner>>,
}

impl TransportLog {
    fn lock(&self) -> MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every successful write, one entry per `write` call.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock().writes.clone()
    }

    /// All successfully written bytes, concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.lock().writes.concat()
    }

    /// Number of scripted bytes handed to the reader so far.
    pub fn bytes_read(&self) -> usize {
        self.lock().bytes_read
    }

    /// Number of times `close` was called.
    pub fn close_calls(&self) -> usize {
        self.lock().close_calls
    }
}

// ── Transport ─────────────────────────────────────────────────────────────────

/// An in-memory [`Transport`] driven by a script.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: VecDeque<ScriptStep>,
    log: TransportLog,
    write_calls: usize,
    failing_writes: Vec<usize>,
    fail_writes_from: Option<usize>,
}

impl ScriptedTransport {
    /// Creates a transport that plays `steps` and then stays silent.
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            script: steps.into_iter().collect(),
            log: TransportLog::default(),
            write_calls: 0,
            failing_writes: Vec::new(),
            fail_writes_from: None,
        }
    }

    /// Creates a transport whose script is just these bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(bytes.iter().copied().map(ScriptStep::Byte))
    }

    /// Makes the `index`-th `write` call (0-based) fail.
    pub fn fail_write(mut self, index: usize) -> Self {
        self.failing_writes.push(index);
        self
    }

    /// Makes every `write` call from the `index`-th onward fail.
    pub fn fail_writes_from(mut self, index: usize) -> Self {
        self.fail_writes_from = Some(index);
        self
    }

    /// Returns a handle to this transport's log.
    pub fn log(&self) -> TransportLog {
        self.log.clone()
    }

    fn write_should_fail(&self, index: usize) -> bool {
        self.failing_writes.contains(&index)
            || self.fail_writes_from.is_some_and(|from| index >= from)
    }
}

impl Transport for ScriptedTransport {
    fn read_byte(&mut self) -> Result<Option<u8>, TransportError> {
        match self.script.pop_front() {
            Some(ScriptStep::Byte(b)) => {
                self.log.lock().bytes_read += 1;
                Ok(Some(b))
            }
            Some(ScriptStep::Silence) => Ok(None),
            Some(ScriptStep::Fail(kind)) => {
                Err(std::io::Error::new(kind, "scripted read failure").into())
            }
            None => {
                thread::sleep(IDLE_READ);
                Ok(None)
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let index = self.write_calls;
        self.write_calls += 1;
        if self.write_should_fail(index) {
            return Err(std::io::Error::new(ErrorKind::BrokenPipe, "scripted write failure").into());
        }
        self.log.lock().writes.push(bytes.to_vec());
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.log.lock().close_calls += 1;
        Ok(())
    }
}

// ── Opener ────────────────────────────────────────────────────────────────────

/// A [`PortOpener`] that hands out pre-registered scripted transports.
///
/// Each registered port can be opened once.  Opening an unknown name (or
/// opening a name twice) fails with [`TransportError::Open`].
#[derive(Debug, Default)]
pub struct ScriptedOpener {
    ports: Mutex<HashMap<String, ScriptedTransport>>,
    open_calls: Mutex<Vec<String>>,
}

impl ScriptedOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `transport` under `name`.
    pub fn with_port(self, name: &str, transport: ScriptedTransport) -> Self {
        self.ports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), transport);
        self
    }

    /// Names passed to `open`, in call order.
    pub fn open_calls(&self) -> Vec<String> {
        self.open_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PortOpener for ScriptedOpener {
    fn open(
        &self,
        port_name: &str,
        _line: &LineSettings,
    ) -> Result<Box<dyn Transport>, TransportError> {
        self.open_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(port_name.to_string());

        self.ports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(port_name)
            .map(|t| Box::new(t) as Box<dyn Transport>)
            .ok_or_else(|| TransportError::Open {
                port: port_name.to_string(),
                reason: "no such port".to_string(),
            })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
