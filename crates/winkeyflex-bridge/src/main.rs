//! winkeyflex: WinKeyer to FlexRadio keyer bridge, entry point.
//!
//! This binary opens a K1EL WinKeyer on one serial port and a FlexRadio
//! virtual keyer on another, then copies everything the operator keys on the
//! paddles across to the radio.  Turning the WinKeyer speed knob changes the
//! radio's keying speed.
//!
//! Every event is also printed to the console, one line per notification.
//!
//! # Usage
//!
//! ```text
//! winkeyflex [OPTIONS]
//!
//! Options:
//!   --winkey <PORT>          WinKeyer serial port (e.g. /dev/ttyUSB0, COM3)
//!   --flex <PORT>            Flex virtual keyer port; omit for monitor mode
//!   --event-queue <N>        Reader → relay queue capacity [default: 10]
//!   --display-queue <N>      Relay → display queue capacity [default: 100]
//!   --poll-ms <MS>           Serial read timeout in milliseconds [default: 100]
//!   --json                   Print notifications as JSON lines
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable                   | Description                 |
//! |----------------------------|-----------------------------|
//! | `WINKEYFLEX_WINKEY_PORT`   | WinKeyer serial port        |
//! | `WINKEYFLEX_FLEX_PORT`     | Flex virtual keyer port     |
//!
//! # Architecture overview
//!
//! ```text
//! K1EL WinKeyer  (serial, 1200-8-2-N)
//!       ↓
//! winkeyflex  ← this process
//!   reader    decode WinKeyer bytes into events
//!   writer    relay echoes and speed changes to the radio
//!   display   this file: print notifications until both sides stop
//!       ↓
//! FlexRadio virtual keyer  (serial)
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use winkeyflex_bridge::domain::link::LinkExit;
use winkeyflex_bridge::domain::BridgeConfig;
use winkeyflex_bridge::infrastructure::{start_bridge, SerialPortOpener};
use winkeyflex_core::Notification;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WinKeyer to FlexRadio keyer bridge.
///
/// The `#[derive(Parser)]` macro from `clap` generates the argument parser
/// automatically from the struct fields and their `#[arg(...)]` attributes.
#[derive(Debug, Parser)]
#[command(
    name = "winkeyflex",
    about = "Relays a K1EL WinKeyer to a FlexRadio virtual keyer",
    version
)]
struct Cli {
    /// Serial port of the WinKeyer.
    ///
    /// When omitted, the WinKeyer side is not started.
    #[arg(long, env = "WINKEYFLEX_WINKEY_PORT")]
    winkey: Option<String>,

    /// Serial port of the Flex virtual keyer.
    ///
    /// When omitted, WinKeyer events are shown but not relayed (monitor mode).
    #[arg(long, env = "WINKEYFLEX_FLEX_PORT")]
    flex: Option<String>,

    /// Capacity of the reader → relay event queue.
    ///
    /// When this fills up the WinKeyer reader waits for the radio side.
    #[arg(long, default_value_t = 10)]
    event_queue: usize,

    /// Capacity of the relay → display queue.
    ///
    /// When this fills up, display lines are dropped; keying is never delayed.
    #[arg(long, default_value_t = 100)]
    display_queue: usize,

    /// Serial read timeout in milliseconds.
    ///
    /// Shutdown is noticed within one timeout.
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Print each notification as a JSON object on its own line.
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if a queue capacity or the poll interval is zero.
    fn into_bridge_config(self) -> anyhow::Result<BridgeConfig> {
        anyhow::ensure!(self.event_queue > 0, "--event-queue must be at least 1");
        anyhow::ensure!(self.display_queue > 0, "--display-queue must be at least 1");
        anyhow::ensure!(self.poll_ms > 0, "--poll-ms must be at least 1");

        Ok(BridgeConfig {
            winkey_port: self.winkey,
            flex_port: self.flex,
            event_queue_capacity: self.event_queue,
            notification_queue_capacity: self.display_queue,
            read_poll_interval: Duration::from_millis(self.poll_ms),
            ..BridgeConfig::default()
        })
    }
}

// ── Display ───────────────────────────────────────────────────────────────────

/// Renders one notification as a console line.
fn render(notification: &Notification, json: bool) -> anyhow::Result<String> {
    if json {
        return serde_json::to_string(notification).context("failed to serialize notification");
    }
    let marker = if notification.relayed { " → radio" } else { "" };
    Ok(format!("{notification}{marker}"))
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. `tracing_subscriber` is initialised.  The log level is controlled by
///    the `RUST_LOG` environment variable (e.g., `RUST_LOG=debug`).
/// 2. CLI arguments are parsed into a [`BridgeConfig`].
/// 3. [`start_bridge`] opens both ports on blocking worker threads.
/// 4. This task prints notifications until the writer side finishes.  Ctrl+C
///    asks the bridge to stop; both ports are closed before the process exits.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Parse CLI arguments ───────────────────────────────────────────────────
    let cli = Cli::parse();
    let json = cli.json;
    let config = cli.into_bridge_config()?;

    info!(
        "winkeyflex starting: winkeyer={}, flex={}, line {}",
        config.winkey_port.as_deref().unwrap_or("(none)"),
        config.flex_port.as_deref().unwrap_or("(monitor mode)"),
        config.line
    );

    let opener = Arc::new(SerialPortOpener::new(config.read_poll_interval));
    let (handle, mut notifications) = start_bridge(&config, opener);

    // ── Display loop ──────────────────────────────────────────────────────────
    //
    // The notification queue closes once the writer side has finished, which
    // (after Ctrl+C or a failure) is the signal to collect both exits.
    let mut ctrl_c = std::pin::pin!(tokio::signal::ctrl_c());
    loop {
        tokio::select! {
            note = notifications.recv() => match note {
                Some(note) => println!("{}", render(&note, json)?),
                None => break,
            },
            signal = &mut ctrl_c, if handle.is_running() => {
                match signal {
                    Ok(()) => info!("received Ctrl+C, closing ports"),
                    Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
                }
                handle.stop();
            }
        }
    }

    // The writer is gone, so nothing the reader produces can go anywhere.  This
    // also releases a reader still waiting for a WinKeyer that never answered.
    handle.stop();
    let outcome = handle.join().await;
    info!("winkeyflex stopped");

    for (side, exit) in [("winkeyer", &outcome.reader), ("flex", &outcome.writer)] {
        if let LinkExit::Failed(detail) = exit {
            anyhow::bail!("{side} side failed: {detail}");
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use winkeyflex_core::{Event, KeyerEvent};

    #[test]
    fn test_cli_defaults_leave_ports_unset() {
        // Arrange: parse with no arguments (all defaults apply)
        let cli = Cli::parse_from(["winkeyflex"]);

        // Assert
        assert!(cli.winkey.is_none() || std::env::var("WINKEYFLEX_WINKEY_PORT").is_ok());
        assert!(cli.flex.is_none() || std::env::var("WINKEYFLEX_FLEX_PORT").is_ok());
    }

    #[test]
    fn test_cli_defaults_produce_correct_queue_sizes() {
        let cli = Cli::parse_from(["winkeyflex"]);
        assert_eq!(cli.event_queue, 10);
        assert_eq!(cli.display_queue, 100);
    }

    #[test]
    fn test_cli_defaults_produce_correct_poll_interval() {
        let cli = Cli::parse_from(["winkeyflex"]);
        assert_eq!(cli.poll_ms, 100);
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_port_overrides() {
        let cli = Cli::parse_from(["winkeyflex", "--winkey", "COM3", "--flex", "COM4"]);
        assert_eq!(cli.winkey.as_deref(), Some("COM3"));
        assert_eq!(cli.flex.as_deref(), Some("COM4"));
    }

    #[test]
    fn test_into_bridge_config_carries_ports_and_sizes() {
        // Arrange
        let cli = Cli::parse_from([
            "winkeyflex",
            "--winkey",
            "/dev/ttyUSB0",
            "--flex",
            "/dev/ttyS10",
            "--event-queue",
            "4",
            "--display-queue",
            "50",
            "--poll-ms",
            "20",
        ]);

        // Act
        let config = cli.into_bridge_config().unwrap();

        // Assert
        assert_eq!(config.winkey_port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.flex_port.as_deref(), Some("/dev/ttyS10"));
        assert_eq!(config.event_queue_capacity, 4);
        assert_eq!(config.notification_queue_capacity, 50);
        assert_eq!(config.read_poll_interval, Duration::from_millis(20));
        assert_eq!(config.line.to_string(), "1200-8-2-N");
    }

    #[test]
    fn test_into_bridge_config_rejects_zero_event_queue() {
        let cli = Cli::parse_from(["winkeyflex", "--event-queue", "0"]);
        assert!(cli.into_bridge_config().is_err());
    }

    #[test]
    fn test_into_bridge_config_rejects_zero_display_queue() {
        let cli = Cli::parse_from(["winkeyflex", "--display-queue", "0"]);
        assert!(cli.into_bridge_config().is_err());
    }

    #[test]
    fn test_into_bridge_config_rejects_zero_poll() {
        let cli = Cli::parse_from(["winkeyflex", "--poll-ms", "0"]);
        assert!(cli.into_bridge_config().is_err());
    }

    #[test]
    fn test_render_human_line_marks_relayed() {
        // Arrange
        let note = Notification::from(&Event::hardware(KeyerEvent::Echo(b'K'))).mark_relayed();

        // Act
        let line = render(&note, false).unwrap();

        // Assert
        assert_eq!(line, "echo: K (winkeyer) → radio");
    }

    #[test]
    fn test_render_json_line() {
        let note = Notification::from(&Event::radio(KeyerEvent::Version(2)));

        let line = render(&note, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["source"], "radio_keyer");
        assert_eq!(value["text"], "2");
        assert_eq!(value["relayed"], false);
    }
}
