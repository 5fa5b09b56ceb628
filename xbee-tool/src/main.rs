// xbee-tool -- issue AT commands to an XBee module in API mode and watch
// the packets it reports.
//
// Usage:
//   xbee-tool --port /dev/ttyUSB0 at NI
//   xbee-tool --port /dev/ttyUSB0 at NI 726f75746572
//   xbee-tool --port /dev/ttyUSB0 --timeout-ms 3000 remote 7D84 D1 04
//   xbee-tool --port /dev/ttyUSB0 monitor --seconds 60

mod logging;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use xbee_api::{AtData, AtReply, XBeeBuilder, XBeeRadio};
use xbee_core::Transport;

use crate::logging::{LogLevel, init_logging};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Talk to an XBee module in API mode.
#[derive(Parser, Debug)]
#[command(name = "xbee-tool", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    #[arg(long)]
    port: String,

    /// Baud rate; must match the module's BD setting.
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Give up on a request after this many milliseconds. Without it the
    /// tool waits for the radio indefinitely.
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Minimum log level (stderr). RUST_LOG overrides it.
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send an AT command to the local module.
    At {
        /// Two-character command name (e.g. NI, ND, %V).
        command: String,
        /// Parameter bytes as hex (e.g. 0A1B).
        #[arg(value_parser = parse_hex_data)]
        data: Option<HexData>,
    },

    /// Send an AT command to a remote node by network address.
    Remote {
        /// 16-bit network address in hex (e.g. 7D84).
        #[arg(value_parser = parse_hex_u16)]
        address: u16,
        /// Two-character command name.
        command: String,
        /// Parameter bytes as hex.
        #[arg(value_parser = parse_hex_data)]
        data: Option<HexData>,
    },

    /// Print every event the radio reports.
    Monitor {
        /// Stop after this many seconds (0 = until Ctrl-C).
        #[arg(long, default_value_t = 0)]
        seconds: u64,
    },
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Parse a hex string like "0x7D84" or "7D84" into a u16.
fn parse_hex_u16(s: &str) -> std::result::Result<u16, String> {
    u16::from_str_radix(strip_hex_prefix(s), 16).map_err(|e| format!("invalid address: {e}"))
}

/// AT parameter bytes given on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
struct HexData(Vec<u8>);

impl HexData {
    fn bytes(data: &Option<HexData>) -> &[u8] {
        match data {
            Some(d) => &d.0,
            None => &[],
        }
    }
}

fn parse_hex_data(s: &str) -> std::result::Result<HexData, String> {
    parse_hex_bytes(s).map(HexData)
}

/// Parse a hex string like "0A1B" into bytes.
fn parse_hex_bytes(s: &str) -> std::result::Result<Vec<u8>, String> {
    let digits = strip_hex_prefix(s);
    if digits.len() % 2 != 0 {
        return Err("hex data needs an even number of digits".into());
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .ok_or_else(|| "hex data must be ASCII".to_string())
                .and_then(|pair| {
                    u8::from_str_radix(pair, 16).map_err(|e| format!("invalid hex byte: {e}"))
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn format_data(data: &AtData) -> String {
    match data {
        AtData::Raw(bytes) if bytes.is_empty() => "(no data)".to_string(),
        AtData::Raw(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
                format!("{hex} \"{}\"", String::from_utf8_lossy(bytes))
            } else {
                hex
            }
        }
        AtData::Voltage(volts) => format!("{volts:.3} V"),
        AtData::Version { digit, raw } => format!("{digit} (0x{raw:04X})"),
        AtData::NodeDiscovery(node) => format!(
            "{:016X} addr {:04X} \"{}\" {} parent {:04X}",
            node.serial_number,
            node.network_address,
            node.node_identifier,
            node.device_type,
            node.parent_network_address
        ),
    }
}

fn print_reply(reply: &AtReply) {
    match reply {
        AtReply::Ok(data) => println!("OK {}", format_data(data)),
        AtReply::Error(status) => println!("ERROR {status}"),
        AtReply::Unknown { status, data } => {
            println!("status 0x{status:02X} {}", format_data(data))
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_monitor(radio: &XBeeRadio, seconds: u64) -> Result<()> {
    let mut event_rx = radio.subscribe();
    println!("Monitoring radio events (Ctrl-C to stop)...");

    let deadline = (seconds > 0).then(|| Instant::now() + Duration::from_secs(seconds));

    loop {
        let remaining = match deadline {
            Some(dl) => dl.saturating_duration_since(Instant::now()),
            None => Duration::from_secs(3600),
        };
        if remaining.is_zero() {
            break;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = tokio::time::timeout(remaining, event_rx.recv()) => match received {
                Ok(Ok(event)) => println!("[event] {event:?}"),
                Ok(Err(RecvError::Lagged(n))) => {
                    println!("[warning] missed {n} events (consumer too slow)");
                }
                Ok(Err(RecvError::Closed)) => break,
                Err(_) => {
                    if deadline.is_some() {
                        break;
                    }
                }
            },
        }
    }

    Ok(())
}

/// Stop the IO task and close the port it hands back.
async fn close_radio(radio: XBeeRadio) -> Result<()> {
    let mut transport = radio
        .shutdown()
        .await
        .context("stopping the radio IO task")?;
    if let Err(e) = transport.close().await {
        warn!(error = %e, "failed to close transport");
    }
    info!("radio closed");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let radio = XBeeBuilder::new()
        .serial_port(&cli.port)
        .baud_rate(cli.baud)
        .request_timeout(cli.timeout_ms.map(Duration::from_millis))
        .build()
        .await
        .with_context(|| format!("opening {} at {} baud", cli.port, cli.baud))?;
    info!(port = %cli.port, baud = cli.baud, "radio ready");

    let result = match &cli.command {
        Command::At { command, data } => radio
            .at_command(command, HexData::bytes(data))
            .await
            .map(|reply| print_reply(&reply))
            .with_context(|| format!("AT{command}")),
        Command::Remote {
            address,
            command,
            data,
        } => radio
            .remote_at_command(*address, command, HexData::bytes(data))
            .await
            .map(|reply| print_reply(&reply))
            .with_context(|| format!("remote AT{command} to {address:04X}")),
        Command::Monitor { seconds } => cmd_monitor(&radio, *seconds).await,
    };

    if let Err(e) = close_radio(radio).await {
        warn!(error = %e, "shutdown incomplete");
    }
    result
}
