use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::Utc;

use super::error::IngestError;
use super::frame::parse_frame;
use super::state::TelemetryState;

pub const DEFAULT_BAUD: u32 = 57_600;

/// Read timeout on the radio port. Also bounds how long a stop request can go
/// unobserved.
const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Backoff after a non-timeout read error so a wedged port does not spin the
/// thread.
const ERROR_BACKOFF: Duration = Duration::from_millis(250);

/// Longest line worth buffering. Real frames are a few hundred bytes; a link
/// streaming noise with no newline must not grow the buffer without bound.
const MAX_LINE_LEN: usize = 8 * 1024;

pub struct Ingest;

/// Handle to a running ingestion thread.
pub struct IngestHandle {
    stop: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl Ingest {
    /// Open the radio port and start the ingestion loop on its own thread.
    ///
    /// The loop owns the port exclusively and is the sole writer of `state`.
    /// Failing to open the port is the only startup error; everything after
    /// that is recovered inside the loop.
    pub fn spawn(
        port_path: &str,
        baud: u32,
        log_file: Option<PathBuf>,
        state: TelemetryState,
    ) -> Result<IngestHandle, IngestError> {
        let port = serialport::new(port_path, baud)
            .timeout(READ_TIMEOUT)
            .open()?;

        log::info!("telemetry ingestion started on {port_path} at {baud} baud");

        let stop = Arc::new(AtomicBool::new(false));
        let loop_stop = stop.clone();
        let join = std::thread::spawn(move || run_loop(port, state, &loop_stop, log_file));

        Ok(IngestHandle { stop, join })
    }
}

impl IngestHandle {
    /// Request a stop and wait for the loop to release the port. The loop
    /// observes the flag within one read-timeout interval.
    pub fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = self.join.join();
    }
}

/// Body of the ingestion thread. Exits only when `stop` is set; every
/// per-frame failure is logged and skipped, because keeping the loop alive
/// matters more than any single frame.
fn run_loop<R: Read>(
    mut port: R,
    state: TelemetryState,
    stop: &AtomicBool,
    log_file: Option<PathBuf>,
) {
    let mut pending: Vec<u8> = Vec::new();
    let mut buf = [0u8; 512];

    while !stop.load(Ordering::Relaxed) {
        let n = match port.read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("telemetry read error: {e}");
                std::thread::sleep(ERROR_BACKOFF);
                continue;
            }
        };

        pending.extend_from_slice(&buf[..n]);

        while let Some(eol) = pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = pending.drain(..=eol).collect();
            handle_line(&String::from_utf8_lossy(&line), &state, log_file.as_deref());
        }

        if pending.len() > MAX_LINE_LEN {
            log::warn!(
                "discarding {} buffered bytes with no line terminator",
                pending.len()
            );
            pending.clear();
        }
    }

    log::info!("telemetry ingestion stopped");
}

fn handle_line(line: &str, state: &TelemetryState, log_file: Option<&Path>) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let packet = match parse_frame(line) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("discarding frame: {e}");
            return;
        }
    };

    log::debug!(
        "accepted fix: lat {} lon {} alt {} m",
        packet.gps.latitude,
        packet.gps.longitude,
        packet.gps.altitude
    );
    state.publish(packet);

    if let Some(path) = log_file {
        // Everything up to the checksum token was validated, so log only the
        // payload portion.
        let payload = line
            .split_once(char::is_whitespace)
            .map(|(_, p)| p.trim_start())
            .unwrap_or(line);
        append_record(path, payload);
    }
}

/// Best-effort append of an accepted payload. A full disk must not take down
/// the radio link.
fn append_record(path: &Path, payload: &str) {
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut f| writeln!(f, "{} {}", Utc::now().to_rfc3339(), payload));

    if let Err(e) = result {
        log::warn!("failed to append to telemetry log {}: {e}", path.display());
    }
}
