use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use super::command::Command;
use super::error::RotatorError;

pub const DEFAULT_BAUD: u32 = 115_200;

/// Every exchange must complete within this window. Calibration motion may
/// run much longer; only the protocol-level response is bounded by it.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Synchronous client for a two-axis rotator.
///
/// Owns its serial line exclusively. Every call writes one command line, then
/// reads an echo of that line and an `OK [fields...]` / `ERR` response.
/// Concurrent commands on one line are not supported; keep the client on a
/// single thread or behind a mutex.
pub struct Rotator<P: Read + Write> {
    port: P,
    protocol_version: String,
}

impl Rotator<Box<dyn SerialPort>> {
    /// Open the rotator port and perform the initial version exchange.
    pub fn open(port_path: &str, baud: u32) -> Result<Self, RotatorError> {
        let port = serialport::new(port_path, baud)
            .timeout(RESPONSE_TIMEOUT)
            .open()?;

        let rotator = Self::from_port(port)?;
        log::info!(
            "rotator on {port_path}: protocol version {}",
            rotator.protocol_version
        );
        Ok(rotator)
    }

    /// Discard anything buffered on the input side, to resynchronize the line
    /// after a malformed response.
    pub fn dump_input(&mut self) -> Result<(), RotatorError> {
        self.port.clear(serialport::ClearBuffer::Input)?;
        Ok(())
    }
}

impl<P: Read + Write> Rotator<P> {
    /// Build a client over an already-open transport. Issues the version
    /// query immediately; construction fails if that exchange fails.
    pub fn from_port(port: P) -> Result<Self, RotatorError> {
        let mut rotator = Self {
            port,
            protocol_version: String::new(),
        };

        let mut fields = rotator.exchange(&Command::Version)?;
        rotator.protocol_version = fields.remove(0);

        Ok(rotator)
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    /// Release the underlying transport.
    #[allow(dead_code)]
    pub fn into_port(self) -> P {
        self.port
    }

    /// Current position as (vertical, horizontal) degrees.
    pub fn position(&mut self) -> Result<(f64, f64), RotatorError> {
        let fields = self.exchange(&Command::GetPosition)?;
        Ok((parse_angle(&fields[0])?, parse_angle(&fields[1])?))
    }

    /// Move both axes, vertical first.
    pub fn set_position(&mut self, vertical_deg: f64, horizontal_deg: f64) -> Result<(), RotatorError> {
        self.set_vertical(vertical_deg)?;
        self.set_horizontal(horizontal_deg)
    }

    pub fn set_vertical(&mut self, deg: f64) -> Result<(), RotatorError> {
        self.exchange(&Command::SetVertical(deg)).map(drop)
    }

    /// Absolute horizontal angle in the bearing convention (clockwise from
    /// north). The device's positive direction is the opposite, so the value
    /// is negated on the wire.
    pub fn set_horizontal(&mut self, deg: f64) -> Result<(), RotatorError> {
        self.exchange(&Command::SetHorizontal(-deg)).map(drop)
    }

    /// Calibrate the vertical axis; `set` persists the calibration on the
    /// device. May take as long as the hardware needs to move.
    pub fn calibrate_vertical(&mut self, set: bool) -> Result<(), RotatorError> {
        self.exchange(&Command::CalibrateVertical { set }).map(drop)
    }

    pub fn calibrate_horizontal(&mut self) -> Result<(), RotatorError> {
        self.exchange(&Command::CalibrateHorizontal).map(drop)
    }

    /// Relative vertical motion by a signed step count.
    pub fn move_vertical(&mut self, steps: i64) -> Result<(), RotatorError> {
        self.exchange(&Command::MoveVertical(steps)).map(drop)
    }

    pub fn move_horizontal(&mut self, steps: i64) -> Result<(), RotatorError> {
        self.exchange(&Command::MoveHorizontal(steps)).map(drop)
    }

    /// One full protocol exchange: command line out, echo line and response
    /// line back in. Returns the response's trailing fields.
    fn exchange(&mut self, command: &Command) -> Result<Vec<String>, RotatorError> {
        let line = command.wire_line();
        log::debug!("rotator <- {line}");

        self.port.write_all(line.as_bytes())?;
        self.port.write_all(b"\n")?;
        self.port.flush()?;

        let _echo = self.read_line()?;
        let response = self.read_line()?;
        log::debug!("rotator -> {response}");

        let mut parts = response.split_whitespace();
        match parts.next() {
            Some("OK") => {}
            Some("ERR") => return Err(RotatorError::DeviceRejected),
            other => {
                return Err(RotatorError::MalformedResponse(format!(
                    "unexpected status token {other:?}"
                )))
            }
        }

        let fields: Vec<String> = parts.map(String::from).collect();
        if let Some(expected) = command.expected_fields() {
            if fields.len() != expected {
                return Err(RotatorError::MalformedResponse(format!(
                    "{line}: expected {expected} response fields, got {}",
                    fields.len()
                )));
            }
        }

        Ok(fields)
    }

    fn read_line(&mut self) -> Result<String, RotatorError> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match self.port.read(&mut byte) {
                Ok(0) => {
                    return Err(RotatorError::MalformedResponse(
                        "line ended before a newline".into(),
                    ))
                }
                Ok(_) if byte[0] == b'\n' => break,
                Ok(_) => line.push(byte[0]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(RotatorError::Io(e)),
            }
        }

        Ok(String::from_utf8_lossy(&line)
            .trim_end_matches('\r')
            .to_string())
    }
}

fn parse_angle(field: &str) -> Result<f64, RotatorError> {
    field.parse().map_err(|_| {
        RotatorError::MalformedResponse(format!("non-numeric position field {field:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory serial peer: serves a scripted input and records everything
    /// written to it.
    struct ScriptedPeer {
        input: std::io::Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl ScriptedPeer {
        /// Peer that answers the construction-time VERS exchange, then plays
        /// `script`.
        fn new(script: &str) -> Self {
            let full = format!("VERS\nOK 1.0\n{script}");
            Self {
                input: std::io::Cursor::new(full.into_bytes()),
                written: Vec::new(),
            }
        }

        fn written_lines(&self) -> Vec<String> {
            String::from_utf8(self.written.clone())
                .unwrap()
                .lines()
                .map(String::from)
                .collect()
        }
    }

    impl Read for ScriptedPeer {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for ScriptedPeer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn construction_stores_protocol_version() {
        let rotator = Rotator::from_port(ScriptedPeer::new("")).unwrap();
        assert_eq!(rotator.protocol_version(), "1.0");
    }

    #[test]
    fn construction_fails_when_version_exchange_fails() {
        let peer = ScriptedPeer {
            input: std::io::Cursor::new(b"VERS\nERR\n".to_vec()),
            written: Vec::new(),
        };
        assert!(matches!(
            Rotator::from_port(peer),
            Err(RotatorError::DeviceRejected)
        ));
    }

    #[test]
    fn position_parses_two_fields() {
        let mut rotator = Rotator::from_port(ScriptedPeer::new("GETP\nOK 12.50 -3.25\n")).unwrap();
        assert_eq!(rotator.position().unwrap(), (12.5, -3.25));
    }

    #[test]
    fn err_response_is_device_rejected() {
        let mut rotator = Rotator::from_port(ScriptedPeer::new("GETP\nERR\n")).unwrap();
        assert!(matches!(
            rotator.position(),
            Err(RotatorError::DeviceRejected)
        ));
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        let mut rotator = Rotator::from_port(ScriptedPeer::new("GETP\nOK 12.50\n")).unwrap();
        assert!(matches!(
            rotator.position(),
            Err(RotatorError::MalformedResponse(_))
        ));
    }

    #[test]
    fn unknown_status_token_is_malformed() {
        let mut rotator = Rotator::from_port(ScriptedPeer::new("GETP\nWHAT 1 2\n")).unwrap();
        assert!(matches!(
            rotator.position(),
            Err(RotatorError::MalformedResponse(_))
        ));
    }

    #[test]
    fn horizontal_angle_is_sign_inverted_on_the_wire() {
        let mut rotator = Rotator::from_port(ScriptedPeer::new("DHOR 45.0\nOK\n")).unwrap();
        rotator.set_horizontal(-45.0).unwrap();
        let lines = rotator.port.written_lines();
        assert_eq!(lines.last().unwrap(), "DHOR 45.0");
    }

    #[test]
    fn vertical_angle_is_sent_unchanged() {
        let mut rotator = Rotator::from_port(ScriptedPeer::new("DVER 70.1\nOK\n")).unwrap();
        rotator.set_vertical(70.1).unwrap();
        assert_eq!(rotator.port.written_lines().last().unwrap(), "DVER 70.1");
    }

    #[test]
    fn jog_and_calibrate_tolerate_extra_response_fields() {
        // No expected field count on these commands.
        let mut rotator =
            Rotator::from_port(ScriptedPeer::new("MOVV 100\nOK moved\nCALH\nOK\n")).unwrap();
        rotator.move_vertical(100).unwrap();
        rotator.calibrate_horizontal().unwrap();
    }
}
