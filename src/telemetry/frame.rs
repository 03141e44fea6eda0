use crc::{Crc, CRC_8_SMBUS};

use super::error::FrameError;
use super::packet::RocketPacket;

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// CRC-8 (poly 0x07) over a byte payload. Stateless; used to reject frames
/// corrupted on the radio link. Not an authentication mechanism.
pub fn crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// Validate and decode one telemetry line of the form `<decimal-crc8> <json>`.
///
/// The checksum covers the exact payload bytes after the first whitespace
/// run. A checksum token that fails to parse rejects the frame; a frame is
/// never accepted on the strength of an uncheckable checksum.
pub fn parse_frame(line: &str) -> Result<RocketPacket, FrameError> {
    let line = line.trim_end_matches(['\r', '\n']);

    let (token, payload) = line
        .split_once(char::is_whitespace)
        .ok_or(FrameError::MissingSeparator)?;
    let payload = payload.trim_start();

    let received: u8 = token
        .parse()
        .map_err(|_| FrameError::BadChecksumToken(token.to_string()))?;

    let computed = crc8(payload.as_bytes());
    if computed != received {
        return Err(FrameError::ChecksumMismatch { received, computed });
    }

    serde_json::from_str(payload).map_err(|e| FrameError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_for(payload: &str) -> String {
        format!("{} {}", crc8(payload.as_bytes()), payload)
    }

    #[test]
    fn crc8_is_deterministic() {
        let data = b"{\"gps\":{\"latitude\":1.0}}";
        assert_eq!(crc8(data), crc8(data));
    }

    #[test]
    fn crc8_detects_single_bit_flips() {
        let data = b"telemetry payload";
        let reference = crc8(data);
        for byte in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data.to_vec();
                flipped[byte] ^= 1 << bit;
                assert_ne!(crc8(&flipped), reference, "flip at {byte}:{bit}");
            }
        }
    }

    #[test]
    fn parses_valid_frame() {
        let payload = r#"{"gps":{"latitude":32.94,"longitude":-106.92,"altitude":1400.0}}"#;
        let packet = parse_frame(&frame_for(payload)).unwrap();
        assert_eq!(packet.gps.longitude, -106.92);
    }

    #[test]
    fn rejects_checksum_mismatch() {
        let payload = r#"{"gps":{"latitude":1.0,"longitude":2.0,"altitude":3.0}}"#;
        let bad = format!("{} {}", crc8(payload.as_bytes()).wrapping_add(1), payload);
        assert!(matches!(
            parse_frame(&bad),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn rejects_unparseable_checksum_token() {
        assert_eq!(
            parse_frame("xyz {\"gps\":{}}"),
            Err(FrameError::BadChecksumToken("xyz".into()))
        );
        // Out of u8 range counts as unparseable too.
        assert!(matches!(
            parse_frame("300 {}"),
            Err(FrameError::BadChecksumToken(_))
        ));
    }

    #[test]
    fn rejects_line_without_separator() {
        assert_eq!(parse_frame("justonetoken"), Err(FrameError::MissingSeparator));
    }

    #[test]
    fn rejects_valid_checksum_over_garbage_json() {
        let payload = "not json at all";
        assert!(matches!(
            parse_frame(&frame_for(payload)),
            Err(FrameError::Decode(_))
        ));
    }
}
