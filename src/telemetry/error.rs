use thiserror::Error;

/// Failure to bring up the ingestion side of the radio link.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open telemetry port: {0}")]
    Port(#[from] serialport::Error),
}

/// Reasons a single received frame was discarded. Local to one read cycle;
/// the ingestion loop logs these and keeps going.
#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("frame has no checksum/payload separator")]
    MissingSeparator,
    #[error("checksum token {0:?} is not an unsigned integer")]
    BadChecksumToken(String),
    #[error("checksum mismatch: received {received}, computed {computed}")]
    ChecksumMismatch { received: u8, computed: u8 },
    #[error("payload is not a well-formed packet: {0}")]
    Decode(String),
}
