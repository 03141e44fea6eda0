use thiserror::Error;

#[derive(Debug, Error)]
pub enum RotatorError {
    #[error("rotator port error: {0}")]
    Port(#[from] serialport::Error),
    #[error("rotator i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The device answered `ERR`: it understood the command and refused it.
    #[error("rotator rejected the command")]
    DeviceRejected,
    /// The exchange did not follow the echo + `OK [fields...]` protocol; the
    /// line may need to be resynchronized before retrying.
    #[error("malformed rotator response: {0}")]
    MalformedResponse(String),
}
