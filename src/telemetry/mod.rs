mod error;
mod frame;
mod ingest;
mod packet;
mod state;

pub use error::{FrameError, IngestError};
pub use frame::{crc8, parse_frame};
pub use ingest::{Ingest, IngestHandle, DEFAULT_BAUD};
pub use packet::{GpsFix, RocketPacket};
pub use state::TelemetryState;
