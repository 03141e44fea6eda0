use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// GPS block inside a telemetry frame. Degrees, degrees, meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Decoded payload of one valid telemetry frame.
///
/// Only the GPS block is consumed by the tracker; everything else the rocket
/// sends (battery, continuity, state flags, ...) rides along opaquely for
/// display. Each accepted frame replaces the previous packet wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketPacket {
    pub gps: GpsFix,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RocketPacket {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(
            self.gps.latitude,
            self.gps.longitude,
            Some(self.gps.altitude),
        )
    }
}
