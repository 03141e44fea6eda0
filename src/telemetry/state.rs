use std::sync::{Arc, Mutex};

use super::packet::RocketPacket;

/// Shared slot holding the most recently decoded rocket packet.
///
/// Exactly one writer (the ingestion loop) and any number of readers. The
/// value is swapped whole, never updated field-by-field, so a reader can
/// never observe a half-written fix.
#[derive(Debug, Clone, Default)]
pub struct TelemetryState {
    inner: Arc<Mutex<Option<RocketPacket>>>,
}

impl TelemetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current packet. Last write wins.
    pub fn publish(&self, packet: RocketPacket) {
        *self.inner.lock().unwrap() = Some(packet);
    }

    /// Clone out the latest packet, if any frame has been accepted yet.
    pub fn latest(&self) -> Option<RocketPacket> {
        self.inner.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::GpsFix;

    fn packet(alt: f64) -> RocketPacket {
        RocketPacket {
            gps: GpsFix {
                latitude: 32.9,
                longitude: -106.9,
                altitude: alt,
            },
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn starts_empty_and_last_write_wins() {
        let state = TelemetryState::new();
        assert!(state.latest().is_none());

        state.publish(packet(100.0));
        state.publish(packet(200.0));
        assert_eq!(state.latest().unwrap().gps.altitude, 200.0);
    }

    #[test]
    fn clones_share_the_slot() {
        let writer = TelemetryState::new();
        let reader = writer.clone();
        writer.publish(packet(1.0));
        assert!(reader.latest().is_some());
    }
}
