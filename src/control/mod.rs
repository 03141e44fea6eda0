use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::geo::{decimal_year, DeclinationModel, GeoPoint};
use crate::rotator::{Rotator, RotatorError};
use crate::telemetry::TelemetryState;

pub const DEFAULT_PERIOD: Duration = Duration::from_millis(500);

/// One computed pointing solution, for display and testing. The bearing here
/// is the reporting form, folded into [0, 360).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointing {
    pub bearing_deg: f64,
    pub elevation_deg: f64,
    pub distance_m: f64,
}

/// Fixed-rate task that reads the latest telemetry fix and points the rotator
/// at it. Sole owner of the rotator; independent of any UI event loop.
pub struct ControlLoop<P: Read + Write, D: DeclinationModel> {
    state: TelemetryState,
    ground: Option<GeoPoint>,
    rotator: Rotator<P>,
    declination: D,
    period: Duration,
}

impl<P: Read + Write, D: DeclinationModel> ControlLoop<P, D> {
    pub fn new(
        state: TelemetryState,
        ground: Option<GeoPoint>,
        rotator: Rotator<P>,
        declination: D,
        period: Duration,
    ) -> Self {
        Self {
            state,
            ground,
            rotator,
            declination,
            period,
        }
    }

    /// Compute and send one pointing update.
    ///
    /// Quietly does nothing until both a ground position and a telemetry fix
    /// exist. A fix without usable altitude is skipped whole rather than
    /// half-pointing the dish.
    pub fn step(&mut self) -> Result<Option<Pointing>, RotatorError> {
        let Some(ground) = self.ground else {
            return Ok(None);
        };
        let Some(packet) = self.state.latest() else {
            return Ok(None);
        };
        let air = packet.position();

        let bearing = ground.magnetic_bearing_to(
            &air,
            &self.declination,
            decimal_year(Utc::now()),
            false,
        );
        let elevation = match ground.elevation_to(&air) {
            Ok(e) => e,
            Err(e) => {
                log::warn!("skipping pointing update: {e}");
                return Ok(None);
            }
        };

        self.rotator.set_vertical(elevation)?;
        self.rotator.set_horizontal(bearing)?;

        Ok(Some(Pointing {
            bearing_deg: (bearing + 360.0) % 360.0,
            elevation_deg: elevation,
            distance_m: ground.distance_to(&air),
        }))
    }

    /// Tick at the configured period until `stop` is set. A failed command
    /// is logged and the loop keeps going; the next fix gets a fresh try.
    pub fn run(&mut self, stop: &AtomicBool) {
        let mut next = Instant::now();

        while !stop.load(Ordering::Relaxed) {
            match self.step() {
                Ok(Some(p)) => log::info!(
                    "pointing: bearing {:.2} deg, elevation {:.2} deg, {:.0} m",
                    p.bearing_deg,
                    p.elevation_deg,
                    p.distance_m
                ),
                Ok(None) => {}
                Err(e) => log::warn!("rotator command failed: {e}"),
            }

            next += self.period;
            let now = Instant::now();
            if next > now {
                std::thread::sleep(next - now);
            } else {
                // Fell behind (e.g. a slow exchange); don't try to catch up.
                next = now;
            }
        }
    }
}
