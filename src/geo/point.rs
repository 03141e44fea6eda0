use serde::{Deserialize, Serialize};

use super::declination::DeclinationModel;
use super::error::GeoError;

/// Spherical Earth radius used by the haversine distance, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// A single point on the Earth, including altitude.
///
/// Altitude is absent only for the uninitialized ground/air default; a new
/// point is constructed whenever a fix changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: Option<f64>,
}

impl GeoPoint {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: Option<f64>) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        }
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    /// Great-circle ground-only distance in meters between two points.
    /// Altitude is ignored.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let dlat = other.lat_rad() - self.lat_rad();
        let dlon = other.lon_rad() - self.lon_rad();

        let a = (dlat / 2.0).sin().powi(2)
            + self.lat_rad().cos() * other.lat_rad().cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Altitude of `other` above this point, if both altitudes are known.
    pub fn altitude_to(&self, other: &GeoPoint) -> Option<f64> {
        match (self.altitude_m, other.altitude_m) {
            (Some(a), Some(b)) => Some(b - a),
            _ => None,
        }
    }

    /// Initial bearing (azimuth) from this point to another, in degrees from
    /// true north. Signed (−180, 180] by default; `positive` folds the result
    /// into [0, 360).
    pub fn bearing_to(&self, other: &GeoPoint, positive: bool) -> f64 {
        let dlon = other.lon_rad() - self.lon_rad();

        let y = dlon.sin() * other.lat_rad().cos();
        let x = self.lat_rad().cos() * other.lat_rad().sin()
            - self.lat_rad().sin() * other.lat_rad().cos() * dlon.cos();

        let bearing = y.atan2(x).to_degrees();

        if positive {
            (bearing + 360.0) % 360.0
        } else {
            bearing
        }
    }

    /// Bearing to another point corrected for magnetic declination at this
    /// point, for devices that base their heading on magnetic north.
    pub fn magnetic_bearing_to(
        &self,
        other: &GeoPoint,
        model: &dyn DeclinationModel,
        decimal_year: f64,
        positive: bool,
    ) -> f64 {
        let declination = model.declination_deg(
            self.latitude_deg,
            self.longitude_deg,
            self.altitude_m.unwrap_or(0.0),
            decimal_year,
        );

        let bearing = self.bearing_to(other, false) + declination;

        if positive {
            (bearing + 360.0) % 360.0
        } else {
            bearing
        }
    }

    /// Elevation above the local horizon to another point, in degrees.
    ///
    /// Returns 0.0 when the horizontal distance is exactly zero (the angle is
    /// undefined there, and dividing would blow up). Both points must carry an
    /// altitude; a silent zero would mis-point the dish.
    pub fn elevation_to(&self, other: &GeoPoint) -> Result<f64, GeoError> {
        let horizontal = self.distance_to(other);

        if horizontal == 0.0 {
            return Ok(0.0);
        }

        let altitude_delta = self.altitude_to(other).ok_or(GeoError::MissingAltitude)?;

        Ok((altitude_delta / horizontal).atan().to_degrees())
    }
}
