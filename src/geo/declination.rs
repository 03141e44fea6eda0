use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Source of magnetic declination (the offset between true and magnetic
/// north) at a location and time.
///
/// Injected wherever a magnetic bearing is needed so the geodesy code never
/// embeds a particular model, coefficients file, or epoch.
pub trait DeclinationModel {
    /// Declination in degrees at the given position and decimal year.
    /// Positive means magnetic north lies east of true north.
    fn declination_deg(&self, lat_deg: f64, lon_deg: f64, alt_m: f64, decimal_year: f64) -> f64;
}

/// Model that reports no declination. Useful for tests and for rotators that
/// are referenced to true north.
pub struct NullDeclination;

impl DeclinationModel for NullDeclination {
    fn declination_deg(&self, _lat_deg: f64, _lon_deg: f64, _alt_m: f64, _year: f64) -> f64 {
        0.0
    }
}

/// Decimal-year form of a timestamp, e.g. 2025-07-02 ≈ 2025.5.
pub fn decimal_year(at: DateTime<Utc>) -> f64 {
    let year_start = Utc
        .with_ymd_and_hms(at.year(), 1, 1, 0, 0, 0)
        .single()
        .expect("jan 1 is always a valid date");
    let days_in = (at - year_start).num_days() as f64;

    at.year() as f64 + days_in / 365.2425
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_year_at_year_start() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert!((decimal_year(t) - 2025.0).abs() < 1e-9);
    }

    #[test]
    fn decimal_year_mid_year() {
        let t = Utc.with_ymd_and_hms(2025, 7, 2, 12, 0, 0).unwrap();
        let y = decimal_year(t);
        assert!(y > 2025.49 && y < 2025.51, "{y}");
    }
}
