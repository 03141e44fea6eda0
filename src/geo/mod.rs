mod declination;
mod error;
mod point;

pub use declination::{decimal_year, DeclinationModel, NullDeclination};
pub use error::GeoError;
pub use point::{GeoPoint, EARTH_RADIUS_M};
