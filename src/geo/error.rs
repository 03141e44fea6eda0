use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeoError {
    #[error("cannot compute elevation: one or both points have no altitude")]
    MissingAltitude,
}
