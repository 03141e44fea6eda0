mod client;
mod command;
mod error;

pub use client::{Rotator, DEFAULT_BAUD};
pub use command::Command;
pub use error::RotatorError;
