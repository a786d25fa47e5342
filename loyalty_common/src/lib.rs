mod points;

pub mod helpers;
pub mod op;
mod secret;

pub use points::{Points, PointsConversionError, POINTS_DECIMAL_PLACES};
pub use secret::Secret;
