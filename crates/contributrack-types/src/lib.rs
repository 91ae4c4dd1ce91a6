pub mod api;
pub mod models;
pub mod range;

pub use range::{DateRange, RangeError};
