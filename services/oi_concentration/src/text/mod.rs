//! Coercion of exchange-formatted text into canonical values

pub mod date;
pub mod value;

pub use date::{normalize_date, today_in_offset, yyyymmdd};
pub use value::coerce_int;
