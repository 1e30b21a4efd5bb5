//! Season analytics for daily snowfall series.
//!
//! Everything here is a pure function over in-memory values: a raw row list
//! is normalized into one record per day, then scanned for streaks and
//! extremes, summed over contest windows, and compared against historical
//! seasons for a remaining-season forecast.

pub mod contest;
pub mod forecast;
pub mod holidays;
pub mod normalize;
pub mod records;
pub mod scan;
pub mod window;
