pub mod acis;
pub mod cache;
pub mod error;
pub mod guess;
pub mod observation;
pub mod season;
pub mod station;
