//! Historical analysis and planning arithmetic.
//!
//! Risk bucketing, compound-growth projection, the shared statistics helpers,
//! and the historical trend report built from the crowd, incident and weather
//! CSVs.

pub mod history;
pub mod projection;
pub mod risk;
pub mod trends;
pub mod types;
pub mod utility;
