//! Data format and configuration shared by every classifier.

pub mod cdf;
pub mod config;
