pub mod bench;
pub mod classify;
pub mod config;
pub mod validate;
