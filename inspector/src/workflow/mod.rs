pub mod config;
pub mod decoder;
pub mod runner;
