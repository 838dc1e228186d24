//! Bootstrap helpers for starting the `FairyDeco` server

pub mod config;

pub use config::load_config;
