//! TinyTunes API server library
//!
//! Exposes the cache, cli, data, and server modules for use in integration
//! tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod server;
