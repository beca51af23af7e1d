//! proxydeck - a terminal console for a session-management proxy
//!
//! This library exposes modules for use in integration tests.

pub mod app;
pub mod cli;
pub mod client;
pub mod error;
pub mod idle;
pub mod models;
pub mod overlay;
pub mod poller;
pub mod state;
pub mod ui;
