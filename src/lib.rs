//! # Cloudcam Library
//!
//! Internal library for the cloudcam binary application.
//!
//! This library exists to enable testing of the pipeline internals and provide
//! clean separation between CLI dispatch (main.rs) and application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: [`Cloudcam`] wires configuration, geocoding, camera and
//!   detection together and drives the tick loop
//! - **Pipeline**: `core` holds the run/stop controller, observers and the
//!   tick scheduler
//! - **Stages**: `frame` (camera sources), `detection` (cloud oracle adapter),
//!   `overlay` (mask blending and text), `geo` (geocoding and time-zone
//!   reference)
//! - **Configuration**: `config` module for TOML-based settings
//! - **Commands**: `commands` module for one-shot CLI subcommands
//! - **Infrastructure**: signal handling, logging, time source and utilities

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

// Public API modules
pub mod app;
pub mod args;
pub mod commands;
pub mod common;
pub mod config;
pub mod core;
pub mod detection;
pub mod frame;
pub mod geo;
pub mod io;
pub mod overlay;
pub mod time_source;

// Test doubles shared by unit and integration tests
#[cfg(any(test, feature = "testing-support"))]
pub mod testing;

// Re-export for binary
pub use app::Cloudcam;
