//! Command-line command handlers for cloudcam.
//!
//! One-shot commands that run instead of the camera pipeline. Each command
//! lives in its own submodule.

pub mod geo;
pub mod help;
