//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the playback and autoplay crates:
//! - Logging and tracing infrastructure
//! - Event bus mirroring playback and autoplay notifications
//!
//! ## Overview
//!
//! Other workspace crates depend on this one for their logging conventions and
//! for the broadcast channel that hosts subscribe to when they want a single
//! stream of everything the coordinators report.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
