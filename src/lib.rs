//! Workspace facade crate.
//!
//! Re-exports the playback and autoplay cores behind feature flags so host
//! applications can depend on `feedplay-workspace` alone.
//!
//! | Feature    | Crate           |
//! |------------|-----------------|
//! | `playback` | `core-playback` |
//! | `autoplay` | `core-autoplay` (implies `playback`) |

#[cfg(feature = "playback")]
pub use core_playback as playback;

#[cfg(feature = "autoplay")]
pub use core_autoplay as autoplay;
