//! [`Playable`] for the playback coordinator, so a feed cell can hand its
//! player straight to autoplay.

use core_playback::PlaybackCoordinator;
use tracing::warn;

use crate::traits::Playable;

impl Playable for PlaybackCoordinator {
    fn is_playing(&self) -> bool {
        self.status().is_playing()
    }

    /// Plays at the coordinator's configured default rate.
    fn play(&self) {
        if let Err(e) = PlaybackCoordinator::play(self, self.config().default_rate) {
            warn!(error = %e, "Autoplay could not start playback");
        }
    }

    fn pause(&self) {
        if let Err(e) = PlaybackCoordinator::pause(self) {
            warn!(error = %e, "Autoplay could not pause playback");
        }
    }
}
