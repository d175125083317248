use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::{MediaEngine, MediaSource, ObserverToken, SignalCallback, TimeCallback, TimeRange};
use mockall::mock;
use std::time::Duration;

mock! {
    pub Engine {}

    #[async_trait]
    impl MediaEngine for Engine {
        async fn load(&self, source: &MediaSource) -> Result<()>;
        fn cancel_loading(&self);
        fn unload(&self);
        fn set_rate(&self, rate: f32);
        fn pause(&self);
        fn rate(&self) -> f32;
        async fn seek(
            &self,
            position: Duration,
            tolerance_before: Duration,
            tolerance_after: Duration,
        ) -> bool;
        fn cancel_pending_seeks(&self);
        fn current_time(&self) -> f64;
        fn duration(&self) -> f64;
        fn loaded_time_ranges(&self) -> Vec<TimeRange>;
        fn add_signal_observer(&self, callback: SignalCallback) -> ObserverToken;
        fn add_periodic_time_observer(&self, interval: Duration, callback: TimeCallback) -> ObserverToken;
        fn add_boundary_time_observer(&self, times: Vec<Duration>, callback: TimeCallback) -> ObserverToken;
        fn remove_observer(&self, token: ObserverToken);
    }
}
