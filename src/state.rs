use std::sync::Arc;

use crate::{
    config::AppConfig,
    services::{
        confirm::ConfirmPrompt, feed::PositionFeed, observer::TripObserver, store::TripStore,
        tracker::TripTracker,
    },
};

/// Composition root: wires the store, tracker, and observer together around
/// the host-supplied position feed and confirmation prompt.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: TripStore,
    pub tracker: TripTracker,
    pub observer: TripObserver,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        feed: Arc<dyn PositionFeed>,
        confirm: Arc<dyn ConfirmPrompt>,
    ) -> Self {
        let store = TripStore::new(config.data_dir.clone());
        let tracker = TripTracker::new(store.clone(), feed, confirm);
        let observer = TripObserver::new(store.clone(), config.poll_interval);
        Self {
            config,
            store,
            tracker,
            observer,
        }
    }
}
