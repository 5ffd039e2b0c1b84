use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    models::{
        feedback::Feedback,
        trip::{Trip, TripStatus},
    },
    services::{confirm::ConfirmPrompt, feed::PositionFeed, store::TripStore},
};

/// What `stop_tracking` did. Unknown ids and declined confirmations are
/// outcomes, not errors: the store is left untouched either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    Declined,
    NotFound,
}

/// Trip lifecycle manager: creates trips, runs one sample loop per tracked
/// trip, and mediates between the position feed and the store.
#[derive(Clone)]
pub struct TripTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    store: TripStore,
    feed: Arc<dyn PositionFeed>,
    confirm: Arc<dyn ConfirmPrompt>,
    // One cancellable subscription per trip id.
    subscriptions: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TripTracker {
    pub fn new(
        store: TripStore,
        feed: Arc<dyn PositionFeed>,
        confirm: Arc<dyn ConfirmPrompt>,
    ) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                store,
                feed,
                confirm,
                subscriptions: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Creates a trip in `in-progress` with no locations and zero distance.
    /// Blank ids or destinations are rejected, as are duplicate ids.
    pub async fn create(&self, trip_id: &str, destination: &str) -> Result<Trip, AppError> {
        let trip_id = trip_id.trim();
        let destination = destination.trim();
        if trip_id.is_empty() || destination.is_empty() {
            return Err(AppError::Validation(
                "trip id and destination are required".into(),
            ));
        }
        if self.inner.store.get_trip(trip_id).await?.is_some() {
            return Err(AppError::Validation(format!(
                "trip {trip_id} already exists"
            )));
        }

        let trip = self
            .inner
            .store
            .insert_trip(Trip::new(trip_id, destination))
            .await?;
        info!("created trip {trip_id} to {destination}");
        Ok(trip)
    }

    /// Moves the trip to `tracking` and spawns its sample loop: every sample
    /// pins the start location if unset, overwrites the last location, and
    /// recomputes the displacement distance, persisting after each one.
    /// Starting again for a trip that is already tracked replaces its
    /// subscription.
    pub async fn start_tracking(&self, trip_id: &str) -> Result<(), AppError> {
        if self.inner.store.get_trip(trip_id).await?.is_none() {
            return Err(AppError::NotFound(trip_id.to_string()));
        }

        let mut samples = self.inner.feed.subscribe().await?;
        self.inner
            .store
            .update_trip(trip_id, |trip| trip.status = TripStatus::Tracking)
            .await?;

        let store = self.inner.store.clone();
        let id = trip_id.to_string();
        let task = tokio::spawn(async move {
            while let Some(sample) = samples.recv().await {
                match store.update_trip(&id, |trip| trip.apply_sample(sample)).await {
                    Ok(trip) => debug!(
                        "trip {id} at {:.4},{:.4}, {} km from start",
                        sample.lat, sample.lng, trip.distance_km
                    ),
                    Err(err) => warn!("dropping sample for trip {id}: {err}"),
                }
            }
        });

        let previous = self
            .lock_subscriptions()
            .insert(trip_id.to_string(), task);
        if let Some(previous) = previous {
            previous.abort();
        }
        info!("tracking started for trip {trip_id}");
        Ok(())
    }

    /// Completes the trip after confirmation. A trip that never entered
    /// `tracking` may still be stopped; it goes straight to `completed`.
    pub async fn stop_tracking(&self, trip_id: &str) -> Result<StopOutcome, AppError> {
        if self.inner.store.get_trip(trip_id).await?.is_none() {
            return Ok(StopOutcome::NotFound);
        }

        let message = format!("Are you sure you want to stop trip {trip_id}?");
        if !self.inner.confirm.confirm(&message) {
            info!("stop of trip {trip_id} declined");
            return Ok(StopOutcome::Declined);
        }

        if let Some(task) = self.lock_subscriptions().remove(trip_id) {
            task.abort();
        }
        self.inner
            .store
            .update_trip(trip_id, |trip| {
                trip.status = TripStatus::Completed;
                trip.completed_at = Some(Utc::now());
            })
            .await?;
        info!("trip {trip_id} completed");
        Ok(StopOutcome::Stopped)
    }

    pub fn is_tracking(&self, trip_id: &str) -> bool {
        self.lock_subscriptions()
            .get(trip_id)
            .is_some_and(|task| !task.is_finished())
    }

    pub async fn list_trips(&self) -> Result<Vec<Trip>, AppError> {
        self.inner.store.load_trips().await
    }

    /// Appends a feedback note. Blank text is rejected with the same
    /// validation error used at trip creation.
    pub async fn submit_feedback(&self, text: &str) -> Result<Feedback, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("feedback text is required".into()));
        }
        self.inner.store.append_feedback(Feedback::new(text)).await
    }

    pub async fn list_feedbacks(&self) -> Result<Vec<Feedback>, AppError> {
        self.inner.store.load_feedbacks().await
    }

    fn lock_subscriptions(&self) -> std::sync::MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for TrackerInner {
    fn drop(&mut self) {
        if let Ok(subscriptions) = self.subscriptions.get_mut() {
            for task in subscriptions.values() {
                task.abort();
            }
        }
    }
}
