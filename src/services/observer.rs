use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{
    sync::watch,
    task::JoinHandle,
};
use tracing::{info, warn};

use crate::{
    error::AppError,
    models::trip::{Position, TripStatus},
    services::store::TripStore,
};

/// Snapshot of a trip as seen by a passive watcher.
#[derive(Debug, Clone, PartialEq)]
pub enum TripView {
    NotFound,
    Found {
        destination: String,
        status: TripStatus,
        last_location: Option<Position>,
        distance_km: f64,
    },
}

/// Passive companion-side poller: re-reads a trip from the store on a fixed
/// interval and publishes the latest snapshot through a watch channel. Each
/// watched trip has its own cancellable poll; re-watching an id replaces that
/// trip's poll only.
#[derive(Clone)]
pub struct TripObserver {
    inner: Arc<ObserverInner>,
}

struct ObserverInner {
    store: TripStore,
    poll_interval: Duration,
    polls: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TripObserver {
    pub fn new(store: TripStore, poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(ObserverInner {
                store,
                poll_interval,
                polls: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Starts polling the trip and returns a receiver that always holds the
    /// most recent snapshot. The first read happens before this returns, so
    /// the receiver never starts empty.
    pub async fn watch(&self, trip_id: &str) -> Result<watch::Receiver<TripView>, AppError> {
        let initial = read_view(&self.inner.store, trip_id).await?;
        let (tx, rx) = watch::channel(initial);

        let store = self.inner.store.clone();
        let id = trip_id.to_string();
        let poll_interval = self.inner.poll_interval;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            // The immediate first tick duplicates the read done above.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match read_view(&store, &id).await {
                    Ok(view) => {
                        if tx.send(view).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("poll of trip {id} failed: {err}"),
                }
            }
        });

        let previous = self.lock_polls().insert(trip_id.to_string(), task);
        if let Some(previous) = previous {
            previous.abort();
        }
        info!("watching trip {trip_id}");
        Ok(rx)
    }

    /// Cancels the poll for this trip, if one is running.
    pub fn unwatch(&self, trip_id: &str) {
        if let Some(task) = self.lock_polls().remove(trip_id) {
            task.abort();
            info!("stopped watching trip {trip_id}");
        }
    }

    pub fn is_watching(&self, trip_id: &str) -> bool {
        self.lock_polls()
            .get(trip_id)
            .is_some_and(|task| !task.is_finished())
    }

    fn lock_polls(&self) -> std::sync::MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.inner
            .polls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ObserverInner {
    fn drop(&mut self) {
        if let Ok(polls) = self.polls.get_mut() {
            for task in polls.values() {
                task.abort();
            }
        }
    }
}

async fn read_view(store: &TripStore, trip_id: &str) -> Result<TripView, AppError> {
    Ok(match store.get_trip(trip_id).await? {
        Some(trip) => TripView::Found {
            destination: trip.destination,
            status: trip.status,
            last_location: trip.last_location,
            distance_km: trip.distance_km,
        },
        None => TripView::NotFound,
    })
}
