use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo;

/// A coordinate sample in degrees, as delivered by the position feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripStatus {
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "tracking")]
    Tracking,
    #[serde(rename = "completed")]
    Completed,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::InProgress => "in-progress",
            TripStatus::Tracking => "tracking",
            TripStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub trip_id: String,
    pub destination: String,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_location: Option<Position>,
    #[serde(default)]
    pub last_location: Option<Position>,
    /// Displacement from `start_location` to the latest sample, NOT the
    /// accumulated path length. Zero until the first sample arrives.
    #[serde(rename = "distance", default)]
    pub distance_km: f64,
}

impl Trip {
    pub fn new(trip_id: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            trip_id: trip_id.into(),
            destination: destination.into(),
            status: TripStatus::InProgress,
            created_at: Utc::now(),
            completed_at: None,
            start_location: None,
            last_location: None,
            distance_km: 0.0,
        }
    }

    /// Folds one position sample into the trip: the first sample becomes the
    /// start location, every sample becomes the last location, and the
    /// distance is recomputed from the start to this sample.
    pub fn apply_sample(&mut self, sample: Position) {
        let start = *self.start_location.get_or_insert(sample);
        self.last_location = Some(sample);
        self.distance_km = round_km(geo::haversine_km(start, sample));
    }
}

// Distances are surfaced in kilometers with two decimals.
fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trip_starts_in_progress_with_no_locations() {
        let trip = Trip::new("T1", "Paris");
        assert_eq!(trip.status, TripStatus::InProgress);
        assert_eq!(trip.distance_km, 0.0);
        assert!(trip.start_location.is_none());
        assert!(trip.last_location.is_none());
    }

    #[test]
    fn first_sample_pins_the_start_location() {
        let mut trip = Trip::new("T1", "Paris");
        let first = Position::new(48.8566, 2.3522);
        let second = Position::new(48.9000, 2.4000);

        trip.apply_sample(first);
        assert_eq!(trip.start_location, Some(first));
        assert_eq!(trip.last_location, Some(first));
        assert_eq!(trip.distance_km, 0.0);

        trip.apply_sample(second);
        assert_eq!(trip.start_location, Some(first));
        assert_eq!(trip.last_location, Some(second));
        let expected = round_km(crate::geo::haversine_km(first, second));
        assert_eq!(trip.distance_km, expected);
    }

    #[test]
    fn distance_is_displacement_not_path_length() {
        let mut trip = Trip::new("T1", "Loop");
        let home = Position::new(0.0, 0.0);
        trip.apply_sample(home);
        trip.apply_sample(Position::new(0.0, 1.0));
        // Returning home collapses the distance even though the path was long.
        trip.apply_sample(home);
        assert_eq!(trip.distance_km, 0.0);
    }

    #[test]
    fn status_round_trips_through_its_wire_names() {
        for status in [
            TripStatus::InProgress,
            TripStatus::Tracking,
            TripStatus::Completed,
        ] {
            let json = serde_json::to_string(&status).expect("serialize");
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
