//! Trip tracking core: create trips, follow a live position feed, accumulate
//! displacement distance, and let a companion observe a trip by id.

pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod services;
pub mod state;
