pub mod confirm;
pub mod feed;
pub mod observer;
pub mod store;
pub mod tracker;
