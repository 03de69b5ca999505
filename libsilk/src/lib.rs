//! This is a library for collecting points of interest along the Green Silk Road: importing them
//! from CSV files, checking user input, storing them in a database and keeping the markers of a
//! map view in line with what has been stored.

pub mod catalog;
pub mod contribute;
pub mod database;
pub mod error;
pub mod ingest;
pub mod markers;
pub mod record;
pub mod session;
pub mod store;
pub mod user;
pub mod validate;

pub use error::Error;
pub use error::Result;
pub use record::{GeoRecord, LngLat, RecordId, UserId};
pub use store::RecordStore;
