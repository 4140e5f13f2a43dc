//! Weather collector and dashboard sharing one SQLite store.
//!
//! - `init-db`  creates the schema and seeds the two fixed sensors
//! - `collect`  polls the weather API on a fixed interval and appends readings
//! - `serve`    renders the last six days as an HTML dashboard
//!
//! The three never call each other; the `leituras` table is the only channel.

pub mod chart;
pub mod collector;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod gate;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;
pub mod upstream;

pub use config::{CollectorConfig, DashboardConfig, StoreConfig};
pub use error::{CollectError, ConfigError};
pub use models::{CycleRecord, DashboardRow, TemperatureStatus, WeatherObservation};
