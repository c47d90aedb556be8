pub mod attendance;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod store;
pub mod telemetry;
pub mod utils;
