//! Weather forecast domain modules.
//!
//! - `geocoding`: query -> location cache in front of the geocoding provider.
//! - `time_window`: timezone-aware instants for a day range and resolution.
//! - `forecast`: positional provider payload -> date/time-indexed model.
//! - `render`: console tables for summary and detailed views.
//! - `service`: command orchestration with explicit dependencies.

pub mod config;
pub mod error;
pub mod forecast;
pub mod geocoding;
pub mod model;
pub mod providers;
pub mod render;
pub mod service;
pub mod store;
pub mod time_window;
pub mod weather_code;
