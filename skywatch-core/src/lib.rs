//! Core library for the `skywatch` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weatherapi.com current-conditions client
//! - The query controller publishing Idle/Loading/Success/Failed state
//! - Shared domain models and the error taxonomy
//!
//! It is used by `skywatch-cli`, but can also be reused by other
//! frontends subscribing to the same state container.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;

pub use client::{ProvideWeather, WeatherApiClient};
pub use config::{ClientConfig, Config};
pub use controller::QueryController;
pub use error::{ConfigError, ErrorKind, FetchError, ValidationError};
pub use model::{
    AirQuality, CompassPoint, Condition, CurrentConditions, Location, QueryState, WeatherQuery,
    WeatherResult, wind_direction_name,
};
