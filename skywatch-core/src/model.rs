use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Input parameters for one weather lookup. Immutable, built per request.
#[derive(Debug, Clone)]
pub struct WeatherQuery {
    /// City or location name. Expected to be trimmed and non-empty;
    /// the caller validates before constructing a query.
    pub city: String,
    pub include_air_quality: bool,
}

impl WeatherQuery {
    pub fn new(city: impl Into<String>) -> Self {
        Self { city: city.into(), include_air_quality: false }
    }

    pub fn with_air_quality(mut self, include: bool) -> Self {
        self.include_air_quality = include;
        self
    }
}

/// Parsed current-conditions data for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub location: Location,
    pub current: CurrentConditions,
}

/// Informational location metadata. Everything the provider may omit
/// is optional; absence is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub timezone_id: Option<String>,
    pub local_time: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: Option<f64>,
    pub temperature_f: Option<f64>,
    pub condition: Option<Condition>,
    pub wind_direction: Option<CompassPoint>,
    pub wind_speed_mph: Option<f64>,
    pub wind_speed_kph: Option<f64>,
    /// 0..=100 when present.
    pub humidity_percent: Option<u8>,
    pub visibility_miles: Option<f64>,
    pub visibility_km: Option<f64>,
    /// Present only when the query asked for air quality and the
    /// provider returned the block.
    pub air_quality: Option<AirQuality>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    /// Absolute URL; protocol-relative icons are normalized at parse time.
    pub icon_url: Option<String>,
}

/// Pollutant concentrations (µg/m³) plus the US EPA index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub co: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub so2: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub us_epa_index: Option<u8>,
}

/// One of the 16 standard wind-direction abbreviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompassPoint {
    N,
    Nne,
    Ne,
    Ene,
    E,
    Ese,
    Se,
    Sse,
    S,
    Ssw,
    Sw,
    Wsw,
    W,
    Wnw,
    Nw,
    Nnw,
}

impl CompassPoint {
    pub const fn all() -> &'static [CompassPoint] {
        use CompassPoint::*;
        &[N, Nne, Ne, Ene, E, Ese, Se, Sse, S, Ssw, Sw, Wsw, W, Wnw, Nw, Nnw]
    }

    /// Parse a provider abbreviation such as "NNE". Case-insensitive;
    /// anything outside the 16-point rose is `None`.
    pub fn from_abbreviation(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase();

        let point = match upper.as_str() {
            "N" => CompassPoint::N,
            "NNE" => CompassPoint::Nne,
            "NE" => CompassPoint::Ne,
            "ENE" => CompassPoint::Ene,
            "E" => CompassPoint::E,
            "ESE" => CompassPoint::Ese,
            "SE" => CompassPoint::Se,
            "SSE" => CompassPoint::Sse,
            "S" => CompassPoint::S,
            "SSW" => CompassPoint::Ssw,
            "SW" => CompassPoint::Sw,
            "WSW" => CompassPoint::Wsw,
            "W" => CompassPoint::W,
            "WNW" => CompassPoint::Wnw,
            "NW" => CompassPoint::Nw,
            "NNW" => CompassPoint::Nnw,
            _ => return None,
        };

        Some(point)
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            CompassPoint::N => "N",
            CompassPoint::Nne => "NNE",
            CompassPoint::Ne => "NE",
            CompassPoint::Ene => "ENE",
            CompassPoint::E => "E",
            CompassPoint::Ese => "ESE",
            CompassPoint::Se => "SE",
            CompassPoint::Sse => "SSE",
            CompassPoint::S => "S",
            CompassPoint::Ssw => "SSW",
            CompassPoint::Sw => "SW",
            CompassPoint::Wsw => "WSW",
            CompassPoint::W => "W",
            CompassPoint::Wnw => "WNW",
            CompassPoint::Nw => "NW",
            CompassPoint::Nnw => "NNW",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            CompassPoint::N => "North",
            CompassPoint::Nne => "North-Northeast",
            CompassPoint::Ne => "Northeast",
            CompassPoint::Ene => "East-Northeast",
            CompassPoint::E => "East",
            CompassPoint::Ese => "East-Southeast",
            CompassPoint::Se => "Southeast",
            CompassPoint::Sse => "South-Southeast",
            CompassPoint::S => "South",
            CompassPoint::Ssw => "South-Southwest",
            CompassPoint::Sw => "Southwest",
            CompassPoint::Wsw => "West-Southwest",
            CompassPoint::W => "West",
            CompassPoint::Wnw => "West-Northwest",
            CompassPoint::Nw => "Northwest",
            CompassPoint::Nnw => "North-Northwest",
        }
    }
}

/// Display helper for an optional wind direction; unknown directions
/// render as "N/A".
pub fn wind_direction_name(direction: Option<CompassPoint>) -> &'static str {
    direction.map_or("N/A", |d| d.full_name())
}

/// Lifecycle of the latest query, published whole by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    Idle,
    Loading { city: String },
    Success { result: WeatherResult },
    Failed { kind: ErrorKind, message: String },
}

impl QueryState {
    /// True once a submitted query has finished, either way.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryState::Success { .. } | QueryState::Failed { .. })
    }
}
