use async_trait::async_trait;
use log::{debug, trace, warn};
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::{
    config::ClientConfig,
    error::{ConfigError, FetchError},
    model::{AirQuality, CompassPoint, Condition, CurrentConditions, Location, WeatherQuery, WeatherResult},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Seam between the controller and the network. Lets tests drive the
/// controller with stub providers.
#[async_trait]
pub trait ProvideWeather: Send + Sync + Debug {
    /// Fetch current conditions for one query. Single attempt, no retry.
    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherResult, FetchError>;
}

/// Client for the weatherapi.com `current.json` endpoint.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiClient {
    /// Build a client, validating the credential up front. A missing
    /// key fails here, before any request is attempted.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { api_key: config.api_key, base_url: config.base_url, http })
    }
}

#[async_trait]
impl ProvideWeather for WeatherApiClient {
    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherResult, FetchError> {
        let url = format!("{}/current.json", self.base_url.trim_end_matches('/'));
        let aqi = if query.include_air_quality { "yes" } else { "no" };

        debug!("GET {url} q={} aqi={aqi}", query.city);

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", query.city.as_str()), ("aqi", aqi)])
            .send()
            .await
            .map_err(classify_transport)?;

        let status = res.status();
        let body = res.text().await.map_err(classify_transport)?;

        trace!("weatherapi response {status}: {}", truncate_body(&body));

        if !status.is_success() {
            warn!("weatherapi current request failed with status {status}");
            return Err(FetchError::Response);
        }

        parse_body(&body)
    }
}

/// Parse a 2xx `current.json` body. The top-level shape (`location` +
/// `current`) is required; every leaf field the provider may omit maps
/// to `None` instead of failing.
fn parse_body(body: &str) -> Result<WeatherResult, FetchError> {
    let parsed: WaResponse = serde_json::from_str(body).map_err(|e| {
        warn!("failed to parse weatherapi current JSON: {e}");
        FetchError::Response
    })?;

    Ok(parsed.into_result())
}

/// Classify a transport failure once, here at the boundary.
fn classify_transport(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout;
    }

    let detail = error_chain_text(&err);
    if is_host_resolution_failure(&detail) {
        FetchError::HostUnresolved(detail)
    } else {
        FetchError::Transport(detail)
    }
}

/// Flatten an error and its sources into one searchable string.
fn error_chain_text(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();

    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }

    parts.join(": ")
}

/// Host-resolution indicators across the resolvers we may sit on.
fn is_host_resolution_failure(detail: &str) -> bool {
    const MARKERS: &[&str] = &[
        "dns error",
        "failed to lookup address",
        "name or service not known",
        "nodename nor servname",
        "no such host",
        "unable to resolve",
    ];

    let lower = detail.to_lowercase();
    MARKERS.iter().any(|m| lower.contains(m))
}

fn truncate_body(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    match body.char_indices().nth(MAX_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: Option<String>,
    region: Option<String>,
    country: Option<String>,
    tz_id: Option<String>,
    localtime: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: Option<f64>,
    temp_f: Option<f64>,
    condition: Option<WaCondition>,
    wind_mph: Option<f64>,
    wind_kph: Option<f64>,
    wind_dir: Option<String>,
    humidity: Option<u8>,
    vis_miles: Option<f64>,
    vis_km: Option<f64>,
    air_quality: Option<WaAirQuality>,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaAirQuality {
    co: Option<f64>,
    no2: Option<f64>,
    o3: Option<f64>,
    so2: Option<f64>,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    #[serde(rename = "us-epa-index")]
    us_epa_index: Option<u8>,
}

impl WaResponse {
    fn into_result(self) -> WeatherResult {
        let location = Location {
            name: self.location.name,
            region: self.location.region,
            country: self.location.country,
            timezone_id: self.location.tz_id,
            local_time: self.location.localtime,
            latitude: self.location.lat,
            longitude: self.location.lon,
        };

        let wind_direction =
            self.current.wind_dir.as_deref().and_then(CompassPoint::from_abbreviation);

        let condition = self.current.condition.map(|c| Condition {
            text: c.text.unwrap_or_default(),
            icon_url: c.icon.map(|i| normalize_icon_url(&i)),
        });

        let air_quality = self.current.air_quality.map(|aq| AirQuality {
            co: aq.co,
            no2: aq.no2,
            o3: aq.o3,
            so2: aq.so2,
            pm2_5: aq.pm2_5,
            pm10: aq.pm10,
            us_epa_index: aq.us_epa_index,
        });

        WeatherResult {
            location,
            current: CurrentConditions {
                temperature_c: self.current.temp_c,
                temperature_f: self.current.temp_f,
                condition,
                wind_direction,
                wind_speed_mph: self.current.wind_mph,
                wind_speed_kph: self.current.wind_kph,
                // Out-of-range humidity is provider garbage; drop it.
                humidity_percent: self.current.humidity.filter(|h| *h <= 100),
                visibility_miles: self.current.vis_miles,
                visibility_km: self.current.vis_km,
                air_quality,
            },
        }
    }
}

/// The provider serves protocol-relative icon paths like
/// `//cdn.weatherapi.com/...`; pin them to https.
fn normalize_icon_url(icon: &str) -> String {
    if icon.starts_with("//") { format!("https:{icon}") } else { icon.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::wind_direction_name;

    const SAMPLE_BODY: &str = r#"{
        "location": {
            "name": "Paris",
            "region": "Ile-de-France",
            "country": "France",
            "tz_id": "Europe/Paris",
            "localtime": "2024-05-02 14:30",
            "lat": 48.87,
            "lon": 2.33
        },
        "current": {
            "temp_c": 21.5,
            "temp_f": 70.7,
            "condition": { "text": "Clear", "icon": "//x/icon.png" },
            "wind_dir": "NE",
            "wind_mph": 6.9,
            "wind_kph": 11.2,
            "humidity": 54,
            "vis_miles": 6.0,
            "vis_km": 9.7
        }
    }"#;

    #[test]
    fn parses_sample_current_response() {
        let result = parse_body(SAMPLE_BODY).expect("sample body must parse");

        assert_eq!(result.location.name.as_deref(), Some("Paris"));
        assert_eq!(result.location.timezone_id.as_deref(), Some("Europe/Paris"));
        assert_eq!(result.current.temperature_c, Some(21.5));
        assert_eq!(result.current.humidity_percent, Some(54));
        assert_eq!(result.current.wind_direction, Some(CompassPoint::Ne));
        assert_eq!(wind_direction_name(result.current.wind_direction), "Northeast");

        let condition = result.current.condition.expect("condition present");
        assert_eq!(condition.text, "Clear");
        assert_eq!(condition.icon_url.as_deref(), Some("https://x/icon.png"));
    }

    #[test]
    fn missing_leaf_fields_become_none() {
        let body = r#"{
            "location": { "name": "Paris" },
            "current": { "temp_c": 3.0, "wind_dir": "XQZ" }
        }"#;

        let result = parse_body(body).expect("partial body must parse");
        assert_eq!(result.location.region, None);
        assert_eq!(result.current.temperature_f, None);
        assert_eq!(result.current.condition, None);
        // Unknown direction is dropped, not an error.
        assert_eq!(result.current.wind_direction, None);
        assert_eq!(result.current.air_quality, None);
    }

    #[test]
    fn out_of_range_humidity_becomes_none() {
        let body = r#"{
            "location": { "name": "Paris" },
            "current": { "temp_c": 3.0, "humidity": 150 }
        }"#;

        let result = parse_body(body).expect("body must parse");
        assert_eq!(result.current.humidity_percent, None);
    }

    #[test]
    fn missing_current_object_is_a_response_error() {
        let body = r#"{ "location": { "name": "Paris" } }"#;
        let err = parse_body(body).unwrap_err();

        assert!(matches!(err, FetchError::Response));
        assert_eq!(err.to_string(), "Data Processing Error");
    }

    #[test]
    fn unparseable_body_is_a_response_error() {
        assert!(matches!(parse_body("not json"), Err(FetchError::Response)));
    }

    #[test]
    fn air_quality_block_is_parsed_when_present() {
        let body = r#"{
            "location": { "name": "Delhi" },
            "current": {
                "temp_c": 31.0,
                "air_quality": {
                    "co": 600.1, "pm2_5": 82.3, "pm10": 120.0,
                    "us-epa-index": 4
                }
            }
        }"#;

        let result = parse_body(body).expect("body must parse");
        let aq = result.current.air_quality.expect("air quality present");
        assert_eq!(aq.pm2_5, Some(82.3));
        assert_eq!(aq.us_epa_index, Some(4));
        assert_eq!(aq.no2, None);
    }

    #[test]
    fn host_resolution_markers_are_recognized() {
        assert!(is_host_resolution_failure(
            "error sending request: dns error: failed to lookup address information"
        ));
        assert!(is_host_resolution_failure("Name or service not known"));
        assert!(is_host_resolution_failure("Unable to resolve host api.weatherapi.com"));
        assert!(!is_host_resolution_failure("connection reset by peer"));
        assert!(!is_host_resolution_failure("tls handshake eof"));
    }

    #[test]
    fn blank_api_key_fails_before_any_request() {
        let config = ClientConfig {
            api_key: "  ".into(),
            base_url: crate::config::DEFAULT_BASE_URL.into(),
        };

        let err = WeatherApiClient::new(config).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn truncates_long_bodies_for_logs() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert!(truncated.len() < long.len());
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn truncation_respects_multibyte_characters() {
        // A multi-byte character straddling the cutoff must not split.
        let body = format!("{}é{}", "x".repeat(199), "y".repeat(100));
        let truncated = truncate_body(&body);

        assert!(truncated.ends_with("..."));
        assert!(truncated.contains('é'));

        let all_multibyte = "é".repeat(300);
        assert!(truncate_body(&all_multibyte).ends_with("..."));
    }
}
