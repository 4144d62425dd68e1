use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use skywatch_core::{
    AirQuality, Config, ErrorKind, QueryController, QueryState, WeatherApiClient, WeatherResult,
    wind_direction_name,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skywatch", version, about = "Current weather conditions lookup")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store your weatherapi.com API key.
    Configure,

    /// Show current conditions for a city.
    Current {
        /// City or location name.
        city: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Current { city } => current(&city).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    if config.is_configured() {
        println!("An API key is already configured; entering a new one replaces it.");
    }

    let key = inquire::Password::new("weatherapi.com API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if key.trim().is_empty() {
        bail!("API key must not be blank");
    }

    config.set_api_key(key.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn current(city: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = WeatherApiClient::new(config.client_config()?)?;

    log::debug!("looking up current conditions for '{}'", city.trim());

    let controller = QueryController::new(Arc::new(client));
    let mut rx = controller.subscribe();

    controller.submit(city).map_err(|_| anyhow!("Please enter a city name."))?;

    let state = rx.wait_for(QueryState::is_terminal).await?.clone();

    match state {
        QueryState::Success { result } => {
            render(&result);
            Ok(())
        }
        QueryState::Failed { kind: ErrorKind::Connectivity, .. } => bail!(
            "Unable to connect to the network. \
             Please make sure you're connected to the Internet."
        ),
        QueryState::Failed { .. } => bail!(
            "Unable to find weather for \"{}\". \
             Make sure you're entering the correct city.",
            city.trim()
        ),
        // `wait_for(is_terminal)` only returns terminal states.
        other => bail!("unexpected query state: {other:?}"),
    }
}

fn render(result: &WeatherResult) {
    let loc = &result.location;
    let place: Vec<&str> = [&loc.name, &loc.region, &loc.country]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .collect();

    println!("{}", place.join(", "));
    println!("Timezone:    {}", loc.timezone_id.as_deref().unwrap_or("N/A"));
    println!("Local time:  {}", loc.local_time.as_deref().unwrap_or("N/A"));

    let cur = &result.current;
    println!(
        "Temperature: {} °C ({} °F)",
        fmt_num(cur.temperature_c),
        fmt_num(cur.temperature_f)
    );

    if let Some(condition) = &cur.condition {
        println!("Condition:   {}", condition.text);
    }

    println!(
        "Wind:        {}, {} mph ({} kph)",
        wind_direction_name(cur.wind_direction),
        fmt_num(cur.wind_speed_mph),
        fmt_num(cur.wind_speed_kph)
    );
    println!(
        "Humidity:    {}",
        cur.humidity_percent.map_or_else(|| "N/A".to_string(), |h| format!("{h}%"))
    );
    println!(
        "Visibility:  {} miles ({} km)",
        fmt_num(cur.visibility_miles),
        fmt_num(cur.visibility_km)
    );

    if let Some(aq) = &cur.air_quality {
        println!("Air quality: {}", fmt_air_quality(aq));
    }
}

fn fmt_num(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.1}"))
}

fn fmt_air_quality(aq: &AirQuality) -> String {
    let mut parts = Vec::new();

    if let Some(pm2_5) = aq.pm2_5 {
        parts.push(format!("PM2.5 {pm2_5:.1}"));
    }
    if let Some(pm10) = aq.pm10 {
        parts.push(format!("PM10 {pm10:.1}"));
    }
    if let Some(o3) = aq.o3 {
        parts.push(format!("O3 {o3:.1}"));
    }
    if let Some(no2) = aq.no2 {
        parts.push(format!("NO2 {no2:.1}"));
    }
    if let Some(index) = aq.us_epa_index {
        parts.push(format!("US EPA index {index}"));
    }

    if parts.is_empty() { "N/A".to_string() } else { parts.join(", ") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skywatch_core::{CompassPoint, Condition, CurrentConditions, Location};

    #[test]
    fn fmt_num_falls_back_to_na() {
        assert_eq!(fmt_num(Some(21.5)), "21.5");
        assert_eq!(fmt_num(None), "N/A");
    }

    #[test]
    fn air_quality_line_lists_present_pollutants_only() {
        let aq = AirQuality {
            co: None,
            no2: None,
            o3: Some(61.5),
            so2: None,
            pm2_5: Some(12.0),
            pm10: None,
            us_epa_index: Some(2),
        };

        assert_eq!(fmt_air_quality(&aq), "PM2.5 12.0, O3 61.5, US EPA index 2");
    }

    #[test]
    fn render_handles_sparse_results() {
        // Must not panic with nearly everything absent.
        render(&WeatherResult {
            location: Location {
                name: Some("Paris".into()),
                region: None,
                country: None,
                timezone_id: None,
                local_time: None,
                latitude: None,
                longitude: None,
            },
            current: CurrentConditions {
                temperature_c: Some(21.5),
                temperature_f: None,
                condition: Some(Condition { text: "Clear".into(), icon_url: None }),
                wind_direction: Some(CompassPoint::Ne),
                wind_speed_mph: None,
                wind_speed_kph: None,
                humidity_percent: None,
                visibility_miles: None,
                visibility_km: None,
                air_quality: None,
            },
        });
    }
}
