use std::time::Duration;

use axum::Json;
use floodnet_models::v0::WeatherSummary;
use floodnet_result::{create_error, Result};
use iso8601_timestamp::Timestamp;
use lazy_static::lazy_static;
use serde::Deserialize;

lazy_static! {
    static ref CLIENT: reqwest::Client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .expect("reqwest Client");
}

#[derive(Deserialize)]
struct CurrentConditions {
    main: ConditionsMain,
    weather: Vec<ConditionsWeather>,
}

#[derive(Deserialize)]
struct ConditionsMain {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct ConditionsWeather {
    main: String,
}

#[derive(Deserialize)]
struct Forecast {
    list: Vec<ForecastBlock>,
}

/// One three-hour forecast block
#[derive(Deserialize)]
struct ForecastBlock {
    #[serde(default)]
    pop: f64,
    rain: Option<ForecastRain>,
}

#[derive(Deserialize)]
struct ForecastRain {
    #[serde(rename = "3h", default)]
    volume: f64,
}

async fn fetch<T: serde::de::DeserializeOwned>(url: &str) -> Result<T> {
    let response = CLIENT
        .get(url)
        .send()
        .await
        .map_err(|_| create_error!(WeatherUnavailable))?;

    if !response.status().is_success() {
        tracing::error!("weather upstream answered {}", response.status());
        return Err(create_error!(WeatherUnavailable));
    }

    response
        .json()
        .await
        .map_err(|_| create_error!(WeatherUnavailable))
}

async fn build_summary() -> Result<WeatherSummary> {
    let config = floodnet_config::config().await;
    let weather = &config.weather;

    // Current conditions come from a physical station, the forecast
    // determines the next 24 hours of rain; fetch both concurrently
    let current_url = format!(
        "{}/weather?lat={}&lon={}&appid={}&units=metric",
        weather.endpoint, weather.latitude, weather.longitude, weather.api_key
    );
    let forecast_url = format!(
        "{}/forecast?lat={}&lon={}&appid={}&units=metric",
        weather.endpoint, weather.latitude, weather.longitude, weather.api_key
    );

    let (current, forecast) = futures::try_join!(
        fetch::<CurrentConditions>(&current_url),
        fetch::<Forecast>(&forecast_url)
    )?;

    // Eight three-hour blocks cover the next 24 hours
    let next_24h = &forecast.list[..forecast.list.len().min(8)];

    let rain_volume: f64 = next_24h
        .iter()
        .filter_map(|block| block.rain.as_ref())
        .map(|rain| rain.volume)
        .sum();
    let max_pop = next_24h.iter().map(|block| block.pop).fold(0.0, f64::max);

    let raining_now = current
        .weather
        .first()
        .map(|conditions| conditions.main == "Rain")
        .unwrap_or(false)
        || rain_volume > 0.5;

    Ok(WeatherSummary {
        rain_24h: (rain_volume * 10.0).round() / 10.0,
        rain_chance: (max_pop * 100.0).round() as u8,
        temp: current.main.temp.round() as i32,
        humidity: current.main.humidity.round() as u8,
        current: if raining_now {
            "Precipitation".to_string()
        } else {
            "Dry Conditions".to_string()
        },
        last_updated: Timestamp::now_utc(),
    })
}

/// Weather context
///
/// 24-hour rain outlook and current conditions for the monitored
/// city. Never fails: when the upstream network is down a degraded
/// all-zero payload flagged "Unavailable" is served instead.
#[utoipa::path(
    get,
    path = "/weather",
    responses(
        (status = 200, description = "Rain context", body = WeatherSummary)
    )
)]
pub async fn weather() -> Json<WeatherSummary> {
    match build_summary().await {
        Ok(summary) => Json(summary),
        Err(error) => {
            tracing::error!("weather fetch failed: {error:?}");
            Json(WeatherSummary::unavailable())
        }
    }
}
