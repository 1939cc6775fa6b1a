use std::convert::TryFrom;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{AppConfig, Units};
use crate::errors::FetchError;
use crate::sources::http;

const ONECALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";
const GEOCODE_URL: &str = "https://geocode.xyz/";

pub trait WeatherSource {
    /// Current conditions plus today's high and low.
    fn current(&self) -> Result<WeatherReport, FetchError>;

    /// Reverse-geocoded place name for the configured coordinates.
    fn locate(&self) -> Result<Location, FetchError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub temperature: f64,
    pub description: String,
    pub icon_code: String,
    pub high: f64,
    pub low: f64,
    pub humidity: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
}

impl Location {
    pub fn label(&self) -> String {
        let parts: Vec<&str> = [self.city.as_deref(), self.state.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            "Cannot Pinpoint Location".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// The parts of a One Call 3.0 response the panel reads.
///
/// ```json
/// {
///     "current": {
///         "temp": 81.3,
///         "humidity": 54,
///         "wind_speed": 3.6,
///         "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }]
///     },
///     "daily": [{ "temp": { "min": 70.8, "max": 84.2 } }]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct OneCallResponse {
    current: Current,
    #[serde(default)]
    daily: Vec<Daily>,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp: f64,
    humidity: f64,
    wind_speed: f64,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct Daily {
    temp: DailyTemperature,
}

#[derive(Debug, Deserialize)]
struct DailyTemperature {
    min: f64,
    max: f64,
}

impl TryFrom<OneCallResponse> for WeatherReport {
    type Error = FetchError;

    fn try_from(response: OneCallResponse) -> Result<Self, Self::Error> {
        let today = response
            .daily
            .into_iter()
            .next()
            .ok_or(FetchError::Missing("daily forecast"))?;
        let condition = response
            .current
            .weather
            .into_iter()
            .next()
            .ok_or(FetchError::Missing("current.weather"))?;

        Ok(Self {
            temperature: response.current.temp,
            description: condition.description,
            icon_code: condition.icon,
            high: today.temp.max,
            low: today.temp.min,
            humidity: response.current.humidity,
            wind_speed: response.current.wind_speed,
        })
    }
}

pub fn parse_onecall(body: &str) -> Result<WeatherReport, FetchError> {
    let response: OneCallResponse = serde_json::from_str(body)?;
    WeatherReport::try_from(response)
}

/// geocode.xyz answers `{}` instead of a string for unknown parts, and an
/// `error` object when throttled.
pub fn parse_geocode(value: &Value) -> Result<Location, FetchError> {
    if value.get("error").is_some() {
        return Err(FetchError::Missing("city and state"));
    }
    let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    Ok(Location {
        city: text("city"),
        state: text("state"),
    })
}

pub struct OpenWeatherClient {
    client: Client,
    latitude: f64,
    longitude: f64,
    units: Units,
    lang: String,
    api_token: String,
}

impl OpenWeatherClient {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        Self {
            client,
            latitude: config.latitude,
            longitude: config.longitude,
            units: config.units,
            lang: config.weather_lang.clone(),
            api_token: config.weather_api_token.clone(),
        }
    }

    fn onecall_query(&self) -> [(&'static str, String); 6] {
        [
            ("lat", self.latitude.to_string()),
            ("lon", self.longitude.to_string()),
            ("exclude", "minutely,hourly".to_string()),
            ("units", self.units.as_query().to_string()),
            ("lang", self.lang.clone()),
            ("appid", self.api_token.clone()),
        ]
    }

    fn geocode_query(&self) -> [(&'static str, String); 2] {
        [
            ("locate", format!("{},{}", self.latitude, self.longitude)),
            ("geoit", "json".to_string()),
        ]
    }
}

impl WeatherSource for OpenWeatherClient {
    fn current(&self) -> Result<WeatherReport, FetchError> {
        let body = http::get_text(&self.client, ONECALL_URL, &self.onecall_query())?;
        parse_onecall(&body)
    }

    fn locate(&self) -> Result<Location, FetchError> {
        let value: Value = http::get_json(&self.client, GEOCODE_URL, &self.geocode_query())?;
        parse_geocode(&value)
    }
}
