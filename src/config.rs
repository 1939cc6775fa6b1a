use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;

use crate::display::tca9548a::TCA9548A_ADDRESS;
use crate::locale::{self, ClockStyle};
use crate::panel_factory::PanelFactory;

const ENV_PREFIX: &str = "MIRROR_DISPLAY_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Terminal,
    Oled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Imperial,
    Metric,
    Standard,
}

impl Units {
    /// Value of the OpenWeatherMap `units` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            Units::Imperial => "imperial",
            Units::Metric => "metric",
            Units::Standard => "standard",
        }
    }

    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric | Units::Standard => "m/s",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub output: OutputKind,
    pub panels: Vec<String>,
    pub locale: String,
    pub time_format: u8,
    pub date_format: String,
    pub units: Units,
    pub weather_lang: String,
    pub latitude: f64,
    pub longitude: f64,
    pub weather_api_token: String,
    pub news_country_code: String,
    pub news_lang: String,
    pub news_feed_url: Option<String>,
    pub markets_feed_url: String,
    pub clock_interval_ms: u64,
    pub weather_interval_secs: u64,
    pub news_interval_secs: u64,
    pub markets_interval_secs: u64,
    pub http_timeout_secs: u64,
    pub assets_dir: PathBuf,
    pub start_fullscreen: bool,
    pub log_file: PathBuf,
    pub screen_duration_secs: u64,
    pub daemon_mode: bool,
    pub clear_only: bool,
    pub multiplexer: MultiplexerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MultiplexerConfig {
    pub enabled: bool,
    pub channel: u8,
    pub address: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output: OutputKind::Terminal,
            panels: PanelFactory::get_available_panels()
                .iter()
                .map(|p| p.to_string())
                .collect(),
            locale: String::new(),
            time_format: 12,
            date_format: "%A %b %d, %Y".to_string(),
            units: Units::Imperial,
            weather_lang: "en".to_string(),
            latitude: 27.976287,
            longitude: -82.535637,
            weather_api_token: String::new(),
            news_country_code: "us".to_string(),
            news_lang: "en".to_string(),
            news_feed_url: None,
            markets_feed_url: "https://seekingalpha.com/feed.xml".to_string(),
            clock_interval_ms: 200,
            weather_interval_secs: 600,
            news_interval_secs: 600,
            markets_interval_secs: 600,
            http_timeout_secs: 10,
            assets_dir: PathBuf::from("assets"),
            start_fullscreen: false,
            log_file: PathBuf::from("mirror_display.log"),
            screen_duration_secs: 10,
            daemon_mode: false,
            clear_only: false,
            multiplexer: MultiplexerConfig::default(),
        }
    }
}

impl Default for MultiplexerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            channel: 0,
            address: TCA9548A_ADDRESS,
        }
    }
}

impl AppConfig {
    pub fn panels_as_str_refs(&self) -> Vec<&str> {
        self.panels.iter().map(|s| s.as_str()).collect()
    }

    /// Load a TOML file on top of the defaults. Keys missing from the file keep their default.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_vars();
        config
    }

    pub fn apply_env_vars(&mut self) {
        if let Some(output) = env_var("OUTPUT").and_then(|s| OutputKind::from_str(&s, true).ok()) {
            self.output = output;
        }

        if let Some(panels_str) = env_var("PANELS") {
            let panels = parse_panel_list(&panels_str);
            if !panels.is_empty() {
                self.panels = panels;
            }
        }

        if let Some(locale) = env_var("LOCALE") {
            self.locale = locale;
        }
        if let Some(format) =
            env_parse::<u8>("TIME_FORMAT").filter(|h| ClockStyle::from_hours(*h).is_some())
        {
            self.time_format = format;
        }
        if let Some(format) = env_var("DATE_FORMAT") {
            self.date_format = format;
        }

        // Weather
        if let Some(units) = env_var("UNITS").and_then(|s| Units::from_str(&s, true).ok()) {
            self.units = units;
        }
        if let Some(lang) = env_var("WEATHER_LANG") {
            self.weather_lang = lang;
        }
        if let Some(latitude) = env_parse::<f64>("LATITUDE") {
            self.latitude = latitude;
        }
        if let Some(longitude) = env_parse::<f64>("LONGITUDE") {
            self.longitude = longitude;
        }
        if let Some(token) = env_var("WEATHER_API_TOKEN") {
            self.weather_api_token = token;
        }

        // Feeds
        if let Some(country) = env_var("NEWS_COUNTRY") {
            self.news_country_code = country;
        }
        if let Some(lang) = env_var("NEWS_LANG") {
            self.news_lang = lang;
        }
        if let Some(url) = env_var("NEWS_FEED_URL") {
            self.news_feed_url = Some(url);
        }
        if let Some(url) = env_var("MARKETS_FEED_URL") {
            self.markets_feed_url = url;
        }

        // Intervals, zero is ignored here and rejected by validate() when set elsewhere
        if let Some(ms) = env_parse::<u64>("CLOCK_INTERVAL_MS").filter(|v| *v > 0) {
            self.clock_interval_ms = ms;
        }
        if let Some(secs) = env_parse::<u64>("WEATHER_INTERVAL").filter(|v| *v > 0) {
            self.weather_interval_secs = secs;
        }
        if let Some(secs) = env_parse::<u64>("NEWS_INTERVAL").filter(|v| *v > 0) {
            self.news_interval_secs = secs;
        }
        if let Some(secs) = env_parse::<u64>("MARKETS_INTERVAL").filter(|v| *v > 0) {
            self.markets_interval_secs = secs;
        }
        if let Some(secs) = env_parse::<u64>("HTTP_TIMEOUT").filter(|v| *v > 0) {
            self.http_timeout_secs = secs;
        }
        if let Some(secs) = env_parse::<u64>("SCREEN_DURATION").filter(|v| *v > 0) {
            self.screen_duration_secs = secs;
        }

        if let Some(dir) = env_var("ASSETS_DIR") {
            self.assets_dir = PathBuf::from(dir);
        }
        if let Some(path) = env_var("LOG_FILE") {
            self.log_file = PathBuf::from(path);
        }
        if let Some(fullscreen) = env_flag("FULLSCREEN") {
            self.start_fullscreen = fullscreen;
        }
        if let Some(daemon) = env_flag("DAEMON") {
            self.daemon_mode = daemon;
        }

        // Multiplexer config
        if let Some(enabled) = env_flag("MUX_ENABLED") {
            self.multiplexer.enabled = enabled;
        }
        if let Some(channel) = env_parse::<u8>("MUX_CHANNEL").filter(|c| *c <= 7) {
            self.multiplexer.channel = channel;
        }
        if let Some(address) = env_var("MUX_ADDRESS").and_then(|s| parse_i2c_address(&s)) {
            self.multiplexer.address = address;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("clock_interval_ms", self.clock_interval_ms),
            ("weather_interval_secs", self.weather_interval_secs),
            ("news_interval_secs", self.news_interval_secs),
            ("markets_interval_secs", self.markets_interval_secs),
            ("http_timeout_secs", self.http_timeout_secs),
            ("screen_duration_secs", self.screen_duration_secs),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConfigError::InvalidInterval(name));
            }
        }

        if self.panels.is_empty() {
            return Err(ConfigError::NoPanelsEnabled);
        }
        for panel in &self.panels {
            if !PanelFactory::validate_panel_type(panel) {
                return Err(ConfigError::InvalidPanel(panel.clone()));
            }
        }

        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ConfigError::InvalidLatitude(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ConfigError::InvalidLongitude(self.longitude));
        }

        if self.time_format != 12 && self.time_format != 24 {
            return Err(ConfigError::InvalidTimeFormat(self.time_format));
        }
        if StrftimeItems::new(&self.date_format).any(|item| item == Item::Error) {
            return Err(ConfigError::InvalidDateFormat(self.date_format.clone()));
        }
        if locale::parse_locale(&self.locale).is_none() {
            return Err(ConfigError::InvalidLocale(self.locale.clone()));
        }

        if self.multiplexer.channel > 7 {
            return Err(ConfigError::InvalidMultiplexerChannel(self.multiplexer.channel));
        }
        if self.output != OutputKind::Oled && (self.daemon_mode || self.clear_only) {
            return Err(ConfigError::RequiresOled);
        }

        Ok(())
    }

    /// Refresh interval of a panel, `None` for unknown panel names.
    pub fn panel_interval(&self, panel: &str) -> Option<Duration> {
        match panel {
            "clock" => Some(Duration::from_millis(self.clock_interval_ms)),
            "weather" => Some(Duration::from_secs(self.weather_interval_secs)),
            "news" => Some(Duration::from_secs(self.news_interval_secs)),
            "markets" => Some(Duration::from_secs(self.markets_interval_secs)),
            _ => None,
        }
    }

    pub fn news_url(&self) -> String {
        match &self.news_feed_url {
            Some(url) => url.clone(),
            None => {
                let country = self.news_country_code.to_uppercase();
                format!(
                    "https://news.google.com/rss?gl={}&ceid={}:{}",
                    country, country, self.news_lang
                )
            }
        }
    }

    pub fn enable_multiplexer(&mut self) {
        self.multiplexer.enabled = true;
    }

    pub fn set_multiplexer_channel(&mut self, channel: u8) -> Result<(), ConfigError> {
        if channel > 7 {
            return Err(ConfigError::InvalidMultiplexerChannel(channel));
        }
        self.multiplexer.channel = channel;
        self.multiplexer.enabled = true;
        Ok(())
    }

    pub fn set_multiplexer_address(&mut self, address: u8) {
        self.multiplexer.address = address;
    }
}

pub fn parse_panel_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Accepts `0x71`, `71` as hex, or falls back to decimal.
pub fn parse_i2c_address(value: &str) -> Option<u8> {
    let trimmed = value.trim();
    u8::from_str_radix(trimmed.trim_start_matches("0x"), 16)
        .ok()
        .or_else(|| trimmed.parse::<u8>().ok())
}

fn env_var(key: &str) -> Option<String> {
    env::var(format!("{}{}", ENV_PREFIX, key)).ok()
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_var(key).and_then(|s| s.trim().parse::<T>().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    env_var(key).map(|s| s.to_lowercase() == "true" || s == "1")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than 0")]
    InvalidInterval(&'static str),
    #[error("At least one panel must be enabled")]
    NoPanelsEnabled,
    #[error("Invalid panel type: {0}")]
    InvalidPanel(String),
    #[error("Latitude must be within -90..=90, got: {0}")]
    InvalidLatitude(f64),
    #[error("Longitude must be within -180..=180, got: {0}")]
    InvalidLongitude(f64),
    #[error("Time format must be 12 or 24, got: {0}")]
    InvalidTimeFormat(u8),
    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),
    #[error("Unknown locale: {0}")]
    InvalidLocale(String),
    #[error("Multiplexer channel must be 0-7, got: {0}")]
    InvalidMultiplexerChannel(u8),
    #[error("--daemon and --clear need the oled output")]
    RequiresOled,
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(String),
}
