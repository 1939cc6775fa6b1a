use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::blocking::Client;

use crate::config::AppConfig;
use crate::locale::{self, ClockStyle, FormatContext};
use crate::panels::{ClockPanel, HeadlinesPanel, Panel, WeatherPanel};
use crate::sources::{OpenWeatherClient, RssFeed};

pub struct PanelFactory;

impl PanelFactory {
    pub fn create_panel(panel_type: &str, config: &AppConfig, client: &Client) -> Result<Box<dyn Panel>> {
        match panel_type {
            "clock" => {
                let locale = locale::parse_locale(&config.locale)
                    .ok_or_else(|| anyhow!("Unknown locale: {}", config.locale))?;
                let clock = ClockStyle::from_hours(config.time_format)
                    .ok_or_else(|| anyhow!("Time format must be 12 or 24, got: {}", config.time_format))?;
                let format = FormatContext::new(locale, clock, config.date_format.clone());
                Ok(Box::new(ClockPanel::new(format)))
            }
            "weather" => Ok(Box::new(WeatherPanel::new(
                Box::new(OpenWeatherClient::new(client.clone(), config)),
                config.units,
            ))),
            "news" => Ok(Box::new(HeadlinesPanel::news(Box::new(RssFeed::new(
                client.clone(),
                config.news_url(),
            ))))),
            "markets" => Ok(Box::new(HeadlinesPanel::markets(Box::new(RssFeed::new(
                client.clone(),
                config.markets_feed_url.clone(),
            ))))),
            _ => Err(anyhow!("Unknown panel type: {}", panel_type)),
        }
    }

    /// Build every enabled panel paired with its refresh interval.
    pub fn create_panels(config: &AppConfig, client: &Client) -> Result<Vec<(Box<dyn Panel>, Duration)>> {
        config
            .panels
            .iter()
            .map(|panel_type| {
                let interval = config
                    .panel_interval(panel_type)
                    .ok_or_else(|| anyhow!("Unknown panel type: {}", panel_type))?;
                Ok((Self::create_panel(panel_type, config, client)?, interval))
            })
            .collect()
    }

    pub fn get_available_panels() -> Vec<&'static str> {
        vec!["clock", "weather", "news", "markets"]
    }

    pub fn get_panel_descriptions() -> HashMap<&'static str, &'static str> {
        let mut descriptions = HashMap::new();
        descriptions.insert("clock", "Local time and date in the configured locale");
        descriptions.insert("weather", "Current conditions, today's high and low, humidity and wind");
        descriptions.insert("news", "Top three headlines from the news feed");
        descriptions.insert("markets", "Top three headlines from the markets feed");
        descriptions
    }

    pub fn validate_panel_type(panel_type: &str) -> bool {
        Self::get_available_panels().contains(&panel_type)
    }
}
