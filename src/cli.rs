use std::env;
use std::path::PathBuf;

use clap::Parser;

use crate::config::{parse_i2c_address, AppConfig, ConfigError, OutputKind, Units};
use crate::panel_factory::PanelFactory;

const CONFIG_ENV: &str = "MIRROR_DISPLAY_CONFIG";

#[derive(Parser, Debug)]
#[command(name = "mirror_display", version)]
#[command(about = "Smart-mirror dashboard: clock, weather, news and market headlines")]
#[command(after_help = "Every option can also be set with a MIRROR_DISPLAY_* environment variable \
    (for example MIRROR_DISPLAY_WEATHER_API_TOKEN) or in the TOML file given by --config.")]
pub struct Cli {
    /// TOML configuration file (defaults to $MIRROR_DISPLAY_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where to draw the dashboard
    #[arg(short, long, value_enum)]
    pub output: Option<OutputKind>,

    /// Comma-separated list of panels (clock,weather,news,markets)
    #[arg(short, long, value_delimiter = ',')]
    pub panels: Option<Vec<String>>,

    /// Print the available panels and exit
    #[arg(long)]
    pub list_panels: bool,

    /// Locale for day and month names, e.g. fr_FR
    #[arg(long)]
    pub locale: Option<String>,

    /// 12 or 24 hour clock
    #[arg(long, value_parser = ["12", "24"])]
    pub time_format: Option<String>,

    /// strftime pattern for the date line
    #[arg(long)]
    pub date_format: Option<String>,

    #[arg(short, long, value_enum)]
    pub units: Option<Units>,

    /// Language of the weather description
    #[arg(long)]
    pub lang: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// OpenWeatherMap API key
    #[arg(long, value_name = "TOKEN")]
    pub api_token: Option<String>,

    /// Country code for the default news feed
    #[arg(long, value_name = "CC")]
    pub news_country: Option<String>,

    /// Language of the default news feed
    #[arg(long)]
    pub news_lang: Option<String>,

    /// News feed URL, overriding the country default
    #[arg(long, value_name = "URL")]
    pub news_feed: Option<String>,

    #[arg(long, value_name = "URL")]
    pub markets_feed: Option<String>,

    #[arg(long, value_name = "MS")]
    pub clock_interval: Option<u64>,

    #[arg(long, value_name = "SECS")]
    pub weather_interval: Option<u64>,

    #[arg(long, value_name = "SECS")]
    pub news_interval: Option<u64>,

    #[arg(long, value_name = "SECS")]
    pub markets_interval: Option<u64>,

    /// Directory holding the weather icon images
    #[arg(long, value_name = "DIR")]
    pub assets_dir: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Start with the terminal dashboard in fullscreen
    #[arg(short, long)]
    pub fullscreen: bool,

    /// Seconds each panel stays on the OLED
    #[arg(short, long, value_name = "SECS")]
    pub screen_duration: Option<u64>,

    /// Clear the OLED and exit
    #[arg(long)]
    pub clear: bool,

    /// Run as daemon (OLED only)
    #[arg(short, long)]
    pub daemon: bool,

    /// Use TCA9548A I2C multiplexer
    #[arg(long)]
    pub mux: bool,

    /// Select multiplexer channel
    #[arg(long, value_name = "0-7", value_parser = clap::value_parser!(u8).range(0..=7))]
    pub mux_channel: Option<u8>,

    /// Multiplexer I2C address, e.g. 0x70
    #[arg(long, value_name = "ADDR", value_parser = parse_mux_address)]
    pub mux_address: Option<u8>,
}

fn parse_mux_address(value: &str) -> Result<u8, String> {
    parse_i2c_address(value).ok_or_else(|| format!("invalid I2C address: {}", value))
}

impl Cli {
    /// Layer the configuration: defaults, then the config file, then the
    /// environment, then these flags.
    pub fn into_config(self) -> Result<AppConfig, ConfigError> {
        let path = self
            .config
            .clone()
            .or_else(|| env::var(CONFIG_ENV).ok().map(PathBuf::from));
        let mut config = match path {
            Some(path) => {
                let mut config = AppConfig::from_file(&path)?;
                config.apply_env_vars();
                config
            }
            None => AppConfig::from_env(),
        };
        self.apply(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply(self, config: &mut AppConfig) -> Result<(), ConfigError> {
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(panels) = self.panels {
            config.panels = panels
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect();
        }
        if let Some(locale) = self.locale {
            config.locale = locale;
        }
        if let Some(hours) = self.time_format.and_then(|h| h.parse::<u8>().ok()) {
            config.time_format = hours;
        }
        if let Some(date_format) = self.date_format {
            config.date_format = date_format;
        }
        if let Some(units) = self.units {
            config.units = units;
        }
        if let Some(lang) = self.lang {
            config.weather_lang = lang;
        }
        if let Some(latitude) = self.latitude {
            config.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            config.longitude = longitude;
        }
        if let Some(token) = self.api_token {
            config.weather_api_token = token;
        }
        if let Some(country) = self.news_country {
            config.news_country_code = country;
        }
        if let Some(lang) = self.news_lang {
            config.news_lang = lang;
        }
        if let Some(url) = self.news_feed {
            config.news_feed_url = Some(url);
        }
        if let Some(url) = self.markets_feed {
            config.markets_feed_url = url;
        }
        if let Some(ms) = self.clock_interval {
            config.clock_interval_ms = ms;
        }
        if let Some(secs) = self.weather_interval {
            config.weather_interval_secs = secs;
        }
        if let Some(secs) = self.news_interval {
            config.news_interval_secs = secs;
        }
        if let Some(secs) = self.markets_interval {
            config.markets_interval_secs = secs;
        }
        if let Some(dir) = self.assets_dir {
            config.assets_dir = dir;
        }
        if let Some(file) = self.log_file {
            config.log_file = file;
        }
        if let Some(secs) = self.screen_duration {
            config.screen_duration_secs = secs;
        }
        config.start_fullscreen |= self.fullscreen;
        config.clear_only |= self.clear;
        config.daemon_mode |= self.daemon;
        if self.mux {
            config.enable_multiplexer();
        }
        if let Some(channel) = self.mux_channel {
            config.set_multiplexer_channel(channel)?;
        }
        if let Some(address) = self.mux_address {
            config.set_multiplexer_address(address);
        }
        Ok(())
    }
}

pub struct CliParser;

impl CliParser {
    pub fn parse() -> Result<AppConfig, ConfigError> {
        let cli = Cli::parse();
        if cli.list_panels {
            Self::print_panels();
            std::process::exit(0);
        }
        cli.into_config()
    }

    fn print_panels() {
        let descriptions = PanelFactory::get_panel_descriptions();
        println!("Available panels:");
        for panel in PanelFactory::get_available_panels() {
            println!("  {:<8} {}", panel, descriptions.get(panel).copied().unwrap_or_default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["mirror_display"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_override_config() {
        let cli = parse(&[
            "--panels",
            "clock, Weather",
            "--units",
            "metric",
            "--latitude",
            "-33.86",
            "--longitude",
            "151.2",
            "--time-format",
            "24",
            "--fullscreen",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config).unwrap();

        assert_eq!(config.panels, vec!["clock", "weather"]);
        assert_eq!(config.units, Units::Metric);
        assert_eq!(config.latitude, -33.86);
        assert_eq!(config.longitude, 151.2);
        assert_eq!(config.time_format, 24);
        assert!(config.start_fullscreen);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let mut config = AppConfig {
            weather_interval_secs: 900,
            ..AppConfig::default()
        };
        parse(&[]).apply(&mut config).unwrap();
        assert_eq!(config.weather_interval_secs, 900);
        assert_eq!(config.panels.len(), 4);
        assert!(!config.start_fullscreen);
    }

    #[test]
    fn test_multiplexer_flags() {
        let mut config = AppConfig::default();
        parse(&["--output", "oled", "--mux-channel", "3", "--mux-address", "0x71"])
            .apply(&mut config)
            .unwrap();
        assert_eq!(config.output, OutputKind::Oled);
        assert!(config.multiplexer.enabled);
        assert_eq!(config.multiplexer.channel, 3);
        assert_eq!(config.multiplexer.address, 0x71);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let argv = |extra: &[&str]| {
            let mut argv = vec!["mirror_display"];
            argv.extend_from_slice(extra);
            Cli::try_parse_from(argv)
        };
        assert!(argv(&["--mux-channel", "8"]).is_err());
        assert!(argv(&["--time-format", "13"]).is_err());
        assert!(argv(&["--output", "hdmi"]).is_err());
        assert!(argv(&["--mux-address", "zz"]).is_err());
    }

    #[test]
    fn test_news_and_weather_languages_are_separate() {
        let mut config = AppConfig::default();
        parse(&["--lang", "fr", "--news-country", "ca", "--news-lang", "en"])
            .apply(&mut config)
            .unwrap();
        assert_eq!(config.weather_lang, "fr");
        assert_eq!(config.news_url(), "https://news.google.com/rss?gl=CA&ceid=CA:en");
    }

    #[test]
    fn test_daemon_needs_oled() {
        let mut config = AppConfig::default();
        parse(&["--daemon"]).apply(&mut config).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::RequiresOled)));
    }

    #[test]
    #[serial]
    fn test_layering_file_env_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mirror.toml");
        std::fs::write(&path, "weather_interval_secs = 900\nnews_interval_secs = 1200\nlocale = \"fr_FR\"\n").unwrap();

        unsafe {
            env::set_var("MIRROR_DISPLAY_NEWS_INTERVAL", "1500");
        }
        let config = parse(&["--config", path.to_str().unwrap(), "--locale", "de_DE"])
            .into_config()
            .unwrap();
        unsafe {
            env::remove_var("MIRROR_DISPLAY_NEWS_INTERVAL");
        }

        assert_eq!(config.weather_interval_secs, 900);
        assert_eq!(config.news_interval_secs, 1500);
        assert_eq!(config.locale, "de_DE");
    }

    #[test]
    fn test_list_panels_flag() {
        assert!(parse(&["--list-panels"]).list_panels);
    }
}
