//! Locale-aware clock formatting.
//!
//! The locale travels with a [`FormatContext`] value instead of living in
//! process-global state, so formatting calls cannot leak a locale into each other.

use std::fmt::{self, Write};

use chrono::{DateTime, Locale, TimeZone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStyle {
    TwelveHour,
    TwentyFourHour,
}

impl ClockStyle {
    pub fn from_hours(hours: u8) -> Option<Self> {
        match hours {
            12 => Some(ClockStyle::TwelveHour),
            24 => Some(ClockStyle::TwentyFourHour),
            _ => None,
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            ClockStyle::TwelveHour => "%I:%M %p",
            ClockStyle::TwentyFourHour => "%H:%M",
        }
    }
}

/// Empty names select the POSIX locale, which is what an unset `LC_ALL` gives.
pub fn parse_locale(name: &str) -> Option<Locale> {
    let name = name.trim();
    if name.is_empty() || name == "C" || name == "POSIX" {
        return Some(Locale::POSIX);
    }
    // Accept "fr_FR.UTF-8" the way LANG is usually spelled
    let name = name.split('.').next().unwrap_or(name);
    Locale::try_from(name).ok()
}

#[derive(Debug, Clone)]
pub struct FormatContext {
    locale: Locale,
    clock: ClockStyle,
    date_format: String,
}

impl FormatContext {
    pub fn new(locale: Locale, clock: ClockStyle, date_format: impl Into<String>) -> Self {
        Self {
            locale,
            clock,
            date_format: date_format.into(),
        }
    }

    pub fn time<Tz>(&self, at: &DateTime<Tz>) -> Result<String, fmt::Error>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.render(at, self.clock.pattern())
    }

    pub fn date<Tz>(&self, at: &DateTime<Tz>) -> Result<String, fmt::Error>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.render(at, &self.date_format)
    }

    // write! instead of to_string(): chrono reports bad specifiers as fmt::Error,
    // which to_string() would turn into a panic.
    fn render<Tz>(&self, at: &DateTime<Tz>, pattern: &str) -> Result<String, fmt::Error>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut out = String::new();
        write!(out, "{}", at.format_localized(pattern, self.locale))?;
        Ok(out)
    }
}

impl Default for FormatContext {
    fn default() -> Self {
        Self::new(Locale::POSIX, ClockStyle::TwelveHour, "%A %b %d, %Y")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 8, 14, 5, 0).unwrap()
    }

    #[test]
    fn test_twelve_hour_clock() {
        let ctx = FormatContext::default();
        assert_eq!(ctx.time(&sample()).unwrap(), "02:05 PM");
        assert_eq!(ctx.date(&sample()).unwrap(), "Friday Mar 08, 2024");
    }

    #[test]
    fn test_twenty_four_hour_clock() {
        let ctx = FormatContext::new(Locale::POSIX, ClockStyle::TwentyFourHour, "%d/%m/%Y");
        assert_eq!(ctx.time(&sample()).unwrap(), "14:05");
        assert_eq!(ctx.date(&sample()).unwrap(), "08/03/2024");
    }

    #[test]
    fn test_locales_do_not_leak_between_contexts() {
        let french = FormatContext::new(parse_locale("fr_FR").unwrap(), ClockStyle::TwentyFourHour, "%A");
        let english = FormatContext::new(parse_locale("en_US").unwrap(), ClockStyle::TwentyFourHour, "%A");

        assert_eq!(french.date(&sample()).unwrap(), "vendredi");
        assert_eq!(english.date(&sample()).unwrap(), "Friday");
        assert_eq!(french.date(&sample()).unwrap(), "vendredi");
    }

    #[test]
    fn test_failed_format_leaves_context_usable() {
        let broken = FormatContext::new(parse_locale("de_DE").unwrap(), ClockStyle::TwentyFourHour, "%Q");
        assert!(broken.date(&sample()).is_err());

        let english = FormatContext::new(parse_locale("en_US").unwrap(), ClockStyle::TwentyFourHour, "%A");
        assert_eq!(english.date(&sample()).unwrap(), "Friday");
        assert_eq!(broken.time(&sample()).unwrap(), "14:05");
    }

    #[test]
    fn test_parse_locale() {
        assert_eq!(parse_locale(""), Some(Locale::POSIX));
        assert_eq!(parse_locale("fr_FR.UTF-8"), Some(Locale::fr_FR));
        assert_eq!(parse_locale("xx_NOWHERE"), None);
    }

    #[test]
    fn test_clock_style_from_hours() {
        assert_eq!(ClockStyle::from_hours(24), Some(ClockStyle::TwentyFourHour));
        assert_eq!(ClockStyle::from_hours(13), None);
    }
}
