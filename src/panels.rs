use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::warn;

use crate::config::Units;
use crate::icons::{icon_for_code, Icon};
use crate::locale::FormatContext;
use crate::sources::weather::WeatherReport;
use crate::sources::{FeedSource, WeatherSource};
use crate::state::{HeadlineList, TimeState, WeatherSnapshot, WeatherState, HEADLINE_LIMIT};

const DEGREE_SIGN: char = '\u{00B0}';

/// Where a panel sits in the root window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    TopLeft,
    TopRight,
    BottomUpper,
    BottomLower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    ExtraLarge,
    Large,
    Medium,
    Small,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewLine {
    pub text: String,
    pub size: TextSize,
    pub icon: Option<Icon>,
}

impl ViewLine {
    pub fn new(text: impl Into<String>, size: TextSize) -> Self {
        Self {
            text: text.into(),
            size,
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: Option<Icon>) -> Self {
        self.icon = icon;
        self
    }
}

/// What a panel currently shows, independent of the surface drawing it.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub name: &'static str,
    pub region: Region,
    pub title: String,
    /// Whether the title is part of the panel's normal layout (news, markets)
    /// or only used by surfaces that show one panel at a time.
    pub show_title: bool,
    pub lines: Vec<ViewLine>,
}

// Panel trait for the self-refreshing display regions
pub trait Panel {
    fn name(&self) -> &'static str;
    fn region(&self) -> Region;
    fn title(&self) -> String {
        self.name().to_string()
    }
    /// Fetch and render. Returns how many display fields were rewritten; on error the
    /// panel's state is exactly what it was before the call.
    fn refresh(&mut self, now: &DateTime<Local>) -> Result<usize>;
    fn view(&self) -> PanelView;
}

pub struct ClockPanel {
    format: FormatContext,
    state: TimeState,
}

impl ClockPanel {
    pub fn new(format: FormatContext) -> Self {
        Self {
            format,
            state: TimeState::default(),
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> &TimeState {
        &self.state
    }
}

impl Panel for ClockPanel {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn region(&self) -> Region {
        Region::TopLeft
    }

    fn title(&self) -> String {
        "Clock".to_string()
    }

    fn refresh(&mut self, now: &DateTime<Local>) -> Result<usize> {
        let time = self.format.time(now).context("formatting time")?;
        let date = self.format.date(now).context("formatting date")?;
        Ok(self.state.apply(time, date))
    }

    fn view(&self) -> PanelView {
        PanelView {
            name: self.name(),
            region: self.region(),
            title: self.title(),
            show_title: false,
            lines: vec![
                ViewLine::new(self.state.formatted_time.get().clone(), TextSize::Large),
                ViewLine::new(self.state.formatted_date.get().clone(), TextSize::Small),
            ],
        }
    }
}

pub struct WeatherPanel {
    source: Box<dyn WeatherSource>,
    units: Units,
    state: WeatherState,
}

impl WeatherPanel {
    pub fn new(source: Box<dyn WeatherSource>, units: Units) -> Self {
        Self {
            source,
            units,
            state: WeatherState::default(),
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> &WeatherState {
        &self.state
    }
}

pub fn snapshot(report: &WeatherReport, location: String, units: Units) -> WeatherSnapshot {
    WeatherSnapshot {
        location,
        temperature: format!("{}{}", report.temperature.trunc() as i64, DEGREE_SIGN),
        condition_text: report.description.to_uppercase(),
        icon: icon_for_code(&report.icon_code),
        high: format!("{}{}", report.high.round_ties_even() as i64, DEGREE_SIGN),
        low: format!("{}{}", report.low.round_ties_even() as i64, DEGREE_SIGN),
        humidity: format!("Humidity: {}%", report.humidity),
        wind: format!("Wind: {} {}", report.wind_speed, units.wind_speed_unit()),
    }
}

impl Panel for WeatherPanel {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn region(&self) -> Region {
        Region::TopRight
    }

    fn title(&self) -> String {
        let location = self.state.location.get();
        if location.is_empty() {
            "Weather".to_string()
        } else {
            location.clone()
        }
    }

    fn refresh(&mut self, _now: &DateTime<Local>) -> Result<usize> {
        let report = self.source.current().context("fetching current weather")?;

        // A failed lookup keeps the last known place rather than failing the whole panel
        let location = match self.source.locate() {
            Ok(location) => location.label(),
            Err(e) => {
                warn!(error = %e, "location lookup failed, keeping previous location");
                self.state.location.get().clone()
            }
        };

        Ok(self.state.apply(snapshot(&report, location, self.units)))
    }

    fn view(&self) -> PanelView {
        let state = &self.state;
        let mut lines = Vec::new();

        if !state.location.get().is_empty() {
            lines.push(ViewLine::new(state.location.get().clone(), TextSize::Small));
        }
        if !state.temperature.get().is_empty() {
            lines.push(
                ViewLine::new(state.temperature.get().clone(), TextSize::ExtraLarge)
                    .with_icon(*state.icon_id.get()),
            );
        }
        if !state.condition_text.get().is_empty() {
            lines.push(ViewLine::new(state.condition_text.get().clone(), TextSize::Medium));
        }
        if !state.high.get().is_empty() && !state.low.get().is_empty() {
            lines.push(ViewLine::new(
                format!("High: {} | Low: {}", state.high.get(), state.low.get()),
                TextSize::Small,
            ));
        }
        for field in [&state.humidity, &state.wind] {
            if !field.get().is_empty() {
                lines.push(ViewLine::new(field.get().clone(), TextSize::Small));
            }
        }

        PanelView {
            name: self.name(),
            region: self.region(),
            title: self.title(),
            show_title: false,
            lines,
        }
    }
}

/// A titled list of feed headlines, used for both news and markets.
pub struct HeadlinesPanel {
    name: &'static str,
    title: &'static str,
    region: Region,
    source: Box<dyn FeedSource>,
    headlines: HeadlineList,
}

impl HeadlinesPanel {
    pub fn news(source: Box<dyn FeedSource>) -> Self {
        Self::new("news", "News", Region::BottomLower, source)
    }

    pub fn markets(source: Box<dyn FeedSource>) -> Self {
        Self::new("markets", "Markets", Region::BottomUpper, source)
    }

    fn new(name: &'static str, title: &'static str, region: Region, source: Box<dyn FeedSource>) -> Self {
        Self {
            name,
            title,
            region,
            source,
            headlines: HeadlineList::default(),
        }
    }

    #[allow(dead_code)]
    pub fn headlines(&self) -> &HeadlineList {
        &self.headlines
    }
}

impl Panel for HeadlinesPanel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn region(&self) -> Region {
        self.region
    }

    fn title(&self) -> String {
        self.title.to_string()
    }

    fn refresh(&mut self, _now: &DateTime<Local>) -> Result<usize> {
        let titles = self
            .source
            .headlines(HEADLINE_LIMIT)
            .with_context(|| format!("fetching {} headlines", self.name))?;
        Ok(self.headlines.replace(titles))
    }

    fn view(&self) -> PanelView {
        PanelView {
            name: self.name,
            region: self.region,
            title: self.title(),
            show_title: true,
            lines: self
                .headlines
                .titles()
                .iter()
                .map(|title| ViewLine::new(title.clone(), TextSize::Small).with_icon(Some(Icon::Newspaper)))
                .collect(),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use crate::errors::FetchError;
    use crate::sources::weather::{Location, WeatherReport};
    use crate::sources::{FeedSource, WeatherSource};

    /// Hands out queued results, one per call, repeating the last when the queue runs dry.
    pub struct Scripted<T> {
        queue: RefCell<VecDeque<Result<T, String>>>,
    }

    impl<T: Clone> Scripted<T> {
        pub fn new(results: Vec<Result<T, String>>) -> Self {
            Self {
                queue: RefCell::new(results.into()),
            }
        }

        fn next(&self) -> Result<T, FetchError> {
            let mut queue = self.queue.borrow_mut();
            let result = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            match result {
                Some(Ok(value)) => Ok(value),
                Some(Err(msg)) => Err(FetchError::Feed(msg)),
                None => Err(FetchError::Missing("scripted result")),
            }
        }
    }

    pub struct FakeWeather {
        pub reports: Scripted<WeatherReport>,
        pub locations: Scripted<Location>,
    }

    impl WeatherSource for FakeWeather {
        fn current(&self) -> Result<WeatherReport, FetchError> {
            self.reports.next()
        }

        fn locate(&self) -> Result<Location, FetchError> {
            self.locations.next()
        }
    }

    pub struct FakeFeed(pub Scripted<Vec<String>>);

    impl FeedSource for FakeFeed {
        fn headlines(&self, limit: usize) -> Result<Vec<String>, FetchError> {
            self.0.next().map(|mut titles| {
                titles.truncate(limit);
                titles
            })
        }
    }

    pub fn report(temperature: f64, icon_code: &str) -> WeatherReport {
        WeatherReport {
            temperature,
            description: "clear sky".to_string(),
            icon_code: icon_code.to_string(),
            high: 84.4,
            low: 70.6,
            humidity: 54.0,
            wind_speed: 3.6,
        }
    }

    pub fn tampa() -> Location {
        Location {
            city: Some("Tampa".to_string()),
            state: Some("Florida".to_string()),
        }
    }
}
