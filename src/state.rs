use crate::icons::Icon;

/// Most headlines a feed panel shows.
pub const HEADLINE_LIMIT: usize = 3;

/// A displayed value that remembers what was last written to it.
#[derive(Debug, Clone, Default)]
pub struct Field<T> {
    value: T,
    writes: u64,
}

impl<T: PartialEq> Field<T> {
    #[allow(dead_code)]
    pub fn new(value: T) -> Self {
        Self { value, writes: 0 }
    }

    /// Store `value` if it differs from the current one. Returns whether a write happened.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.writes += 1;
        true
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeState {
    pub formatted_time: Field<String>,
    pub formatted_date: Field<String>,
}

impl TimeState {
    pub fn apply(&mut self, time: String, date: String) -> usize {
        usize::from(self.formatted_time.set(time)) + usize::from(self.formatted_date.set(date))
    }
}

/// Rendered weather strings, ready for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSnapshot {
    pub location: String,
    pub temperature: String,
    pub condition_text: String,
    pub icon: Option<Icon>,
    pub high: String,
    pub low: String,
    pub humidity: String,
    pub wind: String,
}

#[derive(Debug, Clone, Default)]
pub struct WeatherState {
    pub location: Field<String>,
    pub temperature: Field<String>,
    pub condition_text: Field<String>,
    pub icon_id: Field<Option<Icon>>,
    pub high: Field<String>,
    pub low: Field<String>,
    pub humidity: Field<String>,
    pub wind: Field<String>,
}

impl WeatherState {
    /// Write every changed field of `snapshot`, returning how many were rewritten.
    pub fn apply(&mut self, snapshot: WeatherSnapshot) -> usize {
        [
            self.location.set(snapshot.location),
            self.temperature.set(snapshot.temperature),
            self.condition_text.set(snapshot.condition_text),
            self.icon_id.set(snapshot.icon),
            self.high.set(snapshot.high),
            self.low.set(snapshot.low),
            self.humidity.set(snapshot.humidity),
            self.wind.set(snapshot.wind),
        ]
        .into_iter()
        .filter(|written| *written)
        .count()
    }

    pub fn total_writes(&self) -> u64 {
        self.location.writes()
            + self.temperature.writes()
            + self.condition_text.writes()
            + self.icon_id.writes()
            + self.high.writes()
            + self.low.writes()
            + self.humidity.writes()
            + self.wind.writes()
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeadlineList {
    titles: Field<Vec<String>>,
}

impl HeadlineList {
    /// Replace the whole list, keeping at most [`HEADLINE_LIMIT`] titles.
    pub fn replace(&mut self, mut titles: Vec<String>) -> usize {
        titles.truncate(HEADLINE_LIMIT);
        usize::from(self.titles.set(titles))
    }

    pub fn titles(&self) -> &[String] {
        self.titles.get()
    }

    pub fn writes(&self) -> u64 {
        self.titles.writes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_only_counts_changes() {
        let mut field = Field::new(String::new());
        assert!(field.set("72°".to_string()));
        assert!(!field.set("72°".to_string()));
        assert!(field.set("73°".to_string()));
        assert_eq!(field.get(), "73°");
        assert_eq!(field.writes(), 2);
    }

    #[test]
    fn test_weather_state_counts_rewritten_fields() {
        let mut state = WeatherState::default();
        let snapshot = WeatherSnapshot {
            location: "Tampa, Florida".to_string(),
            temperature: "81°".to_string(),
            condition_text: "CLEAR SKY".to_string(),
            icon: Some(Icon::Sun),
            high: "84°".to_string(),
            low: "71°".to_string(),
            humidity: "Humidity: 54%".to_string(),
            wind: "Wind: 3.6 mph".to_string(),
        };
        assert_eq!(state.apply(snapshot.clone()), 8);
        assert_eq!(state.apply(snapshot.clone()), 0);

        let warmer = WeatherSnapshot {
            temperature: "82°".to_string(),
            ..snapshot
        };
        assert_eq!(state.apply(warmer), 1);
        assert_eq!(state.total_writes(), 9);
    }

    #[test]
    fn test_headline_list_is_capped() {
        let mut list = HeadlineList::default();
        let titles: Vec<String> = (1..=5).map(|i| format!("Headline {i}")).collect();
        assert_eq!(list.replace(titles), 1);
        assert_eq!(list.titles(), ["Headline 1", "Headline 2", "Headline 3"]);
    }

    #[test]
    fn test_headline_list_replaced_wholesale() {
        let mut list = HeadlineList::default();
        list.replace(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        list.replace(vec!["d".to_string()]);
        assert_eq!(list.titles(), ["d"]);
        assert_eq!(list.writes(), 2);
    }
}
