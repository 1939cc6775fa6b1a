pub mod feed;
pub mod http;
pub mod weather;

pub use feed::{FeedSource, RssFeed};
pub use weather::{OpenWeatherClient, WeatherSource};
