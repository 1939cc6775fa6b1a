use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::blocking::Client;

use crate::errors::FetchError;
use crate::sources::http;

pub trait FeedSource {
    /// Titles of the first `limit` entries, in feed order.
    fn headlines(&self, limit: usize) -> Result<Vec<String>, FetchError>;
}

/// An RSS 2.0, RSS 1.0 or Atom feed fetched over HTTP.
pub struct RssFeed {
    client: Client,
    url: String,
}

impl RssFeed {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl FeedSource for RssFeed {
    fn headlines(&self, limit: usize) -> Result<Vec<String>, FetchError> {
        let body = http::get_text(&self.client, &self.url, &[])?;
        parse_titles(&body, limit)
    }
}

/// Collect the `<title>` of each `<item>` (RSS) or `<entry>` (Atom).
pub fn parse_titles(xml: &str, limit: usize) -> Result<Vec<String>, FetchError> {
    // Text is not trimmed per event, only the finished title is
    let mut reader = Reader::from_str(xml);

    let mut titles = Vec::new();
    let mut buf = Vec::new();
    let mut seen_root = false;
    let mut in_entry = false;
    let mut in_title = false;
    // Only the first title of an entry counts, nested <source><title> is skipped
    let mut current: Option<String> = None;

    while titles.len() < limit {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if !seen_root {
                    match e.local_name().as_ref() {
                        b"rss" | b"feed" | b"RDF" => seen_root = true,
                        other => {
                            return Err(FetchError::Feed(format!(
                                "expected an RSS or Atom document, found <{}>",
                                String::from_utf8_lossy(other)
                            )));
                        }
                    }
                }
                match e.name().as_ref() {
                    b"item" | b"entry" => {
                        in_entry = true;
                        current = None;
                    }
                    b"title" if in_entry && current.is_none() => {
                        in_title = true;
                        current = Some(String::new());
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) if in_title => {
                let text = e
                    .unescape()
                    .map(|t| t.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                if let Some(title) = current.as_mut() {
                    title.push_str(&text);
                }
            }
            Ok(Event::CData(e)) if in_title => {
                if let Some(title) = current.as_mut() {
                    title.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"title" => in_title = false,
                b"item" | b"entry" => {
                    in_entry = false;
                    if let Some(title) = current.take() {
                        let title = title.trim();
                        if !title.is_empty() {
                            titles.push(title.to_string());
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FetchError::Feed(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_root && limit > 0 {
        return Err(FetchError::Feed("document has no root element".to_string()));
    }
    Ok(titles)
}
