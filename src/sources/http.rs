use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use crate::errors::FetchError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// One client is shared by every panel so connections are pooled.
pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// GET `url` and return the body. Non-2xx answers are errors; the query string is left
/// out of the error so API keys don't end up in logs.
pub fn get_text(client: &Client, url: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
    let response = client.get(url).query(query).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text()?)
}

pub fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, FetchError> {
    let body = get_text(client, url, query)?;
    Ok(serde_json::from_str(&body)?)
}
