use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::FetchError;

/// Client for the static host that serves `<base_url>/<slug>.json`.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    base_url: String,
}

impl Fetcher {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, slug: &str) -> String {
        format!("{}/{slug}.json", self.base_url)
    }

    /// One GET, no retries. Only a 200 with a JSON body counts as data.
    pub async fn fetch(&self, slug: &str) -> Result<Value, FetchError> {
        let url = self.url_for(slug);
        tracing::debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(FetchError::Status {
                status: response.status(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_slug_under_base() {
        let fetcher = Fetcher::new("https://example.test/cache", None).unwrap();
        assert_eq!(
            fetcher.url_for("south_korea"),
            "https://example.test/cache/south_korea.json"
        );
    }

    #[test]
    fn trailing_slash_is_not_doubled() {
        let fetcher = Fetcher::new("https://example.test/cache/", None).unwrap();
        assert_eq!(fetcher.url_for("chad"), "https://example.test/cache/chad.json");
    }
}
