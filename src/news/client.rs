//! HTTP client for the headlines API.

use color_eyre::{eyre::eyre, Result};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use url::Url;

use crate::config::Config;
use crate::store::refresh::RemoteSource;

use super::api_types::{ApiErrorEnvelope, ApiHeadlinesResponse};
use super::error::FetchError;
use super::types::Article;

/// Client for the top-headlines endpoint.
#[derive(Clone)]
pub struct NewsClient {
  http: reqwest::Client,
  base_url: Url,
  source: String,
  api_key: String,
}

impl NewsClient {
  pub fn new(config: &Config) -> Result<Self> {
    let api_key = Config::get_api_key()?;

    // A trailing slash keeps Url::join from clobbering the last path segment
    let mut base = config.news.base_url.clone();
    if !base.ends_with('/') {
      base.push('/');
    }

    let base_url =
      Url::parse(&base).map_err(|e| eyre!("Invalid base_url {}: {}", config.news.base_url, e))?;

    Ok(Self {
      http: reqwest::Client::new(),
      base_url,
      source: config.news.source.clone(),
      api_key,
    })
  }

  /// Fetch the current headline list for the configured source.
  pub async fn top_headlines(&self) -> Result<Vec<Article>, FetchError> {
    let mut url = self
      .base_url
      .join("top-headlines")
      .map_err(|_| FetchError::Unexpected)?;
    url
      .query_pairs_mut()
      .append_pair("sources", &self.source)
      .append_pair("apiKey", &self.api_key);

    let response = self
      .http
      .get(url)
      .header(ACCEPT, "application/json")
      .send()
      .await
      .map_err(|e| {
        if e.is_connect() || e.is_timeout() {
          FetchError::NoInternet
        } else {
          FetchError::Unexpected
        }
      })?;

    let status = response.status();
    let body = response.bytes().await.map_err(|_| FetchError::Unexpected)?;

    parse_response(status, &body)
  }
}

impl RemoteSource for NewsClient {
  async fn fetch(&self) -> Result<Vec<Article>, FetchError> {
    self.top_headlines().await
  }
}

/// Map an HTTP status and body to articles or a `FetchError`.
///
/// 200-210 is success, except 203 carrying a decodable gateway error
/// envelope. 404 is distinct; everything else is a generic service failure.
fn parse_response(status: StatusCode, body: &[u8]) -> Result<Vec<Article>, FetchError> {
  match status.as_u16() {
    200..=210 => {
      if status.as_u16() == 203 {
        if let Ok(envelope) = serde_json::from_slice::<ApiErrorEnvelope>(body) {
          return Err(FetchError::Service(envelope.message()));
        }
      }

      let parsed: ApiHeadlinesResponse =
        serde_json::from_slice(body).map_err(|_| FetchError::Decoding)?;

      if parsed.status != "ok" {
        return Err(FetchError::Service(
          parsed
            .message
            .unwrap_or_else(|| "Unable to process at the moment.".to_string()),
        ));
      }

      Ok(
        parsed
          .articles
          .unwrap_or_default()
          .into_iter()
          .map(|a| a.into_article())
          .collect(),
      )
    }
    404 => Err(FetchError::NotFound),
    _ => Err(FetchError::Service("Something went wrong".to_string())),
  }
}
