//! Wire types for the headlines API.

use serde::Deserialize;

use super::types::Article;

/// Top-level response envelope for `/top-headlines`.
#[derive(Debug, Deserialize)]
pub struct ApiHeadlinesResponse {
  pub status: String,
  pub message: Option<String>,
  pub articles: Option<Vec<ApiArticle>>,
}

/// One article as the API returns it. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct ApiArticle {
  pub source: Option<ApiSource>,
  pub title: Option<String>,
  pub url: Option<String>,
  #[serde(rename = "urlToImage")]
  pub url_to_image: Option<String>,
}

/// The API emits `source` either as `{"id": .., "name": ..}` or as a bare
/// string, depending on endpoint version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiSource {
  Named { name: Option<String> },
  Plain(String),
}

impl ApiSource {
  pub fn into_name(self) -> Option<String> {
    match self {
      ApiSource::Named { name } => name,
      ApiSource::Plain(name) => Some(name),
    }
  }
}

impl ApiArticle {
  /// Convert into the domain record, keeping only the fields the cache stores.
  pub fn into_article(self) -> Article {
    Article {
      source: self.source.and_then(ApiSource::into_name),
      title: self.title,
      url: self.url,
      image_url: self.url_to_image,
    }
  }
}

/// Error envelope some gateways return with HTTP 203.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorEnvelope {
  pub response_message: Option<String>,
  pub body: Option<Vec<String>>,
}

impl ApiErrorEnvelope {
  /// Best human-readable message available in the envelope.
  pub fn message(self) -> String {
    self
      .response_message
      .or_else(|| self.body.and_then(|mut b| (!b.is_empty()).then(|| b.remove(0))))
      .unwrap_or_else(|| "Unable to process at the moment.".to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_source_as_object() {
    let json = r#"{"source": {"id": "bbc-news", "name": "BBC News"}, "title": "T", "url": "u", "urlToImage": "i"}"#;
    let api: ApiArticle = serde_json::from_str(json).unwrap();
    let article = api.into_article();
    assert_eq!(article.source.as_deref(), Some("BBC News"));
    assert_eq!(article.title.as_deref(), Some("T"));
    assert_eq!(article.image_url.as_deref(), Some("i"));
  }

  #[test]
  fn test_source_as_string() {
    let json = r#"{"source": "BBC News", "title": "T"}"#;
    let api: ApiArticle = serde_json::from_str(json).unwrap();
    assert_eq!(api.into_article().source.as_deref(), Some("BBC News"));
  }

  #[test]
  fn test_missing_fields_are_none() {
    let api: ApiArticle = serde_json::from_str("{}").unwrap();
    let article = api.into_article();
    assert_eq!(article.source, None);
    assert_eq!(article.title, None);
    assert_eq!(article.url, None);
    assert_eq!(article.image_url, None);
  }

  #[test]
  fn test_error_envelope_message_fallback() {
    let env: ApiErrorEnvelope =
      serde_json::from_str(r#"{"responseCode": "42", "body": ["first", "second"]}"#).unwrap();
    assert_eq!(env.message(), "first");

    let env: ApiErrorEnvelope =
      serde_json::from_str(r#"{"responseMessage": "nope"}"#).unwrap();
    assert_eq!(env.message(), "nope");
  }
}
