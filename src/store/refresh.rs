//! Fetch-or-serve policy over the article store.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::news::error::FetchError;
use crate::news::types::Article;

use super::ArticleStore;

/// Anything that can produce a fresh headline list over the network.
pub trait RemoteSource: Send + Sync {
  fn fetch(&self) -> impl Future<Output = Result<Vec<Article>, FetchError>> + Send;
}

/// Decides, per request, whether to serve the cache or hit the network.
///
/// Concurrent `load_articles` calls are independent: no single-flight
/// de-duplication is attempted, and the last save to commit wins.
pub struct Refresher<R: RemoteSource> {
  remote: R,
  store: Arc<ArticleStore>,
}

impl<R: RemoteSource> Refresher<R> {
  pub fn new(remote: R, store: Arc<ArticleStore>) -> Self {
    Self { remote, store }
  }

  /// The underlying store, for manual invalidation.
  pub fn store(&self) -> &ArticleStore {
    &self.store
  }

  /// Load the headline list.
  ///
  /// With `force_refresh`, the cache is bypassed and a failed fetch is an
  /// error - the caller asked for current data, so stale data is no answer.
  /// Otherwise a non-empty cache is served as-is, with expired-row cleanup
  /// run after the read so nothing being returned can be deleted first; an
  /// empty cache falls through to the network.
  pub async fn load_articles(&self, force_refresh: bool) -> Result<Vec<Article>, FetchError> {
    if force_refresh {
      debug!("forced refresh, bypassing cache");
      let fresh = self.remote.fetch().await?;
      self.store.save(&fresh);
      return Ok(fresh);
    }

    let cached = self.store.get_cached();
    if !cached.is_empty() {
      debug!(count = cached.len(), "serving headlines from cache");
      // Housekeeping only; the entries just read were valid at the cutoff
      self.store.clear_expired();
      return Ok(cached);
    }

    debug!("cache miss, fetching headlines");
    let fresh = self.remote.fetch().await?;
    self.store.save(&fresh);
    Ok(fresh)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, Utc};
  use std::collections::VecDeque;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  struct StubSource {
    responses: Mutex<VecDeque<Result<Vec<Article>, FetchError>>>,
    calls: AtomicUsize,
  }

  impl StubSource {
    fn new(responses: Vec<Result<Vec<Article>, FetchError>>) -> Self {
      Self {
        responses: Mutex::new(responses.into()),
        calls: AtomicUsize::new(0),
      }
    }

    fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  impl RemoteSource for StubSource {
    async fn fetch(&self) -> Result<Vec<Article>, FetchError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or(Err(FetchError::Unexpected))
    }
  }

  fn article(title: &str) -> Article {
    Article {
      source: None,
      title: Some(title.to_string()),
      url: None,
      image_url: None,
    }
  }

  fn store() -> Arc<ArticleStore> {
    Arc::new(ArticleStore::open_in_memory().unwrap())
  }

  #[tokio::test]
  async fn test_cache_hit_skips_remote() {
    let store = store();
    let saved = vec![article("Title1"), article("Title2")];
    store.save(&saved);

    let refresher = Refresher::new(StubSource::new(vec![]), store);
    let result = refresher.load_articles(false).await.unwrap();

    assert_eq!(result, saved);
    assert_eq!(refresher.remote.calls(), 0);
  }

  #[tokio::test]
  async fn test_cache_miss_fetches_and_persists() {
    let store = store();
    let refresher = Refresher::new(
      StubSource::new(vec![Ok(vec![article("Fresh")])]),
      Arc::clone(&store),
    );

    let result = refresher.load_articles(false).await.unwrap();

    assert_eq!(result, vec![article("Fresh")]);
    assert_eq!(refresher.remote.calls(), 1);
    assert_eq!(store.get_cached(), vec![article("Fresh")]);
  }

  #[tokio::test]
  async fn test_force_refresh_bypasses_valid_cache() {
    let store = store();
    store.save(&[article("Old")]);

    let refresher = Refresher::new(
      StubSource::new(vec![Ok(vec![article("New")])]),
      Arc::clone(&store),
    );

    let result = refresher.load_articles(true).await.unwrap();

    assert_eq!(result, vec![article("New")]);
    assert_eq!(refresher.remote.calls(), 1);
    assert_eq!(store.get_cached(), vec![article("New")]);
  }

  #[tokio::test]
  async fn test_force_refresh_failure_propagates_and_keeps_cache() {
    let store = store();
    store.save(&[article("Old")]);

    let refresher = Refresher::new(
      StubSource::new(vec![Err(FetchError::Service("down".to_string()))]),
      Arc::clone(&store),
    );

    let result = refresher.load_articles(true).await;

    assert!(matches!(result, Err(FetchError::Service(_))));
    // No stale fallback, but the old generation survives for normal loads
    assert_eq!(store.get_cached(), vec![article("Old")]);
  }

  #[tokio::test]
  async fn test_cache_miss_failure_propagates() {
    let refresher = Refresher::new(StubSource::new(vec![Err(FetchError::NoInternet)]), store());

    let result = refresher.load_articles(false).await;

    assert!(matches!(result, Err(FetchError::NoInternet)));
    assert_eq!(refresher.remote.calls(), 1);
  }

  #[tokio::test]
  async fn test_hit_housekeeping_purges_expired_rows() {
    let store = store();
    let now = Utc::now();

    // One expired row and one valid row, inserted behind the mirror's back
    {
      let conn = store.conn.lock().unwrap();
      for (title, expires) in [
        ("Expired", now - Duration::seconds(150)),
        ("Valid", now + Duration::minutes(5)),
      ] {
        conn
          .execute(
            "INSERT INTO articles (title, fetched_at, expires_at) VALUES (?, ?, ?)",
            rusqlite::params![
              title,
              super::super::format_datetime(now - Duration::seconds(300)),
              super::super::format_datetime(expires),
            ],
          )
          .unwrap();
      }
    }

    let refresher = Refresher::new(StubSource::new(vec![]), Arc::clone(&store));
    let result = refresher.load_articles(false).await.unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].title.as_deref(), Some("Valid"));
    assert_eq!(refresher.remote.calls(), 0);

    // The expired row is gone from durable storage
    let count: i64 = store
      .conn
      .lock()
      .unwrap()
      .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))
      .unwrap();
    assert_eq!(count, 1);
  }
}
