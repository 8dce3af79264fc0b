//! Durable article cache backed by SQLite, with an in-memory mirror.
//!
//! The store holds exactly one generation of headlines: every successful
//! `save` replaces all rows in a single transaction, stamped with a shared
//! `fetched_at`/`expires_at` pair. The mirror is a cache-of-the-cache that
//! avoids repeated disk reads within a session; it is only ever updated
//! after the durable write committed, so both sides stay in agreement.
//!
//! Persistence failures are logged and swallowed here - a stale or empty
//! cache is always recoverable by re-fetching, so callers never see storage
//! errors.

pub mod refresh;

use chrono::{DateTime, Duration, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use std::sync::Mutex;
use tracing::warn;

use crate::news::types::Article;

/// An article plus the cache bookkeeping it was stored with.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  pub article: Article,
  pub fetched_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

/// Schema for the article cache.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    position INTEGER PRIMARY KEY,
    source TEXT,
    title TEXT,
    url TEXT,
    image_url TEXT,
    fetched_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);
"#;

/// Persistent cache of the current headline generation.
pub struct ArticleStore {
  conn: Mutex<Connection>,
  mirror: Mutex<Vec<CacheEntry>>,
  /// How long a saved generation stays valid.
  ttl: Duration,
}

impl ArticleStore {
  /// Open the store at the default location.
  pub fn open() -> Result<Self> {
    let path = default_data_dir()?.join("cache.db");

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// Open an in-memory store. Useful for tests and throwaway sessions.
  #[allow(dead_code)]
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
      mirror: Mutex::new(Vec::new()),
      ttl: Duration::minutes(5),
    })
  }

  /// Set how long saved articles stay valid.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// Replace the stored generation with `articles`, stamped with the current
  /// time and the configured TTL. Persistence failures are logged; the
  /// mirror keeps whatever was last durably committed.
  pub fn save(&self, articles: &[Article]) {
    match self.replace_all(articles) {
      Ok(entries) => {
        if let Ok(mut mirror) = self.mirror.lock() {
          *mirror = entries;
        }
      }
      Err(e) => warn!("failed to persist articles: {}", e),
    }
  }

  /// All non-expired articles, entry metadata stripped.
  ///
  /// A populated mirror is served without touching the database; entries
  /// that expired since the last save are still filtered out. Read failures
  /// yield an empty list, never an error.
  pub fn get_cached(&self) -> Vec<Article> {
    match self.try_get_cached() {
      Ok(articles) => articles,
      Err(e) => {
        warn!("failed to read cached articles: {}", e);
        Vec::new()
      }
    }
  }

  /// Delete every expired entry, durable and mirrored, against one cutoff.
  /// Never removes entries that are still valid.
  pub fn clear_expired(&self) {
    let now = Utc::now();

    if let Err(e) = self.delete_expired(now) {
      warn!("failed to clear expired articles: {}", e);
      return;
    }

    if let Ok(mut mirror) = self.mirror.lock() {
      mirror.retain(|entry| entry.expires_at > now);
    }
  }

  /// Remove every entry unconditionally.
  pub fn clear_all(&self) {
    if let Err(e) = self.delete_all() {
      warn!("failed to clear article cache: {}", e);
      return;
    }

    if let Ok(mut mirror) = self.mirror.lock() {
      mirror.clear();
    }
  }

  fn try_get_cached(&self) -> Result<Vec<Article>> {
    let now = Utc::now();

    {
      let mirror = self
        .mirror
        .lock()
        .map_err(|e| eyre!("Lock poisoned: {}", e))?;
      if !mirror.is_empty() {
        return Ok(
          mirror
            .iter()
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.article.clone())
            .collect(),
        );
      }
    }

    let entries = self.read_valid(now)?;
    let articles = entries.iter().map(|entry| entry.article.clone()).collect();

    let mut mirror = self
      .mirror
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    *mirror = entries;

    Ok(articles)
  }

  /// Replace all rows in one transaction and return the committed entries.
  fn replace_all(&self, articles: &[Article]) -> Result<Vec<CacheEntry>> {
    let now = Utc::now();
    let expires_at = now + self.ttl;

    let entries: Vec<CacheEntry> = articles
      .iter()
      .cloned()
      .map(|article| CacheEntry {
        article,
        fetched_at: now,
        expires_at,
      })
      .collect();

    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("BEGIN TRANSACTION", [])
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    let written = (|| -> Result<()> {
      conn
        .execute("DELETE FROM articles", [])
        .map_err(|e| eyre!("Failed to delete old articles: {}", e))?;

      for entry in &entries {
        conn
          .execute(
            "INSERT INTO articles (source, title, url, image_url, fetched_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
              entry.article.source,
              entry.article.title,
              entry.article.url,
              entry.article.image_url,
              format_datetime(entry.fetched_at),
              format_datetime(entry.expires_at),
            ],
          )
          .map_err(|e| eyre!("Failed to store article: {}", e))?;
      }

      Ok(())
    })();

    match written {
      Ok(()) => {
        conn
          .execute("COMMIT", [])
          .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;
        Ok(entries)
      }
      Err(e) => {
        let _ = conn.execute("ROLLBACK", []);
        Err(e)
      }
    }
  }

  fn read_valid(&self, now: DateTime<Utc>) -> Result<Vec<CacheEntry>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare(
        "SELECT source, title, url, image_url, fetched_at, expires_at
         FROM articles WHERE expires_at > ? ORDER BY position",
      )
      .map_err(|e| eyre!("Failed to prepare cache query: {}", e))?;

    let rows: Vec<(Option<String>, Option<String>, Option<String>, Option<String>, String, String)> =
      stmt
        .query_map(params![format_datetime(now)], |row| {
          Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
          ))
        })
        .map_err(|e| eyre!("Failed to query cached articles: {}", e))?
        .filter_map(|r| r.ok())
        .collect();

    let mut entries = Vec::with_capacity(rows.len());
    for (source, title, url, image_url, fetched_at, expires_at) in rows {
      entries.push(CacheEntry {
        article: Article {
          source,
          title,
          url,
          image_url,
        },
        fetched_at: parse_datetime(&fetched_at)?,
        expires_at: parse_datetime(&expires_at)?,
      });
    }

    Ok(entries)
  }

  fn delete_expired(&self, now: DateTime<Utc>) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "DELETE FROM articles WHERE expires_at <= ?",
        params![format_datetime(now)],
      )
      .map_err(|e| eyre!("Failed to delete expired articles: {}", e))?;

    Ok(())
  }

  fn delete_all(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM articles", [])
      .map_err(|e| eyre!("Failed to delete articles: {}", e))?;

    Ok(())
  }
}

/// Default data directory for the cache database and log file.
pub fn default_data_dir() -> Result<std::path::PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("newsdeck"))
}

/// Store datetimes in SQLite's own text format so expiry comparisons work
/// lexicographically in SQL.
fn format_datetime(dt: DateTime<Utc>) -> String {
  dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn article(source: &str, title: &str, url: &str) -> Article {
    Article {
      source: Some(source.to_string()),
      title: Some(title.to_string()),
      url: Some(url.to_string()),
      image_url: None,
    }
  }

  fn sample_articles() -> Vec<Article> {
    vec![
      article("Source1", "Title1", "https://url1.com"),
      article("Source2", "Title2", "https://url2.com"),
    ]
  }

  /// Insert a row directly, bypassing `save`, with explicit timestamps.
  fn insert_raw(store: &ArticleStore, title: &str, fetched_at: DateTime<Utc>, expires_at: DateTime<Utc>) {
    let conn = store.conn.lock().unwrap();
    conn
      .execute(
        "INSERT INTO articles (source, title, url, image_url, fetched_at, expires_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
          "Raw",
          title,
          format!("https://{}.com", title),
          Option::<String>::None,
          format_datetime(fetched_at),
          format_datetime(expires_at),
        ],
      )
      .unwrap();
  }

  fn row_count(store: &ArticleStore) -> i64 {
    let conn = store.conn.lock().unwrap();
    conn
      .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))
      .unwrap()
  }

  #[test]
  fn test_save_then_get_cached_round_trip() {
    let store = ArticleStore::open_in_memory().unwrap();
    let articles = sample_articles();

    store.save(&articles);
    assert_eq!(store.get_cached(), articles);
  }

  #[test]
  fn test_get_cached_reads_durable_when_mirror_cold() {
    let store = ArticleStore::open_in_memory().unwrap();
    let articles = sample_articles();
    store.save(&articles);

    // Drop the mirror to force a durable read
    store.mirror.lock().unwrap().clear();

    assert_eq!(store.get_cached(), articles);
    // The durable read repopulated the mirror
    assert_eq!(store.mirror.lock().unwrap().len(), 2);
  }

  #[test]
  fn test_save_replaces_previous_generation() {
    let store = ArticleStore::open_in_memory().unwrap();
    store.save(&sample_articles());

    let replacement = vec![article("Source3", "Title3", "https://url3.com")];
    store.save(&replacement);

    assert_eq!(store.get_cached(), replacement);
    assert_eq!(row_count(&store), 1);
  }

  #[test]
  fn test_expired_entries_are_never_returned() {
    let store = ArticleStore::open_in_memory().unwrap();
    let now = Utc::now();
    insert_raw(
      &store,
      "Expired",
      now - Duration::seconds(300),
      now - Duration::seconds(150),
    );

    assert!(store.get_cached().is_empty());
  }

  #[test]
  fn test_mirror_filters_entries_expired_since_save() {
    let store = ArticleStore::open_in_memory().unwrap();
    store.save(&sample_articles());

    // Age the mirrored entries past their expiry without touching the rows
    for entry in store.mirror.lock().unwrap().iter_mut() {
      entry.expires_at = Utc::now() - Duration::seconds(1);
    }

    assert!(store.get_cached().is_empty());
  }

  #[test]
  fn test_clear_expired_removes_only_expired() {
    let store = ArticleStore::open_in_memory().unwrap();
    let now = Utc::now();
    insert_raw(
      &store,
      "Expired",
      now - Duration::seconds(300),
      now - Duration::seconds(150),
    );
    insert_raw(&store, "Valid", now, now + Duration::minutes(5));

    store.clear_expired();

    assert_eq!(row_count(&store), 1);
    let remaining = store.get_cached();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title.as_deref(), Some("Valid"));
  }

  #[test]
  fn test_clear_expired_is_idempotent() {
    let store = ArticleStore::open_in_memory().unwrap();
    let now = Utc::now();
    insert_raw(
      &store,
      "Expired",
      now - Duration::seconds(300),
      now - Duration::seconds(150),
    );
    insert_raw(&store, "Valid", now, now + Duration::minutes(5));

    store.clear_expired();
    let after_first = row_count(&store);
    store.clear_expired();

    assert_eq!(row_count(&store), after_first);
  }

  #[test]
  fn test_clear_all_empties_store_and_mirror() {
    let store = ArticleStore::open_in_memory().unwrap();
    store.save(&sample_articles());

    store.clear_all();

    assert!(store.get_cached().is_empty());
    assert_eq!(row_count(&store), 0);
    assert!(store.mirror.lock().unwrap().is_empty());
  }

  #[test]
  fn test_entries_expire_after_fetch() {
    let store = ArticleStore::open_in_memory().unwrap();
    store.save(&sample_articles());

    let mirror = store.mirror.lock().unwrap();
    for entry in mirror.iter() {
      assert!(entry.expires_at > entry.fetched_at);
    }
  }

  #[test]
  fn test_datetime_round_trip() {
    let now = Utc::now();
    let parsed = parse_datetime(&format_datetime(now)).unwrap();
    // Sub-second precision is dropped by the storage format
    assert_eq!(parsed.timestamp(), now.timestamp());
  }
}
