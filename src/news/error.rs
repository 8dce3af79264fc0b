use thiserror::Error;

/// Errors from the remote headlines fetch.
///
/// Store-level failures never surface here: the cache logs and degrades to
/// an empty result instead, because staleness is recoverable by re-fetching.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("no internet connection; check your network and try again")]
  NoInternet,

  #[error("headlines endpoint not found")]
  NotFound,

  #[error("invalid response from the news service")]
  Decoding,

  #[error("{0}")]
  Service(String),

  #[error("unable to process the request at this time")]
  Unexpected,
}
