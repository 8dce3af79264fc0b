/// One news headline as served to the UI and the cache.
///
/// Every field is optional: the upstream API omits fields freely. When
/// present, `url` is the article's natural identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
  pub source: Option<String>,
  pub title: Option<String>,
  pub url: Option<String>,
  pub image_url: Option<String>,
}
