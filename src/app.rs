use crate::config::Config;
use crate::event::{Event, EventHandler, NewsEvent};
use crate::news::client::NewsClient;
use crate::news::types::Article;
use crate::store::refresh::Refresher;
use crate::store::ArticleStore;
use crate::ui;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Search,
}

/// View state - each variant owns its data
#[derive(Debug)]
pub enum ViewState {
  /// Root view: the headline list
  ArticleList {
    articles: Vec<Article>,
    selected: usize,
    loading: bool,
  },
  /// Detail view for one article (pushed via Enter)
  ArticleDetail { article: Article },
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<ViewState>,

  /// Current input mode
  mode: Mode,

  /// Search filter input (after pressing /)
  search_filter: String,

  /// Application configuration
  config: Config,

  /// Cache-aware headline loader
  refresher: Arc<Refresher<NewsClient>>,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Last fetch error, shown in the status bar until the next load
  last_error: Option<String>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let store = ArticleStore::open()?
      .with_ttl(chrono::Duration::minutes(config.cache.ttl_minutes as i64));
    let client = NewsClient::new(&config)?;
    let refresher = Arc::new(Refresher::new(client, Arc::new(store)));

    let (tx, _rx) = mpsc::unbounded_channel();

    Ok(Self {
      view_stack: vec![ViewState::ArticleList {
        articles: Vec::new(),
        selected: 0,
        loading: true,
      }],
      mode: Mode::Normal,
      search_filter: String::new(),
      config,
      refresher,
      event_tx: tx,
      last_error: None,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    // Initial load, served from cache when it is still warm
    self.load_articles(false);

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  /// Kick off a background headline load and report back via events.
  fn load_articles(&self, force_refresh: bool) {
    let refresher = Arc::clone(&self.refresher);
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let _ = tx.send(Event::News(NewsEvent::Loading));
      match refresher.load_articles(force_refresh).await {
        Ok(articles) => {
          let _ = tx.send(Event::News(NewsEvent::ArticlesLoaded(articles)));
        }
        Err(e) => {
          let _ = tx.send(Event::Error(e.to_string()));
        }
      }
    });
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {} // UI refresh happens automatically
      Event::News(news_event) => self.handle_news_event(news_event),
      Event::Error(msg) => {
        self.last_error = Some(msg);
        if let Some(ViewState::ArticleList { loading, .. }) = self.view_stack.first_mut() {
          *loading = false;
        }
      }
    }
  }

  fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Search => self.handle_search_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      // Quit / back
      KeyCode::Char('q') => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
      }
      KeyCode::Esc => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else if !self.search_filter.is_empty() {
          self.search_filter.clear();
        }
      }

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
      KeyCode::Enter => self.enter_selected(),

      // Refresh, bypassing the cache
      KeyCode::Char('r') => self.load_articles(true),

      // Drop the cached generation, then load as usual
      KeyCode::Char('C') => {
        self.refresher.store().clear_all();
        self.load_articles(false);
      }

      // Filter mode
      KeyCode::Char('/') => {
        self.mode = Mode::Search;
        self.search_filter.clear();
      }

      _ => {}
    }
  }

  fn handle_search_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.search_filter.clear();
      }
      KeyCode::Enter => {
        // Keep the filter applied and return to normal mode
        self.mode = Mode::Normal;
      }
      KeyCode::Backspace => {
        self.search_filter.pop();
      }
      KeyCode::Char(c) => {
        self.search_filter.push(c);
      }
      _ => {}
    }
  }

  fn handle_news_event(&mut self, event: NewsEvent) {
    match event {
      NewsEvent::ArticlesLoaded(articles) => {
        self.last_error = None;
        if let Some(ViewState::ArticleList {
          articles: ref mut list,
          selected,
          loading,
        }) = self.view_stack.first_mut()
        {
          *list = articles;
          *loading = false;
          if *selected >= list.len() {
            *selected = list.len().saturating_sub(1);
          }
        }
      }
      NewsEvent::Loading => {
        if let Some(ViewState::ArticleList { loading, .. }) = self.view_stack.first_mut() {
          *loading = true;
        }
      }
    }
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.filtered_articles().len();
    if let Some(ViewState::ArticleList { selected, .. }) = self.view_stack.last_mut() {
      if len > 0 {
        *selected = (*selected as i32 + delta).rem_euclid(len as i32) as usize;
      }
    }
  }

  fn enter_selected(&mut self) {
    let selected = match self.view_stack.last() {
      Some(ViewState::ArticleList { selected, .. }) => *selected,
      _ => return,
    };

    let article = self.filtered_articles().get(selected).map(|a| (*a).clone());
    if let Some(article) = article {
      self.view_stack.push(ViewState::ArticleDetail { article });
    }
  }

  /// Articles in the root view matching the current filter.
  pub fn filtered_articles(&self) -> Vec<&Article> {
    let Some(ViewState::ArticleList { articles, .. }) = self.view_stack.first() else {
      return Vec::new();
    };

    if self.search_filter.is_empty() {
      return articles.iter().collect();
    }

    let needle = self.search_filter.to_lowercase();
    articles
      .iter()
      .filter(|a| {
        a.title
          .as_deref()
          .is_some_and(|t| t.to_lowercase().contains(&needle))
          || a
            .source
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains(&needle))
      })
      .collect()
  }

  // Accessors for UI rendering
  pub fn current_view(&self) -> Option<&ViewState> {
    self.view_stack.last()
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn search_filter(&self) -> &str {
    &self.search_filter
  }

  pub fn header_title(&self) -> &str {
    self
      .config
      .title
      .as_deref()
      .unwrap_or(&self.config.news.source)
  }

  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }
}
