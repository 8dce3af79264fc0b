mod header;
mod views;

use crate::app::{App, Mode, ViewState};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  header::draw_header(frame, chunks[0], app.header_title());

  // Draw current view
  if let Some(view) = app.current_view() {
    match view {
      ViewState::ArticleList {
        selected, loading, ..
      } => {
        views::article_list::draw_article_list(
          frame,
          chunks[1],
          &app.filtered_articles(),
          *selected,
          *loading,
          !app.search_filter().is_empty(),
        );
      }
      ViewState::ArticleDetail { article } => {
        views::article_detail::draw_article_detail(frame, chunks[1], article);
      }
    }
  }

  draw_status_bar(frame, chunks[2], app);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let (content, style) = if let Some(error) = app.last_error() {
    (
      format!(" {} - press 'r' to retry", error),
      Style::default().fg(Color::Red),
    )
  } else {
    match app.mode() {
      Mode::Normal => {
        let hint = " j/k:nav  Enter:open  r:refresh  /:filter  q:back  Ctrl-C:quit";
        (hint.to_string(), Style::default().fg(Color::DarkGray))
      }
      Mode::Search => {
        let search = format!("/{}", app.search_filter());
        (search, Style::default().fg(Color::Cyan))
      }
    }
  };

  let paragraph = Paragraph::new(content).style(style);
  frame.render_widget(paragraph, area);
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
  }
}
