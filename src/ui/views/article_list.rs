use crate::news::types::Article;
use crate::ui::truncate;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Draw the headline list
pub fn draw_article_list(
  frame: &mut Frame,
  area: Rect,
  articles: &[&Article],
  selected: usize,
  loading: bool,
  filtered: bool,
) {
  let title = if loading {
    " Headlines (loading...) ".to_string()
  } else if filtered {
    format!(" Headlines ({}, filtered) ", articles.len())
  } else {
    format!(" Headlines ({}) ", articles.len())
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if articles.is_empty() && !loading {
    let content = if filtered {
      "No headlines match the filter. Press Esc to clear it."
    } else {
      "No headlines. Press 'r' to refresh."
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let source_width = 18;
  let title_width = (area.width as usize).saturating_sub(source_width + 7);

  let items: Vec<ListItem> = articles
    .iter()
    .map(|article| {
      let source = article.source.as_deref().unwrap_or("-");
      let headline = article.title.as_deref().unwrap_or("(untitled)");

      let line = Line::from(vec![
        Span::styled(
          format!("{:<width$}", truncate(source, source_width), width = source_width),
          Style::default().fg(Color::Yellow),
        ),
        Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
        Span::raw(truncate(headline, title_width)),
      ]);

      ListItem::new(line)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut state = ListState::default();
  if !articles.is_empty() {
    state.select(Some(selected.min(articles.len() - 1)));
  }

  frame.render_stateful_widget(list, area, &mut state);
}
