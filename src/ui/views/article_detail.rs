use crate::news::types::Article;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Draw the detail view for one article
pub fn draw_article_detail(frame: &mut Frame, area: Rect, article: &Article) {
  let block = Block::default()
    .title(" Article ")
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let mut lines = vec![
    Line::from(Span::styled(
      article.title.as_deref().unwrap_or("(untitled)"),
      Style::default().fg(Color::White).bold(),
    )),
    Line::raw(""),
  ];

  let mut field = |label: &str, value: &Option<String>| {
    if let Some(v) = value {
      lines.push(Line::from(vec![
        Span::styled(format!("{:<10}", label), Style::default().fg(Color::Yellow)),
        Span::raw(v.clone()),
      ]));
    }
  };

  field("Source", &article.source);
  field("URL", &article.url);
  field("Image", &article.image_url);

  let paragraph = Paragraph::new(lines)
    .block(block)
    .wrap(Wrap { trim: false });

  frame.render_widget(paragraph, area);
}
