use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, source, and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str) {
  let header = Line::from(vec![
    Span::styled(" newsdeck ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", title),
      Style::default().fg(Color::Yellow).bold(),
    ),
    Span::raw("  "),
    Span::styled("<r>", Style::default().fg(Color::Cyan)),
    Span::styled(" refresh", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("</>", Style::default().fg(Color::Cyan)),
    Span::styled(" filter", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<q>", Style::default().fg(Color::Cyan)),
    Span::styled(" back", Style::default().fg(Color::DarkGray)),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
