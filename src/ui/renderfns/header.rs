use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Keyboard hints shown on the right of the header
const SHORTCUTS: &[(&str, &str)] = &[
  ("n", "new"),
  ("r", "refresh"),
  (":", "command"),
  ("q", "quit"),
];

/// Draw the header bar with logo, API context, auth state and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str, authenticated: bool) {
  let (auth_label, auth_color) = if authenticated {
    ("token", Color::Green)
  } else {
    ("anonymous", Color::DarkGray)
  };

  let mut spans = vec![
    Span::styled(" exemplar ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", auth_label), Style::default().fg(auth_color)),
    Span::raw(" "),
  ];

  for (key, label) in SHORTCUTS {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
