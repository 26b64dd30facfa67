use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::{StatusLevel, StatusMessage};

/// Draw the status line: the latest message, or a hint if there is none
pub fn draw_footer(frame: &mut Frame, area: Rect, status: Option<&StatusMessage>) {
  let line = match status {
    Some(message) => {
      let color = match message.level {
        StatusLevel::Info => Color::Green,
        StatusLevel::Error => Color::Red,
      };
      Line::from(vec![
        Span::raw(" "),
        Span::styled(message.text.clone(), Style::default().fg(color)),
      ])
    }
    None => Line::styled(
      " j/k:nav  Enter:select  Esc:unselect",
      Style::default().fg(Color::DarkGray),
    ),
  };

  let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
