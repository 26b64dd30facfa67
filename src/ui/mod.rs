pub mod components;
mod renderfns;
pub mod views;

use std::time::{Duration, Instant};

use crate::app::App;
use ratatui::prelude::*;

/// How long a status line message stays up
const STATUS_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
  Info,
  Error,
}

/// Transient message for the status line
#[derive(Debug, Clone)]
pub struct StatusMessage {
  pub text: String,
  pub level: StatusLevel,
  shown_at: Instant,
}

impl StatusMessage {
  pub fn info(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      level: StatusLevel::Info,
      shown_at: Instant::now(),
    }
  }

  pub fn error(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      level: StatusLevel::Error,
      shown_at: Instant::now(),
    }
  }

  pub fn is_expired(&self) -> bool {
    self.shown_at.elapsed() > STATUS_TTL
  }
}

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  renderfns::draw_header(frame, chunks[0], app.title(), app.is_authenticated());

  app.view_mut().render(frame, chunks[1]);
  app.command_input().render_overlay(frame, chunks[1]);

  renderfns::draw_footer(frame, chunks[2], app.status());
}
