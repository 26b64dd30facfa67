use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::api::schema::FieldViolation;
use crate::api::ExampleDraft;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by the form that the parent view needs to handle
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
  Submitted(ExampleDraft),
  Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Field {
  #[default]
  Name,
  Value,
}

/// Overlay form for creating an example.
///
/// Only checks that the value parses as a number; everything else is left to
/// validation downstream.
#[derive(Debug, Clone, Default)]
pub struct ExampleForm {
  active: bool,
  name: TextInput,
  value: TextInput,
  focus: Field,
  error: Option<String>,
  /// Per-field messages from the last rejected submit
  name_error: Option<String>,
  value_error: Option<String>,
  submitting: bool,
}

impl ExampleForm {
  pub fn new() -> Self {
    let mut form = Self {
      value: TextInput::numeric(),
      ..Self::default()
    };
    form.reset();
    form
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn show(&mut self) {
    self.active = true;
    self.error = None;
  }

  pub fn hide(&mut self) {
    self.active = false;
  }

  /// Back to an empty name and a zero value
  pub fn reset(&mut self) {
    self.name.clear();
    self.value.set_value("0");
    self.focus = Field::Name;
    self.clear_errors();
  }

  fn clear_errors(&mut self) {
    self.error = None;
    self.name_error = None;
    self.value_error = None;
  }

  /// Show an error under the fields
  pub fn set_error(&mut self, message: impl Into<String>) {
    self.error = Some(message.into());
  }

  /// Show each violation next to its field
  pub fn set_violations(&mut self, violations: &[FieldViolation]) {
    self.clear_errors();
    for violation in violations {
      match violation.field {
        "name" => self.name_error = Some(violation.message.clone()),
        "value" => self.value_error = Some(violation.message.clone()),
        _ => self.error = Some(format!("{}: {}", violation.field, violation.message)),
      }
    }
  }

  /// While submitting, Enter is ignored and the button says so
  pub fn set_submitting(&mut self, submitting: bool) {
    self.submitting = submitting;
  }

  fn focused_input(&mut self) -> &mut TextInput {
    match self.focus {
      Field::Name => &mut self.name,
      Field::Value => &mut self.value,
    }
  }

  fn toggle_focus(&mut self) {
    self.focus = match self.focus {
      Field::Name => Field::Value,
      Field::Value => Field::Name,
    };
  }

  fn draft(&self) -> Result<ExampleDraft, String> {
    let raw = self.value.value().trim();
    let value: f64 = raw
      .parse()
      .map_err(|_| format!("value: '{}' is not a number", raw))?;
    Ok(ExampleDraft::new(self.name.value(), value))
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc => {
        self.hide();
        return KeyResult::Event(FormEvent::Cancelled);
      }
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
        self.toggle_focus();
        return KeyResult::Handled;
      }
      KeyCode::Enter => {
        if self.submitting {
          return KeyResult::Handled;
        }
        return match self.draft() {
          Ok(draft) => KeyResult::Event(FormEvent::Submitted(draft)),
          Err(message) => {
            self.error = Some(message);
            KeyResult::Handled
          }
        };
      }
      _ => {}
    }

    match self.focused_input().handle_key(key) {
      InputResult::Consumed => {
        self.clear_errors();
        KeyResult::Handled
      }
      // Enter and Esc never reach the input
      InputResult::Submitted(_) | InputResult::Cancelled => KeyResult::Handled,
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  fn field_line<'a>(
    &self,
    label: &'a str,
    input: &'a TextInput,
    error: Option<&'a String>,
    field: Field,
  ) -> Line<'a> {
    let focused = self.focus == field;
    let label_style = if focused {
      Style::default().fg(Color::Yellow).bold()
    } else {
      Style::default().fg(Color::DarkGray)
    };

    let mut spans = vec![Span::styled(format!("{:<7}", label), label_style)];
    if focused {
      spans.extend(input.cursor_spans(Style::default().fg(Color::Yellow)));
    } else {
      spans.push(Span::raw(input.value()));
    }
    if let Some(message) = error {
      spans.push(Span::styled(format!("  {}", message), Style::default().fg(Color::Red)));
    }
    Line::from(spans)
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = 50.min(area.width);
    let height = 8.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" New example ");

    let button = if self.submitting {
      Span::styled("[ Creating... ]", Style::default().fg(Color::DarkGray))
    } else {
      Span::styled("[ Add Example ]", Style::default().fg(Color::Green).bold())
    };

    let error_line = match &self.error {
      Some(message) => Line::styled(message.clone(), Style::default().fg(Color::Red)),
      None => Line::raw(""),
    };

    let lines = vec![
      self.field_line("Name", &self.name, self.name_error.as_ref(), Field::Name),
      self.field_line("Value", &self.value, self.value_error.as_ref(), Field::Value),
      error_line,
      Line::from(vec![
        button,
        Span::styled("  Tab:switch  Esc:close", Style::default().fg(Color::DarkGray)),
      ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), overlay_area);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(form: &mut ExampleForm, s: &str) {
    for c in s.chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
  }

  fn open_form() -> ExampleForm {
    let mut form = ExampleForm::new();
    form.show();
    form
  }

  #[test]
  fn test_inactive_form_ignores_keys() {
    let mut form = ExampleForm::new();
    assert_eq!(form.handle_key(key(KeyCode::Char('a'))), KeyResult::NotHandled);
  }

  #[test]
  fn test_submit_builds_draft() {
    let mut form = open_form();
    type_str(&mut form, "widget");
    form.handle_key(key(KeyCode::Tab));
    // Replace the default 0
    form.handle_key(key(KeyCode::Backspace));
    type_str(&mut form, "12.5");

    assert_eq!(
      form.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FormEvent::Submitted(ExampleDraft::new("widget", 12.5)))
    );
  }

  #[test]
  fn test_default_value_is_zero() {
    let mut form = open_form();
    type_str(&mut form, "n");
    assert_eq!(
      form.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FormEvent::Submitted(ExampleDraft::new("n", 0.0)))
    );
  }

  #[test]
  fn test_unparseable_value_stays_in_form() {
    let mut form = open_form();
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Backspace));
    type_str(&mut form, "--");

    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    assert!(form.error.is_some());
    assert!(form.is_active());
  }

  #[test]
  fn test_negative_value_is_passed_on() {
    let mut form = open_form();
    type_str(&mut form, "c");
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Backspace));
    type_str(&mut form, "-1");

    assert_eq!(
      form.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FormEvent::Submitted(ExampleDraft::new("c", -1.0)))
    );
  }

  #[test]
  fn test_violations_attach_to_fields() {
    let mut form = open_form();
    form.set_violations(&[
      FieldViolation {
        field: "name",
        message: "must not be empty".to_string(),
      },
      FieldViolation {
        field: "value",
        message: "must be greater than or equal to 0".to_string(),
      },
    ]);
    assert_eq!(form.name_error.as_deref(), Some("must not be empty"));
    assert_eq!(
      form.value_error.as_deref(),
      Some("must be greater than or equal to 0")
    );
    assert!(form.error.is_none());

    // Editing clears them
    type_str(&mut form, "x");
    assert!(form.name_error.is_none());
    assert!(form.value_error.is_none());
  }

  #[test]
  fn test_enter_ignored_while_submitting() {
    let mut form = open_form();
    type_str(&mut form, "x");
    form.set_submitting(true);
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
  }

  #[test]
  fn test_reset_and_escape() {
    let mut form = open_form();
    type_str(&mut form, "abc");
    form.reset();
    assert_eq!(form.name.value(), "");
    assert_eq!(form.value.value(), "0");

    assert_eq!(
      form.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(FormEvent::Cancelled)
    );
    assert!(!form.is_active());
  }
}
