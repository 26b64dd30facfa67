use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;

/// Result of handling a key event in an input component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
  /// Key was handled, continue input mode
  Consumed,
  /// Enter pressed, here's the submitted value
  Submitted(String),
  /// Escape pressed, input cancelled
  Cancelled,
  /// Key not handled, pass to next handler
  NotHandled,
}

/// Which characters the input accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Accept {
  #[default]
  Any,
  /// Digits, sign, decimal point and exponent
  Numeric,
}

impl Accept {
  fn allows(self, c: char) -> bool {
    match self {
      Accept::Any => true,
      Accept::Numeric => c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'),
    }
  }
}

/// Reusable single-line text input.
///
/// The cursor counts characters, not bytes, so editing multi-byte text is
/// safe.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
  buffer: String,
  cursor: usize,
  accept: Accept,
}

impl TextInput {
  /// Input that only accepts characters that can appear in a number
  pub fn numeric() -> Self {
    Self {
      accept: Accept::Numeric,
      ..Self::default()
    }
  }

  /// Get the current input value
  pub fn value(&self) -> &str {
    &self.buffer
  }

  /// Replace the contents and put the cursor at the end
  pub fn set_value(&mut self, value: impl Into<String>) {
    self.buffer = value.into();
    self.cursor = self.char_len();
  }

  /// Clear the input
  pub fn clear(&mut self) {
    self.buffer.clear();
    self.cursor = 0;
  }

  /// Text before and after the cursor
  pub fn split_at_cursor(&self) -> (&str, &str) {
    self.buffer.split_at(self.byte_offset(self.cursor))
  }

  /// The text as spans, with the cursor drawn in `cursor_style`
  pub fn cursor_spans(&self, cursor_style: Style) -> Vec<Span<'_>> {
    let (before, after) = self.split_at_cursor();
    let mut rest = after.chars();
    match rest.next() {
      Some(under) => vec![
        Span::raw(before),
        Span::styled(under.to_string(), cursor_style.add_modifier(Modifier::REVERSED)),
        Span::raw(rest.as_str()),
      ],
      None => vec![Span::raw(before), Span::styled("_", cursor_style)],
    }
  }

  fn char_len(&self) -> usize {
    self.buffer.chars().count()
  }

  /// Byte offset of the character at `idx` (or the end)
  fn byte_offset(&self, idx: usize) -> usize {
    self
      .buffer
      .char_indices()
      .nth(idx)
      .map(|(i, _)| i)
      .unwrap_or(self.buffer.len())
  }

  /// Handle a key event, returning the result
  pub fn handle_key(&mut self, key: KeyEvent) -> InputResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
      KeyCode::Esc => InputResult::Cancelled,
      KeyCode::Enter => InputResult::Submitted(self.buffer.clone()),
      KeyCode::Backspace => {
        if self.cursor > 0 {
          self.cursor -= 1;
          let at = self.byte_offset(self.cursor);
          self.buffer.remove(at);
        }
        InputResult::Consumed
      }
      KeyCode::Delete => {
        if self.cursor < self.char_len() {
          let at = self.byte_offset(self.cursor);
          self.buffer.remove(at);
        }
        InputResult::Consumed
      }
      KeyCode::Left => {
        self.cursor = self.cursor.saturating_sub(1);
        InputResult::Consumed
      }
      KeyCode::Right => {
        self.cursor = (self.cursor + 1).min(self.char_len());
        InputResult::Consumed
      }
      KeyCode::Home => {
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::End => {
        self.cursor = self.char_len();
        InputResult::Consumed
      }
      KeyCode::Char('a') if ctrl => {
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::Char('e') if ctrl => {
        self.cursor = self.char_len();
        InputResult::Consumed
      }
      KeyCode::Char('u') if ctrl => {
        // Clear line before cursor
        let at = self.byte_offset(self.cursor);
        self.buffer.drain(..at);
        self.cursor = 0;
        InputResult::Consumed
      }
      KeyCode::Char('w') if ctrl => {
        // Delete word before cursor
        let at = self.byte_offset(self.cursor);
        let before = &self.buffer[..at];
        let start = before.trim_end().rfind(' ').map(|i| i + 1).unwrap_or(0);
        self.buffer.drain(start..at);
        self.cursor = self.buffer[..start].chars().count();
        InputResult::Consumed
      }
      KeyCode::Char(_) if ctrl => InputResult::NotHandled,
      KeyCode::Char(c) => {
        if self.accept.allows(c) {
          let at = self.byte_offset(self.cursor);
          self.buffer.insert(at, c);
          self.cursor += 1;
        }
        InputResult::Consumed
      }
      _ => InputResult::NotHandled,
    }
  }
}
