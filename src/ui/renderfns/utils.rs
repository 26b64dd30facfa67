use chrono::{DateTime, Local, Utc};

/// Truncate a string to a maximum number of characters, adding "..." if
/// truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Render a value without a trailing ".0" for whole numbers
pub fn format_value(value: f64) -> String {
  if value.fract() == 0.0 && value.abs() < 1e15 {
    format!("{}", value as i64)
  } else {
    format!("{}", value)
  }
}

/// Calendar date in the local timezone
pub fn format_date(at: &DateTime<Utc>) -> String {
  at.with_timezone(&Local).format("%Y-%m-%d").to_string()
}
