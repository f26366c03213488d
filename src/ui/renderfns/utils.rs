use ratatui::prelude::Color;

/// Truncate to at most `max_len` characters, ending with "..." when cut
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a call request status
pub fn status_color(status: &str) -> Color {
  match status {
    "completed" => Color::Green,
    "in-progress" => Color::Yellow,
    "cancelled" => Color::Red,
    _ => Color::White,
  }
}

/// `2024-03-01T10:00:00.000Z` -> `2024-03-01`; other input is returned as is
pub fn short_date(raw: &str) -> String {
  chrono::DateTime::parse_from_rfc3339(raw)
    .map(|d| d.format("%Y-%m-%d").to_string())
    .unwrap_or_else(|_| raw.to_string())
}

/// Last path segment of a URL, without query string
pub fn file_name(url: &str) -> &str {
  let path = url.split(['?', '#']).next().unwrap_or(url);
  path
    .trim_end_matches('/')
    .rsplit('/')
    .next()
    .unwrap_or(path)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("कार्यशाला प्रश्न", 6), "कार...");
  }

  #[test]
  fn test_status_color() {
    assert_eq!(status_color("completed"), Color::Green);
    assert_eq!(status_color("in-progress"), Color::Yellow);
    assert_eq!(status_color("pending"), Color::White);
  }

  #[test]
  fn test_short_date() {
    assert_eq!(short_date("2024-03-01T10:00:00.000Z"), "2024-03-01");
    assert_eq!(short_date("yesterday"), "yesterday");
  }

  #[test]
  fn test_file_name() {
    assert_eq!(
      file_name("https://cdn.example.com/uploads/thumb.png?v=2"),
      "thumb.png"
    );
    assert_eq!(file_name("thumb.png"), "thumb.png");
  }
}
