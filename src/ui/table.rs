//! Generic tabular rendering for resource collections.
//!
//! Resources describe their columns with `Column<T>` descriptors. Untyped JSON
//! can still be shown: `infer_columns` derives the columns from the first row.
//! Both paths produce a `TableModel`, which `render_table` draws with a
//! column count that degrades on narrow terminals.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Cell, Paragraph, Row, Table, TableState};
use serde_json::Value;

use crate::list_query::SortOrder;
use crate::ui::renderfns::{file_name, truncate};

/// Below this width (terminal cells) only one column is shown
pub const SMALL_BREAKPOINT: u16 = 64;
/// Below this width two columns are shown
pub const MEDIUM_BREAKPOINT: u16 = 77;

pub const HIDDEN_COLUMNS_NOTE: &str = "Some columns are hidden. Widen the terminal to see them all.";
pub const EMPTY_TEXT: &str = "No data available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
  Text,
  /// Rendered as `[img] <file name>`
  Image,
  Link,
}

impl CellKind {
  /// Kind implied by a field name
  pub fn for_key(key: &str) -> Self {
    let key = key.to_lowercase();
    if ["thumbnail", "image", "avatar"].iter().any(|k| key.contains(k)) {
      CellKind::Image
    } else if ["sample", "url", "link"].iter().any(|k| key.contains(k)) {
      CellKind::Link
    } else {
      CellKind::Text
    }
  }
}

/// Column of a typed resource table
pub struct Column<T> {
  /// Wire field name, matched against the sort field
  pub key: &'static str,
  pub label: &'static str,
  pub kind: CellKind,
  pub value: fn(&T) -> String,
}

impl<T> Column<T> {
  pub const fn text(key: &'static str, label: &'static str, value: fn(&T) -> String) -> Self {
    Self {
      key,
      label,
      kind: CellKind::Text,
      value,
    }
  }

  pub const fn image(key: &'static str, label: &'static str, value: fn(&T) -> String) -> Self {
    Self {
      key,
      label,
      kind: CellKind::Image,
      value,
    }
  }

  pub const fn link(key: &'static str, label: &'static str, value: fn(&T) -> String) -> Self {
    Self {
      key,
      label,
      kind: CellKind::Link,
      value,
    }
  }
}

/// Types that know how to lay themselves out as table rows
pub trait Tabular: Sized {
  fn columns() -> Vec<Column<Self>>;
}

/// Column header after descriptors or inference are resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
  pub key: String,
  pub label: String,
  pub kind: CellKind,
}

/// Column headers plus raw (untruncated) cell values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableModel {
  pub columns: Vec<ColumnSpec>,
  pub rows: Vec<Vec<String>>,
}

impl TableModel {
  pub fn from_items<T: Tabular>(items: &[T]) -> Self {
    let columns = T::columns();
    let rows = items
      .iter()
      .map(|item| columns.iter().map(|c| (c.value)(item)).collect())
      .collect();
    Self {
      columns: columns
        .iter()
        .map(|c| ColumnSpec {
          key: c.key.to_string(),
          label: c.label.to_string(),
          kind: c.kind,
        })
        .collect(),
      rows,
    }
  }

  /// Build from arbitrary JSON: a bare array, `{ data: [...] }` or a
  /// paginated `{ data: { items: [...] } }`
  pub fn from_json(value: &Value) -> Self {
    let rows = rows_of(value);
    let columns = infer_columns(rows);
    let rows = rows
      .iter()
      .map(|row| {
        columns
          .iter()
          .map(|c| row.get(&c.key).map(json_cell).unwrap_or_default())
          .collect()
      })
      .collect();
    Self { columns, rows }
  }

  pub fn is_empty(&self) -> bool {
    self.columns.is_empty() || self.rows.is_empty()
  }
}

/// Rows of a bare array or of an object wrapping a `data` array
pub fn rows_of(value: &Value) -> &[Value] {
  match value {
    Value::Array(rows) => rows,
    Value::Object(map) => match map.get("data").or_else(|| map.get("items")) {
      Some(Value::Array(rows)) => rows,
      Some(inner @ Value::Object(_)) => rows_of(inner),
      _ => &[],
    },
    _ => &[],
  }
}

/// Columns from the keys of the first row, minus arrays and the identifier
pub fn infer_columns(rows: &[Value]) -> Vec<ColumnSpec> {
  let Some(Value::Object(first)) = rows.first() else {
    return Vec::new();
  };

  first
    .iter()
    .filter(|(key, value)| !matches!(key.as_str(), "_id" | "id") && !value.is_array())
    .map(|(key, _)| ColumnSpec {
      key: key.clone(),
      label: humanize(key),
      kind: CellKind::for_key(key),
    })
    .collect()
}

/// `jobTitle` -> `Job Title`
pub fn humanize(key: &str) -> String {
  let mut out = String::new();
  for (i, c) in key.trim_start_matches('_').chars().enumerate() {
    if i == 0 {
      out.extend(c.to_uppercase());
    } else if c == '_' {
      out.push(' ');
    } else if c.is_uppercase() {
      out.push(' ');
      out.push(c);
    } else {
      out.push(c);
    }
  }
  out
}

/// Plain text for a JSON scalar; arrays are joined, objects shown compact
pub fn json_cell(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::Bool(true) => "Yes".to_string(),
    Value::Bool(false) => "No".to_string(),
    Value::Number(n) => n.to_string(),
    Value::String(s) => s.clone(),
    Value::Array(items) => items.iter().map(json_cell).collect::<Vec<_>>().join(", "),
    Value::Object(_) => value.to_string(),
  }
}

/// Width class of the area a table is drawn in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewport {
  Small,
  Medium,
  Large,
}

impl Viewport {
  pub fn from_width(width: u16) -> Self {
    if width < SMALL_BREAKPOINT {
      Viewport::Small
    } else if width < MEDIUM_BREAKPOINT {
      Viewport::Medium
    } else {
      Viewport::Large
    }
  }

  pub fn visible_columns(self, total: usize) -> usize {
    match self {
      Viewport::Small => total.min(1),
      Viewport::Medium => total.min(2),
      Viewport::Large => total,
    }
  }

  pub fn cell_width(self) -> usize {
    match self {
      Viewport::Small => 10,
      _ => 20,
    }
  }
}

/// Display text for one cell
pub fn format_cell(kind: CellKind, raw: &str, viewport: Viewport) -> String {
  let max = viewport.cell_width();
  match kind {
    CellKind::Image if raw.is_empty() => String::new(),
    CellKind::Image => format!("[img] {}", truncate(file_name(raw), max)),
    CellKind::Text | CellKind::Link => truncate(raw, max),
  }
}

/// Draw `model` into `area`, or "No data available" when it is empty.
pub fn render_table(
  frame: &mut Frame,
  area: Rect,
  block: Block,
  model: &TableModel,
  sort: Option<(&str, SortOrder)>,
  state: &mut TableState,
) {
  if model.is_empty() {
    let paragraph = Paragraph::new(EMPTY_TEXT)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let inner = block.inner(area);
  frame.render_widget(block, area);

  let viewport = Viewport::from_width(inner.width);
  let shown = viewport.visible_columns(model.columns.len());
  let hidden = shown < model.columns.len();

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Min(1),
      Constraint::Length(if hidden { 1 } else { 0 }),
    ])
    .split(inner);

  let header = Row::new(model.columns.iter().take(shown).map(|c| {
    let label = match sort {
      Some((field, order)) if field == c.key => format!("{} {}", c.label, order.arrow()),
      _ => c.label.clone(),
    };
    Cell::from(label)
  }))
  .style(Style::default().fg(Color::Yellow).bold());

  let rows = model.rows.iter().map(|row| {
    Row::new(
      model
        .columns
        .iter()
        .zip(row)
        .take(shown)
        .map(|(col, raw)| {
          let text = format_cell(col.kind, raw, viewport);
          match col.kind {
            CellKind::Link => Cell::from(text).style(Style::default().fg(Color::Blue).underlined()),
            CellKind::Image => Cell::from(text).style(Style::default().fg(Color::Magenta)),
            CellKind::Text => Cell::from(text),
          }
        }),
    )
  });

  let widths = vec![Constraint::Fill(1); shown];
  let table = Table::new(rows, widths)
    .header(header)
    .row_highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  frame.render_stateful_widget(table, chunks[0], state);

  if hidden {
    let note = Paragraph::new(HIDDEN_COLUMNS_NOTE).style(Style::default().fg(Color::DarkGray).italic());
    frame.render_widget(note, chunks[1]);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ratatui::backend::TestBackend;
  use ratatui::widgets::Borders;
  use serde_json::json;

  fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    buffer
      .content()
      .chunks(buffer.area.width as usize)
      .map(|line| line.iter().map(|c| c.symbol()).collect::<String>())
      .collect::<Vec<_>>()
      .join("\n")
  }

  #[test]
  fn test_infer_columns_skips_arrays_and_id() {
    let rows = vec![json!({
      "_id": "1",
      "jobTitle": "Engineer",
      "skillsRequired": ["TS"],
      "thumbnail": "https://cdn.example.com/t.png",
      "sampleReport": "https://cdn.example.com/r.pdf"
    })];
    let columns = infer_columns(&rows);
    let keys: Vec<_> = columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["jobTitle", "thumbnail", "sampleReport"]);
    assert_eq!(columns[0].label, "Job Title");
    assert_eq!(columns[1].kind, CellKind::Image);
    assert_eq!(columns[2].kind, CellKind::Link);
  }

  #[test]
  fn test_infer_columns_uses_first_row_only() {
    let rows = vec![json!({"id": 1, "name": "A"}), json!({"name": "B", "extra": true})];
    let columns = infer_columns(&rows);
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].key, "name");
  }

  #[test]
  fn test_empty_input_has_no_columns() {
    assert!(infer_columns(&[]).is_empty());
    assert!(TableModel::from_json(&json!([])).is_empty());
    assert!(TableModel::from_json(&json!({"message": "nothing"})).is_empty());
  }

  #[test]
  fn test_from_json_accepts_data_wrapper() {
    let model = TableModel::from_json(&json!({
      "data": [{"_id": "1", "name": "Asha", "active": true}, {"_id": "2", "name": "Ravi"}]
    }));
    assert_eq!(model.columns.len(), 2);
    assert_eq!(model.rows[0], vec!["Asha", "Yes"]);
    assert_eq!(model.rows[1], vec!["Ravi", ""]);
  }

  #[test]
  fn test_from_json_unwraps_paginated_items() {
    let model = TableModel::from_json(&json!({
      "success": true,
      "data": {"items": [{"_id": "p1", "title": "Puzzle"}], "currentPage": 1}
    }));
    assert_eq!(model.columns.len(), 1);
    assert_eq!(model.rows, vec![vec!["Puzzle".to_string()]]);
  }

  #[test]
  fn test_viewport_breakpoints() {
    assert_eq!(Viewport::from_width(63), Viewport::Small);
    assert_eq!(Viewport::from_width(64), Viewport::Medium);
    assert_eq!(Viewport::from_width(76), Viewport::Medium);
    assert_eq!(Viewport::from_width(77), Viewport::Large);
    assert_eq!(Viewport::Small.visible_columns(5), 1);
    assert_eq!(Viewport::Medium.visible_columns(5), 2);
    assert_eq!(Viewport::Large.visible_columns(5), 5);
    assert_eq!(Viewport::Medium.visible_columns(1), 1);
  }

  #[test]
  fn test_format_cell() {
    let long = "A very long job description";
    assert_eq!(format_cell(CellKind::Text, long, Viewport::Small), "A very ...");
    assert_eq!(
      format_cell(CellKind::Text, long, Viewport::Large),
      "A very long job d..."
    );
    assert_eq!(
      format_cell(
        CellKind::Image,
        "https://cdn.example.com/up/thumb.png",
        Viewport::Large
      ),
      "[img] thumb.png"
    );
    assert_eq!(format_cell(CellKind::Image, "", Viewport::Large), "");
  }

  #[test]
  fn test_humanize() {
    assert_eq!(humanize("jobTitle"), "Job Title");
    assert_eq!(humanize("created_at"), "Created at");
    assert_eq!(humanize("name"), "Name");
  }

  #[test]
  fn test_render_empty_model() {
    let mut terminal = Terminal::new(TestBackend::new(40, 5)).unwrap();
    terminal
      .draw(|frame| {
        let mut state = TableState::default();
        render_table(
          frame,
          frame.area(),
          Block::default().borders(Borders::ALL),
          &TableModel::default(),
          None,
          &mut state,
        );
      })
      .unwrap();
    assert!(buffer_text(&terminal).contains(EMPTY_TEXT));
  }

  #[test]
  fn test_render_narrow_hides_columns() {
    let model = TableModel::from_json(&json!([{"name": "Asha", "email": "asha@example.com"}]));
    let mut terminal = Terminal::new(TestBackend::new(40, 6)).unwrap();
    terminal
      .draw(|frame| {
        let mut state = TableState::default();
        render_table(
          frame,
          frame.area(),
          Block::default(),
          &model,
          Some(("name", SortOrder::Asc)),
          &mut state,
        );
      })
      .unwrap();
    let text = buffer_text(&terminal);
    assert!(text.contains("Name ▲"));
    assert!(!text.contains("Email"));
    assert!(text.contains("Some columns are hidden"));
  }

  #[test]
  fn test_render_wide_shows_all_columns() {
    let model = TableModel::from_json(&json!([{"name": "Asha", "email": "asha@example.com"}]));
    let mut terminal = Terminal::new(TestBackend::new(100, 6)).unwrap();
    terminal
      .draw(|frame| {
        let mut state = TableState::default();
        render_table(frame, frame.area(), Block::default(), &model, None, &mut state);
      })
      .unwrap();
    let text = buffer_text(&terminal);
    assert!(text.contains("Email"));
    assert!(!text.contains("Some columns are hidden"));
  }
}
