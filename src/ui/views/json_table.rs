use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, TableState};
use serde_json::Value;
use tracing::debug;

use crate::query::Query;
use crate::ui::ensure_valid_selection;
use crate::ui::table::{rows_of, render_table, TableModel};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Read-only table over an arbitrary endpoint.
///
/// Columns are inferred from the first row, so this works for any collection
/// the backend returns without a typed model. Responses bypass the cache.
pub struct JsonTableView {
  ctx: ViewContext,
  path: String,
  query: Query<Value>,
  table_state: TableState,
}

impl JsonTableView {
  pub fn new(ctx: ViewContext, path: &str) -> Self {
    let path = if path.starts_with('/') {
      path.to_string()
    } else {
      format!("/{}", path)
    };

    let client = ctx.api.client().clone();
    let endpoint = path.clone();
    let mut query = Query::new(move || {
      let client = client.clone();
      let endpoint = endpoint.clone();
      async move { client.get_raw(&endpoint).await }
    });
    query.fetch();

    Self {
      ctx,
      path,
      query,
      table_state: TableState::default(),
    }
  }

  fn row_count(&self) -> usize {
    self.query.latest().map(|v| rows_of(v).len()).unwrap_or(0)
  }
}

impl View for JsonTableView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.table_state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.table_state.select_last(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let mut title = format!(" {} ", self.path);
    if self.query.is_loading() {
      title.push_str("(loading...) ");
    } else if self.query.latest().is_some() {
      title = format!(" {} ({}) ", self.path, self.row_count());
    }

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let len = self.row_count();
    ensure_valid_selection(&mut self.table_state, len);

    match self.query.latest() {
      Some(body) => {
        let model = TableModel::from_json(body);
        render_table(frame, area, block, &model, None, &mut self.table_state);
      }
      None => {
        let text = match self.query.error() {
          Some(e) => format!(
            "{}\n\nPress 'r' to retry.",
            e.user_message(&format!("Failed to fetch {}", self.path))
          ),
          None => "Loading...".to_string(),
        };
        let paragraph = Paragraph::new(text)
          .block(block)
          .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
      }
    }
  }

  fn breadcrumb_label(&self) -> String {
    self.path.clone()
  }

  fn tick(&mut self) -> ViewAction {
    if self.query.poll() {
      if let Some(e) = self.query.error() {
        debug!(path = %self.path, error = %e, "raw fetch failed");
        self
          .ctx
          .toaster
          .error(e.user_message(&format!("Failed to fetch {}", self.path)));
      }
    }
    ViewAction::None
  }

  fn refresh(&mut self) {
    if self.query.is_stale() {
      self.query.refetch();
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("j/k", "move").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
