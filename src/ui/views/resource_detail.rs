use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use serde_json::Value;
use tokio::sync::watch;

use crate::api::Resource;
use crate::cache::{CacheResult, CacheSource, Observation};
use crate::query::{Query, QueryState};
use crate::ui::table::{humanize, json_cell, CellKind, EMPTY_TEXT};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Every field of a single record, one per line
pub struct ResourceDetailView<R: Resource> {
  ctx: ViewContext,
  id: String,
  query: Query<CacheResult<R>>,
  _observation: Observation,
  invalidations: watch::Receiver<u64>,
  scroll: u16,
}

impl<R: Resource> ResourceDetailView<R> {
  pub fn new(ctx: ViewContext, id: String) -> Self {
    let api = ctx.api.clone();
    let observation = api.observe_detail::<R>(&id);
    let invalidations = api.subscribe();
    let stale_time = api.stale_time();

    let record_id = id.clone();
    let mut query = Query::new(move || {
      let api = api.clone();
      let id = record_id.clone();
      async move { api.get::<R>(&id).await }
    })
    .with_stale_time(stale_time);
    query.fetch();

    Self {
      ctx,
      id,
      query,
      _observation: observation,
      invalidations,
      scroll: 0,
    }
  }

  fn fields(record: &R) -> Vec<(String, Value)> {
    match serde_json::to_value(record) {
      Ok(Value::Object(map)) => map
        .into_iter()
        .filter(|(key, _)| !matches!(key.as_str(), "_id" | "id"))
        .collect(),
      _ => Vec::new(),
    }
  }

  fn field_lines(record: &R) -> Vec<Line<'static>> {
    Self::fields(record)
      .into_iter()
      .map(|(key, value)| {
        let text = json_cell(&value);
        let style = match CellKind::for_key(&key) {
          CellKind::Link => Style::default().fg(Color::Blue).underlined(),
          CellKind::Image => Style::default().fg(Color::Magenta),
          CellKind::Text => Style::default(),
        };
        Line::from(vec![
          Span::styled(format!("{:<18}", humanize(&key)), Style::default().fg(Color::DarkGray)),
          Span::styled(text, style),
        ])
      })
      .collect()
  }

  fn refresh_now(&mut self) {
    self.ctx.api.invalidate(&[R::TAG]);
    // Nothing cached after a failed fetch, so invalidation alone does nothing
    if !self.ctx.api.is_detail_invalidated::<R>(&self.id) {
      self.query.refetch();
    }
  }

  fn render_detail(&self, frame: &mut Frame, area: Rect) {
    let title = match self.query.state() {
      QueryState::Loading => format!(" {} (loading...) ", R::LABEL),
      QueryState::Success(result) if result.source == CacheSource::Offline => {
        format!(" {} [offline] ", R::LABEL)
      }
      _ => format!(" {} ", R::LABEL),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = match (self.query.latest(), self.query.error()) {
      (Some(result), _) => Paragraph::new(Self::field_lines(&result.data))
        .wrap(Wrap { trim: false })
        .scroll((self.scroll, 0)),
      (None, Some(error)) if error.is_not_found() => {
        Paragraph::new(EMPTY_TEXT).style(Style::default().fg(Color::DarkGray))
      }
      (None, Some(error)) => Paragraph::new(format!(
        "{}\n\nPress 'r' to retry.",
        error.user_message(&format!("Failed to fetch {}", R::LABEL.to_lowercase()))
      ))
      .style(Style::default().fg(Color::Red)),
      (None, None) => Paragraph::new("Loading...").style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(paragraph, inner);
  }
}

impl<R: Resource> View for ResourceDetailView<R> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.scroll = self.scroll.saturating_add(1);
        ViewAction::None
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.scroll = self.scroll.saturating_sub(1);
        ViewAction::None
      }
      KeyCode::Char('r') => {
        self.refresh_now();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_detail(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.id.clone()
  }

  fn tick(&mut self) -> ViewAction {
    if self.invalidations.has_changed().unwrap_or(false) {
      self.invalidations.borrow_and_update();
      if self.ctx.api.is_detail_invalidated::<R>(&self.id) {
        self.query.refetch();
      }
    }
    if self.query.poll() {
      // Invalidated while the request was on the wire
      let online =
        matches!(self.query.state(), QueryState::Success(r) if r.source != CacheSource::Offline);
      if online && self.ctx.api.is_detail_invalidated::<R>(&self.id) {
        self.query.refetch();
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
      ShortcutInfo::new("j/k", "scroll").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
