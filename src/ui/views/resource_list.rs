use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use futures::future::BoxFuture;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, TableState};
use tokio::sync::{oneshot, watch};
use tracing::debug;

use crate::api::{CollectionPage, MutationDispatcher, MutationError, MutationKind, Resource};
use crate::cache::{CacheResult, CacheSource, Observation};
use crate::error::ApiError;
use crate::list_query::{ListController, ListQuery};
use crate::pagination::PageWindow;
use crate::query::{Query, QueryState};
use crate::ui::components::{
  ConfirmDialog, InputResult, KeyResult, OptionPicker, PickerEvent, SearchEvent, SearchInput,
  TextInput,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::draw_pagination;
use crate::ui::table::{render_table, Tabular, TableModel};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};
use crate::ui::views::ResourceDetailView;

type Listing<R> = CacheResult<CollectionPage<R>>;

/// Opens the create (`None`) or edit form for a resource
pub type OpenForm<R> = fn(ViewContext, Option<R>) -> Box<dyn View>;

struct PendingMutation {
  kind: MutationKind,
  rx: oneshot::Receiver<Result<Option<String>, MutationError>>,
}

fn list_fetcher<R: Resource>(
  api: crate::api::CachedApi,
  query: ListQuery,
) -> impl Fn() -> BoxFuture<'static, Result<Listing<R>, ApiError>> + Send + Sync + 'static {
  move || {
    let api = api.clone();
    let query = query.clone();
    Box::pin(async move { api.list::<R>(&query).await })
  }
}

/// Paginated, searchable table of one resource.
///
/// The controller owns the list parameters; whenever they change the query is
/// re-keyed and the new page is observed in the cache. Mutations run in the
/// background and report back through oneshot channels polled on tick.
pub struct ResourceListView<R: Resource + Tabular> {
  ctx: ViewContext,
  controller: ListController,
  query: Query<Listing<R>>,
  _observation: Observation,
  invalidations: watch::Receiver<u64>,
  table_state: TableState,
  search: SearchInput,
  limit_input: Option<TextInput>,
  picker: OptionPicker,
  confirm: ConfirmDialog,
  mutations: Vec<PendingMutation>,
  editor: Option<OpenForm<R>>,
}

impl<R: Resource + Tabular> ResourceListView<R> {
  pub fn new(ctx: ViewContext) -> Self {
    let controller = ListController::new(
      R::DEFAULT_SORT,
      R::DEFAULT_ORDER,
      ctx.ui.page_size,
      ctx.ui.debounce(),
    );
    let api = ctx.api.clone();
    let observation = api.observe_list::<R>(controller.query());
    let invalidations = api.subscribe();
    let stale_time = api.stale_time();

    let mut query = Query::new(list_fetcher::<R>(api, controller.query().clone()))
      .with_stale_time(stale_time);
    query.fetch();

    Self {
      ctx,
      controller,
      query,
      _observation: observation,
      invalidations,
      table_state: TableState::default(),
      search: SearchInput::new(),
      limit_input: None,
      picker: OptionPicker::new(),
      confirm: ConfirmDialog::new(),
      mutations: Vec::new(),
      editor: None,
    }
  }

  /// Enable create and edit through `open`
  pub fn with_editor(mut self, open: OpenForm<R>) -> Self {
    self.editor = Some(open);
    self
  }

  pub fn controller(&self) -> &ListController {
    &self.controller
  }

  fn page(&self) -> Option<&CollectionPage<R>> {
    self.query.latest().map(|result| &result.data)
  }

  fn items(&self) -> &[R] {
    self.page().map(|p| p.items.as_slice()).unwrap_or(&[])
  }

  fn total_pages(&self) -> u32 {
    self.page().map(|p| p.total_pages).unwrap_or(1)
  }

  fn selected(&self) -> Option<&R> {
    self.table_state.selected().and_then(|i| self.items().get(i))
  }

  /// Re-key the query after the controller changed
  fn reload(&mut self) {
    let api = self.ctx.api.clone();
    let query = self.controller.query().clone();
    debug!(resource = R::TAG, page = query.page, search = %query.search, "list query changed");

    self._observation = api.observe_list::<R>(&query);
    self.query.refetch_with(list_fetcher::<R>(api, query));
    self.table_state.select(Some(0));
  }

  fn refresh_now(&mut self) {
    self.ctx.api.invalidate(&[R::TAG]);
    // No cached page to invalidate (the last fetch failed), so fetch directly
    if !self.ctx.api.is_list_invalidated::<R>(self.controller.query()) {
      self.query.refetch();
    }
  }

  fn spawn_mutation<F>(&mut self, kind: MutationKind, work: F)
  where
    F: std::future::Future<Output = Result<Option<String>, MutationError>> + Send + 'static,
  {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(work.await);
    });
    self.mutations.push(PendingMutation { kind, rx });
  }

  fn delete(&mut self, id: String) {
    let dispatcher = MutationDispatcher::<R>::new(self.ctx.api.clone());
    self.spawn_mutation(MutationKind::Delete, async move { dispatcher.delete(&id).await });
  }

  fn set_status(&mut self, id: String, status: String) {
    let dispatcher = MutationDispatcher::<R>::new(self.ctx.api.clone());
    self.spawn_mutation(MutationKind::Status, async move {
      dispatcher.update_status(&id, &status).await.map(|_| None)
    });
  }

  fn poll_mutations(&mut self) {
    let toaster = self.ctx.toaster.clone();
    self.mutations.retain_mut(|pending| match pending.rx.try_recv() {
      Ok(Ok(message)) => {
        toaster.success(message.unwrap_or_else(|| pending.kind.success_message(R::LABEL)));
        false
      }
      Ok(Err(e)) => {
        toaster.error(e.toast_message(pending.kind, R::LABEL));
        false
      }
      Err(oneshot::error::TryRecvError::Empty) => true,
      Err(oneshot::error::TryRecvError::Closed) => {
        toaster.error(format!("Failed to {} {}", pending.kind.verb(), R::LABEL));
        false
      }
    });
  }

  fn on_query_settled(&mut self) {
    match self.query.state() {
      QueryState::Error(e) => {
        let fallback = format!("Failed to fetch {}", R::PLURAL);
        self.ctx.toaster.error(e.user_message(&fallback));
      }
      QueryState::Success(result) => {
        let total = result.data.total_pages;
        let offline = result.source == CacheSource::Offline;

        // The page can vanish under us, e.g. after deleting the last row
        if total > 0 && self.controller.page() > total && self.controller.go_to_page(total, total) {
          self.reload();
        } else if !offline && self.ctx.api.is_list_invalidated::<R>(self.controller.query()) {
          // A mutation landed while this page was on the wire
          debug!(resource = R::TAG, "page invalidated in flight, refetching");
          self.query.refetch();
        }
      }
      _ => {}
    }
  }

  fn status_of(item: &R) -> Option<String> {
    let (field, _) = R::STATUS?;
    serde_json::to_value(item)
      .ok()?
      .get(field)?
      .as_str()
      .map(str::to_string)
  }

  fn row_label(item: &R) -> String {
    R::columns()
      .first()
      .map(|col| (col.value)(item))
      .filter(|v| !v.is_empty())
      .unwrap_or_else(|| item.id().to_string())
  }

  // Key handling helpers for or_else chain pattern
  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.confirm.handle_key(key) {
      KeyResult::Event(id) => {
        self.delete(id);
        return Some(ViewAction::None);
      }
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    match self.picker.handle_key(key) {
      KeyResult::Event(PickerEvent::Selected(status)) => {
        if let Some(id) = self.selected().map(|r| r.id().to_string()) {
          self.set_status(id, status);
        }
        return Some(ViewAction::None);
      }
      KeyResult::Event(PickerEvent::Cancelled) | KeyResult::Handled => {
        return Some(ViewAction::None)
      }
      KeyResult::NotHandled => {}
    }

    if let Some(input) = &mut self.limit_input {
      match input.handle_key(key) {
        InputResult::Submitted(text) => {
          self.limit_input = None;
          match self.controller.set_limit_input(&text) {
            Ok(true) => self.reload(),
            Ok(false) => {}
            Err(e) => self.ctx.toaster.error(e.to_string()),
          }
        }
        InputResult::Cancelled => self.limit_input = None,
        InputResult::Consumed | InputResult::NotHandled => {}
      }
      return Some(ViewAction::None);
    }

    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(raw)) => {
        self.controller.set_search(raw, Instant::now());
        Some(ViewAction::None)
      }
      KeyResult::Event(SearchEvent::Submitted(raw)) => {
        self.controller.set_search(raw, Instant::now());
        if self.controller.commit_search() {
          self.reload();
        }
        Some(ViewAction::None)
      }
      KeyResult::Handled => Some(ViewAction::None),
      KeyResult::NotHandled => None,
    }
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    let changed = match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.table_state.select_next();
        false
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.table_state.select_previous();
        false
      }
      KeyCode::Char('g') | KeyCode::Home => {
        self.table_state.select_first();
        false
      }
      KeyCode::Char('G') | KeyCode::End => {
        self.table_state.select_last();
        false
      }
      KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => {
        let total = self.total_pages();
        self.controller.next_page(total)
      }
      KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => self.controller.prev_page(),
      _ => return None,
    };
    if changed {
      self.reload();
    }
    Some(ViewAction::None)
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
      return None;
    }

    match key.code {
      KeyCode::Char('s') => {
        let fields = R::SORT_FIELDS;
        let next = fields
          .iter()
          .position(|f| *f == self.controller.sort_field())
          .map(|i| fields[(i + 1) % fields.len()])
          .unwrap_or(R::DEFAULT_SORT);
        self.controller.sort_by(next);
        self.reload();
        Some(ViewAction::None)
      }
      KeyCode::Char('S') => {
        let field = self.controller.sort_field().to_string();
        self.controller.sort_by(&field);
        self.reload();
        Some(ViewAction::None)
      }
      KeyCode::Char('L') => {
        self.limit_input = Some(TextInput::with_value(self.controller.limit().to_string()));
        Some(ViewAction::None)
      }
      KeyCode::Char('r') => {
        self.refresh_now();
        Some(ViewAction::None)
      }
      KeyCode::Enter => {
        let id = self.selected()?.id().to_string();
        Some(ViewAction::Push(Box::new(ResourceDetailView::<R>::new(
          self.ctx.clone(),
          id,
        ))))
      }
      KeyCode::Char('c') => {
        let open = self.editor?;
        Some(ViewAction::Push(open(self.ctx.clone(), None)))
      }
      KeyCode::Char('e') => {
        let open = self.editor?;
        let item = self.selected()?.clone();
        Some(ViewAction::Push(open(self.ctx.clone(), Some(item))))
      }
      KeyCode::Char('d') if R::DELETABLE => {
        let item = self.selected()?;
        let prompt = format!("Delete {} '{}'?", R::LABEL.to_lowercase(), Self::row_label(item));
        let id = item.id().to_string();
        self.confirm.ask(id, prompt);
        Some(ViewAction::None)
      }
      KeyCode::Char('a') => {
        let (_, options) = R::STATUS?;
        let current = self.selected().and_then(Self::status_of)?;
        self.picker.show("Set status", options, &current);
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc => {
        self.controller.cancel_pending();
        Some(ViewAction::Pop)
      }
      _ => None,
    }
  }

  fn title(&self) -> String {
    let mut title = format!(" {}", R::PLURAL);
    if let Some(page) = self.page() {
      title.push_str(&format!(" ({})", page.total_items));
    }
    if self.controller.is_search_pending() {
      title.push_str(&format!(" search: '{}'...", self.controller.raw_search()));
    } else if !self.controller.search().is_empty() {
      title.push_str(&format!(" search: '{}'", self.controller.search()));
    }
    match self.query.state() {
      QueryState::Loading => title.push_str(" (loading...)"),
      QueryState::Error(_) => title.push_str(" (error, r to retry)"),
      QueryState::Success(result) if result.source == CacheSource::Offline => {
        title.push_str(" [offline]")
      }
      _ => {}
    }
    title.push(' ');
    title
  }

  fn render_limit_input(&self, frame: &mut Frame, area: Rect) {
    let Some(input) = &self.limit_input else {
      return;
    };
    let width = 30.min(area.width);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width.saturating_sub(1), 3);
    frame.render_widget(Clear, overlay_area);

    let line = Line::from(vec![
      Span::raw(input.value()),
      Span::styled("_", Style::default().fg(Color::Yellow)),
    ]);
    let paragraph = Paragraph::new(line).block(
      Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Rows per page "),
    );
    frame.render_widget(paragraph, overlay_area);
  }
}

impl<R: Resource + Tabular> View for ResourceListView<R> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_overlays(key)
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(3), Constraint::Length(1)])
      .split(area);

    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let len = self.items().len();
    ensure_valid_selection(&mut self.table_state, len);

    if self.page().is_none() {
      let text = if self.query.is_error() {
        format!("Failed to load {}. Press 'r' to retry.", R::PLURAL.to_lowercase())
      } else {
        "Loading...".to_string()
      };
      let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, chunks[0]);
    } else {
      let model = TableModel::from_items(self.items());
      let sort = Some((self.controller.sort_field(), self.controller.sort_order()));
      render_table(frame, chunks[0], block, &model, sort, &mut self.table_state);

      if let Some(page) = self.page() {
        let window = PageWindow::new(
          page.current_page,
          page.total_pages,
          page.total_items,
          self.controller.limit(),
        );
        draw_pagination(frame, chunks[1], &window);
      }
    }

    self.search.render_overlay(frame, area);
    self.render_limit_input(frame, area);
    self.picker.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    R::PLURAL.to_string()
  }

  fn tick(&mut self) -> ViewAction {
    if self.controller.poll(Instant::now()) {
      self.reload();
    }

    if self.invalidations.has_changed().unwrap_or(false) {
      self.invalidations.borrow_and_update();
      if self.ctx.api.is_list_invalidated::<R>(self.controller.query()) {
        debug!(resource = R::TAG, "list invalidated, refetching");
        self.query.refetch();
      }
    }

    if self.query.poll() {
      self.on_query_settled();
    }

    self.poll_mutations();
    ViewAction::None
  }

  fn refresh(&mut self) {
    if self.query.is_stale() {
      self.refresh_now();
    }
  }

  fn is_capturing_input(&self) -> bool {
    self.search.is_active()
      || self.limit_input.is_some()
      || self.picker.is_active()
      || self.confirm.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("s/S", "sort").with_priority(30),
      ShortcutInfo::new("h/l", "page").with_priority(31),
      ShortcutInfo::new("L", "rows").with_priority(32),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
      ShortcutInfo::new("Enter", "apply").when_active(),
      ShortcutInfo::new("Esc", "cancel").when_active(),
    ];
    if self.editor.is_some() {
      shortcuts.push(ShortcutInfo::new("c", "create").with_priority(50));
      shortcuts.push(ShortcutInfo::new("e", "edit").with_priority(51));
    }
    if R::DELETABLE {
      shortcuts.push(ShortcutInfo::new("d", "delete").with_priority(52));
    }
    if R::STATUS.is_some() {
      shortcuts.push(ShortcutInfo::new("a", "status").with_priority(53));
    }
    shortcuts
  }
}
