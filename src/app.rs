use crate::api::types::{
  Application, AssessmentReport, CallRequest, Employee, Job, Product, User, WorkshopEnquiry,
};
use crate::api::CachedApi;
use crate::commands;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::tasks::PeriodicTask;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult, Toast, Toaster, Toasts};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{ShortcutVisibility, View, ViewAction, ViewContext};
use crate::ui::views::{JsonTableView, ResourceFormView, ResourceListView};
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const TICK_RATE: Duration = Duration::from_millis(100);
const GC_PERIOD_MAX: Duration = Duration::from_secs(60);

/// Main application state
pub struct App {
  config: Config,
  ctx: ViewContext,
  /// Navigation stack; the root is a resource list
  views: Vec<Box<dyn View>>,
  command: CommandInput,
  toasts: Toasts,
  toast_rx: mpsc::UnboundedReceiver<Toast>,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, api: CachedApi) -> Self {
    let (toaster, toast_rx) = Toaster::channel();
    let ctx = ViewContext {
      api,
      ui: config.ui.clone(),
      toaster,
    };

    Self {
      config,
      ctx,
      views: Vec::new(),
      command: CommandInput::new(),
      toasts: Toasts::new(),
      toast_rx,
      should_quit: false,
    }
  }

  /// List view for a command name, or `None` if it names no resource
  fn resource_view(&self, name: &str) -> Option<Box<dyn View>> {
    let ctx = self.ctx.clone();
    let view: Box<dyn View> = match name {
      "jobs" => Box::new(ResourceListView::<Job>::new(ctx).with_editor(ResourceFormView::<Job>::open)),
      "applications" => Box::new(ResourceListView::<Application>::new(ctx)),
      "employees" => Box::new(
        ResourceListView::<Employee>::new(ctx).with_editor(ResourceFormView::<Employee>::open),
      ),
      "users" => Box::new(ResourceListView::<User>::new(ctx)),
      "products" => Box::new(
        ResourceListView::<Product>::new(ctx).with_editor(ResourceFormView::<Product>::open),
      ),
      "enquiries" => Box::new(ResourceListView::<WorkshopEnquiry>::new(ctx)),
      "calls" => Box::new(ResourceListView::<CallRequest>::new(ctx)),
      "assessments" => Box::new(ResourceListView::<AssessmentReport>::new(ctx)),
      _ => return None,
    };
    Some(view)
  }

  /// Replace the whole stack with the list for `name` (name or alias)
  pub fn open_resource(&mut self, name: &str) -> Result<()> {
    let command = commands::find(name).ok_or_else(|| eyre!("Unknown resource '{}'", name))?;
    let view = self
      .resource_view(command.name)
      .ok_or_else(|| eyre!("'{}' is not a resource", command.name))?;
    info!(resource = command.name, "opening resource");
    self.views = vec![view];
    Ok(())
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode().map_err(|e| eyre!("Failed to enable raw mode: {}", e))?;
    stdout()
      .execute(EnterAlternateScreen)
      .map_err(|e| eyre!("Failed to enter alternate screen: {}", e))?;

    let result = self.event_loop().await;

    // Cleanup terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(TICK_RATE);

    let cache = self.ctx.api.cache().clone();
    let gc_period = Duration::from_secs(self.config.cache.gc_secs.max(1)).min(GC_PERIOD_MAX);
    let gc = PeriodicTask::spawn("cache-gc", gc_period, move || {
      let evicted = cache.collect_garbage();
      if evicted > 0 {
        debug!(evicted, remaining = cache.len(), "cache garbage collected");
      }
    });

    let refresh = self.config.ui.refresh_interval().map(|interval| {
      let tx = events.sender();
      PeriodicTask::spawn("auto-refresh", interval, move || {
        let _ = tx.send(Event::Refresh);
      })
    });

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    for task in std::iter::once(gc).chain(refresh) {
      debug!(task = task.name(), "stopping periodic task");
      task.cancel().await;
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.tick(),
      Event::Refresh => {
        if let Some(view) = self.views.last_mut() {
          view.refresh();
        }
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let capturing = self.views.last().is_some_and(|v| v.is_capturing_input());
    if self.command.is_active() || !capturing {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(name)) => {
          self.run_command(&name);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.views.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn run_command(&mut self, input: &str) {
    let (name, arg) = match input.split_once(char::is_whitespace) {
      Some((name, arg)) => (name, arg.trim()),
      None => (input, ""),
    };

    match commands::find(name).map(|c| c.name) {
      Some("quit") => {
        self.should_quit = true;
        return;
      }
      Some("raw") if arg.is_empty() => {
        self.ctx.toaster.info("Usage: raw <path>");
        return;
      }
      Some("raw") => {
        info!(path = arg, "opening raw endpoint");
        self.views.push(Box::new(JsonTableView::new(self.ctx.clone(), arg)));
        return;
      }
      _ => {}
    }

    if let Err(e) = self.open_resource(input) {
      warn!(command = input, error = %e, "command failed");
      self.ctx.toaster.error(format!("Unknown command: {}", input));
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.views.push(view),
      ViewAction::Pop => {
        if self.views.len() > 1 {
          self.views.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  /// Tick every view so background work completes; only the top one may
  /// change the stack
  fn tick(&mut self) {
    let top = self.views.len().saturating_sub(1);
    let mut action = ViewAction::None;
    for (i, view) in self.views.iter_mut().enumerate() {
      let result = view.tick();
      if i == top {
        action = result;
      }
    }
    self.apply(action);

    while let Ok(toast) = self.toast_rx.try_recv() {
      self.toasts.push(toast);
    }
    self.toasts.expire(Instant::now());
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Main content
        Constraint::Length(1), // Breadcrumb
      ])
      .split(frame.area());

    let title = self.config.title.as_deref().unwrap_or("madmin");
    let (shortcuts, breadcrumb) = match self.views.last() {
      Some(view) => {
        let capturing = view.is_capturing_input();
        let shortcuts: Vec<_> = view
          .shortcuts()
          .into_iter()
          .filter(|s| capturing || s.visibility == ShortcutVisibility::Always)
          .collect();
        let breadcrumb: Vec<_> = self.views.iter().map(|v| v.breadcrumb_label()).collect();
        (shortcuts, breadcrumb)
      }
      None => (Vec::new(), Vec::new()),
    };
    draw_header(frame, chunks[0], title, &self.config.api.base_url, &shortcuts);

    if let Some(view) = self.views.last_mut() {
      view.render(frame, chunks[1]);
    }

    draw_footer(frame, chunks[2], &breadcrumb);

    self.command.render_overlay(frame, chunks[1]);
    self.toasts.render(frame, chunks[1]);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::ApiClient;
  use crate::cache::{MemoryStorage, SharedCache};
  use ratatui::backend::TestBackend;
  use serde_json::json;
  use wiremock::matchers::method;
  use wiremock::{Mock, MockServer, ResponseTemplate};

  async fn app() -> (App, MockServer) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "data": {"items": [], "currentPage": 1, "totalPages": 0, "totalItems": 0}
      })))
      .mount(&server)
      .await;

    let client = ApiClient::with_base_url(&server.uri(), None, Duration::from_secs(5)).unwrap();
    let api = CachedApi::new(client, SharedCache::new(MemoryStorage::new()));
    let mut config = Config::default();
    config.api.base_url = server.uri();
    (App::new(config, api), server)
  }

  fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
  }

  fn labels(app: &App) -> Vec<String> {
    app.views.iter().map(|v| v.breadcrumb_label()).collect()
  }

  #[tokio::test]
  async fn test_every_resource_command_opens_a_list() {
    let (mut app, _server) = app().await;
    for cmd in commands::COMMANDS
      .iter()
      .filter(|c| !matches!(c.name, "quit" | "raw"))
    {
      app.open_resource(cmd.name).unwrap();
      assert_eq!(app.views.len(), 1, "{}", cmd.name);
    }
    assert!(app.open_resource("quit").is_err());
    assert!(app.open_resource("raw").is_err());
    assert!(app.open_resource("nope").is_err());
  }

  #[tokio::test]
  async fn test_command_palette_switches_root() {
    let (mut app, _server) = app().await;
    app.open_resource("jobs").unwrap();
    assert_eq!(labels(&app), vec!["Jobs"]);

    app.handle_key(key(':'));
    for c in "staff".chars() {
      app.handle_key(key(c));
    }
    app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
    assert_eq!(labels(&app), vec!["Employees"]);
  }

  #[tokio::test]
  async fn test_create_form_push_and_escape() {
    let (mut app, _server) = app().await;
    app.open_resource("products").unwrap();

    app.handle_key(key('c'));
    assert_eq!(labels(&app), vec!["Products", "New Product"]);

    // The form owns the keyboard, so ':' is typed rather than opening the palette
    app.handle_key(key(':'));
    assert!(!app.command.is_active());

    app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
    assert_eq!(labels(&app), vec!["Products"]);

    app.handle_key(key('q'));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_read_only_resource_has_no_form() {
    let (mut app, _server) = app().await;
    app.open_resource("assessments").unwrap();
    app.handle_key(key('c'));
    assert_eq!(labels(&app), vec!["Assessment Reports"]);
  }

  #[tokio::test]
  async fn test_unknown_command_toasts() {
    let (mut app, _server) = app().await;
    app.open_resource("users").unwrap();
    app.run_command("bogus");
    app.tick();
    assert_eq!(app.toasts.len(), 1);
    assert_eq!(labels(&app), vec!["Users"]);
  }

  #[tokio::test]
  async fn test_raw_command_pushes_table() {
    let (mut app, _server) = app().await;
    app.open_resource("jobs").unwrap();

    app.run_command("raw");
    assert_eq!(labels(&app), vec!["Jobs"]);

    app.run_command("get orders/recent");
    assert_eq!(labels(&app), vec!["Jobs", "/orders/recent"]);

    app.handle_key(key('q'));
    assert_eq!(labels(&app), vec!["Jobs"]);

    app.tick();
    assert_eq!(app.toasts.len(), 1);
  }

  #[tokio::test]
  async fn test_draw_smoke() {
    let (mut app, _server) = app().await;
    app.open_resource("calls").unwrap();
    let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
    terminal.draw(|f| app.draw(f)).unwrap();

    let buffer = terminal.backend().buffer();
    let footer: String = (0..100).map(|x| buffer[(x, 19)].symbol().to_string()).collect();
    assert!(footer.contains("Call Requests"));
  }
}
