use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use crate::api::CachedApi;
use crate::config::UiConfig;
use crate::ui::components::Toaster;

/// When a shortcut should be shown in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortcutVisibility {
  #[default]
  Always,
  /// Only while an overlay or input is focused
  WhenActive,
}

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub visibility: ShortcutVisibility,
  /// Lower is shown first
  pub priority: u8,
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      visibility: ShortcutVisibility::Always,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }

  pub const fn when_active(mut self) -> Self {
    self.visibility = ShortcutVisibility::WhenActive;
    self
  }
}

/// Everything a view needs from the app: the cached API, UI settings and
/// a way to raise toasts. Cheap to clone.
#[derive(Clone)]
pub struct ViewContext {
  pub api: CachedApi,
  pub ui: UiConfig,
  pub toaster: Toaster,
}

/// Actions that a view can request in response to input or a tick
pub enum ViewAction {
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop the current view (go back)
  Pop,
}

/// Trait for view behavior
///
/// Views own their input modes (search, pickers, forms) and return actions
/// for the App to execute: App → View → Components.
///
/// Views that load data asynchronously hold a `Query<T>` and poll it in
/// `tick()`.
pub trait View {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  fn render(&mut self, frame: &mut Frame, area: Rect);

  fn breadcrumb_label(&self) -> String;

  /// Called on every tick to poll queries, debouncers and pending mutations
  fn tick(&mut self) -> ViewAction {
    ViewAction::None
  }

  /// Periodic auto-refresh signal
  fn refresh(&mut self) {}

  /// Whether a text input owns the keyboard (global shortcuts are suspended)
  fn is_capturing_input(&self) -> bool {
    false
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
