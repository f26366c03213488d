use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tokio::sync::mpsc;

const MAX_TOASTS: usize = 4;
const TOAST_TTL: Duration = Duration::from_secs(4);
const TOAST_WIDTH: u16 = 44;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
  Success,
  Error,
  Info,
}

impl ToastKind {
  fn color(self) -> Color {
    match self {
      ToastKind::Success => Color::Green,
      ToastKind::Error => Color::Red,
      ToastKind::Info => Color::Cyan,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Toast {
  pub kind: ToastKind,
  pub message: String,
  pub created: Instant,
}

impl Toast {
  pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
      created: Instant::now(),
    }
  }
}

/// Handle views use to raise toasts. Cloned into every view.
#[derive(Debug, Clone)]
pub struct Toaster {
  tx: mpsc::UnboundedSender<Toast>,
}

impl Toaster {
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<Toast>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }

  pub fn success(&self, message: impl Into<String>) {
    self.send(Toast::new(ToastKind::Success, message));
  }

  pub fn error(&self, message: impl Into<String>) {
    self.send(Toast::new(ToastKind::Error, message));
  }

  pub fn info(&self, message: impl Into<String>) {
    self.send(Toast::new(ToastKind::Info, message));
  }

  fn send(&self, toast: Toast) {
    // Receiver only goes away on shutdown
    let _ = self.tx.send(toast);
  }
}

/// Bounded queue of visible toasts. Oldest are dropped first.
#[derive(Debug)]
pub struct Toasts {
  items: VecDeque<Toast>,
  ttl: Duration,
  capacity: usize,
}

impl Default for Toasts {
  fn default() -> Self {
    Self {
      items: VecDeque::new(),
      ttl: TOAST_TTL,
      capacity: MAX_TOASTS,
    }
  }
}

impl Toasts {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, toast: Toast) {
    if self.items.len() == self.capacity {
      self.items.pop_front();
    }
    self.items.push_back(toast);
  }

  /// Drop expired toasts. Returns true if any were removed.
  pub fn expire(&mut self, now: Instant) -> bool {
    let before = self.items.len();
    let ttl = self.ttl;
    self
      .items
      .retain(|t| now.saturating_duration_since(t.created) < ttl);
    self.items.len() != before
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Stack toasts in the bottom-right corner of `area`, newest at the bottom
  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let width = TOAST_WIDTH.min(area.width);
    let inner_width = width.saturating_sub(2).max(1) as usize;
    let mut bottom = area.y + area.height;

    for toast in self.items.iter().rev() {
      let lines = toast.message.chars().count().div_ceil(inner_width).max(1) as u16;
      let height = lines + 2;
      if bottom < area.y + height {
        break;
      }
      bottom -= height;
      let rect = Rect::new(area.x + area.width - width, bottom, width, height);

      frame.render_widget(Clear, rect);
      let color = toast.kind.color();
      let paragraph = Paragraph::new(toast.message.as_str())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true })
        .block(
          Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color)),
        );
      frame.render_widget(paragraph, rect);
    }
  }
}
