use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Yes/no overlay guarding a destructive action. Carries the target it was
/// opened for so the answer can't be applied to a different row.
#[derive(Debug, Clone, Default)]
pub struct ConfirmDialog {
  pending: Option<(String, String)>,
}

impl ConfirmDialog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.pending.is_some()
  }

  pub fn ask(&mut self, target: impl Into<String>, prompt: impl Into<String>) {
    self.pending = Some((target.into(), prompt.into()));
  }

  /// `Event(target)` when confirmed
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<String> {
    let Some((target, _)) = &self.pending else {
      return KeyResult::NotHandled;
    };

    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') => {
        let target = target.clone();
        self.pending = None;
        KeyResult::Event(target)
      }
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
        self.pending = None;
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let Some((_, prompt)) = &self.pending else {
      return;
    };

    let width = 50.min(area.width.saturating_sub(4));
    let height = 5.min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let text = vec![
      Line::from(prompt.as_str()),
      Line::from(vec![
        Span::styled("y", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" confirm   "),
        Span::styled("n", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(" cancel"),
      ]),
    ];

    let paragraph = Paragraph::new(text).wrap(Wrap { trim: true }).block(
      Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Confirm "),
    );
    frame.render_widget(paragraph, overlay_area);
  }
}
