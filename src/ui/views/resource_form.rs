use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tokio::sync::oneshot;
use tracing::debug;

use crate::api::forms::{FieldErrors, FieldKind, FormField, FormValues};
use crate::api::{Editable, MutationDispatcher, MutationError, MutationKind};
use crate::ui::components::TextInput;
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Create or edit form for an editable resource.
///
/// Values are validated locally before anything is sent. On success the form
/// closes and the list refetches through tag invalidation.
pub struct ResourceFormView<R: Editable> {
  ctx: ViewContext,
  editing: Option<String>,
  fields: Vec<FormField>,
  inputs: Vec<TextInput>,
  focus: usize,
  errors: FieldErrors,
  pending: Option<oneshot::Receiver<Result<R, MutationError>>>,
}

impl<R: Editable> ResourceFormView<R> {
  pub fn new(ctx: ViewContext, existing: Option<R>) -> Self {
    let fields = R::form_fields();
    let values = existing.as_ref().map(R::form_values).unwrap_or_default();
    let inputs = fields
      .iter()
      .map(|field| {
        let value = match (values.get(field.key), &field.kind) {
          (Some(v), _) => v.clone(),
          (None, FieldKind::Select(options)) => options.first().map(|o| o.to_string()).unwrap_or_default(),
          (None, _) => String::new(),
        };
        TextInput::with_value(value)
      })
      .collect();

    Self {
      ctx,
      editing: existing.map(|r| r.id().to_string()),
      fields,
      inputs,
      focus: 0,
      errors: FieldErrors::new(),
      pending: None,
    }
  }

  /// Boxed constructor, usable as a list view's `OpenForm`
  pub fn open(ctx: ViewContext, existing: Option<R>) -> Box<dyn View> {
    Box::new(Self::new(ctx, existing))
  }

  fn kind(&self) -> MutationKind {
    if self.editing.is_some() {
      MutationKind::Update
    } else {
      MutationKind::Create
    }
  }

  fn values(&self) -> FormValues {
    self
      .fields
      .iter()
      .zip(&self.inputs)
      .map(|(field, input)| (field.key.to_string(), input.value().to_string()))
      .collect()
  }

  fn submit(&mut self) {
    if self.pending.is_some() {
      return;
    }

    let (payload, upload) = match MutationDispatcher::<R>::prepare(&self.values()) {
      Ok(prepared) => prepared,
      Err(e) => {
        self.fail(e);
        return;
      }
    };
    self.errors.clear();

    let dispatcher = MutationDispatcher::<R>::new(self.ctx.api.clone());
    let id = self.editing.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = match id {
        Some(id) => dispatcher.update(&id, payload, upload).await,
        None => dispatcher.create(payload, upload).await,
      };
      let _ = tx.send(result);
    });
    self.pending = Some(rx);
  }

  fn fail(&mut self, error: MutationError) {
    debug!(resource = R::TAG, error = %error, "form submission failed");
    self
      .ctx
      .toaster
      .error(error.toast_message(self.kind(), R::LABEL));
    if let Some(errors) = error.field_errors() {
      self.errors = errors.clone();
      if let Some(first) = self.fields.iter().position(|f| self.errors.contains_key(f.key)) {
        self.focus = first;
      }
    }
  }

  fn cycle_select(&mut self, forward: bool) {
    let FieldKind::Select(options) = self.fields[self.focus].kind else {
      return;
    };
    if options.is_empty() {
      return;
    }
    let input = &mut self.inputs[self.focus];
    let current = options.iter().position(|o| *o == input.value());
    let next = match (current, forward) {
      (Some(i), true) => (i + 1) % options.len(),
      (Some(i), false) => (i + options.len() - 1) % options.len(),
      (None, _) => 0,
    };
    input.set_value(options[next]);
  }

  fn move_focus(&mut self, forward: bool) {
    let len = self.fields.len();
    self.focus = if forward {
      (self.focus + 1) % len
    } else {
      (self.focus + len - 1) % len
    };
  }

  fn title(&self) -> String {
    let verb = if self.editing.is_some() { "Edit" } else { "New" };
    let mut title = format!(" {} {} ", verb, R::LABEL);
    if self.pending.is_some() {
      title.push_str("(saving...) ");
    }
    title
  }

  fn field_hint(kind: &FieldKind) -> &'static str {
    match kind {
      FieldKind::Select(_) => "  ←/→ to change",
      FieldKind::File => "  local path to upload, or existing URL",
      FieldKind::List => "  comma separated",
      _ => "",
    }
  }
}

impl<R: Editable> View for ResourceFormView<R> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if key.code == KeyCode::Esc {
      return ViewAction::Pop;
    }
    if self.pending.is_some() {
      return ViewAction::None;
    }

    let is_select = matches!(self.fields[self.focus].kind, FieldKind::Select(_));
    match key.code {
      KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => self.submit(),
      KeyCode::Tab | KeyCode::Down | KeyCode::Enter => self.move_focus(true),
      KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
      KeyCode::Left if is_select => self.cycle_select(false),
      KeyCode::Right if is_select => self.cycle_select(true),
      _ if is_select => {}
      _ => {
        let key_name = self.fields[self.focus].key;
        self.inputs[self.focus].handle_key(key);
        self.errors.remove(key_name);
      }
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let mut lines = Vec::new();
    for (i, (field, input)) in self.fields.iter().zip(&self.inputs).enumerate() {
      let focused = i == self.focus;
      let label_style = if focused {
        Style::default().fg(Color::Yellow).bold()
      } else {
        Style::default().fg(Color::DarkGray)
      };
      let marker = if field.required { "*" } else { "" };

      let mut spans = vec![
        Span::styled(if focused { "> " } else { "  " }, label_style),
        Span::styled(format!("{}{}: ", field.label, marker), label_style),
      ];
      match field.kind {
        FieldKind::Select(_) => spans.push(Span::styled(
          format!("‹ {} ›", input.value()),
          Style::default().fg(Color::Cyan),
        )),
        _ => {
          spans.push(Span::raw(input.value().to_string()));
          if focused {
            spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
          }
        }
      }
      if focused {
        spans.push(Span::styled(
          Self::field_hint(&field.kind),
          Style::default().fg(Color::DarkGray).italic(),
        ));
      }
      lines.push(Line::from(spans));

      if let Some(error) = self.errors.get(field.key) {
        lines.push(Line::from(Span::styled(
          format!("    {}", error),
          Style::default().fg(Color::Red),
        )));
      }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
      "Ctrl-S save   Tab next field   Esc cancel",
      Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn breadcrumb_label(&self) -> String {
    match &self.editing {
      Some(id) => format!("Edit {}", id),
      None => format!("New {}", R::LABEL),
    }
  }

  fn tick(&mut self) -> ViewAction {
    let Some(rx) = &mut self.pending else {
      return ViewAction::None;
    };

    match rx.try_recv() {
      Ok(Ok(_)) => {
        self.pending = None;
        self.ctx.toaster.success(self.kind().success_message(R::LABEL));
        ViewAction::Pop
      }
      Ok(Err(e)) => {
        self.pending = None;
        self.fail(e);
        ViewAction::None
      }
      Err(oneshot::error::TryRecvError::Empty) => ViewAction::None,
      Err(oneshot::error::TryRecvError::Closed) => {
        self.pending = None;
        self
          .ctx
          .toaster
          .error(format!("Failed to {} {}", self.kind().verb(), R::LABEL));
        ViewAction::None
      }
    }
  }

  fn is_capturing_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("Ctrl-S", "save").with_priority(10),
      ShortcutInfo::new("Tab", "next field").with_priority(20),
      ShortcutInfo::new("Esc", "cancel").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{Job, Product};
  use crate::ui::components::ToastKind;
  use crate::ui::views::testing::context;
  use serde_json::{json, Value};
  use std::time::Duration;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn fill<R: Editable>(view: &mut ResourceFormView<R>, key: &str, value: &str) {
    let idx = view.fields.iter().position(|f| f.key == key).unwrap();
    view.inputs[idx].set_value(value);
  }

  async fn run_until_done<R: Editable>(view: &mut ResourceFormView<R>) -> bool {
    for _ in 0..100 {
      if let ViewAction::Pop = view.tick() {
        return true;
      }
      if view.pending.is_none() {
        return false;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
  }

  fn ctrl_s() -> KeyEvent {
    KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)
  }

  #[tokio::test]
  async fn test_create_job_with_thumbnail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/upload/file"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": {"imageUrl": "https://cdn.example.com/j.png"}
      })))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/career/jobs"))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({
        "success": true,
        "data": {"_id": "j1", "jobTitle": "Engineer"}
      })))
      .expect(1)
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("j.png");
    std::fs::write(&file, b"png").unwrap();

    let (ctx, mut toasts) = context(&server);
    let mut view = ResourceFormView::<Job>::new(ctx, None);
    fill(&mut view, "job_title", "Engineer");
    fill(&mut view, "job_description", "Build things");
    fill(&mut view, "skills_required", "Rust, TS");
    fill(&mut view, "location", "Remote");
    fill(&mut view, "thumbnail", &file.to_string_lossy());

    view.handle_key(ctrl_s());
    assert!(run_until_done(&mut view).await);

    let toast = toasts.try_recv().unwrap();
    assert_eq!(toast.kind, ToastKind::Success);
    assert_eq!(toast.message, "Job created successfully");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(requests[0].url.path(), "/upload/file");
    assert_eq!(body["thumbnail"], "https://cdn.example.com/j.png");
    assert_eq!(body["jobType"], "FULLTIME");
    assert_eq!(body["skillsRequired"], json!(["Rust", "TS"]));
  }

  #[tokio::test]
  async fn test_validation_errors_stay_local() {
    let server = MockServer::start().await;
    let (ctx, mut toasts) = context(&server);
    let mut view = ResourceFormView::<Job>::new(ctx, None);

    view.handle_key(ctrl_s());
    assert!(view.pending.is_none());
    assert_eq!(
      view.errors.get("job_title").map(String::as_str),
      Some("Job title is required")
    );
    assert_eq!(view.fields[view.focus].key, "job_title");
    assert_eq!(
      toasts.try_recv().unwrap().message,
      "Please fix the highlighted fields"
    );
    assert!(server.received_requests().await.unwrap().is_empty());

    // Typing into the field clears its error
    view.handle_key(KeyEvent::new(KeyCode::Char('E'), KeyModifiers::NONE));
    assert!(!view.errors.contains_key("job_title"));
  }

  #[tokio::test]
  async fn test_edit_prefills_and_puts() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
      .and(path("/products/p1"))
      .respond_with(ResponseTemplate::new(500).set_body_json(json!({"success": false})))
      .expect(1)
      .mount(&server)
      .await;

    let product: Product = serde_json::from_value(json!({
      "_id": "p1",
      "title": "Puzzle",
      "description": "Wooden",
      "price": 12.5,
      "ageCategory": "6-12",
      "productType": "game",
      "thumbnail": "https://cdn.example.com/p.png"
    }))
    .unwrap();

    let (ctx, mut toasts) = context(&server);
    let mut view = ResourceFormView::<Product>::new(ctx, Some(product));
    assert_eq!(view.breadcrumb_label(), "Edit p1");

    view.handle_key(ctrl_s());
    assert!(!run_until_done(&mut view).await);
    assert_eq!(toasts.try_recv().unwrap().message, "Failed to update Product");
  }

  #[tokio::test]
  async fn test_select_cycles_options() {
    let server = MockServer::start().await;
    let (ctx, _toasts) = context(&server);

    let mut view = ResourceFormView::<Job>::new(ctx, None);
    view.focus = view.fields.iter().position(|f| f.key == "job_type").unwrap();
    assert_eq!(view.inputs[view.focus].value(), "FULLTIME");

    view.handle_key(KeyEvent::new(KeyCode::Right, KeyModifiers::NONE));
    assert_eq!(view.inputs[view.focus].value(), "PARTTIME");
    view.handle_key(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE));
    view.handle_key(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE));
    assert_eq!(view.inputs[view.focus].value(), "FREELANCE");

    // Free text is ignored on a select
    view.handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE));
    assert_eq!(view.inputs[view.focus].value(), "FREELANCE");
  }
}
