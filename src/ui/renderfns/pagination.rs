use crate::pagination::PageWindow;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

const MAX_PAGE_BUTTONS: u32 = 5;

/// One-line pager: item range, page buttons and page size
pub fn draw_pagination(frame: &mut Frame, area: Rect, window: &PageWindow) {
  frame.render_widget(Paragraph::new(pagination_line(window)), area);
}

fn pagination_line(window: &PageWindow) -> Line<'static> {
  let enabled = Style::default().fg(Color::Cyan);
  let disabled = Style::default().fg(Color::DarkGray);

  let mut spans = vec![
    Span::styled(format!(" {}", window.summary()), Style::default().fg(Color::White)),
    Span::raw("   "),
    Span::styled(
      "‹ prev",
      if window.has_prev() { enabled } else { disabled },
    ),
    Span::raw(" "),
  ];

  if window.total_pages > 0 {
    for page in window.page_range(MAX_PAGE_BUTTONS) {
      if page == window.current_page {
        spans.push(Span::styled(
          format!("[{}]", page),
          Style::default().fg(Color::Yellow).bold(),
        ));
      } else {
        spans.push(Span::styled(format!(" {} ", page), Style::default().fg(Color::White)));
      }
    }
    spans.push(Span::raw(" "));
  }

  spans.push(Span::styled(
    "next ›",
    if window.has_next() { enabled } else { disabled },
  ));
  spans.push(Span::styled(
    format!("   rows/page: {}", window.limit),
    Style::default().fg(Color::DarkGray),
  ));

  Line::from(spans)
}
