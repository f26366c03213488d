//! Page arithmetic for list footers.

/// Visible window of a paginated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
  pub current_page: u32,
  pub total_pages: u32,
  pub total_items: u64,
  pub limit: u32,
}

impl PageWindow {
  pub fn new(current_page: u32, total_pages: u32, total_items: u64, limit: u32) -> Self {
    Self {
      current_page: current_page.max(1),
      total_pages,
      total_items,
      limit: limit.max(1),
    }
  }

  /// 1-based index of the first item on this page (0 when empty)
  pub fn start_item(&self) -> u64 {
    if self.total_items == 0 {
      return 0;
    }
    let start = (self.current_page as u64 - 1) * self.limit as u64 + 1;
    start.min(self.total_items)
  }

  /// 1-based index of the last item on this page (0 when empty)
  pub fn end_item(&self) -> u64 {
    (self.current_page as u64 * self.limit as u64).min(self.total_items)
  }

  pub fn has_prev(&self) -> bool {
    self.current_page > 1
  }

  pub fn has_next(&self) -> bool {
    self.current_page < self.total_pages
  }

  /// Keep a requested page within `1..=total_pages`.
  pub fn clamp(&self, page: u32) -> u32 {
    page.clamp(1, self.total_pages.max(1))
  }

  /// Up to `max_buttons` page numbers centred on the current page.
  pub fn page_range(&self, max_buttons: u32) -> std::ops::RangeInclusive<u32> {
    let total = self.total_pages.max(1);
    let max_buttons = max_buttons.clamp(1, total);
    let half = max_buttons / 2;

    let mut first = self.current_page.saturating_sub(half).max(1);
    let mut last = first + max_buttons - 1;
    if last > total {
      last = total;
      first = last + 1 - max_buttons;
    }
    first..=last
  }

  /// Footer label, e.g. "Showing 21-25 of 25"
  pub fn summary(&self) -> String {
    format!(
      "Showing {}-{} of {}",
      self.start_item(),
      self.end_item(),
      self.total_items
    )
  }
}
