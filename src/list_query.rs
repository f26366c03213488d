//! List query state: page, page size, sort and debounced search.
//!
//! `ListController` owns the parameters of one list view and produces the
//! `ListQuery` value the fetcher consumes. It never talks to the network.
//! Time is passed in explicitly so the debounce can be driven from the UI tick
//! and tested without a clock.

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  Desc,
}

impl SortOrder {
  pub fn toggled(self) -> Self {
    match self {
      SortOrder::Asc => SortOrder::Desc,
      SortOrder::Desc => SortOrder::Asc,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      SortOrder::Asc => "asc",
      SortOrder::Desc => "desc",
    }
  }

  /// Arrow shown next to the sorted column header
  pub fn arrow(self) -> &'static str {
    match self {
      SortOrder::Asc => "▲",
      SortOrder::Desc => "▼",
    }
  }
}

impl fmt::Display for SortOrder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Parameters identifying one page of a resource collection.
///
/// Field order matters: the serialized form is part of the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
  pub search: String,
  pub sort_field: String,
  pub sort_order: SortOrder,
  pub page: u32,
  pub limit: u32,
}

impl ListQuery {
  pub fn new(sort_field: impl Into<String>, sort_order: SortOrder, limit: u32) -> Self {
    Self {
      search: String::new(),
      sort_field: sort_field.into(),
      sort_order,
      page: 1,
      limit: limit.max(1),
    }
  }

  /// Query-string pairs in wire order
  pub fn to_params(&self) -> Vec<(&'static str, String)> {
    vec![
      ("search", self.search.clone()),
      ("sortField", self.sort_field.clone()),
      ("sortOrder", self.sort_order.to_string()),
      ("page", self.page.to_string()),
      ("limit", self.limit.to_string()),
    ]
  }
}

/// Delays a value until input has been quiet for `delay`.
///
/// Each `push` replaces the pending value and restarts the window, so only the
/// last value of a burst is ever released.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
  delay: Duration,
  pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      pending: None,
    }
  }

  pub fn push(&mut self, value: T, now: Instant) {
    self.pending = Some((value, now + self.delay));
  }

  /// Release the pending value if its deadline has passed.
  pub fn poll(&mut self, now: Instant) -> Option<T> {
    match &self.pending {
      Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(v, _)| v),
      _ => None,
    }
  }

  /// Drop the pending value without releasing it.
  pub fn cancel(&mut self) {
    self.pending = None;
  }

  pub fn is_pending(&self) -> bool {
    self.pending.is_some()
  }
}

/// Error for rejected page-size input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLimit(pub String);

impl fmt::Display for InvalidLimit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "'{}' is not a positive page size", self.0)
  }
}

impl std::error::Error for InvalidLimit {}

/// Owns the list parameters of a single view.
#[derive(Debug, Clone)]
pub struct ListController {
  query: ListQuery,
  default_order: SortOrder,
  raw_search: String,
  debouncer: Debouncer<String>,
}

impl ListController {
  pub fn new(
    sort_field: impl Into<String>,
    default_order: SortOrder,
    limit: u32,
    debounce: Duration,
  ) -> Self {
    Self {
      query: ListQuery::new(sort_field, default_order, limit),
      default_order,
      raw_search: String::new(),
      debouncer: Debouncer::new(debounce),
    }
  }

  pub fn query(&self) -> &ListQuery {
    &self.query
  }

  pub fn page(&self) -> u32 {
    self.query.page
  }

  pub fn limit(&self) -> u32 {
    self.query.limit
  }

  /// Search text as typed, possibly not yet applied
  pub fn raw_search(&self) -> &str {
    &self.raw_search
  }

  /// Whether typed search text is still waiting out the debounce
  pub fn is_search_pending(&self) -> bool {
    self.debouncer.is_pending()
  }

  /// Search text the current query uses
  pub fn search(&self) -> &str {
    &self.query.search
  }

  pub fn sort_field(&self) -> &str {
    &self.query.sort_field
  }

  pub fn sort_order(&self) -> SortOrder {
    self.query.sort_order
  }

  /// Record new search input; it takes effect once the debounce settles.
  pub fn set_search(&mut self, raw: impl Into<String>, now: Instant) {
    let raw = raw.into();
    self.raw_search = raw.clone();
    self.debouncer.push(raw, now);
  }

  /// Apply search immediately, bypassing the debounce (e.g. on Enter).
  pub fn commit_search(&mut self) -> bool {
    self.debouncer.cancel();
    let raw = self.raw_search.clone();
    self.apply_search(raw)
  }

  /// Advance the debounce. Returns true when the query changed.
  pub fn poll(&mut self, now: Instant) -> bool {
    match self.debouncer.poll(now) {
      Some(term) => self.apply_search(term),
      None => false,
    }
  }

  fn apply_search(&mut self, term: String) -> bool {
    let term = term.trim().to_string();
    if term == self.query.search {
      return false;
    }
    self.query.search = term;
    self.query.page = 1;
    true
  }

  /// Change the page size. Returns true when the query changed.
  pub fn set_limit(&mut self, limit: u32) -> Result<bool, InvalidLimit> {
    if limit == 0 {
      return Err(InvalidLimit(limit.to_string()));
    }
    if limit == self.query.limit {
      return Ok(false);
    }
    self.query.limit = limit;
    self.query.page = 1;
    Ok(true)
  }

  /// Parse page-size text typed by the user. Invalid input keeps the old value.
  pub fn set_limit_input(&mut self, input: &str) -> Result<bool, InvalidLimit> {
    let parsed = input
      .trim()
      .parse::<u32>()
      .map_err(|_| InvalidLimit(input.trim().to_string()))?;
    self.set_limit(parsed)
  }

  /// Sort by `field`: the same field flips the order, a new one starts from
  /// the resource default.
  pub fn sort_by(&mut self, field: &str) {
    if self.query.sort_field == field {
      self.query.sort_order = self.query.sort_order.toggled();
    } else {
      self.query.sort_field = field.to_string();
      self.query.sort_order = self.default_order;
    }
  }

  /// Jump to a page, clamped to `1..=total_pages`.
  pub fn go_to_page(&mut self, page: u32, total_pages: u32) -> bool {
    let target = page.clamp(1, total_pages.max(1));
    if target == self.query.page {
      return false;
    }
    self.query.page = target;
    true
  }

  pub fn next_page(&mut self, total_pages: u32) -> bool {
    if self.query.page >= total_pages {
      return false;
    }
    self.go_to_page(self.query.page + 1, total_pages)
  }

  pub fn prev_page(&mut self) -> bool {
    if self.query.page <= 1 {
      return false;
    }
    self.query.page -= 1;
    true
  }

  /// Drop any pending search keystrokes (view teardown).
  pub fn cancel_pending(&mut self) {
    self.debouncer.cancel();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const DEBOUNCE: Duration = Duration::from_millis(300);

  fn controller() -> ListController {
    ListController::new("createdAt", SortOrder::Desc, 10, DEBOUNCE)
  }

  #[test]
  fn test_debouncer_releases_only_last_value() {
    let start = Instant::now();
    let mut debouncer = Debouncer::new(DEBOUNCE);

    debouncer.push("e", start);
    debouncer.push("en", start + Duration::from_millis(100));
    debouncer.push("eng", start + Duration::from_millis(200));

    // 300ms after the first keystroke but only 100ms after the last
    assert_eq!(debouncer.poll(start + Duration::from_millis(300)), None);
    assert_eq!(
      debouncer.poll(start + Duration::from_millis(500)),
      Some("eng")
    );
    assert_eq!(debouncer.poll(start + Duration::from_millis(900)), None);
  }

  #[test]
  fn test_debouncer_cancel() {
    let start = Instant::now();
    let mut debouncer = Debouncer::new(DEBOUNCE);
    debouncer.push(1, start);
    assert!(debouncer.is_pending());
    debouncer.cancel();
    assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
  }

  #[test]
  fn test_search_applies_after_quiescence_and_resets_page() {
    let start = Instant::now();
    let mut ctl = controller();
    ctl.go_to_page(4, 10);

    ctl.set_search("e", start);
    ctl.set_search("en", start + Duration::from_millis(50));
    ctl.set_search("eng", start + Duration::from_millis(100));
    assert!(!ctl.poll(start + Duration::from_millis(200)));
    assert_eq!(ctl.search(), "");
    assert_eq!(ctl.page(), 4);

    assert!(ctl.poll(start + Duration::from_millis(400)));
    assert_eq!(ctl.search(), "eng");
    assert_eq!(ctl.page(), 1);
  }

  #[test]
  fn test_clearing_search_is_distinct_state() {
    let start = Instant::now();
    let mut ctl = controller();
    ctl.set_search("eng", start);
    ctl.poll(start + DEBOUNCE);
    ctl.go_to_page(2, 5);

    ctl.set_search("", start + Duration::from_secs(1));
    assert!(ctl.poll(start + Duration::from_secs(2)));
    assert_eq!(ctl.query().search, "");
    assert_eq!(ctl.page(), 1);
  }

  #[test]
  fn test_padded_search_is_trimmed() {
    let mut ctl = controller();
    ctl.go_to_page(3, 5);

    // Blank input is the unfiltered state, so nothing changes
    ctl.set_search("   ", Instant::now());
    assert!(!ctl.commit_search());
    assert_eq!(ctl.page(), 3);

    ctl.set_search("  lego ", Instant::now());
    assert!(ctl.commit_search());
    assert_eq!(ctl.query().search, "lego");
    assert_eq!(ctl.query().to_params()[0], ("search", "lego".to_string()));
  }

  #[test]
  fn test_commit_search_skips_debounce() {
    let mut ctl = controller();
    ctl.go_to_page(3, 5);
    ctl.set_search("ts", Instant::now());
    assert!(ctl.commit_search());
    assert_eq!(ctl.search(), "ts");
    assert_eq!(ctl.page(), 1);
    // Nothing left pending
    assert!(!ctl.poll(Instant::now() + Duration::from_secs(1)));
  }

  #[test]
  fn test_limit_change_resets_page() {
    let mut ctl = controller();
    ctl.go_to_page(3, 5);
    assert_eq!(ctl.set_limit(25), Ok(true));
    assert_eq!(ctl.limit(), 25);
    assert_eq!(ctl.page(), 1);
  }

  #[test]
  fn test_invalid_limit_input_keeps_prior_value() {
    let mut ctl = controller();
    ctl.go_to_page(2, 5);
    assert!(ctl.set_limit_input("abc").is_err());
    assert!(ctl.set_limit_input("0").is_err());
    assert!(ctl.set_limit_input("-5").is_err());
    assert_eq!(ctl.limit(), 10);
    assert_eq!(ctl.page(), 2);

    assert_eq!(ctl.set_limit_input(" 20 "), Ok(true));
    assert_eq!(ctl.limit(), 20);
  }

  #[test]
  fn test_sort_toggles_same_field_and_resets_new_field() {
    let mut ctl = controller();
    ctl.sort_by("createdAt");
    assert_eq!(ctl.sort_order(), SortOrder::Asc);
    ctl.sort_by("createdAt");
    assert_eq!(ctl.sort_order(), SortOrder::Desc);
    ctl.sort_by("createdAt");
    ctl.sort_by("jobTitle");
    assert_eq!(ctl.sort_field(), "jobTitle");
    assert_eq!(ctl.sort_order(), SortOrder::Desc);
  }

  #[test]
  fn test_page_navigation_is_clamped() {
    let mut ctl = controller();
    assert!(!ctl.prev_page());
    assert!(ctl.next_page(3));
    assert!(ctl.next_page(3));
    assert!(!ctl.next_page(3));
    assert_eq!(ctl.page(), 3);
    assert!(!ctl.go_to_page(99, 3));
    assert!(ctl.go_to_page(0, 3));
    assert_eq!(ctl.page(), 1);
  }

  #[test]
  fn test_query_params_wire_names() {
    let ctl = controller();
    let params = ctl.query().to_params();
    assert_eq!(
      params,
      vec![
        ("search", String::new()),
        ("sortField", "createdAt".to_string()),
        ("sortOrder", "desc".to_string()),
        ("page", "1".to_string()),
        ("limit", "10".to_string()),
      ]
    );
  }
}
