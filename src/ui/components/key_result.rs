/// Outcome of offering a key to a component.
///
/// Views chain components with `or_else`: the first one that does not return
/// `NotHandled` wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the parent to do
  Handled,
  /// Consumed, with an event for the parent
  Event(T),
  /// Not consumed, try the next handler
  NotHandled,
}
