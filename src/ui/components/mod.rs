mod command_input;
mod example_form;
mod input;

pub use command_input::{CommandEvent, CommandInput};
pub use example_form::{ExampleForm, FormEvent};

/// What a component did with a key, shared by all overlay components
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the parent to do
  Handled,
  /// Consumed, and the parent should act on this event
  Event(T),
  /// Not consumed, try the next handler
  NotHandled,
}
