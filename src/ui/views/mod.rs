mod examples;

pub use examples::{ExampleView, ViewAction};
