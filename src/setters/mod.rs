//! Generated single-field setters.
//!
//! One setter per declared key, named `set<Prefix><Key>`.

mod setters;

pub use setters::{create_setters, setter_name, Setter, Setters};
