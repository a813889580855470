pub mod domain;
pub mod errors;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{EditorError, FieldError};
pub use services::{EditorSettings, ReleaseEditor};
