//! `examkit-compose`: assembling exam versions from question generators.
//!
//! Nothing here is global: callers build a [`TexRenderer`] and a
//! [`QuestionRegistry`] and pass them where they are needed.

pub mod error;
pub mod question;
pub mod render;

pub use error::ComposeError;
pub use question::{compose_version, permute, ChoiceQuestion, QuestionGenerator, QuestionRegistry};
pub use render::{si, Delimiters, Renderer, TexRenderer};
