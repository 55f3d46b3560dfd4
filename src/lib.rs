#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod document;
pub mod error;
pub mod file_handler;
pub mod history;
pub mod pixel_buffer;
pub mod redact;
pub mod renderer;
pub mod tools;

pub use app::CrayonsApp;
pub use document::{Document, DocumentEvent};
pub use error::DocumentError;
pub use history::History;
pub use pixel_buffer::PixelBuffer;
pub use tools::{Interaction, StrokeParams, ToolKind};
