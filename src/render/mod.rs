//! Rendering of converted pages: JSON export and a plain text view.

mod json;
mod text;

pub use json::{from_json, to_json, JsonFormat};
pub use text::{image_caption, render_page, table_grid};
