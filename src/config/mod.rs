// Command-line configuration: render settings and context data files

pub mod context_file;
pub mod render_settings;

pub use context_file::ContextFormat;
pub use render_settings::{parse_define, RenderSettings};
