//! Config-declared tools.
//!
//! Tools live behind HTTP endpoints; this crate describes them to the
//! registry and forwards calls to them without owning any tool logic.

pub mod http_tool;
pub mod manifest;

pub use http_tool::HttpTool;
pub use manifest::{load_tools_into, ToolEntry, ToolManifest, ToolsConfigError};
