// Library root: source registry, spreadsheet row normalization, and the
// per-player aggregation that produces the consolidated price database.

pub mod aggregate;
pub mod config;
pub mod document;
pub mod normalize;
pub mod pipeline;
pub mod reader;
pub mod registry;
