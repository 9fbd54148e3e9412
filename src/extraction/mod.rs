/// Line-level parsing of `.ann` files into typed records.
mod line_parser;

/// Validation of entity offsets against the document text.
mod spans;

pub use line_parser::LineParser;
pub use spans::{byte_range, SpanMerger};
