pub mod config;
pub mod document;
pub mod errors;
pub mod export;
pub mod extraction;
pub mod pairing;
pub mod parser;
pub mod policy;
pub mod resolution;
pub mod types;
pub mod writer;

pub use document::Document;
pub use errors::{AnnotationError, BratError, ErrorKind, Result};
pub use parser::{parse, BratParser, Corpus, ParsedDocument};
pub use policy::{Diagnostic, ErrorPolicy};
