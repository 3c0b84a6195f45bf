// src/extractors/mod.rs
pub mod pdf;
pub mod report;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use pdf::{text_with_timeout, DocumentText, PdfText};
#[allow(unused_imports)]
pub use report::{
    extract,
    match_line,
    KeywordFilter,
    LineMatch,
    Record,
    RecordSet,
    ReportExtractor,
    ValueShape,
    DEFAULT_KEYWORDS,
};
