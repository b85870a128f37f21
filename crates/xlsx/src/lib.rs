//! Word source backend.
//!
//! Reads the words of a deck from the first column of an .xlsx worksheet
//! (a ZIP archive of XML documents) or from a plain text/CSV list.

pub mod reader;
pub mod source;

pub use reader::XlsxReader;
pub use source::{SourceFormat, WordSource};
