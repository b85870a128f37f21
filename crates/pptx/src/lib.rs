//! PPTX (Office Open XML) backend for word slide decks.
//!
//! Writes .pptx files, which are ZIP archives containing XML documents, edits
//! per-slide transition timing, and reads finished decks back for inspection.

pub mod package;
pub mod parser;
pub mod template;
pub mod transition;
pub mod writer;

pub use package::{save_atomic, Package};
pub use parser::{InspectedDeck, InspectedSlide, PptxParser, SlideTiming};
pub use transition::set_auto_advance;
pub use writer::{PptxDeck, SlidePart};
