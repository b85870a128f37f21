//! Core domain types, font-size fitting, and deck building for word
//! slide decks.

pub mod builder;
pub mod config;
pub mod error;
pub mod fit;
pub mod stats;
pub mod types;

pub use builder::{BuildReport, DeckBuilder, DeckWriter};
pub use config::{DeckConfig, FontConfig, ProgressConfig, TimingConfig};
pub use error::{Error, Result};
pub use fit::{estimate_width, fit, FitParams};
pub use stats::SizeTally;
pub use types::{AdvanceTiming, FontSpec, Rgb, SlideRecord, TextBox, TransitionOutcome, WordList};
