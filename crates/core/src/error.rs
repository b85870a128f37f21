//! Error types for word deck generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading words or writing a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The word source format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// The named sheet does not exist in the workbook.
    #[error("Sheet not found in workbook: {0}")]
    SheetNotFound(String),

    /// The word source contained no usable words.
    #[error("No usable words found in {0}")]
    NoWords(String),

    /// Invalid or corrupted file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// ZIP archive error (for XLSX and PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlError(String),

    /// The finished deck could not be written to its destination.
    #[error("Failed to save deck: {0}")]
    StorageError(String),

    /// Slide timing markup could not be edited.
    #[error("Could not set slide transitions: {0}")]
    TransitionError(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
