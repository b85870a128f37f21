//! Word sources: spreadsheets and plain word lists.

use crate::reader::XlsxReader;
use deck_core::{Error, Result, WordList};
use std::io::Cursor;
use std::path::PathBuf;

/// The format of a word source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Excel workbook (Office Open XML).
    Xlsx,
    /// One word per line.
    Text,
    /// Comma-separated values; the first field of each line is the word.
    Csv,
}

impl SourceFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            "txt" => Some(Self::Text),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Detect format from file magic bytes. Only ZIP containers are
    /// recognizable this way.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Xlsx);
        }
        None
    }
}

/// A file holding the words of a deck.
#[derive(Debug, Clone)]
pub struct WordSource {
    path: PathBuf,
    sheet: String,
}

impl WordSource {
    /// A source at `path`; `sheet` names the worksheet for workbooks.
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
        }
    }

    /// Read every usable word, in file order.
    pub fn read(&self) -> Result<WordList> {
        let bytes = std::fs::read(&self.path)?;

        let format = SourceFormat::from_magic(&bytes)
            .or_else(|| {
                self.path
                    .extension()
                    .and_then(|e| e.to_str())
                    .and_then(SourceFormat::from_extension)
            })
            .ok_or_else(|| Error::UnsupportedFormat(self.path.display().to_string()))?;
        log::debug!("Reading {} as {:?}", self.path.display(), format);

        let words = match format {
            SourceFormat::Xlsx => XlsxReader::new(&self.sheet).read_words(Cursor::new(bytes))?,
            SourceFormat::Text | SourceFormat::Csv => {
                let text = String::from_utf8(bytes)
                    .map_err(|e| Error::CorruptedFile(format!("{} is not UTF-8: {}", self.path.display(), e)))?;
                match format {
                    SourceFormat::Csv => parse_csv_words(&text)?,
                    _ => parse_word_lines(&text),
                }
            }
        };

        log::debug!("Read {} words from {}", words.len(), self.path.display());
        Ok(words)
    }
}

/// One word per line.
fn parse_word_lines(text: &str) -> WordList {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    WordList::new(text.lines().map(|line| line.trim().to_string()))
}

/// The first field of every record; quoting follows RFC 4180.
fn parse_csv_words(text: &str) -> Result<WordList> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut words = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::CorruptedFile(format!("Bad CSV record: {}", e)))?;
        if let Some(field) = record.get(0) {
            words.push(field.trim().to_string());
        }
    }
    Ok(WordList::new(words))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::tests::sample_workbook;
    use std::io::Write;
    use tempfile::Builder;

    fn write_temp(suffix: &str, content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(SourceFormat::from_magic(b"PK\x03\x04rest"), Some(SourceFormat::Xlsx));
        assert_eq!(SourceFormat::from_magic(b"Haus"), None);
        assert_eq!(SourceFormat::from_extension("XLSX"), Some(SourceFormat::Xlsx));
        assert_eq!(SourceFormat::from_extension("csv"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_extension("ods"), None);
    }

    #[test]
    fn test_reads_workbook_by_magic() {
        // Extension says nothing; the ZIP signature decides
        let file = write_temp(".bin", &sample_workbook());
        let words = WordSource::new(file.path(), "Sheet1").read().unwrap();
        assert_eq!(words.first_few(1), vec!["Haus"]);
    }

    #[test]
    fn test_reads_text_list() {
        let file = write_temp(".txt", "\u{feff}Apfel\n\n  Birne  \r\nKirsche\n".as_bytes());
        let words = WordSource::new(file.path(), "Sheet1").read().unwrap();
        assert_eq!(words.into_inner(), vec!["Apfel", "Birne", "Kirsche"]);
    }

    #[test]
    fn test_reads_csv_first_field() {
        let file = write_temp(".csv", b"\"Apfel\",fruit\nBirne,fruit\n,empty\n");
        let words = WordSource::new(file.path(), "Sheet1").read().unwrap();
        assert_eq!(words.into_inner(), vec!["Apfel", "Birne"]);
    }

    #[test]
    fn test_csv_quoted_fields() {
        let file = write_temp(
            ".csv",
            b"\"Salz, Pfeffer\",spice\n\"Der \"\"gro\xc3\x9fe\"\" Baum\",tree\nBirne,fruit\n",
        );
        let words = WordSource::new(file.path(), "Sheet1").read().unwrap();
        assert_eq!(
            words.into_inner(),
            vec!["Salz, Pfeffer", "Der \"gro\u{df}e\" Baum", "Birne"]
        );
    }

    #[test]
    fn test_csv_with_bom_and_ragged_rows() {
        let file = write_temp(".csv", "\u{feff}Apfel\nBirne,fruit,extra\n\nKirsche,fruit\n".as_bytes());
        let words = WordSource::new(file.path(), "Sheet1").read().unwrap();
        assert_eq!(words.into_inner(), vec!["Apfel", "Birne", "Kirsche"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = WordSource::new("/nonexistent/words.xlsx", "Sheet1").read();
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[test]
    fn test_unknown_format() {
        let file = write_temp(".dat", b"Apfel");
        let result = WordSource::new(file.path(), "Sheet1").read();
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }
}
