//! XLSX workbook reader.
//!
//! Reads the cells of the first column of one named sheet. A workbook is a ZIP
//! archive: `xl/workbook.xml` names the sheets, `xl/_rels/workbook.xml.rels`
//! maps each sheet to its part, and `xl/sharedStrings.xml` holds the string
//! table most text cells point into.

use deck_core::{Error, Result, WordList};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

const WORKBOOK_PATH: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PATH: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";

/// Reader for the first column of a named worksheet.
pub struct XlsxReader {
    sheet: String,
}

impl XlsxReader {
    /// Create a reader for the sheet with the given name.
    pub fn new(sheet: impl Into<String>) -> Self {
        Self { sheet: sheet.into() }
    }

    /// Read the words in column A, skipping blank cells.
    pub fn read_words<R: Read + Seek>(&self, reader: R) -> Result<WordList> {
        Ok(WordList::from_cells(self.read_first_column(reader)?))
    }

    /// Read column A, one entry per row in document order. Rows without a
    /// value in column A yield `None`. No header row is assumed.
    pub fn read_first_column<R: Read + Seek>(&self, reader: R) -> Result<Vec<Option<String>>> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let sheet_path = self.sheet_path(&mut archive)?;
        log::debug!("Sheet '{}' is stored at {}", self.sheet, sheet_path);

        let shared = if archive.file_names().any(|name| name == SHARED_STRINGS_PATH) {
            let content = read_file_from_archive(&mut archive, SHARED_STRINGS_PATH)?;
            parse_shared_strings(&content)?
        } else {
            Vec::new()
        };

        let content = read_file_from_archive(&mut archive, &sheet_path)?;
        parse_first_column(&content, &shared)
    }

    /// Resolve the archive path of the configured sheet.
    fn sheet_path<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<String> {
        let workbook = read_file_from_archive(archive, WORKBOOK_PATH)?;
        let rel_id = find_sheet_rel_id(&workbook, &self.sheet)?
            .ok_or_else(|| Error::SheetNotFound(self.sheet.clone()))?;

        let rels = read_file_from_archive(archive, WORKBOOK_RELS_PATH)?;
        let target = relationship_targets(&rels)?
            .remove(&rel_id)
            .ok_or_else(|| Error::CorruptedFile(format!("No relationship '{}' for sheet '{}'", rel_id, self.sheet)))?;

        Ok(match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("xl/{}", target),
        })
    }
}

/// Find the relationship id of the sheet called `name` in workbook.xml.
fn find_sheet_rel_id(xml: &str, name: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sheet" => {
                let mut sheet_name = None;
                let mut rel_id = None;
                for attr in e.attributes().flatten() {
                    match local_name(attr.key.as_ref()) {
                        b"name" => sheet_name = Some(attr_value(&attr)),
                        b"id" => rel_id = Some(attr_value(&attr)),
                        _ => {}
                    }
                }
                if sheet_name.as_deref() == Some(name) {
                    return Ok(rel_id);
                }
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(Error::XmlError(format!("Error parsing workbook: {}", e))),
            _ => {}
        }
    }
}

/// Map relationship ids to their targets.
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>> {
    let mut targets = HashMap::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                let mut id = String::new();
                let mut target = String::new();
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = attr_value(&attr),
                        b"Target" => target = attr_value(&attr),
                        _ => {}
                    }
                }
                targets.insert(id, target);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }

    Ok(targets)
}

/// Parse the shared string table. Rich-text runs are concatenated; phonetic
/// hints are skipped.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let mut reader = Reader::from_str(xml);

    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"si" => current.clear(),
                b"rPh" => in_phonetic = true,
                b"t" => in_text = !in_phonetic,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if local_name(e.name().as_ref()) == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::XmlError(format!("Bad shared string text: {}", e)))?;
                current.push_str(&text);
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("Error parsing shared strings: {}", e))),
            _ => {}
        }
    }

    log::debug!("Loaded {} shared strings", strings.len());
    Ok(strings)
}

/// A cell of column A being read.
#[derive(Debug, Default)]
struct CellState {
    cell_type: String,
    raw: String,
}

/// Extract the column A value of every row in a worksheet.
fn parse_first_column(xml: &str, shared: &[String]) -> Result<Vec<Option<String>>> {
    let mut rows = Vec::new();
    let mut reader = Reader::from_str(xml);

    let mut next_column: u32 = 1;
    let mut row_value: Option<String> = None;
    let mut cell: Option<CellState> = None;
    let mut in_value = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"row" => {
                    next_column = 1;
                    row_value = None;
                }
                b"c" => {
                    let (column, cell_type) = cell_position(e, &mut next_column)?;
                    if column == 1 {
                        cell = Some(CellState {
                            cell_type,
                            raw: String::new(),
                        });
                    }
                }
                b"v" | b"t" if cell.is_some() => in_value = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if local_name(e.name().as_ref()) == b"c" => {
                cell_position(e, &mut next_column)?;
            }
            Ok(Event::Text(ref e)) if in_value => {
                if let Some(state) = cell.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::XmlError(format!("Bad cell text: {}", e)))?;
                    state.raw.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(state) = cell.take() {
                        row_value = cell_value(&state, shared);
                    }
                }
                b"row" => rows.push(row_value.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("Error parsing worksheet: {}", e))),
            _ => {}
        }
    }

    Ok(rows)
}

/// Read a cell's column and type, advancing the implicit column counter.
fn cell_position(e: &BytesStart, next_column: &mut u32) -> Result<(u32, String)> {
    let mut column = *next_column;
    let mut cell_type = String::from("n");

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"r" => {
                let reference = attr_value(&attr);
                column = column_index(&reference)
                    .ok_or_else(|| Error::CorruptedFile(format!("Invalid cell reference '{}'", reference)))?;
            }
            b"t" => cell_type = attr_value(&attr),
            _ => {}
        }
    }

    *next_column = column.saturating_add(1);
    Ok((column, cell_type))
}

/// Convert a raw cell to its string form. Empty cells yield `None`.
fn cell_value(cell: &CellState, shared: &[String]) -> Option<String> {
    if cell.raw.is_empty() {
        return None;
    }

    match cell.cell_type.as_str() {
        "s" => {
            let value = cell.raw.trim().parse::<usize>().ok().and_then(|idx| shared.get(idx));
            if value.is_none() {
                log::warn!("Shared string index '{}' out of range", cell.raw);
            }
            value.cloned()
        }
        "b" => Some(if cell.raw.trim() == "1" { "TRUE" } else { "FALSE" }.to_string()),
        "n" => Some(format_number(&cell.raw)),
        _ => Some(cell.raw.clone()),
    }
}

/// Render a numeric cell the way a person would type it: integral values
/// without a fractional part.
fn format_number(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n as i64),
        Ok(n) if n.is_finite() => format!("{}", n),
        _ => raw.to_string(),
    }
}

/// Last column a worksheet can hold (`XFD`).
const MAX_COLUMN: u32 = 16_384;

/// 1-based column number of a cell reference like "A1" or "AB12".
/// References past `XFD` yield `None`.
fn column_index(reference: &str) -> Option<u32> {
    let letters: String = reference.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    if letters.is_empty() {
        return None;
    }
    let column = letters
        .to_ascii_uppercase()
        .bytes()
        .try_fold(0u32, |acc, b| acc.checked_mul(26)?.checked_add(u32::from(b - b'A' + 1)))?;
    (column <= MAX_COLUMN).then_some(column)
}

fn attr_value(attr: &quick_xml::events::attributes::Attribute) -> String {
    attr.unescape_value()
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string())
}

/// Extract the local name from a potentially namespaced XML name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Read a file from the ZIP archive.
fn read_file_from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}
