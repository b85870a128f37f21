//! PPTX deck inspector.
//!
//! Reads a finished presentation back: slide order, the text on each slide,
//! the first run's font size, and the slide's auto-advance settings.

use deck_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// A presentation as read back from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InspectedDeck {
    /// Slides in presentation order.
    pub slides: Vec<InspectedSlide>,
}

impl InspectedDeck {
    /// The text of every slide, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.slides.iter().map(|s| s.text.as_str()).collect()
    }
}

/// One slide's content and timing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InspectedSlide {
    /// 1-based slide number.
    pub number: usize,

    /// Text of all shapes, paragraphs joined by newlines.
    pub text: String,

    /// Size of the first text run, in points.
    pub font_size: Option<u32>,

    /// Typeface of the first text run.
    pub typeface: Option<String>,

    pub bold: Option<bool>,

    /// Number of transition elements found anywhere on the slide.
    pub transition_count: usize,

    /// The slide's direct transition, if any.
    pub transition: Option<SlideTiming>,
}

/// Attributes of a `<p:transition>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideTiming {
    pub speed: Option<String>,
    /// Whether a click advances the slide (`advClick`, default true).
    pub advance_on_click: bool,
    /// Auto-advance delay in milliseconds (`advTm`).
    pub advance_after_ms: Option<u64>,
    /// Transition duration in milliseconds (`p14:dur`).
    pub duration_ms: Option<u64>,
}

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<InspectedDeck> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_order = self.get_slide_order(&mut archive)?;
        log::debug!("Found {} slides", slide_order.len());

        let mut deck = InspectedDeck::default();
        for (idx, slide_path) in slide_order.iter().enumerate() {
            let content = self.read_file_from_archive(&mut archive, slide_path)?;
            deck.slides.push(self.parse_slide(&content, idx + 1)?);
        }

        Ok(deck)
    }

    /// Get the ordered list of slide paths.
    ///
    /// Order comes from `sldIdLst` in presentation.xml, resolved through the
    /// presentation relationships. Without a list, slides are sorted by the
    /// number in their relationship id.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, "ppt/_rels/presentation.xml.rels")?;
        let mut slide_rels: HashMap<String, String> = HashMap::new();

        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut id = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                            _ => {}
                        }
                    }

                    if rel_type.ends_with("/slide") {
                        let full_path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("ppt/{}", target),
                        };
                        slide_rels.insert(id, full_path);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing relationships: {}", e)));
                }
                _ => {}
            }
        }

        let presentation = self.read_file_from_archive(archive, "ppt/presentation.xml")?;
        let listed = slide_id_list(&presentation)?;

        if !listed.is_empty() {
            return listed
                .into_iter()
                .map(|rel_id| {
                    slide_rels
                        .remove(&rel_id)
                        .ok_or_else(|| Error::CorruptedFile(format!("Slide relationship '{}' is missing", rel_id)))
                })
                .collect();
        }

        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .into_iter()
            .map(|(id, path)| (path, extract_slide_number(&id)))
            .collect();
        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide's markup.
    fn parse_slide(&self, xml_content: &str, slide_number: usize) -> Result<InspectedSlide> {
        let mut slide = InspectedSlide {
            number: slide_number,
            ..InspectedSlide::default()
        };

        let mut reader = Reader::from_str(xml_content);
        reader.trim_text(true);

        let mut depth = 0usize;
        let mut in_text = false;
        let mut paragraphs: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut seen_run = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    self.inspect_element(e, depth, &mut slide, &mut seen_run);
                    match local_name(e.name().as_ref()) {
                        b"p" if depth > 1 => current.clear(),
                        b"t" => in_text = true,
                        _ => {}
                    }
                    depth += 1;
                }
                Ok(Event::Empty(ref e)) => {
                    self.inspect_element(e, depth, &mut slide, &mut seen_run);
                }
                Ok(Event::Text(ref e)) if in_text => {
                    let text = e.unescape().unwrap_or_default();
                    current.push_str(&text);
                }
                Ok(Event::End(ref e)) => {
                    depth = depth.saturating_sub(1);
                    match local_name(e.name().as_ref()) {
                        b"t" => in_text = false,
                        b"p" if depth > 1 => {
                            if !current.trim().is_empty() {
                                paragraphs.push(current.trim().to_string());
                            }
                            current.clear();
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing slide {}: {}",
                        slide_number, e
                    )));
                }
                _ => {}
            }
        }

        slide.text = paragraphs.join("\n");
        Ok(slide)
    }

    /// Pick up run formatting and transition attributes.
    fn inspect_element(&self, e: &BytesStart, depth: usize, slide: &mut InspectedSlide, seen_run: &mut bool) {
        match local_name(e.name().as_ref()) {
            b"transition" => {
                slide.transition_count += 1;
                // Only direct children of <p:sld> drive playback
                if depth == 1 && slide.transition.is_none() {
                    slide.transition = Some(parse_timing(e));
                }
            }
            b"rPr" if !*seen_run => {
                *seen_run = true;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value);
                    match attr.key.as_ref() {
                        b"sz" => slide.font_size = value.parse::<u32>().ok().map(|sz| sz / 100),
                        b"b" => slide.bold = Some(value == "1" || value == "true"),
                        _ => {}
                    }
                }
            }
            b"latin" if slide.typeface.is_none() && *seen_run => {
                slide.typeface = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() == b"typeface")
                    .map(|a| String::from_utf8_lossy(&a.value).to_string());
            }
            _ => {}
        }
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Relationship ids listed in `<p:sldIdLst>`, in order.
fn slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sldId" => {
                if let Some(attr) = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() != b"id" && local_name(a.key.as_ref()) == b"id")
                {
                    ids.push(String::from_utf8_lossy(&attr.value).to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("Error parsing presentation: {}", e))),
            _ => {}
        }
    }

    Ok(ids)
}

fn parse_timing(e: &BytesStart) -> SlideTiming {
    let mut timing = SlideTiming {
        advance_on_click: true,
        ..SlideTiming::default()
    };

    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match local_name(attr.key.as_ref()) {
            b"spd" => timing.speed = Some(value.to_string()),
            b"advClick" => timing.advance_on_click = !(value == "0" || value == "false"),
            b"advTm" => timing.advance_after_ms = value.parse().ok(),
            b"dur" => timing.duration_ms = value.parse().ok(),
            _ => {}
        }
    }

    timing
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    // Remove common extensions first
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    // Try to find digits at the end
    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_slide_id_list_order() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst><p:sldId id="257" r:id="rId9"/><p:sldId id="256" r:id="rId7"/></p:sldIdLst></p:presentation>"#;
        assert_eq!(slide_id_list(xml).unwrap(), vec!["rId9", "rId7"]);
    }

    #[test]
    fn test_parse_slide_content_and_timing() {
        let xml = concat!(
            r#"<p:sld xmlns:a="a" xmlns:p="p" xmlns:p14="p14"><p:cSld><p:spTree><p:sp><p:txBody><a:bodyPr/>"#,
            r#"<a:p><a:r><a:rPr sz="20000" b="1"><a:latin typeface="Arial"/></a:rPr><a:t>Hallo</a:t></a:r></a:p>"#,
            r#"</p:txBody></p:sp></p:spTree></p:cSld>"#,
            r#"<p:transition spd="fast" p14:dur="3000" advClick="0" advTm="3000"/></p:sld>"#
        );
        let slide = PptxParser::new().parse_slide(xml, 4).unwrap();

        assert_eq!(slide.number, 4);
        assert_eq!(slide.text, "Hallo");
        assert_eq!(slide.font_size, Some(200));
        assert_eq!(slide.bold, Some(true));
        assert_eq!(slide.typeface.as_deref(), Some("Arial"));
        assert_eq!(slide.transition_count, 1);
        assert_eq!(
            slide.transition,
            Some(SlideTiming {
                speed: Some("fast".to_string()),
                advance_on_click: false,
                advance_after_ms: Some(3000),
                duration_ms: Some(3000),
            })
        );
    }

    #[test]
    fn test_slide_without_transition() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree/></p:cSld></p:sld>"#;
        let slide = PptxParser::new().parse_slide(xml, 1).unwrap();
        assert_eq!(slide.transition_count, 0);
        assert!(slide.transition.is_none());
        assert!(slide.text.is_empty());
    }
}
