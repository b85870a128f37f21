//! PPTX deck writer.
//!
//! Holds each slide's markup in memory so the timing pass can edit it before
//! the package is assembled and saved.

use crate::package::{save_atomic, Package};
use crate::template::{self, content_types, rel_types, NS_A, NS_MC, NS_P, NS_P14, NS_R, XML_DECL};
use crate::transition;
use deck_core::{AdvanceTiming, DeckWriter, Result, SlideRecord};
use quick_xml::escape::escape;
use std::path::Path;

/// Relationship ids taken by fixed parts in presentation.xml.rels.
const FIXED_PRESENTATION_RELS: usize = 5;

/// First slide id; ids below 256 are reserved.
const FIRST_SLIDE_ID: usize = 256;

/// One slide's markup.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidePart {
    /// Archive path, e.g. `ppt/slides/slide1.xml`.
    pub name: String,
    pub xml: String,
}

/// A presentation being assembled in memory.
#[derive(Debug, Clone)]
pub struct PptxDeck {
    slides: Vec<SlidePart>,
    /// Slide width in EMUs (914400 EMU = 1 inch).
    slide_width: i64,
    /// Slide height in EMUs.
    slide_height: i64,
    title: String,
}

impl PptxDeck {
    /// Create an empty 10" x 7.5" (4:3) deck.
    pub fn new() -> Self {
        Self {
            slides: Vec::new(),
            slide_width: 9_144_000,
            slide_height: 6_858_000,
            title: "Word Presentation".to_string(),
        }
    }

    /// Set the document title stored in the core properties.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn slides(&self) -> &[SlidePart] {
        &self.slides
    }

    /// Assemble every part of the presentation.
    pub fn package(&self) -> Package {
        let mut package = Package::new();

        package.add("_rels/.rels", None, root_rels_xml());
        package.add(
            "docProps/core.xml",
            Some(content_types::CORE_PROPERTIES),
            template::core_props_xml(&self.title),
        );
        package.add(
            "docProps/app.xml",
            Some(content_types::EXTENDED_PROPERTIES),
            template::app_props_xml(self.slides.len()),
        );

        package.add(
            "ppt/presentation.xml",
            Some(content_types::PRESENTATION),
            self.presentation_xml(),
        );
        package.add("ppt/_rels/presentation.xml.rels", None, self.presentation_rels_xml());

        package.add(
            "ppt/slideMasters/slideMaster1.xml",
            Some(content_types::SLIDE_MASTER),
            template::slide_master_xml(),
        );
        package.add(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            None,
            relationships_xml(&[
                ("rId1", rel_types::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                ("rId2", rel_types::THEME, "../theme/theme1.xml"),
            ]),
        );
        package.add(
            "ppt/slideLayouts/slideLayout1.xml",
            Some(content_types::SLIDE_LAYOUT),
            template::blank_layout_xml(),
        );
        package.add(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            None,
            relationships_xml(&[("rId1", rel_types::SLIDE_MASTER, "../slideMasters/slideMaster1.xml")]),
        );
        package.add("ppt/theme/theme1.xml", Some(content_types::THEME), template::theme_xml());
        package.add("ppt/presProps.xml", Some(content_types::PRES_PROPS), template::pres_props_xml());
        package.add("ppt/viewProps.xml", Some(content_types::VIEW_PROPS), template::view_props_xml());
        package.add(
            "ppt/tableStyles.xml",
            Some(content_types::TABLE_STYLES),
            template::table_styles_xml(),
        );

        let layout_rels = relationships_xml(&[("rId1", rel_types::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml")]);
        for (idx, slide) in self.slides.iter().enumerate() {
            package.add(slide.name.clone(), Some(content_types::SLIDE), slide.xml.clone());
            package.add(
                format!("ppt/slides/_rels/slide{}.xml.rels", idx + 1),
                None,
                layout_rels.clone(),
            );
        }

        package
    }

    /// Serialize the presentation into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package().to_bytes()
    }

    /// Generate presentation.xml.
    fn presentation_xml(&self) -> String {
        let mut xml = String::with_capacity(1024 + self.slides.len() * 48);
        xml.push_str(XML_DECL);
        xml.push_str(&format!(
            r#"<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" saveSubsetFonts="1">"#,
            NS_A, NS_R, NS_P
        ));
        xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);

        if !self.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for idx in 0..self.slides.len() {
                xml.push_str(&format!(
                    r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                    FIRST_SLIDE_ID + idx,
                    FIXED_PRESENTATION_RELS + 1 + idx
                ));
            }
            xml.push_str("</p:sldIdLst>");
        }

        xml.push_str(&format!(
            r#"<p:sldSz cx="{}" cy="{}" type="screen4x3"/>"#,
            self.slide_width, self.slide_height
        ));
        xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
        xml.push_str("</p:presentation>");
        xml
    }

    /// Generate presentation.xml.rels; slides follow the fixed parts.
    fn presentation_rels_xml(&self) -> String {
        let mut rels: Vec<(String, &str, String)> = vec![
            ("rId1".into(), rel_types::SLIDE_MASTER, "slideMasters/slideMaster1.xml".into()),
            ("rId2".into(), rel_types::PRES_PROPS, "presProps.xml".into()),
            ("rId3".into(), rel_types::VIEW_PROPS, "viewProps.xml".into()),
            ("rId4".into(), rel_types::THEME, "theme/theme1.xml".into()),
            ("rId5".into(), rel_types::TABLE_STYLES, "tableStyles.xml".into()),
        ];
        for idx in 0..self.slides.len() {
            rels.push((
                format!("rId{}", FIXED_PRESENTATION_RELS + 1 + idx),
                rel_types::SLIDE,
                format!("slides/slide{}.xml", idx + 1),
            ));
        }

        let borrowed: Vec<(&str, &str, &str)> = rels
            .iter()
            .map(|(id, rel_type, target)| (id.as_str(), *rel_type, target.as_str()))
            .collect();
        relationships_xml(&borrowed)
    }
}

impl Default for PptxDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckWriter for PptxDeck {
    fn add_slide(&mut self, slide: &SlideRecord) -> Result<()> {
        let number = self.slides.len() + 1;
        self.slides.push(SlidePart {
            name: format!("ppt/slides/slide{}.xml", number),
            xml: slide_xml(slide),
        });
        Ok(())
    }

    fn set_auto_advance(&mut self, timing: &AdvanceTiming) -> Result<usize> {
        transition::set_auto_advance(&mut self.slides, timing)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        save_atomic(path, &bytes)?;
        log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn slide_count(&self) -> usize {
        self.slides.len()
    }
}

/// Markup for a slide holding one centered, single-line word.
pub fn slide_xml(slide: &SlideRecord) -> String {
    let (x, y, cx, cy) = slide.text_box.to_emu();
    let font = &slide.font;

    let mut xml = String::with_capacity(1536);
    xml.push_str(XML_DECL);
    xml.push_str(&format!(
        r#"<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" xmlns:mc="{}" xmlns:p14="{}" mc:Ignorable="p14">"#,
        NS_A, NS_R, NS_P, NS_MC, NS_P14
    ));
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(template::GROUP_SHAPE_HEADER);

    xml.push_str(r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="TextBox 1"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#);
    xml.push_str(&format!(
        r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        x, y, cx, cy
    ));
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#);

    // Single line, no insets, vertically centered
    xml.push_str(r#"<p:txBody><a:bodyPr wrap="none" lIns="0" tIns="0" rIns="0" bIns="0" anchor="ctr"/>"#);
    xml.push_str("<a:lstStyle/>");
    xml.push_str(r#"<a:p><a:pPr algn="ctr"/><a:r>"#);
    xml.push_str(&format!(
        r#"<a:rPr lang="de-DE" sz="{}" b="{}" dirty="0">"#,
        font.size.saturating_mul(100),
        if font.bold { 1 } else { 0 }
    ));
    xml.push_str(&format!(
        r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
        font.color.to_hex()
    ));
    let typeface = escape(&font.family);
    xml.push_str(&format!(
        r#"<a:latin typeface="{0}"/><a:cs typeface="{0}"/></a:rPr>"#,
        typeface
    ));
    xml.push_str(&format!("<a:t>{}</a:t></a:r></a:p>", escape(&slide.text)));
    xml.push_str("</p:txBody></p:sp>");

    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sld>");
    xml
}

fn root_rels_xml() -> String {
    relationships_xml(&[
        ("rId1", rel_types::OFFICE_DOCUMENT, "ppt/presentation.xml"),
        ("rId2", rel_types::CORE_PROPERTIES, "docProps/core.xml"),
        ("rId3", rel_types::EXTENDED_PROPERTIES, "docProps/app.xml"),
    ])
}

/// Generate a relationships part from `(id, type, target)` triples.
fn relationships_xml(rels: &[(&str, &str, &str)]) -> String {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    for (id, rel_type, target) in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            id, rel_type, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use deck_core::{FontSpec, Rgb, TextBox};

    pub(crate) fn record(number: usize, text: &str, size: u32) -> SlideRecord {
        SlideRecord {
            number,
            text: text.to_string(),
            text_box: TextBox::default(),
            font: FontSpec {
                family: "DCH-Basisschrift".to_string(),
                size,
                bold: true,
                color: Rgb::BLACK,
            },
        }
    }

    #[test]
    fn test_slide_xml_text_box() {
        let xml = slide_xml(&record(1, "Haus", 320));
        assert!(xml.contains(r#"<a:off x="685800" y="1371600"/>"#));
        assert!(xml.contains(r#"<a:ext cx="7772400" cy="4572000"/>"#));
        assert!(xml.contains(r#"wrap="none""#));
        assert!(xml.contains(r#"anchor="ctr""#));
        assert!(xml.contains(r#"<a:pPr algn="ctr"/>"#));
        assert!(xml.contains(r#"sz="32000" b="1""#));
        assert!(xml.contains(r#"<a:srgbClr val="000000"/>"#));
        assert!(xml.contains(r#"<a:latin typeface="DCH-Basisschrift"/>"#));
        assert!(xml.contains("<a:t>Haus</a:t>"));
    }

    #[test]
    fn test_slide_xml_escapes_text() {
        let xml = slide_xml(&record(1, "Salz & <Pfeffer>", 100));
        assert!(xml.contains("<a:t>Salz &amp; &lt;Pfeffer&gt;</a:t>"));
    }

    #[test]
    fn test_slide_xml_huge_size_saturates() {
        let xml = slide_xml(&record(1, "Riese", u32::MAX));
        assert!(xml.contains(&format!(r#"sz="{}""#, u32::MAX)));
    }

    #[test]
    fn test_presentation_lists_slides_in_order() {
        let mut deck = PptxDeck::new();
        deck.add_slide(&record(1, "eins", 320)).unwrap();
        deck.add_slide(&record(2, "zwei", 320)).unwrap();

        let xml = deck.presentation_xml();
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId6"/><p:sldId id="257" r:id="rId7"/>"#));

        let rels = deck.presentation_rels_xml();
        assert!(rels.contains(r#"Id="rId6" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml""#));
        assert!(rels.contains(r#"Id="rId7""#));
    }

    #[test]
    fn test_package_contains_every_slide() {
        let mut deck = PptxDeck::new();
        for (i, word) in ["a", "b", "c"].iter().enumerate() {
            deck.add_slide(&record(i + 1, word, 320)).unwrap();
        }

        let package = deck.package();
        for n in 1..=3 {
            assert!(package.part(&format!("ppt/slides/slide{}.xml", n)).is_some());
            assert!(package.part(&format!("ppt/slides/_rels/slide{}.xml.rels", n)).is_some());
        }
        assert!(package.content_types_xml().contains("/ppt/slides/slide3.xml"));
        assert!(package.part("docProps/app.xml").unwrap().data.contains("<Slides>3</Slides>"));
    }

    #[test]
    fn test_empty_deck_has_no_slide_list() {
        let deck = PptxDeck::new();
        assert!(!deck.presentation_xml().contains("sldIdLst"));
        assert!(deck.to_bytes().is_ok());
    }
}
