//! In-memory OPC package and atomic persistence.

use crate::template::{content_types, XML_DECL};
use deck_core::{Error, Result};
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// A single part of the package.
#[derive(Debug, Clone)]
pub struct Part {
    /// Archive path without a leading slash, e.g. `ppt/slides/slide1.xml`.
    pub name: String,
    /// Override content type; `None` for parts covered by a default.
    pub content_type: Option<&'static str>,
    pub data: String,
}

/// An ordered collection of parts, written out as a ZIP archive.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part. Later parts with the same name replace earlier ones.
    pub fn add(&mut self, name: impl Into<String>, content_type: Option<&'static str>, data: impl Into<String>) {
        let name = name.into();
        self.parts.retain(|p| p.name != name);
        self.parts.push(Part {
            name,
            content_type,
            data: data.into(),
        });
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Generate `[Content_Types].xml` for the current parts.
    pub fn content_types_xml(&self) -> String {
        let mut xml = String::with_capacity(1024 + self.parts.len() * 160);
        xml.push_str(XML_DECL);
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        xml.push_str(&format!(
            r#"<Default Extension="rels" ContentType="{}"/>"#,
            content_types::RELATIONSHIPS
        ));
        xml.push_str(&format!(r#"<Default Extension="xml" ContentType="{}"/>"#, content_types::XML));

        for part in &self.parts {
            if let Some(content_type) = part.content_type {
                xml.push_str(&format!(
                    r#"<Override PartName="/{}" ContentType="{}"/>"#,
                    part.name, content_type
                ));
            }
        }

        xml.push_str("</Types>");
        xml
    }

    /// Write the package as a ZIP archive. The content types part comes first.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut write_entry = |name: &str, data: &str| -> Result<()> {
            zip.start_file(name, options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(data.as_bytes())
                .map_err(|e| Error::ZipError(format!("Failed to write '{}': {}", name, e)))?;
            Ok(())
        };

        write_entry(CONTENT_TYPES_PATH, &self.content_types_xml())?;
        for part in &self.parts {
            write_entry(&part.name, &part.data)?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))
    }

    /// Serialize the whole package into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }
}

/// Write `bytes` to `path` through a temporary file in the same directory,
/// so the destination is either the old file or the complete new one.
pub fn save_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let storage = |e: std::io::Error| Error::StorageError(format!("{}: {}", path.display(), e));

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(storage)?;

    let mut temp_file = NamedTempFile::new_in(parent).map_err(storage)?;
    temp_file.write_all(bytes).map_err(storage)?;
    temp_file.as_file().sync_all().map_err(storage)?;
    temp_file.persist(path).map_err(|e| storage(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn sample_package() -> Package {
        let mut package = Package::new();
        package.add("_rels/.rels", None, "<Relationships/>");
        package.add(
            "ppt/slides/slide1.xml",
            Some(content_types::SLIDE),
            "<p:sld/>",
        );
        package
    }

    #[test]
    fn test_content_types_lists_overrides() {
        let xml = sample_package().content_types_xml();
        assert!(xml.contains(r#"<Default Extension="rels""#));
        assert!(xml.contains(r#"<Override PartName="/ppt/slides/slide1.xml""#));
        assert!(!xml.contains(r#"PartName="/_rels/.rels""#));
    }

    #[test]
    fn test_add_replaces_same_name() {
        let mut package = sample_package();
        package.add("ppt/slides/slide1.xml", Some(content_types::SLIDE), "<p:sld>new</p:sld>");
        assert_eq!(package.parts().len(), 2);
        assert_eq!(package.part("ppt/slides/slide1.xml").unwrap().data, "<p:sld>new</p:sld>");
    }

    #[test]
    fn test_archive_starts_with_content_types() {
        let bytes = sample_package().to_bytes().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), CONTENT_TYPES_PATH);

        let mut slide = String::new();
        archive
            .by_name("ppt/slides/slide1.xml")
            .unwrap()
            .read_to_string(&mut slide)
            .unwrap();
        assert_eq!(slide, "<p:sld/>");
    }

    #[test]
    fn test_save_atomic_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deck.pptx");

        save_atomic(&path, b"first").unwrap();
        save_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_save_into_file_as_directory_fails() {
        let blocker = NamedTempFile::new().unwrap();
        let path = blocker.path().join("deck.pptx");
        let result = save_atomic(&path, b"data");
        assert!(matches!(result, Err(Error::StorageError(_))));
    }
}
