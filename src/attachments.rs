//! Parsing the Attachments element and keeping only font files.

use crate::ebml::{ElementIter, read_utf8};
use crate::elements::fetch_element;
use crate::error::Error;
use crate::ids;
use crate::range_reader::RangeReader;

/// A single embedded font, extracted from an AttachedFile.
#[derive(Debug, Clone)]
pub struct FontFile {
    /// The original attachment file name, e.g. `NotoSans-Bold.ttf`.
    pub file_name: String,
    /// The raw font bytes.
    pub data: Vec<u8>,
}

const FONT_MIME_TYPES: &[&str] = &[
    "font/ttf",
    "font/otf",
    "font/woff",
    "font/woff2",
    "font/sfnt",
    "application/font-sfnt",
    "application/font-woff",
    "application/font-woff2",
    "application/x-truetype-font",
    "application/x-font-ttf",
    "application/x-font-otf",
    "application/vnd.ms-opentype",
];

const FONT_EXTENSIONS: &[&str] = &[".ttf", ".otf", ".woff", ".woff2"];

fn is_font(mime: Option<&str>, file_name: &str) -> bool {
    if let Some(mime) = mime {
        let lower = mime.to_ascii_lowercase();
        if FONT_MIME_TYPES.contains(&lower.as_str()) || lower.starts_with("application/font-") {
            return true;
        }
    }
    let lower_name = file_name.to_ascii_lowercase();
    FONT_EXTENSIONS.iter().any(|ext| lower_name.ends_with(ext))
}

/// Fetches and parses the Attachments element at `offset`, returning only font files.
pub async fn parse_attachments(reader: &RangeReader, offset: u64) -> crate::Result<Vec<FontFile>> {
    let (header, body) = fetch_element(reader, offset).await?;
    if header.id.as_encoded() != ids::ATTACHMENTS {
        return Err(Error::MalformedContainer(
            "element at recorded Attachments offset is not an Attachments element".to_string(),
        ));
    }

    let mut fonts = Vec::new();
    for entry in ElementIter::new(&body, 0) {
        if entry.header.id.as_encoded() != ids::ATTACHED_FILE {
            continue;
        }
        if let Some(font) = parse_attached_file(entry.body) {
            fonts.push(font);
        }
    }
    Ok(fonts)
}

fn parse_attached_file(body: &[u8]) -> Option<FontFile> {
    let mut file_name = None;
    let mut mime_type = None;
    let mut data = None;

    for child in ElementIter::new(body, 0) {
        match child.header.id.as_encoded() {
            id if id == ids::FILE_NAME => file_name = read_utf8(child.body).ok(),
            id if id == ids::FILE_MIME_TYPE => mime_type = read_utf8(child.body).ok(),
            id if id == ids::FILE_DATA => data = Some(child.body.to_vec()),
            _ => {}
        }
    }

    let file_name = file_name?;
    let data = data?;
    if !is_font(mime_type.as_deref(), &file_name) {
        return None;
    }
    Some(FontFile { file_name, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_detected_by_mime() {
        assert!(is_font(Some("application/x-truetype-font"), "file.bin"));
    }

    #[test]
    fn font_detected_by_extension_when_mime_missing() {
        assert!(is_font(None, "NotoSans-Bold.ttf"));
        assert!(is_font(None, "NotoSans-Bold.WOFF2"));
    }

    #[test]
    fn non_font_rejected() {
        assert!(!is_font(Some("image/png"), "cover.png"));
    }

    #[test]
    fn font_detected_by_application_font_wildcard() {
        assert!(is_font(Some("application/font-truetype"), "file.bin"));
        assert!(is_font(Some("Application/Font-Sfnt"), "file.bin"));
    }
}
