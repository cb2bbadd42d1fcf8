//! Parsing the Tracks element and keeping only subtitle TrackEntry children.

use crate::ebml::{ElementIter, read_uint, read_utf8};
use crate::elements::fetch_element;
use crate::error::Error;
use crate::ids;
use crate::range_reader::RangeReader;

/// A single subtitle track's metadata.
#[derive(Debug, Clone)]
pub struct SubtitleTrack {
    /// The track number referenced by blocks and Cues.
    pub track_number: u64,
    /// The Matroska CodecID, e.g. `S_TEXT/ASS`.
    pub codec_id: String,
    /// Codec-private bytes (format header), if present.
    pub codec_private: Option<Vec<u8>>,
    /// Track language; `None` if absent or the legacy `"und"` placeholder.
    pub language: Option<String>,
    /// Track name, if present.
    pub name: Option<String>,
    /// Default frame duration in nanoseconds, if present.
    pub default_duration: Option<u64>,
}

/// Fetches and parses the Tracks element at `offset`, returning only subtitle tracks.
pub async fn parse_tracks(reader: &RangeReader, offset: u64) -> crate::Result<Vec<SubtitleTrack>> {
    let (header, body) = fetch_element(reader, offset).await?;
    if header.id.as_encoded() != ids::TRACKS {
        return Err(Error::MalformedContainer(
            "element at recorded Tracks offset is not a Tracks element".to_string(),
        ));
    }

    let mut tracks = Vec::new();
    for entry in ElementIter::new(&body, 0) {
        if entry.header.id.as_encoded() != ids::TRACK_ENTRY {
            continue;
        }
        match parse_track_entry(entry.body) {
            Some(track) => tracks.push(track),
            None => log::warn!("mkv-subtitles: skipped malformed TrackEntry"),
        }
    }
    Ok(tracks)
}

fn parse_track_entry(body: &[u8]) -> Option<SubtitleTrack> {
    let mut track_number = None;
    let mut track_type = None;
    let mut codec_id = None;
    let mut codec_private = None;
    let mut legacy_language: Option<String> = None;
    let mut bcp47_language: Option<String> = None;
    let mut name = None;
    let mut default_duration = None;

    for child in ElementIter::new(body, 0) {
        match child.header.id.as_encoded() {
            id if id == ids::TRACK_NUMBER => track_number = read_uint(child.body).ok(),
            id if id == ids::TRACK_TYPE => track_type = read_uint(child.body).ok(),
            id if id == ids::CODEC_ID => codec_id = read_utf8(child.body).ok(),
            id if id == ids::CODEC_PRIVATE => codec_private = Some(child.body.to_vec()),
            id if id == ids::LANGUAGE => legacy_language = read_utf8(child.body).ok(),
            id if id == ids::LANGUAGE_BCP47 => bcp47_language = read_utf8(child.body).ok(),
            id if id == ids::NAME => name = read_utf8(child.body).ok(),
            id if id == ids::DEFAULT_DURATION => default_duration = read_uint(child.body).ok(),
            _ => {}
        }
    }

    if track_type != Some(ids::TRACK_TYPE_SUBTITLE) {
        return None;
    }

    let language = bcp47_language.or(legacy_language).filter(|l| l != "und");

    Some(SubtitleTrack {
        track_number: track_number?,
        codec_id: codec_id?,
        codec_private,
        language,
        name,
        default_duration,
    })
}
