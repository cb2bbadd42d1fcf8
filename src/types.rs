//! Public output types.

use std::sync::Arc;

use crate::attachments::FontFile;

/// The reconstructed text format of a subtitle track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// SubRip (`.srt`).
    Srt,
    /// Advanced SubStation Alpha (`.ass`).
    Ass,
    /// SubStation Alpha (`.ssa`).
    Ssa,
    /// WebVTT (`.vtt`).
    Vtt,
}

impl SubtitleFormat {
    /// Maps a Matroska CodecID to the format this crate reconstructs for it. Unknown
    /// CodecIDs default to SRT assembly.
    pub fn from_codec_id(codec_id: &str) -> Self {
        match codec_id {
            "S_TEXT/ASS" => SubtitleFormat::Ass,
            "S_TEXT/SSA" => SubtitleFormat::Ssa,
            "S_TEXT/WEBVTT" => SubtitleFormat::Vtt,
            _ => SubtitleFormat::Srt,
        }
    }
}

/// Minimal metadata describing a surviving subtitle track.
#[derive(Debug, Clone)]
pub struct TrackMetadata {
    /// The Matroska track number.
    pub track_number: u64,
    /// The track's language, if known.
    pub language: Option<String>,
    /// The track's name, if known.
    pub name: Option<String>,
}

/// The reconstructed subtitle file and its associated fonts (ASS/SSA only).
#[derive(Debug, Clone)]
pub struct TrackOutput {
    /// UTF-8 bytes of the reconstructed subtitle file.
    pub subtitle: Vec<u8>,
    /// Embedded fonts shared by every ASS/SSA track; `None` for other formats.
    pub fonts: Option<Arc<[FontFile]>>,
}

/// One subtitle track's complete extraction result.
#[derive(Debug, Clone)]
pub struct TrackResult {
    /// The reconstructed format.
    pub format: SubtitleFormat,
    /// Track metadata.
    pub metadata: TrackMetadata,
    /// The reconstructed output.
    pub output: TrackOutput,
}

/// A single subtitle block, ready for assembly: absolute timestamp (milliseconds),
/// optional duration, payload, and optional BlockAdditions bytes (WebVTT cue settings).
#[derive(Debug, Clone)]
pub struct SubtitleBlock {
    /// The track this block belongs to.
    pub track_number: u64,
    /// Absolute start timestamp, in milliseconds.
    pub timestamp_ms: i64,
    /// Duration, in milliseconds, if known.
    pub duration_ms: Option<i64>,
    /// The block's raw text payload.
    pub payload: Vec<u8>,
    /// Raw BlockAdditions bytes, if any (used by the WebVTT assembler).
    pub additions: Option<Vec<u8>>,
}
