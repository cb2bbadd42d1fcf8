//! Locating the EBML header and Segment, and scanning Segment-level metadata
//! (SeekHead, Info) up to the first Cluster.

use std::collections::HashMap;

use crate::ebml::{ElementIter, read_uint};
use crate::error::Error;
use crate::ids;
use crate::range_reader::RangeReader;

const INITIAL_SCAN_LEN: u64 = 256 * 1024;
const DEFAULT_TIMESTAMP_SCALE: u64 = 1_000_000;

/// Segment-level metadata gathered by the initial scan.
pub struct SegmentMeta {
    /// Offset of the Segment's data (first byte after its header), in file bytes.
    pub data_offset: u64,
    /// Size of the Segment's data. If the Segment declared an unknown size, this is
    /// `file_size - data_offset`.
    pub data_size: u64,
    /// Nanoseconds per timestamp unit; defaults to 1,000,000 (1 ms) if Info/TimestampScale
    /// is absent.
    pub timestamp_scale: u64,
    /// SeekHead entries: element ID -> byte position relative to `data_offset`.
    pub seek_entries: HashMap<u64, u64>,
    /// File offset of the first Cluster encountered during the scan, if any.
    pub first_cluster_offset: Option<u64>,
}

impl SegmentMeta {
    /// Resolve the file offset of `id` via the SeekHead index.
    pub fn seek_offset(&self, id: u64) -> Option<u64> {
        self.seek_entries.get(&id).map(|pos| self.data_offset + pos)
    }
}

/// Reads the initial chunk of the file, validates the EBML header and Segment, and scans
/// Segment-level children (SeekHead, Info) up to the first Cluster.
pub async fn scan(reader: &RangeReader) -> crate::Result<SegmentMeta> {
    let probe_len = INITIAL_SCAN_LEN.min(reader.file_size());
    let buf = reader.read(0, probe_len).await?;

    let mut cursor = &buf[..];
    let ebml_header = crate::ebml::ElementHeader::parse(&mut cursor, 0)?;
    if ebml_header.id.as_encoded() != ids::EBML_HEADER {
        return Err(Error::MalformedContainer(
            "file does not start with an EBML header".to_string(),
        ));
    }
    let ebml_header_len = ebml_header
        .size
        .ok_or_else(|| Error::ElementBodySizeUnknown(ebml_header.id))?;
    let after_ebml = ebml_header.data_offset + ebml_header_len;

    let mut cursor = &buf[after_ebml as usize..];
    let segment_header = crate::ebml::ElementHeader::parse(&mut cursor, after_ebml)?;
    if segment_header.id.as_encoded() != ids::SEGMENT {
        return Err(Error::MalformedContainer(
            "missing top-level Segment element".to_string(),
        ));
    }
    let data_offset = segment_header.data_offset;
    let data_size = match segment_header.size {
        Some(s) => s,
        None => reader.file_size() - data_offset,
    };

    let mut seek_entries = HashMap::new();
    let mut timestamp_scale = DEFAULT_TIMESTAMP_SCALE;
    let mut first_cluster_offset = None;

    let scanned_len = (probe_len as i64 - data_offset as i64).max(0) as usize;
    let body = &buf[data_offset as usize..data_offset as usize + scanned_len];

    for child in ElementIter::new(body, data_offset) {
        match child.header.id.as_encoded() {
            id if id == ids::SEEK_HEAD => {
                for seek in ElementIter::new(child.body, child.header.data_offset) {
                    if seek.header.id.as_encoded() != ids::SEEK {
                        continue;
                    }
                    if let Some((seek_id, pos)) = parse_seek_entry(seek.body) {
                        seek_entries.insert(seek_id, pos);
                    } else {
                        log::warn!("mkv-subtitles: skipped malformed Seek entry");
                    }
                }
            }
            id if id == ids::INFO => {
                for info_child in ElementIter::new(child.body, child.header.data_offset) {
                    if info_child.header.id.as_encoded() == ids::TIMESTAMP_SCALE {
                        if let Ok(scale) = read_uint(info_child.body) {
                            if scale > 0 {
                                timestamp_scale = scale;
                            }
                        }
                    }
                }
            }
            id if id == ids::CLUSTER => {
                first_cluster_offset = Some(child.header.header_offset);
                break;
            }
            id if ids::SEGMENT_TOP_LEVEL_IDS.contains(&id) => {
                // Tracks/Attachments/Cues/Chapters/Tags: located via SeekHead or a later
                // dedicated fetch; nothing to record here.
            }
            other => {
                log::warn!("mkv-subtitles: skipped unknown top-level element {:#x}", other);
            }
        }
    }

    Ok(SegmentMeta {
        data_offset,
        data_size,
        timestamp_scale,
        seek_entries,
        first_cluster_offset,
    })
}

fn parse_seek_entry(body: &[u8]) -> Option<(u64, u64)> {
    let mut id = None;
    let mut position = None;
    for child in ElementIter::new(body, 0) {
        match child.header.id.as_encoded() {
            x if x == ids::SEEK_ID => {
                // SeekID's binary body is the raw EBML-coded ID (marker bit included),
                // i.e. already in the same form as the `ids` module's constants.
                id = read_uint(child.body).ok();
            }
            x if x == ids::SEEK_POSITION => {
                position = read_uint(child.body).ok();
            }
            _ => {}
        }
    }
    Some((id?, position?))
}
