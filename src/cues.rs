//! Parsing the Cues index into `(time, track, cluster position, relative position?)`
//! entries.

use crate::ebml::{ElementIter, read_uint};
use crate::elements::fetch_element;
use crate::error::Error;
use crate::ids;
use crate::range_reader::RangeReader;

/// A single CueTrackPositions entry, scoped to the CuePoint's time.
#[derive(Debug, Clone, Copy)]
pub struct CueEntry {
    /// Raw CueTime, in the Segment's timestamp-scale units.
    pub time: u64,
    /// The track this entry targets.
    pub track: u64,
    /// Byte position of the referenced Cluster, relative to Segment data start.
    pub cluster_position: u64,
    /// Byte position of the block within the Cluster, relative to the first byte after
    /// the Cluster's own header, if present.
    pub relative_position: Option<u64>,
}

/// Fetches and parses the Cues element at `offset`.
pub async fn parse_cues(reader: &RangeReader, offset: u64) -> crate::Result<Vec<CueEntry>> {
    let (header, body) = fetch_element(reader, offset).await?;
    if header.id.as_encoded() != ids::CUES {
        return Err(Error::MalformedContainer(
            "element at recorded Cues offset is not a Cues element".to_string(),
        ));
    }

    let mut entries = Vec::new();
    for point in ElementIter::new(&body, 0) {
        if point.header.id.as_encoded() != ids::CUE_POINT {
            continue;
        }
        parse_cue_point(point.body, &mut entries);
    }
    Ok(entries)
}

fn parse_cue_point(body: &[u8], out: &mut Vec<CueEntry>) {
    let mut time = None;
    let mut positions = Vec::new();

    for child in ElementIter::new(body, 0) {
        match child.header.id.as_encoded() {
            id if id == ids::CUE_TIME => time = read_uint(child.body).ok(),
            id if id == ids::CUE_TRACK_POSITIONS => {
                if let Some(p) = parse_cue_track_positions(child.body) {
                    positions.push(p);
                } else {
                    log::warn!("mkv-subtitles: skipped malformed CueTrackPositions");
                }
            }
            _ => {}
        }
    }

    let Some(time) = time else {
        log::warn!("mkv-subtitles: skipped CuePoint without a CueTime");
        return;
    };
    for (track, cluster_position, relative_position) in positions {
        out.push(CueEntry {
            time,
            track,
            cluster_position,
            relative_position,
        });
    }
}

fn parse_cue_track_positions(body: &[u8]) -> Option<(u64, u64, Option<u64>)> {
    let mut track = None;
    let mut cluster_position = None;
    let mut relative_position = None;

    for child in ElementIter::new(body, 0) {
        match child.header.id.as_encoded() {
            id if id == ids::CUE_TRACK => track = read_uint(child.body).ok(),
            id if id == ids::CUE_CLUSTER_POSITION => cluster_position = read_uint(child.body).ok(),
            id if id == ids::CUE_RELATIVE_POSITION => {
                relative_position = read_uint(child.body).ok()
            }
            _ => {}
        }
    }

    Some((track?, cluster_position?, relative_position))
}
