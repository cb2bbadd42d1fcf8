//! Linear cluster-scan fallback, used when no Cue index is available (or usable).

use std::collections::HashSet;

use crate::block::{parse_block, parse_block_group};
use crate::ebml::{ElementHeader, read_uint};
use crate::error::Error;
use crate::functional::Decode;
use crate::ids;
use crate::range_reader::RangeReader;
use crate::types::SubtitleBlock;
use crate::vint::VInt64;

const BLOCK_PEEK_LEN: u64 = 16;

/// Walks Clusters from `start_offset` to `segment_end`, extracting blocks for
/// `wanted_tracks` only.
pub async fn scan(
    reader: &RangeReader,
    start_offset: u64,
    segment_end: u64,
    timestamp_scale: u64,
    wanted_tracks: &HashSet<u64>,
) -> crate::Result<Vec<SubtitleBlock>> {
    let mut blocks = Vec::new();
    let mut cursor = start_offset;
    // None => top level (outside any cluster). Some((cluster_ts, cluster_end)) otherwise;
    // cluster_end is None for an unknown-size Cluster, ended by the next recognized
    // Segment top-level element.
    let mut cluster_ctx: Option<(u64, Option<u64>)> = None;

    while cursor < segment_end {
        let probe = reader
            .read(cursor, BLOCK_PEEK_LEN.min(segment_end - cursor))
            .await?;
        if probe.is_empty() {
            break;
        }
        let mut head_cursor = &probe[..];
        let header = match ElementHeader::parse(&mut head_cursor, cursor) {
            Ok(h) => h,
            Err(_) => break,
        };

        let id = header.id.as_encoded();

        if id == ids::CLUSTER {
            let end = header.size.map(|s| header.data_offset + s);
            cluster_ctx = Some((0, end));
            cursor = header.data_offset;
            continue;
        }

        if let Some((cluster_ts, cluster_end)) = cluster_ctx {
            if cluster_end.is_none() && ids::SEGMENT_TOP_LEVEL_IDS.contains(&id) {
                // Unknown-size Cluster ends where the next top-level Segment child begins.
                cluster_ctx = None;
                continue;
            }

            match id {
                x if x == ids::CLUSTER_TIMESTAMP => {
                    let size = header.size.ok_or(Error::ElementBodySizeUnknown(header.id))?;
                    let body = reader.read(header.data_offset, size).await?;
                    let ts = read_uint(&body).unwrap_or(cluster_ts);
                    cluster_ctx = Some((ts, cluster_end));
                    cursor = header.data_offset + size;
                }
                x if x == ids::SIMPLE_BLOCK => {
                    let size = header.size.ok_or(Error::ElementBodySizeUnknown(header.id))?;
                    let peek = reader.read(header.data_offset, size.min(10)).await?;
                    if let Some(track) = peek_track_number(&peek) {
                        if wanted_tracks.contains(&track) {
                            let body = reader.read(header.data_offset, size).await?;
                            if let Ok(parsed) = parse_block(&body) {
                                blocks.push(to_subtitle_block(
                                    parsed.track_number,
                                    cluster_ts,
                                    parsed.relative_timestamp,
                                    None,
                                    parsed.data,
                                    None,
                                    timestamp_scale,
                                ));
                            }
                        }
                    }
                    cursor = header.data_offset + size;
                }
                x if x == ids::BLOCK_GROUP => {
                    let size = header.size.ok_or(Error::ElementBodySizeUnknown(header.id))?;
                    let body = reader.read(header.data_offset, size).await?;
                    if let Ok(group) = parse_block_group(&body) {
                        if wanted_tracks.contains(&group.block.track_number) {
                            blocks.push(to_subtitle_block(
                                group.block.track_number,
                                cluster_ts,
                                group.block.relative_timestamp,
                                group.duration,
                                group.block.data,
                                group.additions,
                                timestamp_scale,
                            ));
                        }
                    }
                    cursor = header.data_offset + size;
                }
                _ => match header.size {
                    Some(size) => cursor = header.data_offset + size,
                    None => break,
                },
            }
            continue;
        }

        // Outside any cluster: skip this top-level element by its declared size.
        match header.size {
            Some(size) => cursor = header.data_offset + size,
            None => break,
        }
    }

    Ok(blocks)
}

fn peek_track_number(body_prefix: &[u8]) -> Option<u64> {
    let mut cursor = body_prefix;
    VInt64::decode(&mut cursor).ok().map(|v| *v)
}

#[allow(clippy::too_many_arguments)]
fn to_subtitle_block(
    track_number: u64,
    cluster_ts: u64,
    relative_ts: i16,
    duration_raw: Option<u64>,
    payload: &[u8],
    additions: Option<&[u8]>,
    timestamp_scale: u64,
) -> SubtitleBlock {
    let abs_ts = (cluster_ts as i64 + relative_ts as i64) as f64 * (timestamp_scale as f64 / 1e6);
    let duration_ms = duration_raw.map(|d| (d as f64 * (timestamp_scale as f64 / 1e6)) as i64);
    SubtitleBlock {
        track_number,
        timestamp_ms: abs_ts as i64,
        duration_ms,
        payload: payload.to_vec(),
        additions: additions.map(|a| a.to_vec()),
    }
}
