//! Cue-driven targeted block fetch: turns a sparse set of byte offsets into a small
//! number of coalesced HTTP range reads.

use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cues::CueEntry;
use crate::ebml::ElementHeader;
use crate::elements::fetch_element;
use crate::error::Error;
use crate::ids;
use crate::range_reader::RangeReader;
use crate::types::SubtitleBlock;

const BLOCK_SIZE_ESTIMATE: u64 = 4 * 1024;
const MIN_THRESHOLD: u64 = 32 * 1024;
const MAX_THRESHOLD: u64 = 2 * 1024 * 1024;
const WIDE_GAP_THRESHOLD: u64 = 128 * 1024;

#[derive(Clone, Copy)]
struct DirectTarget {
    offset: u64,
    cue: CueEntry,
}

/// Fetches subtitle blocks for `cues`, using the Cue index to minimize the number (and
/// size) of HTTP range reads. `cues` must already be filtered to the tracks of interest.
pub async fn fetch(
    reader: Arc<RangeReader>,
    segment_data_offset: u64,
    segment_end: u64,
    cues: &[CueEntry],
    timestamp_scale: u64,
    concurrency: NonZeroUsize,
) -> crate::Result<Vec<SubtitleBlock>> {
    if cues.is_empty() {
        return Ok(Vec::new());
    }

    let wanted_tracks: HashSet<u64> = cues.iter().map(|c| c.track).collect();

    let mut by_cluster: BTreeMap<u64, Vec<CueEntry>> = BTreeMap::new();
    for cue in cues {
        by_cluster.entry(cue.cluster_position).or_default().push(*cue);
    }

    let cluster_header_width =
        probe_cluster_header_width(&reader, segment_data_offset, &by_cluster).await?;

    let mut direct_targets = Vec::new();
    let mut fallback_clusters = Vec::new();

    for (cluster_position, entries) in &by_cluster {
        if entries.iter().all(|e| e.relative_position.is_some()) {
            for entry in entries {
                let offset = segment_data_offset
                    + cluster_position
                    + cluster_header_width
                    + entry.relative_position.unwrap();
                direct_targets.push(DirectTarget {
                    offset,
                    cue: *entry,
                });
            }
        } else {
            fallback_clusters.push(*cluster_position);
        }
    }

    direct_targets.sort_by_key(|t| t.offset);

    let batches = group_into_batches(&direct_targets);

    if concurrency.get() == 1 {
        let mut blocks = Vec::new();
        for batch in &batches {
            blocks.extend(fetch_batch(&reader, batch, timestamp_scale).await?);
        }
        blocks.extend(
            fetch_fallback_clusters(
                &reader,
                segment_data_offset,
                segment_end,
                &fallback_clusters,
                timestamp_scale,
                &wanted_tracks,
            )
            .await?,
        );
        blocks.sort_by_key(|b| b.timestamp_ms);
        return Ok(blocks);
    }

    let batches = Arc::new(batches);
    let next_index = Arc::new(AtomicUsize::new(0));
    let mut results: Vec<Option<Vec<SubtitleBlock>>> = (0..batches.len()).map(|_| None).collect();
    let mut join_set = tokio::task::JoinSet::new();

    for _ in 0..concurrency.get().min(batches.len().max(1)) {
        let batches = Arc::clone(&batches);
        let next_index = Arc::clone(&next_index);
        let reader = Arc::clone(&reader);
        join_set.spawn(async move {
            let mut local: Vec<(usize, crate::Result<Vec<SubtitleBlock>>)> = Vec::new();
            loop {
                let idx = next_index.fetch_add(1, Ordering::SeqCst);
                if idx >= batches.len() {
                    break;
                }
                let result = fetch_batch(&reader, &batches[idx], timestamp_scale).await;
                local.push((idx, result));
            }
            local
        });
    }

    while let Some(outcome) = join_set.join_next().await {
        let local = outcome.map_err(|e| Error::Transport {
            offset: 0,
            end: 0,
            status: None,
            message: format!("worker task panicked: {e}"),
        })?;
        for (idx, result) in local {
            results[idx] = Some(result?);
        }
    }

    let mut blocks: Vec<SubtitleBlock> = results.into_iter().flatten().flatten().collect();
    blocks.extend(
        fetch_fallback_clusters(
            &reader,
            segment_data_offset,
            segment_end,
            &fallback_clusters,
            timestamp_scale,
            &wanted_tracks,
        )
        .await?,
    );
    blocks.sort_by_key(|b| b.timestamp_ms);
    Ok(blocks)
}

async fn probe_cluster_header_width(
    reader: &RangeReader,
    segment_data_offset: u64,
    by_cluster: &BTreeMap<u64, Vec<CueEntry>>,
) -> crate::Result<u64> {
    let first_cluster_position = *by_cluster
        .keys()
        .next()
        .ok_or_else(|| Error::MissingElement(crate::vint::VInt64::from_encoded(ids::CLUSTER)))?;
    let probe = reader
        .read(segment_data_offset + first_cluster_position, 16)
        .await?;
    let mut cursor = &probe[..];
    let header = ElementHeader::parse(&mut cursor, segment_data_offset + first_cluster_position)?;
    if header.id.as_encoded() != ids::CLUSTER {
        return Err(Error::MalformedContainer(
            "Cue cluster position does not point at a Cluster element".to_string(),
        ));
    }
    Ok(header.data_offset - header.header_offset)
}

fn group_into_batches(targets: &[DirectTarget]) -> Vec<Vec<DirectTarget>> {
    if targets.is_empty() {
        return Vec::new();
    }

    let gaps: Vec<u64> = targets
        .windows(2)
        .map(|w| w[1].offset.saturating_sub(w[0].offset))
        .collect();
    let threshold = batch_threshold(&gaps);

    let mut batches: Vec<Vec<DirectTarget>> = vec![vec![targets[0]]];
    for pair in targets.windows(2) {
        let gap = pair[1].offset.saturating_sub(pair[0].offset);
        if gap > threshold {
            batches.push(vec![pair[1]]);
        } else {
            batches.last_mut().unwrap().push(pair[1]);
        }
    }
    batches
}

fn batch_threshold(gaps: &[u64]) -> u64 {
    if gaps.is_empty() {
        return MIN_THRESHOLD;
    }
    let mut sorted = gaps.to_vec();
    sorted.sort_unstable();
    let median = sorted[sorted.len() / 2];
    if median < MAX_THRESHOLD {
        (median * 2).clamp(MIN_THRESHOLD, MAX_THRESHOLD)
    } else {
        WIDE_GAP_THRESHOLD
    }
}

async fn fetch_batch(
    reader: &RangeReader,
    batch: &[DirectTarget],
    timestamp_scale: u64,
) -> crate::Result<Vec<SubtitleBlock>> {
    let first = batch.first().unwrap().offset;
    let last = batch.last().unwrap().offset;
    let batch_buf = reader
        .read_uncached(first, last + BLOCK_SIZE_ESTIMATE - first)
        .await?;

    let mut blocks = Vec::with_capacity(batch.len());
    for target in batch {
        let rel = (target.offset - first) as usize;
        let slice = &batch_buf[rel.min(batch_buf.len())..];
        let parsed = if let Ok(header) = peek_header(slice, target.offset) {
            match header.total_len() {
                Some(total) if total as usize <= slice.len() => {
                    parse_target_body(&slice[..total as usize], &header)
                }
                _ => {
                    let (header, body) = fetch_element(reader, target.offset).await?;
                    parse_target_body(&body, &header)
                }
            }
        } else {
            let (header, body) = fetch_element(reader, target.offset).await?;
            parse_target_body(&body, &header)
        };

        if let Some((track, payload, additions, duration_raw)) = parsed? {
            if track != target.cue.track {
                continue;
            }
            let ts_ms = (target.cue.time as f64 * (timestamp_scale as f64 / 1e6)) as i64;
            let duration_ms =
                duration_raw.map(|d| (d as f64 * (timestamp_scale as f64 / 1e6)) as i64);
            blocks.push(SubtitleBlock {
                track_number: track,
                timestamp_ms: ts_ms,
                duration_ms,
                payload,
                additions,
            });
        }
    }
    Ok(blocks)
}

fn peek_header(slice: &[u8], offset: u64) -> crate::Result<ElementHeader> {
    let mut cursor = slice;
    ElementHeader::parse(&mut cursor, offset)
}

fn parse_target_body(
    element_bytes: &[u8],
    header: &ElementHeader,
) -> crate::Result<Option<(u64, Vec<u8>, Option<Vec<u8>>, Option<u64>)>> {
    let header_len = (header.data_offset - header.header_offset) as usize;
    let body = element_bytes.get(header_len..).unwrap_or(&[]);

    match header.id.as_encoded() {
        id if id == ids::SIMPLE_BLOCK => match crate::block::parse_block(body) {
            Ok(parsed) => Ok(Some((
                parsed.track_number,
                parsed.data.to_vec(),
                None,
                None,
            ))),
            Err(Error::LacedBlock(_)) => Ok(None),
            Err(e) => Err(e),
        },
        id if id == ids::BLOCK_GROUP => match crate::block::parse_block_group(body) {
            Ok(group) => Ok(Some((
                group.block.track_number,
                group.block.data.to_vec(),
                group.additions.map(|a| a.to_vec()),
                group.duration,
            ))),
            Err(Error::LacedBlock(_)) => Ok(None),
            Err(e) => Err(e),
        },
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(offset: u64) -> DirectTarget {
        DirectTarget {
            offset,
            cue: CueEntry {
                time: 0,
                track: 1,
                cluster_position: 0,
                relative_position: Some(0),
            },
        }
    }

    #[test]
    fn wide_gap_splits_into_two_batches() {
        // Gaps of 50, 50, 189_900 bytes: the first two are tight enough to coalesce, the
        // last is far wider than the adaptive threshold they imply and starts a new batch.
        let targets = vec![
            target(1_000),
            target(1_050),
            target(1_100),
            target(191_000),
        ];
        let batches = group_into_batches(&targets);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[1].len(), 1);
    }

    #[test]
    fn uniform_small_gaps_stay_in_one_batch() {
        let targets: Vec<_> = (0..5).map(|i| target(1_000 + i * 4_000)).collect();
        let batches = group_into_batches(&targets);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 5);
    }

    #[test]
    fn batch_threshold_clamps_tiny_median_to_minimum() {
        assert_eq!(batch_threshold(&[50, 50]), MIN_THRESHOLD);
    }

    #[test]
    fn batch_threshold_uses_flat_wide_gap_value_above_max() {
        assert_eq!(batch_threshold(&[3_000_000, 3_000_000]), WIDE_GAP_THRESHOLD);
    }
}

async fn fetch_fallback_clusters(
    reader: &RangeReader,
    segment_data_offset: u64,
    segment_end: u64,
    cluster_positions: &[u64],
    timestamp_scale: u64,
    wanted_tracks: &HashSet<u64>,
) -> crate::Result<Vec<SubtitleBlock>> {
    let mut blocks = Vec::new();
    for &cluster_position in cluster_positions {
        let cluster_offset = segment_data_offset + cluster_position;
        let probe = reader.read(cluster_offset, 16).await?;
        let mut cursor = &probe[..];
        let header = ElementHeader::parse(&mut cursor, cluster_offset)?;
        let end = header.size.map(|s| header.data_offset + s).unwrap_or(segment_end);
        blocks.extend(
            super::linear::scan(reader, header.header_offset, end, timestamp_scale, wanted_tracks)
                .await?,
        );
    }
    Ok(blocks)
}
