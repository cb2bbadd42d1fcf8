//! Wires the pipeline together: locate metadata, filter tracks, fetch blocks, assemble.

use std::collections::HashMap;
use std::sync::Arc;

use crate::assemblers::assemble;
use crate::attachments::{FontFile, parse_attachments};
use crate::cues::parse_cues;
use crate::error::Error;
use crate::fetcher::{linear, targeted};
use crate::ids;
use crate::options::Options;
use crate::range_reader::RangeReader;
use crate::segment;
use crate::tracks::parse_tracks;
use crate::types::{SubtitleBlock, SubtitleFormat, TrackMetadata, TrackOutput, TrackResult};

/// Extracts every subtitle track (and, for ASS/SSA, embedded fonts) from the Matroska
/// file at `url`, downloading only the bytes needed to do so.
pub async fn extract_subtitles(url: &str, options: &Options) -> crate::Result<Vec<TrackResult>> {
    let reader = Arc::new(
        RangeReader::open(
            url,
            Arc::clone(&options.fetch),
            options.headers.clone(),
            options.allow_full_download,
            options.verbose,
        )
        .await?,
    );

    let meta = segment::scan(&reader).await?;

    let tracks_offset = meta
        .seek_offset(ids::TRACKS)
        .ok_or_else(|| Error::MalformedContainer("no Tracks element indexed by SeekHead".to_string()))?;
    let all_tracks = parse_tracks(&reader, tracks_offset).await?;

    let surviving_tracks: Vec<_> = all_tracks
        .into_iter()
        .filter(|t| options.language_allowed(t.language.as_deref()))
        .collect();
    if surviving_tracks.is_empty() {
        return Ok(Vec::new());
    }

    let has_ass_or_ssa = surviving_tracks
        .iter()
        .any(|t| matches!(SubtitleFormat::from_codec_id(&t.codec_id), SubtitleFormat::Ass | SubtitleFormat::Ssa));

    let fonts: Option<Arc<[FontFile]>> = if has_ass_or_ssa {
        if let Some(attachments_offset) = meta.seek_offset(ids::ATTACHMENTS) {
            let fonts = parse_attachments(&reader, attachments_offset).await?;
            if fonts.is_empty() {
                None
            } else {
                Some(Arc::from(fonts))
            }
        } else {
            None
        }
    } else {
        None
    };

    let wanted_tracks: std::collections::HashSet<u64> =
        surviving_tracks.iter().map(|t| t.track_number).collect();

    let segment_end = meta.data_offset + meta.data_size;

    let blocks = if let Some(cues_offset) = meta.seek_offset(ids::CUES) {
        let all_cues = parse_cues(&reader, cues_offset).await?;
        let filtered_cues: Vec<_> = all_cues
            .into_iter()
            .filter(|c| wanted_tracks.contains(&c.track))
            .collect();
        if filtered_cues.is_empty() {
            run_linear_scan(&reader, &meta, segment_end, &wanted_tracks).await?
        } else {
            targeted::fetch(
                Arc::clone(&reader),
                meta.data_offset,
                segment_end,
                &filtered_cues,
                meta.timestamp_scale,
                options.concurrency,
            )
            .await?
        }
    } else {
        run_linear_scan(&reader, &meta, segment_end, &wanted_tracks).await?
    };

    if options.verbose {
        log::info!(
            "mkv-subtitles: done, {} bytes downloaded in {} requests",
            reader.bytes_downloaded(),
            reader.request_count()
        );
    }

    let mut blocks_by_track: HashMap<u64, Vec<SubtitleBlock>> = HashMap::new();
    for block in blocks {
        blocks_by_track.entry(block.track_number).or_default().push(block);
    }

    let mut results = Vec::with_capacity(surviving_tracks.len());
    for track in &surviving_tracks {
        let format = SubtitleFormat::from_codec_id(&track.codec_id);
        let empty = Vec::new();
        let track_blocks = blocks_by_track.get(&track.track_number).unwrap_or(&empty);
        let subtitle = assemble(format, track.codec_private.as_deref(), track_blocks);
        let track_fonts = match format {
            SubtitleFormat::Ass | SubtitleFormat::Ssa => fonts.clone(),
            _ => None,
        };
        results.push(TrackResult {
            format,
            metadata: TrackMetadata {
                track_number: track.track_number,
                language: track.language.clone(),
                name: track.name.clone(),
            },
            output: TrackOutput {
                subtitle,
                fonts: track_fonts,
            },
        });
    }

    Ok(results)
}

async fn run_linear_scan(
    reader: &RangeReader,
    meta: &segment::SegmentMeta,
    segment_end: u64,
    wanted_tracks: &std::collections::HashSet<u64>,
) -> crate::Result<Vec<SubtitleBlock>> {
    let start = meta.first_cluster_offset.unwrap_or(meta.data_offset);
    linear::scan(reader, start, segment_end, meta.timestamp_scale, wanted_tracks).await
}
