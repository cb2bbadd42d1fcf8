//! End-to-end extraction tests against a small synthetic Matroska file, served through
//! a mock `Fetch` that answers HTTP Range semantics in memory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use mkv_subtitles::{Error, Fetch, FetchResponse, Options, SubtitleFormat};

const EBML_HEADER: u64 = 0x1A45_DFA3;
const SEGMENT: u64 = 0x1853_8067;
const SEEK_HEAD: u64 = 0x114D_9B74;
const SEEK: u64 = 0x4DBB;
const SEEK_ID: u64 = 0x53AB;
const SEEK_POSITION: u64 = 0x53AC;
const INFO: u64 = 0x1549_A966;
const TIMESTAMP_SCALE: u64 = 0x2AD7_B1;
const TRACKS: u64 = 0x1654_AE6B;
const TRACK_ENTRY: u64 = 0xAE;
const TRACK_NUMBER: u64 = 0xD7;
const TRACK_TYPE: u64 = 0x83;
const CODEC_ID: u64 = 0x86;
const LANGUAGE: u64 = 0x22B5_9C;
const CLUSTER: u64 = 0x1F43_B675;
const CLUSTER_TIMESTAMP: u64 = 0xE7;
const SIMPLE_BLOCK: u64 = 0xA3;
const BLOCK_GROUP: u64 = 0xA0;
const BLOCK: u64 = 0xA1;
const BLOCK_DURATION: u64 = 0x9B;
const CUES: u64 = 0x1C53_BB6B;
const CUE_POINT: u64 = 0xBB;
const CUE_TIME: u64 = 0xB3;
const CUE_TRACK_POSITIONS: u64 = 0xB7;
const CUE_TRACK: u64 = 0xF7;
const CUE_CLUSTER_POSITION: u64 = 0xF1;
const CUE_RELATIVE_POSITION: u64 = 0xF0;

fn id_bytes(id: u64) -> Vec<u8> {
    let mut bytes = id.to_be_bytes().to_vec();
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes.remove(0);
    }
    bytes
}

fn size_vint(n: u64) -> Vec<u8> {
    let mut width = 1u32;
    while n > (1u64 << (7 * width)) - 2 {
        width += 1;
    }
    let mut bytes = n.to_be_bytes()[8 - width as usize..].to_vec();
    bytes[0] |= 1u8 << (8 - width);
    bytes
}

fn uint_body(v: u64, width: usize) -> Vec<u8> {
    v.to_be_bytes()[8 - width..].to_vec()
}

fn elem(id: u64, body: Vec<u8>) -> Vec<u8> {
    let mut out = id_bytes(id);
    out.extend(size_vint(body.len() as u64));
    out.extend(body);
    out
}

fn header_len(id: u64, body_len: usize) -> usize {
    id_bytes(id).len() + size_vint(body_len as u64).len()
}

/// Builds a tiny single-Cluster Matroska file with one (or two) subtitle tracks and no
/// Cues, so extraction exercises the linear cluster-scan path.
fn build_fixture(second_track: bool) -> Vec<u8> {
    let ebml_header = elem(EBML_HEADER, vec![]);

    let info = elem(INFO, elem(TIMESTAMP_SCALE, uint_body(1_000_000, 3)));

    let mut track_entries = vec![
        elem(TRACK_ENTRY, {
            let mut body = elem(TRACK_NUMBER, uint_body(1, 1));
            body.extend(elem(TRACK_TYPE, uint_body(17, 1)));
            body.extend(elem(CODEC_ID, b"S_TEXT/UTF8".to_vec()));
            body.extend(elem(LANGUAGE, b"eng".to_vec()));
            body
        }),
    ];
    if second_track {
        track_entries.push(elem(TRACK_ENTRY, {
            let mut body = elem(TRACK_NUMBER, uint_body(2, 1));
            body.extend(elem(TRACK_TYPE, uint_body(17, 1)));
            body.extend(elem(CODEC_ID, b"S_TEXT/UTF8".to_vec()));
            body.extend(elem(LANGUAGE, b"fre".to_vec()));
            body
        }));
    }
    let tracks = elem(TRACKS, track_entries.concat());

    let mut cluster_body = elem(CLUSTER_TIMESTAMP, uint_body(0, 1));
    cluster_body.extend(elem(SIMPLE_BLOCK, {
        let mut body = size_vint(1); // track number VINT, value 1
        body.extend(1_000i16.to_be_bytes());
        body.push(0x00);
        body.extend_from_slice(b"Hello, world!");
        body
    }));
    if second_track {
        cluster_body.extend(elem(SIMPLE_BLOCK, {
            let mut body = size_vint(2); // track number VINT, value 2
            body.extend(2_000i16.to_be_bytes());
            body.push(0x00);
            body.extend_from_slice("Bonjour le monde !".as_bytes());
            body
        }));
    }
    let cluster = elem(CLUSTER, cluster_body);

    let placeholder_entry = elem(
        SEEK,
        [elem(SEEK_ID, id_bytes(TRACKS)), elem(SEEK_POSITION, uint_body(0, 4))].concat(),
    );
    let pos_tracks =
        header_len(SEEK_HEAD, placeholder_entry.len()) + placeholder_entry.len() + info.len();
    let seek_entry = elem(
        SEEK,
        [
            elem(SEEK_ID, id_bytes(TRACKS)),
            elem(SEEK_POSITION, uint_body(pos_tracks as u64, 4)),
        ]
        .concat(),
    );
    assert_eq!(seek_entry.len(), placeholder_entry.len());
    let seek_head = elem(SEEK_HEAD, seek_entry);

    let segment_body = [seek_head, info, tracks, cluster].concat();
    let segment = elem(SEGMENT, segment_body);

    [ebml_header, segment].concat()
}

/// Builds a fixture whose one subtitle block lives in a BlockGroup (with a BlockDuration)
/// and is indexed by a Cues entry with both CueClusterPosition and CueRelativePosition, so
/// extraction exercises the Cue-driven targeted-fetch path rather than the linear scan.
fn build_fixture_with_cues() -> Vec<u8> {
    let ebml_header = elem(EBML_HEADER, vec![]);
    let info = elem(INFO, elem(TIMESTAMP_SCALE, uint_body(1_000_000, 3)));
    let tracks = elem(TRACKS, elem(TRACK_ENTRY, {
        let mut body = elem(TRACK_NUMBER, uint_body(1, 1));
        body.extend(elem(TRACK_TYPE, uint_body(17, 1)));
        body.extend(elem(CODEC_ID, b"S_TEXT/UTF8".to_vec()));
        body.extend(elem(LANGUAGE, b"eng".to_vec()));
        body
    }));

    let cluster_timestamp = elem(CLUSTER_TIMESTAMP, uint_body(0, 1));
    let block_group = elem(BLOCK_GROUP, {
        let mut body = elem(BLOCK, {
            let mut b = size_vint(1); // track number VINT, value 1
            b.extend(1_000i16.to_be_bytes());
            b.push(0x00);
            b.extend_from_slice(b"Hello, world!");
            b
        });
        body.extend(elem(BLOCK_DURATION, uint_body(500, 2)));
        body
    });
    let relative_position = cluster_timestamp.len() as u64;
    let mut cluster_body = cluster_timestamp;
    cluster_body.extend(block_group);
    let cluster = elem(CLUSTER, cluster_body);

    let placeholder_entries = [
        elem(SEEK, [elem(SEEK_ID, id_bytes(TRACKS)), elem(SEEK_POSITION, uint_body(0, 4))].concat()),
        elem(SEEK, [elem(SEEK_ID, id_bytes(CUES)), elem(SEEK_POSITION, uint_body(0, 4))].concat()),
    ];
    let seek_head_placeholder = elem(SEEK_HEAD, placeholder_entries.concat());

    let pos_tracks = seek_head_placeholder.len() as u64 + info.len() as u64;
    let pos_cluster = pos_tracks + tracks.len() as u64;
    let cue_cluster_position = pos_cluster;
    let pos_cues = pos_cluster + cluster.len() as u64;

    let cue_point = elem(CUE_POINT, {
        let mut body = elem(CUE_TIME, uint_body(1_000, 2));
        body.extend(elem(CUE_TRACK_POSITIONS, {
            let mut p = elem(CUE_TRACK, uint_body(1, 1));
            p.extend(elem(CUE_CLUSTER_POSITION, uint_body(cue_cluster_position, 4)));
            p.extend(elem(CUE_RELATIVE_POSITION, uint_body(relative_position, 2)));
            p
        }));
        body
    });
    let cues = elem(CUES, cue_point);

    let real_entries = [
        elem(SEEK, [elem(SEEK_ID, id_bytes(TRACKS)), elem(SEEK_POSITION, uint_body(pos_tracks, 4))].concat()),
        elem(SEEK, [elem(SEEK_ID, id_bytes(CUES)), elem(SEEK_POSITION, uint_body(pos_cues, 4))].concat()),
    ];
    let seek_head = elem(SEEK_HEAD, real_entries.concat());
    assert_eq!(seek_head.len(), seek_head_placeholder.len());

    let segment_body = [seek_head, info, tracks, cluster, cues].concat();
    let segment = elem(SEGMENT, segment_body);

    [ebml_header, segment].concat()
}

struct MockFetch {
    data: Vec<u8>,
    support_range: bool,
}

#[async_trait]
impl Fetch for MockFetch {
    async fn get(
        &self,
        _url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<FetchResponse, Box<dyn std::error::Error + Send + Sync>> {
        if !self.support_range {
            return Ok(FetchResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from(self.data.clone()),
            });
        }

        let range = headers.get("Range").expect("reader always sends a Range header");
        let (start, end) = range
            .strip_prefix("bytes=")
            .and_then(|r| r.split_once('-'))
            .map(|(a, b)| (a.parse::<usize>().unwrap(), b.parse::<usize>().unwrap()))
            .unwrap();
        let end = end.min(self.data.len().saturating_sub(1));
        let slice = self.data[start..=end].to_vec();

        let mut resp_headers = HashMap::new();
        resp_headers.insert(
            "content-range".to_string(),
            format!("bytes {start}-{end}/{}", self.data.len()),
        );
        Ok(FetchResponse {
            status: 206,
            headers: resp_headers,
            body: Bytes::from(slice),
        })
    }
}

#[tokio::test]
async fn extracts_single_srt_track_via_linear_scan() {
    let data = build_fixture(false);
    let fetch = Arc::new(MockFetch {
        data,
        support_range: true,
    });
    let options = Options::new().with_fetch(fetch);

    let results = mkv_subtitles::extract_subtitles("https://example.test/movie.mkv", &options)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let track = &results[0];
    assert_eq!(track.format, SubtitleFormat::Srt);
    assert_eq!(track.metadata.language.as_deref(), Some("eng"));
    let subtitle = String::from_utf8(track.output.subtitle.clone()).unwrap();
    assert_eq!(subtitle, "1\n00:00:01,000 --> 00:00:01,000\nHello, world!\n\n");
}

#[tokio::test]
async fn language_filter_drops_non_matching_tracks() {
    let data = build_fixture(true);
    let fetch = Arc::new(MockFetch {
        data,
        support_range: true,
    });
    let options = Options::new()
        .with_fetch(fetch)
        .with_languages(vec!["eng".to_string()]);

    let results = mkv_subtitles::extract_subtitles("https://example.test/movie.mkv", &options)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].metadata.language.as_deref(), Some("eng"));
    let subtitle = String::from_utf8(results[0].output.subtitle.clone()).unwrap();
    assert!(subtitle.contains("Hello, world!"));
    assert!(!subtitle.contains("Bonjour"));
}

#[tokio::test]
async fn extracts_via_cue_driven_targeted_fetch() {
    let data = build_fixture_with_cues();
    let fetch = Arc::new(MockFetch {
        data,
        support_range: true,
    });
    let options = Options::new().with_fetch(fetch);

    let results = mkv_subtitles::extract_subtitles("https://example.test/movie.mkv", &options)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let track = &results[0];
    assert_eq!(track.format, SubtitleFormat::Srt);
    let subtitle = String::from_utf8(track.output.subtitle.clone()).unwrap();
    // BlockDuration (500, at TimestampScale 1_000_000 = 1ms/unit) moves the end
    // timestamp 500ms past the CueTime-derived start, rather than collapsing to it.
    assert_eq!(subtitle, "1\n00:00:01,000 --> 00:00:01,500\nHello, world!\n\n");
}

#[tokio::test]
async fn range_not_supported_without_full_download_opt_in() {
    let data = build_fixture(false);
    let fetch = Arc::new(MockFetch {
        data,
        support_range: false,
    });
    let options = Options::new().with_fetch(fetch);

    let err = mkv_subtitles::extract_subtitles("https://example.test/movie.mkv", &options)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RangeNotSupported { .. }));
}
