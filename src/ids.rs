//! Matroska/EBML element ID constants used by the parsers in this crate.
//!
//! Values are the element IDs as conventionally written (marker bit included), matching
//! [`crate::vint::VInt64::as_encoded`]'s output.

pub const EBML_HEADER: u64 = 0x1A45_DFA3;
pub const SEGMENT: u64 = 0x1853_8067;

pub const SEEK_HEAD: u64 = 0x114D_9B74;
pub const SEEK: u64 = 0x4DBB;
pub const SEEK_ID: u64 = 0x53AB;
pub const SEEK_POSITION: u64 = 0x53AC;

pub const INFO: u64 = 0x1549_A966;
pub const TIMESTAMP_SCALE: u64 = 0x2AD7_B1;

pub const CLUSTER: u64 = 0x1F43_B675;
pub const CLUSTER_TIMESTAMP: u64 = 0xE7;
pub const SIMPLE_BLOCK: u64 = 0xA3;
pub const BLOCK_GROUP: u64 = 0xA0;
pub const BLOCK: u64 = 0xA1;
pub const BLOCK_DURATION: u64 = 0x9B;
pub const REFERENCE_BLOCK: u64 = 0xFB;
pub const BLOCK_ADDITIONS: u64 = 0x75A1;
pub const BLOCK_MORE: u64 = 0xA6;
pub const BLOCK_ADDITIONAL: u64 = 0xA5;

pub const TRACKS: u64 = 0x1654_AE6B;
pub const TRACK_ENTRY: u64 = 0xAE;
pub const TRACK_NUMBER: u64 = 0xD7;
pub const TRACK_TYPE: u64 = 0x83;
pub const CODEC_ID: u64 = 0x86;
pub const CODEC_PRIVATE: u64 = 0x63A2;
pub const LANGUAGE: u64 = 0x22B59C;
pub const LANGUAGE_BCP47: u64 = 0x22B59D;
pub const NAME: u64 = 0x536E;
pub const DEFAULT_DURATION: u64 = 0x23E383;

/// TrackType value identifying a subtitle track.
pub const TRACK_TYPE_SUBTITLE: u64 = 17;

pub const ATTACHMENTS: u64 = 0x1941_A469;
pub const ATTACHED_FILE: u64 = 0x61A7;
pub const FILE_NAME: u64 = 0x466E;
pub const FILE_MIME_TYPE: u64 = 0x4660;
pub const FILE_DATA: u64 = 0x465C;

pub const CUES: u64 = 0x1C53_BB6B;
pub const CUE_POINT: u64 = 0xBB;
pub const CUE_TIME: u64 = 0xB3;
pub const CUE_TRACK_POSITIONS: u64 = 0xB7;
pub const CUE_TRACK: u64 = 0xF7;
pub const CUE_CLUSTER_POSITION: u64 = 0xF1;
pub const CUE_RELATIVE_POSITION: u64 = 0xF0;

pub const CHAPTERS: u64 = 0x1043_A770;
pub const TAGS: u64 = 0x1254_C367;

/// Top-level Segment child IDs the Segment scanner recognizes, used both to know when a
/// scan has reached the end of metadata (first Cluster) and, in the linear scan fallback,
/// to detect the end of an unknown-size Cluster.
pub const SEGMENT_TOP_LEVEL_IDS: &[u64] = &[
    SEEK_HEAD, INFO, TRACKS, ATTACHMENTS, CUES, CHAPTERS, TAGS, CLUSTER,
];
