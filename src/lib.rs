#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

//! Downloads only the subtitle tracks (and their embedded fonts) out of a remote
//! Matroska file, using HTTP Range requests to avoid pulling down the video and audio.
//!
//! The entry point is [`extract_subtitles`]. Callers who want a non-`reqwest` transport,
//! custom headers, a language filter, or concurrent targeted fetching configure an
//! [`Options`] and pass it in.

mod assemblers;
mod attachments;
mod block;
mod cues;
mod ebml;
mod elements;
mod error;
mod fetch;
mod fetcher;
mod functional;
mod ids;
mod options;
mod orchestrator;
mod range_reader;
mod segment;
mod tracks;
mod types;
mod vint;

pub use attachments::FontFile;
pub use error::{Error, Result};
pub use fetch::{Fetch, FetchResponse, ReqwestFetch};
pub use options::Options;
pub use orchestrator::extract_subtitles;
pub use types::{SubtitleFormat, TrackMetadata, TrackOutput, TrackResult};
