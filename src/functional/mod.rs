//! Minimal buffer and codec traits used throughout the crate.
//!
//! These mirror `bytes::Buf`/`bytes::BufMut` closely but stay small and local so the
//! element decoders in [`crate::ebml`] and [`crate::vint`] can be written against a
//! plain `&[u8]` without pulling in a full `Buf` implementation for `Vec<u8>` writers.

mod buf;
mod coding;

pub use buf::{Buf, BufMut};
pub use coding::{Decode, Encode};
