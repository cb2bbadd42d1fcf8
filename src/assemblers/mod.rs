//! Per-format subtitle file reconstruction.

mod ass;
mod srt;
mod vtt;

use crate::types::{SubtitleBlock, SubtitleFormat};

pub use ass::assemble_ass;
pub use srt::assemble_srt;
pub use vtt::assemble_vtt;

/// Dispatches to the assembler matching `format`.
pub fn assemble(
    format: SubtitleFormat,
    codec_private: Option<&[u8]>,
    blocks: &[SubtitleBlock],
) -> Vec<u8> {
    match format {
        SubtitleFormat::Srt => assemble_srt(blocks),
        SubtitleFormat::Ass | SubtitleFormat::Ssa => assemble_ass(codec_private, blocks),
        SubtitleFormat::Vtt => assemble_vtt(codec_private, blocks),
    }
}

fn split_hms(total_ms: i64) -> (i64, i64, i64, i64) {
    let ms = total_ms.max(0);
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    (hours, minutes, seconds, millis)
}

/// `HH:MM:SS,mmm`, as used by SRT.
pub(crate) fn format_srt_time(ms: i64) -> String {
    let (h, m, s, ms) = split_hms(ms);
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

/// `HH:MM:SS.mmm`, as used by WebVTT.
pub(crate) fn format_vtt_time(ms: i64) -> String {
    let (h, m, s, ms) = split_hms(ms);
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// `H:MM:SS.cc` (centiseconds, hours not zero-padded), as used by ASS/SSA.
pub(crate) fn format_ass_time(ms: i64) -> String {
    let (h, m, s, millis) = split_hms(ms);
    let centis = millis / 10;
    format!("{h}:{m:02}:{s:02}.{centis:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srt_time_formats_with_comma() {
        assert_eq!(format_srt_time(3_661_234), "01:01:01,234");
    }

    #[test]
    fn vtt_time_formats_with_dot() {
        assert_eq!(format_vtt_time(3_661_234), "01:01:01.234");
    }

    #[test]
    fn ass_time_uses_centiseconds_and_unpadded_hours() {
        assert_eq!(format_ass_time(3_661_230), "1:01:01.23");
        assert_eq!(format_ass_time(59_990), "0:00:59.99");
    }
}
