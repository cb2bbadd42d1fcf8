use super::format_srt_time;
use crate::types::SubtitleBlock;

/// Reconstructs an SRT file from subtitle blocks.
pub fn assemble_srt(blocks: &[SubtitleBlock]) -> Vec<u8> {
    let mut sorted: Vec<&SubtitleBlock> = blocks.iter().collect();
    sorted.sort_by_key(|b| b.timestamp_ms);

    let mut out = String::new();
    for (i, block) in sorted.iter().enumerate() {
        let end = block.timestamp_ms + block.duration_ms.unwrap_or(0);
        out.push_str(&(i + 1).to_string());
        out.push('\n');
        out.push_str(&format_srt_time(block.timestamp_ms));
        out.push_str(" --> ");
        out.push_str(&format_srt_time(end));
        out.push('\n');
        out.push_str(&String::from_utf8_lossy(&block.payload));
        out.push('\n');
        out.push('\n');
    }
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(ms: i64, dur: i64, text: &str) -> SubtitleBlock {
        SubtitleBlock {
            track_number: 1,
            timestamp_ms: ms,
            duration_ms: Some(dur),
            payload: text.as_bytes().to_vec(),
            additions: None,
        }
    }

    #[test]
    fn single_block_matches_literal_srt_shape() {
        let blocks = vec![block(1_000, 2_000, "Hello, world!")];
        let out = String::from_utf8(assemble_srt(&blocks)).unwrap();
        assert_eq!(
            out,
            "1\n00:00:01,000 --> 00:00:03,000\nHello, world!\n\n"
        );
    }

    #[test]
    fn blocks_sorted_by_timestamp_before_indexing() {
        let blocks = vec![block(5_000, 1_000, "second"), block(1_000, 1_000, "first")];
        let out = String::from_utf8(assemble_srt(&blocks)).unwrap();
        let first_idx = out.find("first").unwrap();
        let second_idx = out.find("second").unwrap();
        assert!(first_idx < second_idx);
        assert!(out.starts_with("1\n00:00:01,000"));
    }
}
