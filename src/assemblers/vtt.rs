use super::format_vtt_time;
use crate::types::SubtitleBlock;

struct Additions {
    identifier: Option<String>,
    settings: Option<String>,
    comments: Vec<String>,
}

fn parse_additions(raw: &[u8]) -> Additions {
    let text = String::from_utf8_lossy(raw);
    let mut lines = text.split('\n');
    let identifier = lines.next().map(str::to_string).filter(|s| !s.is_empty());
    let settings = lines.next().map(str::to_string).filter(|s| !s.is_empty());
    let comments: Vec<String> = lines.map(str::to_string).filter(|s| !s.is_empty()).collect();
    Additions {
        identifier,
        settings,
        comments,
    }
}

/// Reconstructs a WebVTT file from its codec-private header and subtitle blocks.
pub fn assemble_vtt(codec_private: Option<&[u8]>, blocks: &[SubtitleBlock]) -> Vec<u8> {
    let header = codec_private
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_else(|| "WEBVTT".to_string());

    let mut out = String::new();
    out.push_str(header.trim_end());
    out.push('\n');
    out.push('\n');

    let mut sorted: Vec<&SubtitleBlock> = blocks.iter().collect();
    sorted.sort_by_key(|b| b.timestamp_ms);

    for block in sorted {
        let additions = block
            .additions
            .as_deref()
            .map(parse_additions)
            .unwrap_or(Additions {
                identifier: None,
                settings: None,
                comments: Vec::new(),
            });

        if !additions.comments.is_empty() {
            out.push_str(&additions.comments.join("\n"));
            out.push('\n');
            out.push('\n');
        }
        if let Some(id) = &additions.identifier {
            out.push_str(id);
            out.push('\n');
        }

        let end = block.timestamp_ms + block.duration_ms.unwrap_or(0);
        out.push_str(&format_vtt_time(block.timestamp_ms));
        out.push_str(" --> ");
        out.push_str(&format_vtt_time(end));
        if let Some(settings) = &additions.settings {
            out.push(' ');
            out.push_str(settings);
        }
        out.push('\n');
        out.push_str(&String::from_utf8_lossy(&block.payload));
        out.push('\n');
        out.push('\n');
    }

    out.into_bytes()
}
