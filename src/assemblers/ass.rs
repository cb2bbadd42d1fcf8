use super::format_ass_time;
use crate::types::SubtitleBlock;

const FORMAT_LINE: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Reconstructs an ASS/SSA file from its codec-private header and subtitle blocks.
///
/// Each block's payload is `ReadOrder,Layer,Style,Name,MarginL,MarginR,MarginV,Effect,Text`:
/// the first eight commas delimit fields, and everything after the eighth is `Text`
/// verbatim (it may itself contain commas).
pub fn assemble_ass(codec_private: Option<&[u8]>, blocks: &[SubtitleBlock]) -> Vec<u8> {
    let header = codec_private
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default();
    let newline = if header.contains("\r\n") { "\r\n" } else { "\n" };

    let mut out = String::new();
    let trimmed = header.trim_end();
    if trimmed.contains("[Events]") {
        out.push_str(trimmed);
        out.push_str(newline);
    } else {
        out.push_str(trimmed);
        out.push_str(newline);
        out.push_str(newline);
        out.push_str("[Events]");
        out.push_str(newline);
        out.push_str(FORMAT_LINE);
        out.push_str(newline);
    }

    let mut events: Vec<(i64, String)> = Vec::with_capacity(blocks.len());
    for block in blocks {
        let Some(dialogue) = dialogue_line(block) else {
            continue;
        };
        let read_order = read_order(&block.payload).unwrap_or(0);
        events.push((read_order, dialogue));
    }
    events.sort_by_key(|(order, _)| *order);

    for (_, line) in events {
        out.push_str(&line);
        out.push_str(newline);
        out.push_str(newline);
    }

    out.into_bytes()
}

fn read_order(payload: &[u8]) -> Option<i64> {
    let text = std::str::from_utf8(payload).ok()?;
    let (first, _) = text.split_once(',')?;
    first.trim().parse().ok()
}

fn dialogue_line(block: &SubtitleBlock) -> Option<String> {
    let text = String::from_utf8_lossy(&block.payload);
    let fields: Vec<&str> = text.splitn(9, ',').collect();
    if fields.len() != 9 {
        return None;
    }
    let [_, layer, style, name, margin_l, margin_r, margin_v, effect, dialogue_text] =
        <[&str; 9]>::try_from(fields).ok()?;

    let start = format_ass_time(block.timestamp_ms);
    let end = format_ass_time(block.timestamp_ms + block.duration_ms.unwrap_or(0));

    Some(format!(
        "Dialogue: {layer},{start},{end},{style},{name},{margin_l},{margin_r},{margin_v},{effect},{dialogue_text}"
    ))
}
