//! Parsing the payload of a SimpleBlock/Block: track number, relative timestamp, flags,
//! and the frame data itself.
//!
//! Lacing is rejected outright (see `LacedBlock`) rather than decoded: no known subtitle
//! muxer emits laced subtitle blocks, and treating an unexpected laced block as a hard
//! error is safer than risking a silently-wrong payload split.

use crate::error::Error;
use crate::functional::{Buf, Decode};
use crate::ids;
use crate::vint::VInt64;

/// A parsed SimpleBlock/Block payload.
pub struct ParsedBlock<'a> {
    /// The track this block belongs to.
    pub track_number: u64,
    /// Timestamp relative to the enclosing Cluster's timestamp, in the Segment's
    /// timestamp-scale units.
    pub relative_timestamp: i16,
    /// The block's flags byte.
    pub flags: u8,
    /// The frame payload (everything after track number, timestamp, and flags).
    pub data: &'a [u8],
}

/// Parses a SimpleBlock or Block body. `body` is the full element body (everything after
/// the element header).
pub fn parse_block(body: &[u8]) -> crate::Result<ParsedBlock<'_>> {
    let mut cursor = body;
    let track_number = VInt64::decode(&mut cursor)?;
    let relative_timestamp = i16::decode(&mut cursor)?;
    let flags = u8::decode(&mut cursor)?;

    let lacing = (flags >> 1) & 0x03;
    if lacing != 0 {
        return Err(Error::LacedBlock(track_number));
    }

    Ok(ParsedBlock {
        track_number: *track_number,
        relative_timestamp,
        flags,
        data: cursor,
    })
}

/// A parsed BlockGroup: the inner Block plus its optional duration and BlockAdditions.
pub struct ParsedBlockGroup<'a> {
    /// The inner SimpleBlock-shaped payload.
    pub block: ParsedBlock<'a>,
    /// BlockDuration, in the Segment's timestamp-scale units, if present.
    pub duration: Option<u64>,
    /// Raw bytes of the (single) BlockMore/BlockAdditional, if present.
    pub additions: Option<&'a [u8]>,
}

/// Parses a BlockGroup body (the element body following a `BlockGroup` header).
pub fn parse_block_group(body: &[u8]) -> crate::Result<ParsedBlockGroup<'_>> {
    use crate::ebml::ElementIter;

    let mut block: Option<ParsedBlock<'_>> = None;
    let mut duration = None;
    let mut additions = None;

    for child in ElementIter::new(body, 0) {
        match child.header.id.as_encoded() {
            id if id == ids::BLOCK => {
                block = Some(parse_block(child.body)?);
            }
            id if id == ids::BLOCK_DURATION => {
                duration = Some(crate::ebml::read_uint(child.body)?);
            }
            id if id == ids::BLOCK_ADDITIONS => {
                additions = find_block_additional(child.body);
            }
            _ => {}
        }
    }

    let block = block.ok_or_else(|| Error::MissingElement(VInt64::from_encoded(ids::BLOCK)))?;
    Ok(ParsedBlockGroup {
        block,
        duration,
        additions,
    })
}

fn find_block_additional(block_additions_body: &[u8]) -> Option<&[u8]> {
    use crate::ebml::ElementIter;
    for more in ElementIter::new(block_additions_body, 0) {
        if more.header.id.as_encoded() != ids::BLOCK_MORE {
            continue;
        }
        for inner in ElementIter::new(more.body, 0) {
            if inner.header.id.as_encoded() == ids::BLOCK_ADDITIONAL {
                return Some(inner.body);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functional::Encode;

    fn encode_track(n: u64) -> Vec<u8> {
        let mut out = vec![];
        VInt64::new(n).encode(&mut out).unwrap();
        out
    }

    #[test]
    fn parses_unlaced_block() {
        let mut body = encode_track(3);
        body.extend_from_slice(&(-10i16).to_be_bytes());
        body.push(0x00); // flags: no lacing, not a keyframe
        body.extend_from_slice(b"hello");

        let parsed = parse_block(&body).unwrap();
        assert_eq!(parsed.track_number, 3);
        assert_eq!(parsed.relative_timestamp, -10);
        assert_eq!(parsed.data, b"hello");
    }

    #[test]
    fn relative_timestamp_min_boundary_is_preserved() {
        // 0x8000 is i16::MIN (-32768), the widest negative offset a Block's relative
        // timestamp can express before the Cluster's own timestamp must advance.
        let mut body = encode_track(1);
        body.extend_from_slice(&0x8000u16.to_be_bytes());
        body.push(0x00);
        body.extend_from_slice(b"x");

        let parsed = parse_block(&body).unwrap();
        assert_eq!(parsed.relative_timestamp, i16::MIN);
        assert_eq!(parsed.relative_timestamp, -32768);
    }

    #[test]
    fn rejects_laced_block() {
        let mut body = encode_track(3);
        body.extend_from_slice(&0i16.to_be_bytes());
        body.push(0b0000_0010); // Xiph lacing bit set
        body.extend_from_slice(b"anything");

        assert!(matches!(parse_block(&body), Err(Error::LacedBlock(_))));
    }
}
