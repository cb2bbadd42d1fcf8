//! Fetching a single top-level element's header and full body from a [`RangeReader`].

use bytes::Bytes;

use crate::ebml::ElementHeader;
use crate::error::Error;
use crate::range_reader::RangeReader;

/// Largest an EBML header (ID + size VINTs) can be: 8 bytes each.
const MAX_HEADER_LEN: u64 = 16;

/// Fetches the header and full body of the element at `offset`.
pub async fn fetch_element(reader: &RangeReader, offset: u64) -> crate::Result<(ElementHeader, Bytes)> {
    let probe = reader.read(offset, MAX_HEADER_LEN.min(reader.file_size() - offset)).await?;
    let mut cursor = &probe[..];
    let header = ElementHeader::parse(&mut cursor, offset)?;
    let size = header
        .size
        .ok_or_else(|| Error::ElementBodySizeUnknown(header.id))?;

    let header_len = header.data_offset - header.header_offset;
    if header_len + size <= probe.len() as u64 {
        let start = header_len as usize;
        return Ok((header, probe.slice(start..start + size as usize)));
    }

    let body = reader.read(header.data_offset, size).await?;
    Ok((header, body))
}
