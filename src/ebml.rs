//! EBML framing: element headers and lazy iteration over a parent's children.

use crate::error::Error;
use crate::functional::{Buf, Decode};
use crate::vint::VInt64;

/// An EBML element header: an ID (marker bit retained) and a data size.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHeader {
    /// EBML ID of the element, including its marker bit.
    pub id: VInt64,
    /// Size of the element's data, excluding the header itself. `None` if unknown.
    pub size: Option<u64>,
    /// Offset of this header within whatever buffer it was parsed from.
    pub header_offset: u64,
    /// Offset of this element's data (`header_offset + header_len`).
    pub data_offset: u64,
}

impl ElementHeader {
    /// Parse a single element header at the front of `buf`. `base_offset` is the file
    /// (or buffer) offset of `buf[0]`, used to populate `header_offset`/`data_offset`.
    pub fn parse(buf: &mut &[u8], base_offset: u64) -> crate::Result<Self> {
        let header_offset = base_offset;
        let remaining_before = buf.remaining();
        let id = VInt64::decode(buf)?;
        let size_vint = VInt64::decode(buf)?;
        let consumed = remaining_before - buf.remaining();
        Ok(Self {
            id,
            size: if size_vint.is_unknown {
                None
            } else {
                Some(*size_vint)
            },
            header_offset,
            data_offset: header_offset + consumed as u64,
        })
    }

    /// Total size of header + data, if the data size is known.
    pub fn total_len(&self) -> Option<u64> {
        self.size.map(|s| (self.data_offset - self.header_offset) + s)
    }
}

/// Lazily iterates the children of a master element whose body has already been fetched
/// into `buf`. Stops cleanly (without propagating an error) on malformed data or an
/// unknown-size child, per the "stop and return the valid prefix" policy: see
/// [`ElementIter::next`].
pub struct ElementIter<'a> {
    buf: &'a [u8],
    offset: u64,
    done: bool,
}

impl<'a> ElementIter<'a> {
    /// Iterate the elements packed into `buf`, whose first byte lives at `base_offset`.
    pub fn new(buf: &'a [u8], base_offset: u64) -> Self {
        Self {
            buf,
            offset: base_offset,
            done: false,
        }
    }
}

/// One element yielded by [`ElementIter`]: its header plus the raw bytes of its body.
pub struct ChildElement<'a> {
    /// The element's parsed header.
    pub header: ElementHeader,
    /// The element's body bytes, sliced out of the parent's buffer.
    pub body: &'a [u8],
}

impl<'a> Iterator for ElementIter<'a> {
    type Item = ChildElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.buf.is_empty() {
            return None;
        }
        let mut cursor = self.buf;
        let header = match ElementHeader::parse(&mut cursor, self.offset) {
            Ok(h) => h,
            Err(_) => {
                self.done = true;
                return None;
            }
        };
        let size = match header.size {
            Some(s) => s as usize,
            None => {
                // Unknown-size children are only legal for Segment/Cluster, which are
                // never themselves iterated as a child here; treat as end of data.
                self.done = true;
                return None;
            }
        };
        if size > cursor.len() {
            self.done = true;
            return None;
        }
        let body = &cursor[..size];
        let header_len = (header.data_offset - header.header_offset) as usize;
        let consumed = header_len + size;
        self.offset += consumed as u64;
        self.buf = &self.buf[consumed..];
        Some(ChildElement { header, body })
    }
}

/// Reads a big-endian unsigned integer from a body of 0..=8 bytes (EBML's "uint" type).
pub fn read_uint(body: &[u8]) -> crate::Result<u64> {
    if body.len() > 8 {
        return Err(Error::OutOfBounds);
    }
    let mut buf = [0u8; 8];
    buf[8 - body.len()..].copy_from_slice(body);
    Ok(u64::from_be_bytes(buf))
}

/// Reads a big-endian signed integer from a body of 0..=8 bytes (EBML's "int" type).
pub fn read_sint(body: &[u8]) -> crate::Result<i64> {
    if body.len() > 8 {
        return Err(Error::OutOfBounds);
    }
    if body.is_empty() {
        return Ok(0);
    }
    let negative = body[0] & 0x80 != 0;
    let mut buf = [if negative { 0xFF } else { 0x00 }; 8];
    buf[8 - body.len()..].copy_from_slice(body);
    Ok(i64::from_be_bytes(buf))
}

/// Reads an EBML "string"/"utf-8" body, trimming trailing NUL padding.
pub fn read_utf8(body: &[u8]) -> crate::Result<String> {
    let trimmed = match body.iter().position(|&b| b == 0) {
        Some(i) => &body[..i],
        None => body,
    };
    String::from_utf8(trimmed.to_vec()).map_err(|_| Error::OutOfBounds)
}

/// Reads an EBML "float" body: must be exactly 4 or 8 bytes.
pub fn read_float(body: &[u8]) -> crate::Result<f64> {
    match body.len() {
        4 => {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(body);
            Ok(f32::from_be_bytes(buf) as f64)
        }
        8 => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(body);
            Ok(f64::from_be_bytes(buf))
        }
        _ => Err(Error::OutOfBounds),
    }
}
