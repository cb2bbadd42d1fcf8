use crate::vint::VInt64;

/// Error types for this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error, from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid variable-length integer encoding, indicates a vint longer than 8 bytes.
    #[error("Invalid variable-length integer encoding, 8 leading zeros found...")]
    InvalidVInt,

    /// Attempted to read past the end of the buffer.
    #[error("Attempted to read past the end of the buffer")]
    OutOfBounds,

    /// Not all bytes were consumed in an element body.
    #[error("Short read: not all bytes were consumed")]
    ShortRead,

    /// Missing a required element.
    #[error("Missing element, ID: {0}")]
    MissingElement(VInt64),

    /// Element body size is unknown in a context where that is not permitted.
    #[error("Element body size is unknown, ID: {0}")]
    ElementBodySizeUnknown(VInt64),

    /// A SimpleBlock or Block used lacing. Subtitle muxers never lace, so this is
    /// treated as a hard parse error rather than risking silently corrupted output.
    #[error("Laced block encountered, ID: {0}")]
    LacedBlock(VInt64),

    /// The remote resource did not honor HTTP Range requests and full download was not
    /// opted into.
    #[error("Server at {url} does not support HTTP Range requests")]
    RangeNotSupported {
        /// The URL that was probed.
        url: String,
    },

    /// The remote file is structurally not a valid Matroska container at a point where
    /// extraction cannot proceed (missing EBML header, missing Segment, missing Tracks).
    #[error("Malformed Matroska file: {0}")]
    MalformedContainer(String),

    /// A network request failed or returned an unexpected status.
    #[error("Transport error reading bytes {offset}..{end} (status {status:?}): {message}")]
    Transport {
        /// Start of the requested byte range.
        offset: u64,
        /// End of the requested byte range (exclusive).
        end: u64,
        /// HTTP status code, if one was received.
        status: Option<u16>,
        /// Human-readable detail from the underlying client.
        message: String,
    },

    /// An error raised by a caller-supplied `Fetch` implementation.
    #[error("fetch failed: {0}")]
    Fetch(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
