//! Minimal PNG header reader.
//!
//! Reads the first 24 bytes of a tile and pulls the pixel dimensions out of
//! the IHDR chunk. Nothing past the IHDR dimensions is decoded.
//!
//! Layout (all integers big-endian):
//!
//! ```text
//! offset  size  field
//!      0     1  high-bit byte (0x89, ignored)
//!      1     3  "PNG"
//!      4     4  line-ending check bytes (ignored)
//!      8     4  IHDR chunk length (ignored)
//!     12     4  "IHDR"
//!     16     4  width
//!     20     4  height
//! ```

use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Number of bytes read from the start of every tile.
pub const HEADER_LEN: usize = 24;

/// Format magic expected at offset 1.
pub const PNG_SIGNATURE: [u8; 3] = *b"PNG";

/// First chunk type expected at offset 12.
pub const IHDR_TAG: [u8; 4] = *b"IHDR";

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("unable to open: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to read 24 header bytes, got {0}")]
    Truncated(usize),
    #[error("invalid png header (signature {signature:?}, chunk {chunk:?})")]
    InvalidSignature { signature: String, chunk: String },
}

/// Fields decoded from the first 24 bytes of a PNG tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RasterHeader {
    pub signature: [u8; 3],
    pub chunk_tag: [u8; 4],
    pub width: u32,
    pub height: u32,
}

/// Decode a header from a byte buffer.
///
/// Only the first [`HEADER_LEN`] bytes are looked at; a shorter buffer is
/// rejected before any field is touched.
pub fn parse_header(buf: &[u8]) -> Result<RasterHeader, HeaderError> {
    let Some(buf) = buf.get(..HEADER_LEN) else {
        return Err(HeaderError::Truncated(buf.len()));
    };

    let signature: [u8; 3] = [buf[1], buf[2], buf[3]];
    let chunk_tag: [u8; 4] = [buf[12], buf[13], buf[14], buf[15]];
    if signature != PNG_SIGNATURE || chunk_tag != IHDR_TAG {
        return Err(HeaderError::InvalidSignature {
            signature: String::from_utf8_lossy(&signature).into_owned(),
            chunk: String::from_utf8_lossy(&chunk_tag).into_owned(),
        });
    }

    let width = u32::from_be_bytes([buf[16], buf[17], buf[18], buf[19]]);
    let height = u32::from_be_bytes([buf[20], buf[21], buf[22], buf[23]]);

    Ok(RasterHeader {
        signature,
        chunk_tag,
        width,
        height,
    })
}

/// Read and decode the header of the file at `path`.
///
/// The file handle is dropped before returning on every path.
pub fn read_header(path: &Path) -> Result<RasterHeader, HeaderError> {
    let mut buf = Vec::with_capacity(HEADER_LEN);
    File::open(path)?
        .take(HEADER_LEN as u64)
        .read_to_end(&mut buf)?;
    parse_header(&buf)
}
