//! Zlib compression primitives.
//!
//! Loose objects and every object inside a packfile are zlib streams.
//! The pack format does not record a compressed length, so the inflater
//! here reports how many input bytes each stream consumed; that is what
//! lets the pack decoder walk from one object to the next.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use thiserror::Error;

/// An error which can be returned when inflating a zlib stream.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum InflateError {
    /// The input ended before the stream did.
    #[error("zlib stream is truncated")]
    Truncated,

    /// The stream is not valid zlib data.
    #[error("zlib stream is corrupt{0}")]
    Corrupt(String),

    /// The stream's checksum does not match its contents.
    #[error("zlib checksum mismatch")]
    Checksum,
}

/// Compress `data` as a single zlib stream at the default level.
pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // Writing to a Vec cannot fail.
    encoder.write_all(data).expect("write to Vec");
    encoder.finish().expect("finish to Vec")
}

/// Inflate the zlib stream that begins at `input[0]`.
///
/// The total compressed length need not be known up front and `input` may
/// contain arbitrary trailing bytes; on success the decompressed bytes are
/// returned together with the number of compressed bytes consumed, so the
/// caller can continue reading whatever follows the stream.
pub fn inflate_prefix(input: &[u8]) -> Result<(Vec<u8>, usize), InflateError> {
    let mut inflater = Decompress::new(true);
    let mut output = Vec::with_capacity(8 * 1024);

    loop {
        let consumed = inflater.total_in() as usize;
        let status = inflater
            .decompress_vec(&input[consumed..], &mut output, FlushDecompress::None)
            .map_err(|err| classify(&err.to_string()))?;

        match status {
            Status::StreamEnd => return Ok((output, inflater.total_in() as usize)),
            Status::Ok | Status::BufError => {
                if output.len() == output.capacity() {
                    // Inflater stalled on output space.
                    output.reserve(32 * 1024);
                    continue;
                }
                if inflater.total_in() as usize >= input.len() {
                    return Err(InflateError::Truncated);
                }
                // Progress was made and both input and output remain.
            }
        }
    }
}

fn classify(message: &str) -> InflateError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("checksum") || lower.contains("data check") {
        InflateError::Checksum
    } else if message.is_empty() {
        InflateError::Corrupt(String::new())
    } else {
        InflateError::Corrupt(format!(": {}", message))
    }
}
