//! Pkt-line framing, the length-prefixed unit Smart HTTP speaks.
//!
//! Each frame starts with four hex digits giving the total frame length
//! including the digits themselves. `0000` is the flush sentinel; `0001`
//! is the protocol v2 delimiter, which this v1 client rejects.

use crate::{Error, Result};

// git reserves frame lengths 65521 to 65535
const MAX_FRAME_LENGTH: usize = 65520;
const LENGTH_DIGITS: usize = 4;

/// A single decoded pkt-line frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PktLine {
    Flush,
    Data(Vec<u8>),
}

/// Encode a payload as a pkt-line frame.
///
/// An empty payload encodes as the flush sentinel; git has no use for an
/// empty data frame.
pub fn data(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.is_empty() {
        return Ok(flush().to_vec());
    }

    let total = payload.len() + LENGTH_DIGITS;
    if total > MAX_FRAME_LENGTH {
        return Err(Error::Protocol(format!(
            "pkt-line payload of {} bytes exceeds the frame limit",
            payload.len()
        )));
    }

    let mut frame = format!("{:04x}", total).into_bytes();
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// The flush sentinel `0000`.
pub fn flush() -> &'static [u8] {
    b"0000"
}

/// A cursor-style decoder over a byte buffer.
///
/// The upload-pack response switches from pkt-line framing to a raw pack
/// stream when side-band was not negotiated, so the decoder exposes its
/// position via [`remainder`](Parser::remainder).
pub struct Parser<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(data: &'a [u8]) -> Parser<'a> {
        Parser { data, pos: 0 }
    }

    /// The bytes not yet consumed by [`next_line`](Parser::next_line).
    pub fn remainder(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Decode the next frame, or `None` at end of input.
    pub fn next_line(&mut self) -> Result<Option<PktLine>> {
        if self.pos == self.data.len() {
            return Ok(None);
        }

        let rest = &self.data[self.pos..];
        if rest.len() < LENGTH_DIGITS {
            return Err(Error::Protocol(
                "truncated pkt-line length prefix".to_string(),
            ));
        }

        let mut length = 0usize;
        for &digit in &rest[..LENGTH_DIGITS] {
            let value = match digit {
                b'0'..=b'9' => digit - b'0',
                b'a'..=b'f' => digit - b'a' + 10,
                _ => {
                    return Err(Error::Protocol(format!(
                        "invalid pkt-line length prefix {:?}",
                        String::from_utf8_lossy(&rest[..LENGTH_DIGITS])
                    )))
                }
            };
            length = length << 4 | value as usize;
        }

        match length {
            0 => {
                self.pos += LENGTH_DIGITS;
                Ok(Some(PktLine::Flush))
            }
            1 => Err(Error::Protocol(
                "received a protocol v2 delim-pkt; only protocol v1 is supported".to_string(),
            )),
            2..=3 => Err(Error::Protocol(format!(
                "pkt-line length {} is too short",
                length
            ))),
            _ => {
                if length > rest.len() {
                    return Err(Error::Protocol(format!(
                        "pkt-line length {} exceeds remaining input",
                        length
                    )));
                }
                let payload = rest[LENGTH_DIGITS..length].to_vec();
                self.pos += length;
                Ok(Some(PktLine::Data(payload)))
            }
        }
    }
}

/// Decode an entire buffer as consecutive pkt-line frames.
pub fn parse_all(data: &[u8]) -> Result<Vec<PktLine>> {
    let mut parser = Parser::new(data);
    let mut frames = Vec::new();
    while let Some(frame) = parser.next_line()? {
        frames.push(frame);
    }
    Ok(frames)
}
