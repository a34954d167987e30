//! Side-band demultiplexing.
//!
//! When `side-band-64k` is negotiated, each pkt-line payload in the
//! upload-pack response starts with a channel byte: `1` carries pack data,
//! `2` carries human-readable progress, and `3` carries a fatal message
//! from the remote.

use crate::protocol::pkt_line::{Parser, PktLine};
use crate::{Error, Result};

const CHANNEL_PACK: u8 = 1;
const CHANNEL_PROGRESS: u8 = 2;
const CHANNEL_FATAL: u8 = 3;

/// Consume side-band frames from `parser` until a flush or end of input,
/// concatenating the pack-data channel.
///
/// Progress payloads are handed to `progress`; a fatal payload aborts with
/// the remote's message.
pub fn demux<F>(parser: &mut Parser, mut progress: F) -> Result<Vec<u8>>
where
    F: FnMut(&[u8]),
{
    let mut pack = Vec::new();

    while let Some(frame) = parser.next_line()? {
        let payload = match frame {
            PktLine::Flush => break,
            PktLine::Data(payload) => payload,
        };

        let (&channel, data) = payload
            .split_first()
            .ok_or_else(|| Error::Protocol("empty side-band frame".to_string()))?;
        match channel {
            CHANNEL_PACK => pack.extend_from_slice(data),
            CHANNEL_PROGRESS => progress(data),
            CHANNEL_FATAL => {
                return Err(Error::Protocol(format!(
                    "remote error: {}",
                    String::from_utf8_lossy(data).trim_end()
                )))
            }
            other => {
                return Err(Error::Protocol(format!(
                    "invalid side-band channel {}",
                    other
                )))
            }
        }
    }

    Ok(pack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::pkt_line;

    fn frame(channel: u8, payload: &[u8]) -> Vec<u8> {
        let mut body = vec![channel];
        body.extend_from_slice(payload);
        pkt_line::data(&body).unwrap()
    }

    #[test]
    fn concatenates_pack_channel() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&frame(1, b"PACK"));
        stream.extend_from_slice(&frame(2, b"Counting objects: 2\r"));
        stream.extend_from_slice(&frame(1, b"rest of pack"));
        stream.extend_from_slice(pkt_line::flush());

        let mut progress_seen = Vec::new();
        let mut parser = Parser::new(&stream);
        let pack = demux(&mut parser, |text| {
            progress_seen.extend_from_slice(text);
        })
        .unwrap();

        assert_eq!(pack, b"PACKrest of pack");
        assert_eq!(progress_seen, b"Counting objects: 2\r");
    }

    #[test]
    fn stops_at_end_of_input_without_flush() {
        let stream = frame(1, b"only frame");
        let mut parser = Parser::new(&stream);
        let pack = demux(&mut parser, |_| {}).unwrap();
        assert_eq!(pack, b"only frame");
    }

    #[test]
    fn fatal_channel_aborts() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&frame(1, b"partial"));
        stream.extend_from_slice(&frame(3, b"access denied\n"));

        let mut parser = Parser::new(&stream);
        let err = demux(&mut parser, |_| {}).unwrap_err();
        assert_eq!(err.to_string(), "protocol error: remote error: access denied");
        assert_eq!(err.exit_code(), 128);
    }

    #[test]
    fn unknown_channel_rejected() {
        let stream = frame(9, b"???");
        let mut parser = Parser::new(&stream);
        let err = demux(&mut parser, |_| {}).unwrap_err();
        assert!(err.to_string().contains("invalid side-band channel 9"));
    }

    #[test]
    fn empty_frame_rejected() {
        // A server should never send a zero-payload frame; hand-assemble
        // one since the encoder refuses to.
        let mut parser = Parser::new(b"0004");
        let err = demux(&mut parser, |_| {}).unwrap_err();
        assert!(err.to_string().contains("empty side-band frame"));
    }
}
