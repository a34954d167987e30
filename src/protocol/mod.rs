//! The Smart HTTP v1 wire protocol: pkt-line framing, side-band
//! demultiplexing, and the upload-pack client.

mod http;
pub use http::{RefAdvertisement, Remote};

pub mod pkt_line;
pub use pkt_line::PktLine;

pub mod sideband;
