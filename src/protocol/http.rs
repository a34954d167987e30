//! The Smart HTTP v1 upload-pack client.
//!
//! Two round trips per remote: `GET <repo>/info/refs?service=git-upload-pack`
//! to discover refs and capabilities, then `POST <repo>/git-upload-pack`
//! with our wants to receive the packfile.

use std::collections::{BTreeMap, HashSet};

use crate::object::Id;
use crate::protocol::pkt_line::{self, Parser, PktLine};
use crate::protocol::sideband;
use crate::{Error, Result};

const UPLOAD_PACK_SERVICE: &str = "git-upload-pack";
const SIDE_BAND_CAPABILITY: &str = "side-band-64k";
const REQUESTED_CAPABILITIES: &[&str] = &["multi_ack_detailed", SIDE_BAND_CAPABILITY, "ofs-delta"];

/// Everything the ref advertisement told us about the remote.
#[derive(Debug)]
pub struct RefAdvertisement {
    /// Ref name (e.g. `refs/heads/main`) to commit ID.
    pub refs: BTreeMap<String, Id>,
    pub capabilities: HashSet<String>,
    /// The commit the remote's `HEAD` points at, when advertised.
    pub head: Option<Id>,
}

impl RefAdvertisement {
    /// The branch `HEAD` symbolically points at, when the remote announced
    /// it via the `symref=HEAD:<refname>` capability.
    pub fn head_symref(&self) -> Option<&str> {
        self.capabilities
            .iter()
            .find_map(|cap| cap.strip_prefix("symref=HEAD:"))
    }

    /// The branch a fresh clone should check out.
    ///
    /// The symref capability wins. Failing that, the advertised branch whose
    /// ID matches `HEAD` (preferring `main`, then `master`, then the first
    /// match in name order). Failing that, `main` or `master` if advertised
    /// at all.
    pub fn default_branch(&self) -> Option<String> {
        if let Some(refname) = self.head_symref() {
            return Some(refname.to_string());
        }

        if let Some(head) = self.head {
            for candidate in &["refs/heads/main", "refs/heads/master"] {
                if self.refs.get(*candidate) == Some(&head) {
                    return Some(candidate.to_string());
                }
            }
            for (refname, id) in &self.refs {
                if refname.starts_with("refs/heads/") && *id == head {
                    return Some(refname.clone());
                }
            }
        }

        for candidate in &["refs/heads/main", "refs/heads/master"] {
            if self.refs.contains_key(*candidate) {
                return Some(candidate.to_string());
            }
        }

        None
    }
}

/// A Smart HTTP remote.
pub struct Remote {
    url: String,
    client: reqwest::blocking::Client,
}

impl Remote {
    /// Create a client for the repository at `url`.
    ///
    /// A `.git` suffix is appended when absent, as git itself does.
    pub fn new(url: &str) -> Result<Remote> {
        let trimmed = url.trim_end_matches('/');
        let url = if trimmed.ends_with(".git") {
            trimmed.to_string()
        } else {
            format!("{}.git", trimmed)
        };

        let client = reqwest::blocking::Client::builder()
            .user_agent("git/1.0")
            .build()?;

        Ok(Remote { url, client })
    }

    /// Fetch and parse the ref advertisement.
    pub fn discover_refs(&self) -> Result<RefAdvertisement> {
        let url = format!("{}/info/refs?service={}", self.url, UPLOAD_PACK_SERVICE);
        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Protocol(format!(
                "server returned HTTP {} for {}",
                status, url
            )));
        }

        let body = response.bytes()?;
        parse_advertisement(&body)
    }

    /// Request a pack holding everything reachable from `wants` and return
    /// its raw bytes.
    ///
    /// Progress text from the remote (side-band channel 2) is handed to
    /// `progress`.
    pub fn fetch_pack<F>(
        &self,
        wants: &[Id],
        advertisement: &RefAdvertisement,
        progress: F,
    ) -> Result<Vec<u8>>
    where
        F: FnMut(&[u8]),
    {
        if wants.is_empty() {
            return Err(Error::Protocol("nothing to fetch".to_string()));
        }

        let capabilities = negotiated_capabilities(&advertisement.capabilities);
        let side_band = advertisement
            .capabilities
            .contains(SIDE_BAND_CAPABILITY);

        let url = format!("{}/{}", self.url, UPLOAD_PACK_SERVICE);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/x-git-upload-pack-request")
            .header("Accept", "application/x-git-upload-pack-result")
            .body(upload_pack_request(wants, &capabilities)?)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Protocol(format!(
                "server returned HTTP {} for {}",
                status, url
            )));
        }

        let body = response.bytes()?;
        parse_upload_pack_response(&body, side_band, progress)
    }
}

// The capabilities we ask for: the requested set intersected with what the
// server advertised, plus our agent string.
fn negotiated_capabilities(advertised: &HashSet<String>) -> Vec<String> {
    let mut capabilities: Vec<String> = REQUESTED_CAPABILITIES
        .iter()
        .filter(|cap| advertised.contains(**cap))
        .map(|cap| cap.to_string())
        .collect();
    capabilities.push(format!("agent=mingit/{}", env!("CARGO_PKG_VERSION")));
    capabilities
}

fn parse_advertisement(body: &[u8]) -> Result<RefAdvertisement> {
    let mut parser = Parser::new(body);

    let banner = match parser.next_line()? {
        Some(PktLine::Data(payload)) => payload,
        _ => return Err(Error::Protocol("empty ref advertisement".to_string())),
    };
    if strip_newline(&banner) != format!("# service={}", UPLOAD_PACK_SERVICE).as_bytes() {
        return Err(Error::Protocol(format!(
            "unexpected advertisement banner {:?}",
            String::from_utf8_lossy(&banner)
        )));
    }
    match parser.next_line()? {
        Some(PktLine::Flush) => (),
        _ => {
            return Err(Error::Protocol(
                "missing flush after advertisement banner".to_string(),
            ))
        }
    }

    let mut refs = BTreeMap::new();
    let mut capabilities = HashSet::new();
    let mut head = None;
    let mut first_line = true;

    while let Some(frame) = parser.next_line()? {
        let payload = match frame {
            PktLine::Flush => break,
            PktLine::Data(payload) => payload,
        };
        let payload = strip_newline(&payload);

        if first_line && payload.starts_with(b"version ") {
            return Err(Error::Protocol(
                "remote speaks a newer protocol version; only v1 is supported".to_string(),
            ));
        }

        // The first ref line carries the capability list after a NUL.
        let (ref_part, caps_part) = match payload.iter().position(|&b| b == 0) {
            Some(nul) => (&payload[..nul], Some(&payload[nul + 1..])),
            None => (payload, None),
        };
        if first_line {
            let caps = caps_part.ok_or_else(|| {
                Error::Protocol("first advertisement line is missing capabilities".to_string())
            })?;
            capabilities = String::from_utf8_lossy(caps)
                .split_ascii_whitespace()
                .map(str::to_string)
                .collect();
            first_line = false;
        }

        let (id, refname) = parse_ref_line(ref_part)?;
        if refname == "HEAD" {
            head = Some(id);
        } else {
            refs.insert(refname, id);
        }
    }

    Ok(RefAdvertisement {
        refs,
        capabilities,
        head,
    })
}

fn parse_ref_line(line: &[u8]) -> Result<(Id, String)> {
    if line.len() < 41 || line[40] != b' ' {
        return Err(Error::Protocol(format!(
            "malformed ref line {:?}",
            String::from_utf8_lossy(line)
        )));
    }

    let id = Id::from_hex(&line[..40])
        .map_err(|err| Error::Protocol(format!("malformed ref ID: {}", err)))?;
    let refname = String::from_utf8(line[41..].to_vec())
        .map_err(|_| Error::Protocol("ref name is not UTF-8".to_string()))?;
    Ok((id, refname))
}

fn upload_pack_request(wants: &[Id], capabilities: &[String]) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    for (index, want) in wants.iter().enumerate() {
        let line = if index == 0 {
            format!("want {} {}\n", want, capabilities.join(" "))
        } else {
            format!("want {}\n", want)
        };
        body.extend_from_slice(&pkt_line::data(line.as_bytes())?);
    }
    body.extend_from_slice(pkt_line::flush());
    body.extend_from_slice(&pkt_line::data(b"done\n")?);
    Ok(body)
}

fn parse_upload_pack_response<F>(body: &[u8], side_band: bool, progress: F) -> Result<Vec<u8>>
where
    F: FnMut(&[u8]),
{
    let mut parser = Parser::new(body);

    match parser.next_line()? {
        Some(PktLine::Data(payload)) if strip_newline(&payload) == b"NAK" => (),
        Some(PktLine::Data(payload)) => {
            return Err(Error::Protocol(format!(
                "expected NAK, got {:?}",
                String::from_utf8_lossy(&payload)
            )))
        }
        _ => return Err(Error::Protocol("empty upload-pack response".to_string())),
    }

    if side_band {
        sideband::demux(&mut parser, progress)
    } else {
        Ok(parser.remainder().to_vec())
    }
}

fn strip_newline(line: &[u8]) -> &[u8] {
    match line.split_last() {
        Some((&b'\n', rest)) => rest,
        _ => line,
    }
}
