//! The packfile decoder.
//!
//! A pack is `"PACK"`, a version, an object count, that many encoded
//! objects, and a trailing SHA-1 over everything before it. Objects are
//! either zlib-deflated payloads carrying their own type, or deltas
//! against a base named by in-pack offset (`ofs-delta`) or by ID
//! (`ref-delta`).
//!
//! Decoding runs in two passes: a sequential scan that inflates every
//! object and indexes it by offset, then a resolve pass that applies
//! deltas (cascading through bases that are themselves deltas) until every
//! object has a concrete type.

use std::collections::HashMap;

use sha1::{Digest, Sha1};

use crate::object::{Id, Kind, Object};
use crate::store::ObjectStore;
use crate::zlib;
use crate::{Error, Result};

pub mod delta;

const SIGNATURE: &[u8; 4] = b"PACK";
const SUPPORTED_VERSION: u32 = 2;
const TRAILER_LENGTH: usize = 20;

// How a scanned object will obtain its payload and kind.
enum Form {
    Plain(Kind),
    OfsDelta { base_offset: usize },
    RefDelta { base: Id },
}

struct ScannedObject {
    offset: usize,
    form: Form,
    // Payload for Plain; the inflated delta stream otherwise.
    data: Vec<u8>,
}

/// Decode a complete pack into its objects, in pack order.
pub fn decode(pack: &[u8]) -> Result<Vec<Object>> {
    let scanned = scan(pack)?;
    resolve(scanned)
}

/// Decode a pack and write every object to the store.
///
/// Returns the IDs of the decoded objects, in pack order.
pub fn decode_to_store(store: &ObjectStore, pack: &[u8]) -> Result<Vec<Id>> {
    let objects = decode(pack)?;
    let mut ids = Vec::with_capacity(objects.len());
    for object in &objects {
        ids.push(store.write(object)?);
    }
    Ok(ids)
}

fn scan(pack: &[u8]) -> Result<Vec<ScannedObject>> {
    let mut reader = Reader { pack, pos: 0 };

    if reader.take(4)? != SIGNATURE {
        return Err(Error::Pack("bad pack signature".to_string()));
    }
    let version = reader.u32_be()?;
    if version != SUPPORTED_VERSION {
        return Err(Error::Pack(format!(
            "unsupported pack version {}",
            version
        )));
    }
    let count = reader.u32_be()? as usize;

    let mut objects = Vec::with_capacity(count);
    for index in 0..count {
        let offset = reader.pos;
        let (type_code, size) = reader.object_header(index)?;

        let form = match type_code {
            1 => Form::Plain(Kind::Commit),
            2 => Form::Plain(Kind::Tree),
            3 => Form::Plain(Kind::Blob),
            4 => Form::Plain(Kind::Tag),
            6 => {
                let distance = reader.offset_encoding(index)?;
                let base_offset = offset.checked_sub(distance).ok_or_else(|| {
                    object_error(index, "delta base offset reaches before the pack")
                })?;
                if base_offset >= offset {
                    return Err(object_error(index, "delta references itself"));
                }
                Form::OfsDelta { base_offset }
            }
            7 => {
                let raw = reader.take(20).map_err(|_| {
                    object_error(index, "truncated ref-delta base ID")
                })?;
                let base = Id::from_bytes(raw).expect("20-byte slice");
                Form::RefDelta { base }
            }
            code => {
                return Err(object_error(
                    index,
                    &format!("invalid object type {}", code),
                ))
            }
        };

        let data = reader.inflate(index)?;
        if data.len() != size {
            return Err(object_error(
                index,
                &format!(
                    "inflated to {} bytes but header declared {}",
                    data.len(),
                    size
                ),
            ));
        }

        objects.push(ScannedObject { offset, form, data });
    }

    let trailer = reader.take(TRAILER_LENGTH).map_err(|_| {
        Error::Pack("pack is missing its trailing checksum".to_string())
    })?;
    if reader.pos != pack.len() {
        return Err(Error::Pack("trailing garbage after pack checksum".to_string()));
    }
    let actual: [u8; 20] = Sha1::digest(&pack[..pack.len() - TRAILER_LENGTH]).into();
    if trailer != &actual[..] {
        return Err(Error::Pack("pack checksum mismatch".to_string()));
    }

    Ok(objects)
}

fn resolve(scanned: Vec<ScannedObject>) -> Result<Vec<Object>> {
    let count = scanned.len();
    let mut resolved: Vec<Option<Object>> = Vec::with_capacity(count);
    let mut index_by_offset = HashMap::with_capacity(count);
    let mut index_by_id = HashMap::new();

    for (index, object) in scanned.iter().enumerate() {
        index_by_offset.insert(object.offset, index);
        resolved.push(match &object.form {
            Form::Plain(kind) => Some(Object::new(*kind, object.data.clone())),
            _ => None,
        });
    }
    for (index, object) in resolved.iter().enumerate() {
        if let Some(object) = object {
            index_by_id.insert(object.id(), index);
        }
    }

    // Deltas against earlier objects resolve in the first sweep; a
    // ref-delta may name an object that appears later in the pack, so
    // sweep until nothing is left or nothing moved.
    loop {
        let mut progressed = false;
        let mut unresolved = None;

        for index in 0..count {
            if resolved[index].is_some() {
                continue;
            }

            let base_index = match &scanned[index].form {
                Form::OfsDelta { base_offset } => {
                    *index_by_offset.get(base_offset).ok_or_else(|| {
                        object_error(index, "no object starts at the delta base offset")
                    })?
                }
                Form::RefDelta { base } => match index_by_id.get(base) {
                    Some(&base_index) => base_index,
                    None => {
                        unresolved = unresolved.or(Some(index));
                        continue;
                    }
                },
                Form::Plain(_) => unreachable!("plain objects resolve in the first pass"),
            };

            let base = match &resolved[base_index] {
                Some(base) => base,
                None => {
                    unresolved = unresolved.or(Some(index));
                    continue;
                }
            };

            let content = delta::apply(&base.content, &scanned[index].data)
                .map_err(|err| object_error(index, &err.to_string()))?;
            // A delta's type is inherited from its ultimate non-delta base.
            let object = Object::new(base.kind, content);
            index_by_id.insert(object.id(), index);
            resolved[index] = Some(object);
            progressed = true;
        }

        match unresolved {
            None => break,
            Some(index) if !progressed => {
                let detail = match &scanned[index].form {
                    Form::RefDelta { base } => format!("delta base {} not found in pack", base),
                    _ => "delta cannot be resolved".to_string(),
                };
                return Err(object_error(index, &detail));
            }
            Some(_) => (),
        }
    }

    Ok(resolved
        .into_iter()
        .map(|object| object.expect("all objects resolved"))
        .collect())
}

fn object_error(index: usize, reason: &str) -> Error {
    Error::Pack(format!("object {}: {}", index, reason))
}

struct Reader<'a> {
    pack: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn byte(&mut self) -> Result<u8> {
        let &byte = self
            .pack
            .get(self.pos)
            .ok_or_else(|| Error::Pack("unexpected end of pack".to_string()))?;
        self.pos += 1;
        Ok(byte)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self
            .pack
            .get(self.pos..self.pos + count)
            .ok_or_else(|| Error::Pack("unexpected end of pack".to_string()))?;
        self.pos += count;
        Ok(bytes)
    }

    fn u32_be(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    // The split object header varint: 3 type bits and the low 4 size bits
    // in the first byte, then 7 size bits per continuation byte.
    fn object_header(&mut self, index: usize) -> Result<(u8, usize)> {
        let first = self
            .byte()
            .map_err(|_| object_error(index, "truncated object header"))?;
        let type_code = (first >> 4) & 0x7;
        let mut size = (first & 0xf) as usize;
        let mut shift = 4u32;

        let mut byte = first;
        while byte & 0x80 != 0 {
            byte = self
                .byte()
                .map_err(|_| object_error(index, "truncated object header"))?;
            let chunk = (byte & 0x7f) as usize;
            size |= chunk
                .checked_shl(shift)
                .filter(|shifted| shifted >> shift == chunk)
                .ok_or_else(|| object_error(index, "object size overflows"))?;
            shift += 7;
        }

        Ok((type_code, size))
    }

    // The ofs-delta distance varint: 7 bits per byte ordered from most to
    // least significant, with the accumulated value incremented once per
    // continuation byte so that multi-byte encodings have no redundancy.
    fn offset_encoding(&mut self, index: usize) -> Result<usize> {
        let mut value = 0usize;
        loop {
            let byte = self
                .byte()
                .map_err(|_| object_error(index, "truncated delta base offset"))?;
            value = value
                .checked_shl(7)
                .filter(|_| value >> (usize::max_value().count_ones() - 7) == 0)
                .map(|shifted| shifted | (byte & 0x7f) as usize)
                .ok_or_else(|| object_error(index, "delta base offset overflows"))?;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            value += 1;
        }
    }

    fn inflate(&mut self, index: usize) -> Result<Vec<u8>> {
        let (data, consumed) = zlib::inflate_prefix(&self.pack[self.pos..])
            .map_err(|err| object_error(index, &err.to_string()))?;
        self.pos += consumed;
        Ok(data)
    }
}
