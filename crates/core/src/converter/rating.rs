//! Winamp rating extraction from M4A containers.
//!
//! Winamp keeps its rating in the iTunes-style item list at
//! `moov/udta/meta/ilst/rate`, as a `data` atom holding either a
//! big-endian integer or a decimal string. We walk the box tree with
//! seeks, so `mdat` is never read.

use std::io::{Read, Seek, SeekFrom};

use super::error::RatingError;
use super::types::Rating;

const ITEM_PATH: [&[u8; 4]; 5] = [b"moov", b"udta", b"meta", b"ilst", b"rate"];

/// Largest payload we accept for a rating value.
const MAX_PAYLOAD: u64 = 32;

// Well-known data atom type indicators.
const TYPE_IMPLICIT: u32 = 0;
const TYPE_UTF8: u32 = 1;
const TYPE_BE_SIGNED: u32 = 21;
const TYPE_BE_UNSIGNED: u32 = 22;

#[derive(Debug, Clone, Copy)]
struct BoxHeader {
    kind: [u8; 4],
    offset: u64,
    header_len: u64,
    size: u64,
    end: u64,
}

impl BoxHeader {
    fn body_start(&self) -> u64 {
        self.offset + self.header_len
    }

    fn end(&self) -> u64 {
        self.end
    }

    fn kind_str(&self) -> String {
        String::from_utf8_lossy(&self.kind).into_owned()
    }
}

/// Reads the Winamp rating from an M4A stream.
///
/// Returns `Ok(None)` when the file has no rating item.
pub fn read_winamp_rating<R: Read + Seek>(reader: &mut R) -> Result<Option<Rating>, RatingError> {
    let file_end = reader.seek(SeekFrom::End(0))?;

    let mut start = 0;
    let mut end = file_end;
    for kind in ITEM_PATH {
        let Some(header) = find_child(reader, start, end, kind)? else {
            return Ok(None);
        };
        start = header.body_start();
        end = header.end();
        if &header.kind == b"meta" && !is_quicktime_meta(reader, start, end)? {
            // ISO meta is a full box: skip version and flags.
            start += 4;
        }
    }

    let Some(data) = find_child(reader, start, end, b"data")? else {
        return Ok(None);
    };
    read_data_atom(reader, &data)
}

/// QuickTime-style `meta` boxes have no version/flags word and start
/// directly with the `hdlr` child.
fn is_quicktime_meta<R: Read + Seek>(reader: &mut R, start: u64, end: u64) -> Result<bool, RatingError> {
    if end.saturating_sub(start) < 8 {
        return Ok(false);
    }
    let mut buf = [0u8; 8];
    reader.seek(SeekFrom::Start(start))?;
    reader.read_exact(&mut buf)?;
    Ok(&buf[4..8] == b"hdlr")
}

fn find_child<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    end: u64,
    kind: &[u8; 4],
) -> Result<Option<BoxHeader>, RatingError> {
    let mut pos = start;
    while end.saturating_sub(pos) >= 8 {
        let header = read_header(reader, pos, end)?;
        if &header.kind == kind {
            return Ok(Some(header));
        }
        if header.end() <= pos {
            return Err(RatingError::InvalidSize {
                kind: header.kind_str(),
                offset: pos,
                size: header.size,
            });
        }
        pos = header.end();
    }
    Ok(None)
}

fn read_header<R: Read + Seek>(reader: &mut R, offset: u64, parent_end: u64) -> Result<BoxHeader, RatingError> {
    let mut buf = [0u8; 8];
    reader.seek(SeekFrom::Start(offset))?;
    reader.read_exact(&mut buf)?;

    let mut kind = [0u8; 4];
    kind.copy_from_slice(&buf[4..8]);
    let size32 = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);

    let (size, header_len) = match size32 {
        // Box extends to the end of its parent.
        0 => (parent_end - offset, 8),
        1 => {
            if parent_end - offset < 16 {
                return Err(RatingError::Truncated {
                    kind: String::from_utf8_lossy(&kind).into_owned(),
                    offset,
                });
            }
            let mut large = [0u8; 8];
            reader.read_exact(&mut large)?;
            (u64::from_be_bytes(large), 16)
        }
        n => (u64::from(n), 8),
    };

    let kind_str = || String::from_utf8_lossy(&kind).into_owned();

    if size < header_len {
        return Err(RatingError::InvalidSize {
            kind: kind_str(),
            offset,
            size,
        });
    }
    let end = match offset.checked_add(size) {
        Some(end) if end <= parent_end => end,
        _ => {
            return Err(RatingError::Truncated {
                kind: kind_str(),
                offset,
            })
        }
    };

    Ok(BoxHeader {
        kind,
        offset,
        header_len,
        size,
        end,
    })
}

fn read_data_atom<R: Read + Seek>(reader: &mut R, data: &BoxHeader) -> Result<Option<Rating>, RatingError> {
    let body_len = data.size - data.header_len;
    if body_len < 8 {
        return Err(RatingError::Truncated {
            kind: data.kind_str(),
            offset: data.offset,
        });
    }

    let mut prefix = [0u8; 8];
    reader.seek(SeekFrom::Start(data.body_start()))?;
    reader.read_exact(&mut prefix)?;
    // First byte is the version, the next three the type indicator.
    let data_type = u32::from_be_bytes([0, prefix[1], prefix[2], prefix[3]]);

    let payload_len = body_len - 8;
    if payload_len == 0 {
        return Ok(None);
    }
    if payload_len > MAX_PAYLOAD {
        return Err(RatingError::UnsupportedPayload {
            data_type,
            len: payload_len as usize,
        });
    }

    let mut payload = vec![0u8; payload_len as usize];
    reader.read_exact(&mut payload)?;

    decode_payload(data_type, &payload).map(Some)
}

fn decode_payload(data_type: u32, payload: &[u8]) -> Result<Rating, RatingError> {
    let unsupported = || RatingError::UnsupportedPayload {
        data_type,
        len: payload.len(),
    };

    match data_type {
        TYPE_BE_SIGNED | TYPE_BE_UNSIGNED | TYPE_IMPLICIT
            if matches!(payload.len(), 1 | 2 | 4 | 8) =>
        {
            let value = payload
                .iter()
                .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
            Ok(Rating(value))
        }
        TYPE_UTF8 | TYPE_IMPLICIT => std::str::from_utf8(payload)
            .ok()
            .map(|s| s.trim_matches(|c: char| c.is_whitespace() || c == '\0'))
            .and_then(|s| s.parse::<u64>().ok())
            .map(Rating)
            .ok_or_else(unsupported),
        _ => Err(unsupported()),
    }
}
