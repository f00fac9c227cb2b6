//! The wire format: every message is a single frame made of a 2 byte big-endian length
//! followed by that many bytes of "modified UTF-8", the string encoding used by Java's
//! `DataOutputStream::writeUTF`.
//!
//! Modified UTF-8 differs from standard UTF-8 in two ways: the NUL character is written as the
//! two bytes `C0 80`, and characters outside the basic multilingual plane are written as a
//! UTF-16 surrogate pair with each surrogate taking three bytes.
use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{JsonDbError, Result};

/// the largest payload a frame can carry, in bytes
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// reads one frame from `reader` and decodes its payload
///
/// # Errors
/// IO errors from `reader`, including an unexpected EOF if the peer sends a short frame, and
/// [`JsonDbError::Frame`] if the payload is not valid modified UTF-8
pub fn read_frame<R: Read>(reader: &mut R) -> Result<String> {
    let len = reader.read_u16::<BigEndian>()?;
    let mut payload = vec![0_u8; usize::from(len)];
    reader.read_exact(&mut payload)?;
    decode(&payload)
}

/// encodes `msg` and writes it to `writer` as one frame, then flushes `writer`
///
/// # Errors
/// [`JsonDbError::Frame`] if the encoded message is longer than [`MAX_FRAME_LEN`]; nothing is
/// written in that case
pub fn write_frame<W: Write>(writer: &mut W, msg: &str) -> Result<()> {
    let payload = encode(msg);
    let len = u16::try_from(payload.len()).map_err(|_| {
        JsonDbError::Frame(format!(
            "encoded message is {} bytes, the limit is {}",
            payload.len(),
            MAX_FRAME_LEN
        ))
    })?;
    writer.write_u16::<BigEndian>(len)?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// encodes `msg` as modified UTF-8
pub fn encode(msg: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(msg.len());
    let mut units = [0_u16; 2];
    for c in msg.chars() {
        let cp = u32::from(c);
        if cp != 0 && cp < 0x80 {
            out.push(cp as u8);
        } else if cp < 0x10000 {
            encode_unit(cp as u16, &mut out);
        } else {
            for unit in c.encode_utf16(&mut units).iter() {
                encode_unit(*unit, &mut out);
            }
        }
    }
    out
}

// writes one UTF-16 code unit in its two or three byte form. NUL takes the two byte form.
fn encode_unit(unit: u16, out: &mut Vec<u8>) {
    if unit != 0 && unit < 0x80 {
        out.push(unit as u8);
    } else if unit < 0x800 {
        out.push(0xC0 | (unit >> 6) as u8);
        out.push(0x80 | (unit & 0x3F) as u8);
    } else {
        out.push(0xE0 | (unit >> 12) as u8);
        out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
        out.push(0x80 | (unit & 0x3F) as u8);
    }
}

/// decodes modified UTF-8 into a `String`
///
/// # Errors
/// [`JsonDbError::Frame`] on a malformed byte sequence, a four byte UTF-8 sequence, or an
/// unpaired surrogate
pub fn decode(bytes: &[u8]) -> Result<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied().enumerate();
    while let Some((pos, b)) = iter.next() {
        let mut continuation = || match iter.next() {
            Some((_, next)) if next & 0xC0 == 0x80 => Ok(u16::from(next & 0x3F)),
            _ => Err(malformed(pos)),
        };
        let unit = match b {
            0x00..=0x7F => u16::from(b),
            0xC0..=0xDF => (u16::from(b & 0x1F) << 6) | continuation()?,
            0xE0..=0xEF => {
                let high = u16::from(b & 0x0F) << 12;
                let mid = continuation()? << 6;
                high | mid | continuation()?
            }
            _ => return Err(malformed(pos)),
        };
        units.push(unit);
    }
    String::from_utf16(&units)
        .map_err(|_| JsonDbError::Frame("payload contains an unpaired surrogate".to_string()))
}

fn malformed(pos: usize) -> JsonDbError {
    JsonDbError::Frame(format!("malformed modified UTF-8 at byte {}", pos))
}
