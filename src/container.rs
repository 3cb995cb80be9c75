////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! MSQ record framing: every payload in the game's data files is preceded by
//! a 4 or 8 byte header naming its kind, source disk, and (for compressed and
//! animation payloads) the decompressed size.
//!
//! A game file is simply a run of records back to back; running out of bytes
//! exactly on a record boundary is the normal end of the file, not an error.

use std::io::{ErrorKind, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{Error, Result};

/// The three tag bytes that open (or, in the sized form, follow the size of)
/// every non-animation record: literal `m`, `s`, `q` in stream order.
pub const MSQ_TAG: [u8; 3] = *b"msq";

/// Magic byte sequence identifying an animation block where the tag and disk
/// byte would otherwise sit.
pub const ANIMATION_MAGIC: [u8; 4] = [0x08, 0x67, 0x01, 0x00];

/// Internal struct to represent a decoded MSQ record header
#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub enum MsqHeader {
    /// 4-byte form: the tag followed by the disk index as an ASCII digit.
    /// The payload is stored raw.
    Uncompressed { disk: u8 },
    /// 8-byte form: decompressed payload size, then the tag and the raw disk
    /// byte. The payload is Huffman compressed.
    Compressed { disk: u8, decompressed_length: u32 },
    /// 8-byte form: decompressed size then the animation magic. The disk
    /// index is fixed by the magic's trailing zero byte.
    AnimationBlock { decompressed_length: u32 },
}

impl MsqHeader {
    /// Attempts to parse the next record header at the current position.
    ///
    /// Returns `Ok(None)` if the stream ends before the first header byte,
    /// which is the clean end of the record sequence.
    ///
    /// # Errors
    /// - [Error::UnexpectedEndOfStream]: the stream ended partway through a
    ///   header
    /// - [Error::BadHeader]: 8 bytes were read and matched no known form
    /// - [Error::Io]: generic IO error while reading
    pub fn read<R: Read>(reader: &mut R) -> Result<Option<MsqHeader>> {
        let first = match reader.read_u8() {
            Ok(byte) => byte,
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let mut lead = [first, 0, 0, 0];
        read_exactly(reader, &mut lead[1..])?;

        if lead[..3] == MSQ_TAG && (lead[3] == b'0' || lead[3] == b'1') {
            return Ok(Some(MsqHeader::Uncompressed {
                disk: lead[3] - b'0',
            }));
        }

        let decompressed_length = u32::from_le_bytes(lead);
        let mut tail = [0_u8; 4];
        read_exactly(reader, &mut tail)?;

        if tail[..3] == MSQ_TAG && (tail[3] == 0 || tail[3] == 1) {
            Ok(Some(MsqHeader::Compressed {
                disk: tail[3],
                decompressed_length,
            }))
        } else if tail == ANIMATION_MAGIC {
            Ok(Some(MsqHeader::AnimationBlock {
                decompressed_length,
            }))
        } else {
            let mut bytes = [0_u8; 8];
            bytes[..4].copy_from_slice(&lead);
            bytes[4..].copy_from_slice(&tail);
            Err(Error::BadHeader(bytes))
        }
    }

    /// Writes the header back in its exact on-disk byte form.
    ///
    /// # Errors
    /// - [Error::Io]: generic IO error while writing
    pub fn write<W: Write>(self, writer: &mut W) -> Result<()> {
        match self {
            MsqHeader::Uncompressed { disk } => {
                writer.write_all(&MSQ_TAG)?;
                writer.write_u8(b'0' + disk)?;
            }
            MsqHeader::Compressed {
                disk,
                decompressed_length,
            } => {
                writer.write_u32::<LittleEndian>(decompressed_length)?;
                writer.write_all(&MSQ_TAG)?;
                writer.write_u8(disk)?;
            }
            MsqHeader::AnimationBlock {
                decompressed_length,
            } => {
                writer.write_u32::<LittleEndian>(decompressed_length)?;
                writer.write_all(&ANIMATION_MAGIC)?;
            }
        }
        Ok(())
    }
}

// read_exact with EOF mapped to the typed truncation error; at this point the
// header has started, so running out is always fatal.
fn read_exactly<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == ErrorKind::UnexpectedEof {
            Error::UnexpectedEndOfStream
        } else {
            err.into()
        }
    })
}
