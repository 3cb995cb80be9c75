////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

use std::fmt::{Display, Formatter};

use crate::anim::PatchError;

/// Possible errors returned by encoding and decoding functions
#[derive(Debug)]
pub enum Error {
    /// Error for when no input is provided to a compressor function
    EmptyInput,
    /// Error indicating that the underlying byte source ran out in a position
    /// where the format requires more data (mid-header, mid-tree, mid-patch).
    ///
    /// Benign ends of a sequence (no more MSQ records, no more animation
    /// frames) are reported as `Ok(None)` by the relevant readers, never as
    /// this error.
    UnexpectedEndOfStream,
    /// Error indicating that the leading bytes of an MSQ record matched
    /// neither the `msq` tag form, the sized `msq` form, nor the animation
    /// block magic.
    ///
    /// ### Fields
    /// - `[u8; 8]`: the 8 bytes that were read instead
    BadHeader([u8; 8]),
    /// Indicates a Huffman encoder was asked to emit a byte value that has no
    /// leaf in the tree it was built with. The alphabet is fixed at tree
    /// construction time, so this is always a caller bug.
    ///
    /// ### Fields
    /// - u8: the byte value with no code
    SymbolNotInTree(u8),
    /// Error indicating that an encrypted block was exhausted before the
    /// running checksum reached the stored target, meaning the block is
    /// corrupted or was never valid ciphertext.
    ///
    /// ### Fields
    /// - `target`: the checksum stored in the block header
    /// - `checksum`: where the running checksum ended up
    ChecksumNeverMet { target: u16, checksum: u16 },
    /// Error for a raster width that cannot describe packed 4-bit pixel rows:
    /// zero, odd, not dividing the supplied data into whole rows, or past the
    /// 320-pixel animation offset convention.
    ///
    /// ### Fields
    /// - u16: the offending width in pixels
    BadWidth(u16),
    /// Error for a raster with more rows than animation patch offsets can
    /// address; the largest offset would collide with the 0xFFFF list
    /// terminator.
    ///
    /// ### Fields
    /// - usize: number of rows in the raster
    RasterTooTall(usize),
    /// Indicates that an invalid patch was encountered while decoding an
    /// animation frame. This normally indicates corrupted data.
    ///
    /// See [PatchError] for further details on types of errors that can occur.
    Patch { error: PatchError, frame: usize },
    /// Generic IO Error wrapper for when a generic IO error of some sort occurs
    /// in relation to the readers and writers.
    Io(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::EmptyInput => {
                write!(f, "No input provided to compression")
            }
            Error::UnexpectedEndOfStream => {
                write!(f, "Byte source ended in the middle of a unit")
            }
            Error::BadHeader(bytes) => {
                write!(f, "Unrecognized MSQ record header `{bytes:02X?}`")
            }
            Error::SymbolNotInTree(value) => {
                write!(
                    f,
                    "Byte value `{value:#04X}` has no code in the Huffman tree"
                )
            }
            Error::ChecksumNeverMet { target, checksum } => {
                write!(
                    f,
                    "Encrypted block exhausted with checksum `{checksum:#06X}`, target \
                     `{target:#06X}`"
                )
            }
            Error::BadWidth(width) => {
                write!(f, "Invalid raster width `{width}` for packed pixel rows")
            }
            Error::RasterTooTall(rows) => {
                write!(
                    f,
                    "Raster of `{rows}` rows overflows animation patch offsets"
                )
            }
            Error::Patch { error, frame } => {
                write!(
                    f,
                    "Error occured while decoding patch in animation frame `{frame}`:\n{error}"
                )
            }
            Error::Io(err) => {
                write!(f, "IO Error: {err}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Wrapper for Result specified to [Error]
pub type Result<T> = std::result::Result<T, Error>;
