////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! The game's Huffman compression: a serialized prefix-code tree immediately
//! followed by the bit-packed payload codes.
//!
//! The compressed stream carries no payload length; the MSQ record header
//! wrapping it stores the decompressed size, so decompression takes the
//! expected byte count from the caller.
//!
//! Compressed output is byte-identical with the original encoder's archives as
//! long as the construction tie-break in [HuffmanTree] holds, which is what
//! makes re-encoded assets diffable against shipped game data.

mod tree;

use std::io::{Cursor, Read, Write};

pub use tree::HuffmanTree;

use crate::bitio::{BitReader, BitWriter};
use crate::Result;

/// Compresses a byte buffer into a bit sink: tree header first, then one code
/// per input byte.
///
/// The caller is responsible for flushing the sink once the compressed unit is
/// complete.
///
/// # Errors
/// - [Error::EmptyInput](crate::Error::EmptyInput): `input` contains no bytes
/// - [Error::Io](crate::Error::Io): generic IO error while writing
pub fn compress<W: Write>(input: &[u8], writer: &mut BitWriter<W>) -> Result<()> {
    let tree = HuffmanTree::build(input)?;
    tree.write(writer)?;
    for &byte in input {
        tree.encode_byte(byte, writer)?;
    }
    Ok(())
}

/// Decompresses `length` bytes from a bit source: tree header first, then one
/// root-to-leaf walk per output byte.
///
/// # Errors
/// - [Error::UnexpectedEndOfStream](crate::Error::UnexpectedEndOfStream): the
///   source ended mid-tree or mid-code
/// - [Error::Io](crate::Error::Io): generic IO error while reading
pub fn decompress<R: Read>(reader: &mut BitReader<R>, length: usize) -> Result<Vec<u8>> {
    let tree = HuffmanTree::read(reader)?;
    let mut output = Vec::with_capacity(length);
    for _ in 0..length {
        output.push(tree.decode_byte(reader)?);
    }
    Ok(output)
}

/// Wrapped compress function with a bit easier and cleaner of an API.
/// Takes a slice of uncompressed bytes and returns a Vec of compressed bytes.
/// In implementation this just creates a `Cursor`-backed [BitWriter] and calls
/// [compress], flushing at the end.
///
/// # Errors
/// - [Error::EmptyInput](crate::Error::EmptyInput): `input` contains no bytes
/// - [Error::Io](crate::Error::Io): generic IO error while writing
pub fn easy_compress(input: &[u8]) -> Result<Vec<u8>> {
    let mut writer = BitWriter::new(Cursor::new(vec![]));
    compress(input, &mut writer)?;
    writer.flush()?;
    Ok(writer.into_inner().into_inner())
}

/// Wrapped decompress function with a bit easier and cleaner of an API.
/// Takes a slice of compressed bytes and the decompressed length (from the
/// MSQ record header) and returns a Vec of decompressed bytes.
///
/// # Errors
/// - [Error::UnexpectedEndOfStream](crate::Error::UnexpectedEndOfStream): the
///   input ended mid-tree or mid-code
/// - [Error::Io](crate::Error::Io): generic IO error while reading
pub fn easy_decompress(input: &[u8], length: usize) -> Result<Vec<u8>> {
    let mut reader = BitReader::new(Cursor::new(input));
    decompress(&mut reader, length)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use test_strategy::proptest;

    use super::*;

    // Worked by hand from the serialization rules: tree `0 1[b] 0 1[a]`,
    // then codes a=1 a=1 b=0, zero-padded to the byte boundary.
    #[test]
    fn known_compressed_bytes() {
        let compressed = easy_compress(b"aab").unwrap();
        assert_eq!(compressed, vec![0x58, 0x96, 0x1C]);
    }

    #[test]
    fn single_distinct_value_round_trips() {
        let input = vec![0x07; 64];
        let compressed = easy_compress(&input).unwrap();
        let decompressed = easy_decompress(&compressed, input.len()).unwrap();
        assert_eq!(input, decompressed);
    }

    #[test]
    fn truncated_codes_error() {
        let input = b"abracadabra".repeat(20);
        let compressed = easy_compress(&input).unwrap();
        let err = easy_decompress(&compressed[..compressed.len() / 2], input.len()).unwrap_err();
        assert!(matches!(err, crate::Error::UnexpectedEndOfStream));
    }

    #[proptest]
    fn symmetrical_compression(#[filter(!#input.is_empty())] input: Vec<u8>) {
        let compressed = easy_compress(&input).unwrap();
        let decompressed = easy_decompress(&compressed, input.len()).unwrap();

        prop_assert_eq!(input, decompressed);
    }

    #[proptest]
    fn symmetrical_compression_all_byte_values(
        #[strategy(proptest::collection::vec(any::<u8>(), 2_000..=2_000))] input: Vec<u8>,
    ) {
        let compressed = easy_compress(&input).unwrap();
        let decompressed = easy_decompress(&compressed, input.len()).unwrap();

        prop_assert_eq!(input, decompressed);
    }
}
