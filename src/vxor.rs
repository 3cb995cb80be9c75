////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! The vertical-XOR transform applied to packed-pixel raster payloads.
//!
//! Rows hold two 4-bit pixels per byte, `width / 2` bytes per row. The first
//! row is stored as-is; every later byte is XORed against the decoded byte one
//! row up in the same column, which turns the mostly-vertical structure of the
//! game's art into long zero runs for the Huffman stage to eat.
//!
//! The streaming forms exist so callers can feed bytes through as they fall
//! out of the Huffman decoder without materializing an intermediate buffer.

use crate::{Error, Result};

fn row_stride(width: u16) -> Result<usize> {
    if width == 0 || width % 2 != 0 {
        return Err(Error::BadWidth(width));
    }
    Ok(usize::from(width) / 2)
}

/// Streaming decoder: feed transform-coded bytes in raster order, get true
/// raster bytes out.
#[derive(Debug)]
pub struct VxorDecoder {
    last_line: Vec<u8>,
    x: usize,
    y: usize,
}

impl VxorDecoder {
    /// # Errors
    /// - [Error::BadWidth]: `width` is zero or odd
    pub fn new(width: u16) -> Result<Self> {
        Ok(Self {
            last_line: vec![0; row_stride(width)?],
            x: 0,
            y: 0,
        })
    }

    /// Decodes the next byte in raster order.
    pub fn decode_byte(&mut self, byte: u8) -> u8 {
        let decoded = if self.y == 0 {
            byte
        } else {
            byte ^ self.last_line[self.x]
        };
        self.last_line[self.x] = decoded;
        self.x += 1;
        if self.x == self.last_line.len() {
            self.x = 0;
            self.y += 1;
        }
        decoded
    }

    /// Decodes one stored row in place.
    pub fn decode_row(&mut self, row: &mut [u8]) {
        for byte in row {
            *byte = self.decode_byte(*byte);
        }
    }
}

/// Streaming encoder: feed true raster bytes in raster order, get
/// transform-coded bytes out.
#[derive(Debug)]
pub struct VxorEncoder {
    last_line: Vec<u8>,
    x: usize,
    y: usize,
}

impl VxorEncoder {
    /// # Errors
    /// - [Error::BadWidth]: `width` is zero or odd
    pub fn new(width: u16) -> Result<Self> {
        Ok(Self {
            last_line: vec![0; row_stride(width)?],
            x: 0,
            y: 0,
        })
    }

    /// Encodes the next byte in raster order. `last_line` always tracks the
    /// true byte, never the XORed one.
    pub fn encode_byte(&mut self, byte: u8) -> u8 {
        let encoded = if self.y == 0 {
            byte
        } else {
            byte ^ self.last_line[self.x]
        };
        self.last_line[self.x] = byte;
        self.x += 1;
        if self.x == self.last_line.len() {
            self.x = 0;
            self.y += 1;
        }
        encoded
    }

    /// Encodes one raster row in place.
    pub fn encode_row(&mut self, row: &mut [u8]) {
        for byte in row {
            *byte = self.encode_byte(*byte);
        }
    }
}

/// Decodes a whole transform-coded raster of `width`-pixel rows.
///
/// # Errors
/// - [Error::BadWidth]: `width` is zero or odd, or `data` is not a whole
///   number of rows
pub fn decode(data: &[u8], width: u16) -> Result<Vec<u8>> {
    let stride = row_stride(width)?;
    if data.len() % stride != 0 {
        return Err(Error::BadWidth(width));
    }
    let mut decoder = VxorDecoder::new(width)?;
    Ok(data.iter().map(|&byte| decoder.decode_byte(byte)).collect())
}

/// Encodes a whole raster of `width`-pixel rows into transform-coded form.
///
/// # Errors
/// - [Error::BadWidth]: `width` is zero or odd, or `raster` is not a whole
///   number of rows
pub fn encode(raster: &[u8], width: u16) -> Result<Vec<u8>> {
    let stride = row_stride(width)?;
    if raster.len() % stride != 0 {
        return Err(Error::BadWidth(width));
    }
    let mut encoder = VxorEncoder::new(width)?;
    Ok(raster
        .iter()
        .map(|&byte| encoder.encode_byte(byte))
        .collect())
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use test_strategy::proptest;

    use super::*;

    #[test]
    fn first_row_passes_through() {
        let raster = vec![0x12, 0x34, 0x56, 0x78];
        let encoded = encode(&raster, 8).unwrap();
        assert_eq!(encoded, raster);
    }

    #[test]
    fn second_row_xors_against_first() {
        // Two rows of 2 bytes each (width 4).
        let raster = vec![0xF0, 0x0F, 0xFF, 0x0F];
        let encoded = encode(&raster, 4).unwrap();
        assert_eq!(encoded, vec![0xF0, 0x0F, 0x0F, 0x00]);
        assert_eq!(decode(&encoded, 4).unwrap(), raster);
    }

    #[test]
    fn row_interface_matches_byte_interface() {
        let raster = vec![0x12, 0x34, 0x88, 0x44, 0x21, 0x43];
        let mut encoder = VxorEncoder::new(4).unwrap();
        let mut rows = raster.clone();
        for row in rows.chunks_mut(2) {
            encoder.encode_row(row);
        }
        assert_eq!(rows, encode(&raster, 4).unwrap());

        let mut decoder = VxorDecoder::new(4).unwrap();
        for row in rows.chunks_mut(2) {
            decoder.decode_row(row);
        }
        assert_eq!(rows, raster);
    }

    #[test]
    fn zero_width_is_rejected() {
        assert!(matches!(encode(&[], 0).unwrap_err(), Error::BadWidth(0)));
    }

    #[test]
    fn odd_width_is_rejected() {
        assert!(matches!(
            decode(&[0x00], 3).unwrap_err(),
            Error::BadWidth(3)
        ));
    }

    #[test]
    fn ragged_data_is_rejected() {
        assert!(matches!(
            decode(&[0x00, 0x01, 0x02], 4).unwrap_err(),
            Error::BadWidth(4)
        ));
    }

    #[proptest]
    fn symmetrical_transform(
        #[strategy(1..=64_u16)] half_width: u16,
        #[strategy(1..=48_usize)] height: usize,
        #[strategy(proptest::collection::vec(any::<u8>(), 1..=3072))] fill: Vec<u8>,
    ) {
        let width = half_width * 2;
        let stride = usize::from(width) / 2;
        let raster: Vec<u8> = fill.into_iter().cycle().take(stride * height).collect();

        let encoded = encode(&raster, width).unwrap();
        let decoded = decode(&encoded, width).unwrap();

        prop_assert_eq!(raster, decoded);
    }
}
