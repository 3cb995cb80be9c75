////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! The frame-diff animation codec: a static base picture plus, per frame, a
//! delay and a sparse list of 4-byte patches against the previously rendered
//! frame.
//!
//! Patch offsets count packed bytes using a fixed logical row of 320 pixels
//! (160 bytes) regardless of the raster's real width. The original engine
//! hard-codes this stride, so shipped archives for narrower animations depend
//! on it; do not "fix" it to use the real width.
//!
//! The engine loops the trailing four frames of an animation. The frame that
//! playback loops back to re-enters with the *last* frame on screen rather
//! than its usual predecessor, so the encoder pads that frame's patch list
//! with every group that differs from the final frame, erasing leftovers
//! without re-transmitting the raster.

use std::io::{ErrorKind, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use onlyerror::Error as OnlyError;

use crate::{Error, Result};

/// Terminates both a frame's patch list (as an offset) and the whole frame
/// sequence (as a delay).
pub const SENTINEL: u16 = 0xFFFF;

/// Packed bytes per logical patch row: 320 pixels at two per byte.
const LOGICAL_ROW_BYTES: usize = 160;

/// Raw packed bytes carried by one patch, covering 8 pixels.
const PATCH_BYTES: usize = 4;

/// How many trailing frames the engine loops over.
const LOOP_SPAN: usize = 4;

#[derive(OnlyError, Debug)]
pub enum PatchError {
    /// Error indicating that a patch would spill past the right edge of its
    /// row. This indicates malformed or corrupted data, or a raster narrower
    /// than the patch expects.
    ///
    /// ### Fields
    /// - usize: byte column the patch starts at
    /// - usize: bytes per row in the actual raster
    #[error("Patch column `{0}` spills past the `{1}` byte row")]
    ColumnOverflow(usize, usize),
    /// Error indicating that a patch addresses a row below the bottom of the
    /// raster. This indicates malformed or corrupted data.
    ///
    /// ### Fields
    /// - usize: row the patch addresses
    /// - usize: number of rows in the actual raster
    #[error("Patch row `{0}` is past the end of a `{1}` row raster")]
    RowOverflow(usize, usize),
}

/// One animation step: how long to display it, and its full packed raster
/// (already reconstructed on decode, to be diffed on encode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub delay: u16,
    pub data: Vec<u8>,
}

/// Pulls frames out of an animation block one at a time, each reconstructed
/// against the previously rendered raster.
#[derive(Debug)]
pub struct AnimationDecoder<R: Read> {
    reader: R,
    stride: usize,
    frame_index: usize,
}

impl<R: Read> AnimationDecoder<R> {
    /// Positions the decoder past the leading size word, which the original
    /// reader never uses.
    ///
    /// # Errors
    /// - [Error::BadWidth]: `width` is zero, odd, or wider than the 320-pixel
    ///   offset convention can address
    /// - [Error::UnexpectedEndOfStream]: the block ends before the size word
    ///   does
    /// - [Error::Io]: generic IO error while reading
    pub fn new(mut reader: R, width: u16) -> Result<Self> {
        if width == 0 || width % 2 != 0 || usize::from(width) > LOGICAL_ROW_BYTES * 2 {
            return Err(Error::BadWidth(width));
        }
        let _block_length = read_word(&mut reader)?;
        Ok(Self {
            reader,
            stride: usize::from(width) / 2,
            frame_index: 0,
        })
    }

    /// Decodes the next frame as a patched clone of `prev`, the previously
    /// rendered raster (the base picture for the first frame).
    ///
    /// Returns `Ok(None)` on the terminating delay sentinel.
    ///
    /// # Errors
    /// - [Error::UnexpectedEndOfStream]: the block ended mid-frame
    /// - [Error::Patch]: a patch addressed bytes outside the raster
    /// - [Error::Io]: generic IO error while reading
    pub fn next_frame(&mut self, prev: &[u8]) -> Result<Option<Frame>> {
        let delay = read_word(&mut self.reader)?;
        if delay == SENTINEL {
            return Ok(None);
        }

        let mut data = prev.to_vec();
        loop {
            let offset = read_word(&mut self.reader)?;
            if offset == SENTINEL {
                break;
            }
            let target = self
                .locate(usize::from(offset), data.len())
                .map_err(|error| Error::Patch {
                    error,
                    frame: self.frame_index,
                })?;
            read_patch(&mut self.reader, &mut data[target..target + PATCH_BYTES])?;
        }

        self.frame_index += 1;
        Ok(Some(Frame { delay, data }))
    }

    // Maps a 320-wide-convention offset onto the actual raster.
    fn locate(&self, offset: usize, raster_len: usize) -> std::result::Result<usize, PatchError> {
        let row = offset / LOGICAL_ROW_BYTES;
        let column = offset % LOGICAL_ROW_BYTES;
        if column + PATCH_BYTES > self.stride {
            return Err(PatchError::ColumnOverflow(column, self.stride));
        }
        let start = row * self.stride + column;
        if start + PATCH_BYTES > raster_len {
            return Err(PatchError::RowOverflow(row, raster_len / self.stride));
        }
        Ok(start)
    }
}

/// Decodes a complete animation block into its frame list.
///
/// # Errors
/// See [AnimationDecoder::new] and [AnimationDecoder::next_frame].
pub fn decode_animation<R: Read>(reader: R, base: &[u8], width: u16) -> Result<Vec<Frame>> {
    let mut decoder = AnimationDecoder::new(reader, width)?;
    let mut frames: Vec<Frame> = Vec::new();
    loop {
        let prev = frames.last().map_or(base, |frame| frame.data.as_slice());
        match decoder.next_frame(prev)? {
            Some(frame) => frames.push(frame),
            None => return Ok(frames),
        }
    }
}

/// Encodes a base raster and frame list into a complete animation block.
///
/// Every frame raster must have the same length as `base`, a whole number of
/// `width / 2` byte rows; `width` must be a multiple of 8 so patch groups
/// never straddle a row edge, and at most 320 pixels so every byte column has
/// a representable offset. The leading size word receives the true payload
/// length truncated to 16 bits, which is what shipped archives carry; the
/// decoder ignores it either way.
///
/// # Errors
/// - [Error::BadWidth]: `width` is zero, not a multiple of 8, wider than 320
///   pixels, or some raster is not a whole number of rows of it
/// - [Error::RasterTooTall]: the raster has enough rows to push a patch
///   offset into the list terminator value
/// - [Error::Io]: generic IO error while writing
pub fn encode_animation<W: Write>(
    writer: &mut W,
    base: &[u8],
    frames: &[Frame],
    width: u16,
) -> Result<()> {
    if width == 0 || width % 8 != 0 || usize::from(width) > LOGICAL_ROW_BYTES * 2 {
        return Err(Error::BadWidth(width));
    }
    let stride = usize::from(width) / 2;
    if base.len() % stride != 0 || frames.iter().any(|frame| frame.data.len() != base.len()) {
        return Err(Error::BadWidth(width));
    }
    let rows = base.len() / stride;
    if rows > 0 && (rows - 1) * LOGICAL_ROW_BYTES + stride - PATCH_BYTES >= usize::from(SENTINEL) {
        return Err(Error::RasterTooTall(rows));
    }

    let loop_frame = frames.len().checked_sub(LOOP_SPAN);
    let mut payload: Vec<u8> = Vec::new();
    let mut prev = base;
    for (index, frame) in frames.iter().enumerate() {
        payload.write_u16::<LittleEndian>(frame.delay)?;

        let loop_target = (loop_frame == Some(index)).then(|| &frames[frames.len() - 1].data);
        for start in (0..frame.data.len()).step_by(PATCH_BYTES) {
            let group = &frame.data[start..start + PATCH_BYTES];
            let differs = group != &prev[start..start + PATCH_BYTES]
                || loop_target.map_or(false, |last| group != &last[start..start + PATCH_BYTES]);
            if differs {
                let row = start / stride;
                let column = start % stride;
                let offset = row * LOGICAL_ROW_BYTES + column;
                payload.write_u16::<LittleEndian>(offset as u16)?;
                payload.write_all(group)?;
            }
        }
        payload.write_u16::<LittleEndian>(SENTINEL)?;

        prev = &frame.data;
    }
    payload.write_u16::<LittleEndian>(SENTINEL)?;

    writer.write_u16::<LittleEndian>(payload.len() as u16)?;
    writer.write_all(&payload)?;
    Ok(())
}

fn read_word<R: Read>(reader: &mut R) -> Result<u16> {
    reader.read_u16::<LittleEndian>().map_err(|err| {
        if err.kind() == ErrorKind::UnexpectedEof {
            Error::UnexpectedEndOfStream
        } else {
            Error::from(err)
        }
    })
}

fn read_patch<R: Read>(reader: &mut R, target: &mut [u8]) -> Result<()> {
    reader.read_exact(target).map_err(|err| {
        if err.kind() == ErrorKind::UnexpectedEof {
            Error::UnexpectedEndOfStream
        } else {
            Error::from(err)
        }
    })
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use proptest::prelude::*;
    use test_strategy::proptest;

    use super::*;

    #[test]
    fn known_single_frame_block() {
        // Width 8 (stride 4), two rows; the second row changes. Its group
        // starts at byte 4 = row 1 column 0, so the 320-wide convention puts
        // the offset at 160.
        let base = vec![0_u8; 8];
        let frames = vec![Frame {
            delay: 5,
            data: vec![0, 0, 0, 0, 1, 2, 3, 4],
        }];

        let mut block = vec![];
        encode_animation(&mut block, &base, &frames, 8).unwrap();
        assert_eq!(
            block,
            [
                0x0C, 0x00, // payload size
                0x05, 0x00, // delay
                0xA0, 0x00, 1, 2, 3, 4, // patch at offset 160
                0xFF, 0xFF, // end of patches
                0xFF, 0xFF, // end of frames
            ]
        );

        let decoded = decode_animation(Cursor::new(&block), &base, 8).unwrap();
        assert_eq!(decoded, frames);
    }

    #[test]
    fn empty_animation_is_two_sentinels() {
        let base = vec![0_u8; 8];
        let mut block = vec![];
        encode_animation(&mut block, &base, &[], 8).unwrap();
        assert_eq!(block, [0x02, 0x00, 0xFF, 0xFF]);

        let decoded = decode_animation(Cursor::new(&block), &base, 8).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn loop_closing_frame_patches_against_final_frame() {
        // Four frames, so the loop-closing frame is index 0. Its raster
        // equals the base, so an ordinary diff would emit nothing; the group
        // still differs from the final frame and must be transmitted.
        let base = vec![0_u8; 4];
        let frames: Vec<Frame> = (0..4)
            .map(|n| Frame {
                delay: 1,
                data: vec![n; 4],
            })
            .collect();

        let mut block = vec![];
        encode_animation(&mut block, &base, &frames, 8).unwrap();

        // Frame 0 carries a patch (offset 0, four zero bytes) even though it
        // is identical to its predecessor.
        assert_eq!(block[2..12], [1, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF]);

        let decoded = decode_animation(Cursor::new(&block), &base, 8).unwrap();
        assert_eq!(decoded, frames);
    }

    #[test]
    fn narrow_raster_uses_320_wide_offsets() {
        // Width 96: stride 48, but offsets still advance 160 per row.
        let base = vec![0_u8; 48 * 2];
        let mut data = base.clone();
        data[48..52].copy_from_slice(&[0xA, 0xB, 0xC, 0xD]);
        let frames = vec![Frame { delay: 3, data }];

        let mut block = vec![];
        encode_animation(&mut block, &base, &frames, 96).unwrap();
        // Row 1 column 0 encodes as 160, not 48.
        assert_eq!(block[4..6], [0xA0, 0x00]);

        let decoded = decode_animation(Cursor::new(&block), &base, 96).unwrap();
        assert_eq!(decoded, frames);
    }

    #[test]
    fn patch_outside_raster_errors() {
        // Offset 160 addresses row 1 of a single-row raster.
        let block = [
            0x0C, 0x00, 0x01, 0x00, 0xA0, 0x00, 1, 2, 3, 4, 0xFF, 0xFF, 0xFF, 0xFF,
        ];
        let base = vec![0_u8; 4];
        let err = decode_animation(Cursor::new(&block), &base, 8).unwrap_err();
        assert!(matches!(
            err,
            Error::Patch {
                error: PatchError::RowOverflow(1, 1),
                frame: 0
            }
        ));
    }

    #[test]
    fn wide_patch_column_errors_on_narrow_raster() {
        // Column 46 needs bytes 46..50 of a 48 byte row.
        let offset = 46_u16;
        let mut block = vec![0x0C, 0x00, 0x01, 0x00];
        block.extend_from_slice(&offset.to_le_bytes());
        block.extend_from_slice(&[1, 2, 3, 4, 0xFF, 0xFF, 0xFF, 0xFF]);
        let base = vec![0_u8; 48];
        let err = decode_animation(Cursor::new(&block), &base, 96).unwrap_err();
        assert!(matches!(
            err,
            Error::Patch {
                error: PatchError::ColumnOverflow(46, 48),
                ..
            }
        ));
    }

    #[test]
    fn truncated_block_errors() {
        // Frame starts but the patch list never terminates.
        let block = [0x08, 0x00, 0x01, 0x00, 0x00, 0x00];
        let base = vec![0_u8; 4];
        let err = decode_animation(Cursor::new(&block), &base, 8).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEndOfStream));
    }

    #[test]
    fn odd_width_is_rejected() {
        let err = AnimationDecoder::new(Cursor::new(&[0_u8; 4]), 7).unwrap_err();
        assert!(matches!(err, Error::BadWidth(7)));
        let mut sink = vec![];
        let err = encode_animation(&mut sink, &[0; 4], &[], 4).unwrap_err();
        assert!(matches!(err, Error::BadWidth(4)));
    }

    #[test]
    fn wider_than_320_pixels_is_rejected() {
        // Stride 240: a group at byte column 200 has no representable offset
        // (160 + 40 would decode as row 1 column 40), so the dimension is
        // rejected outright instead of encoding a patch that lands elsewhere.
        let base = vec![0_u8; 240];
        let mut data = base.clone();
        data[200..204].copy_from_slice(&[1, 2, 3, 4]);
        let frames = vec![Frame { delay: 1, data }];

        let mut sink = vec![];
        let err = encode_animation(&mut sink, &base, &frames, 480).unwrap_err();
        assert!(matches!(err, Error::BadWidth(480)));

        let err = AnimationDecoder::new(Cursor::new(&[0_u8; 4]), 480).unwrap_err();
        assert!(matches!(err, Error::BadWidth(480)));
    }

    #[test]
    fn raster_too_tall_for_offsets_is_rejected() {
        // At 410 rows the last group's offset passes the 0xFFFF terminator.
        let mut sink = vec![];
        let base = vec![0_u8; 160 * 410];
        let err = encode_animation(&mut sink, &base, &[], 320).unwrap_err();
        assert!(matches!(err, Error::RasterTooTall(410)));

        // 409 rows still fits.
        let base = vec![0_u8; 160 * 409];
        encode_animation(&mut sink, &base, &[], 320).unwrap();
    }

    prop_compose! {
        fn frame_sequence()(
            half_groups in 1..=8_usize,
            height in 1..=6_usize,
            count in 0..=9_usize,
        )(
            rasters in prop::collection::vec(
                prop::collection::vec(any::<u8>(), half_groups * 8 * height),
                count,
            ),
            delays in prop::collection::vec(0..SENTINEL, count),
            width in Just(half_groups as u16 * 16),
            rows in Just(height),
        ) -> (u16, usize, Vec<Frame>) {
            let frames = delays
                .into_iter()
                .zip(rasters)
                .map(|(delay, data)| Frame { delay, data })
                .collect();
            (width, rows, frames)
        }
    }

    #[proptest]
    fn symmetrical_animation(
        #[strategy(frame_sequence())] input: (u16, usize, Vec<Frame>),
    ) {
        let (width, height, frames) = input;
        let base = vec![0_u8; usize::from(width) / 2 * height];

        let mut block = vec![];
        encode_animation(&mut block, &base, &frames, width).unwrap();
        let decoded = decode_animation(Cursor::new(&block), &base, width).unwrap();

        prop_assert_eq!(frames, decoded);
    }
}
