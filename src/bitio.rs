////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! Sequential bit-level access over byte streams, MSB-first within each byte.
//!
//! Every compressed structure in the format is a bit stream: the Huffman tree
//! header, the Huffman codes themselves. Byte and word reads stay valid at any
//! bit alignment because they are composed from single bit reads; words are
//! little-endian, inherited from the original platform.

use std::io::{ErrorKind, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::{Error, Result};

/// Reads single bits out of a byte source, most significant bit first.
///
/// At most 7 unread bits are buffered between calls; a fresh source byte is
/// fetched only once the buffer is empty.
#[derive(Debug)]
pub struct BitReader<R: Read> {
    reader: R,
    buffer: u8,
    remaining: u8,
}

impl<R: Read> BitReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: 0,
            remaining: 0,
        }
    }

    /// Reads the next bit, returned as `0` or `1`.
    ///
    /// # Errors
    /// - [Error::UnexpectedEndOfStream]: the underlying source is exhausted
    /// - [Error::Io]: generic IO error while fetching the next source byte
    pub fn read_bit(&mut self) -> Result<u8> {
        if self.remaining == 0 {
            self.buffer = match self.reader.read_u8() {
                Ok(byte) => byte,
                Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                    return Err(Error::UnexpectedEndOfStream);
                }
                Err(err) => return Err(err.into()),
            };
            self.remaining = 8;
        }
        let bit = self.buffer >> 7;
        self.buffer <<= 1;
        self.remaining -= 1;
        Ok(bit)
    }

    /// Reads 8 sequential bits as a byte, valid at any bit alignment.
    ///
    /// # Errors
    /// - [Error::UnexpectedEndOfStream]: the underlying source is exhausted
    /// - [Error::Io]: generic IO error while fetching the next source byte
    pub fn read_byte(&mut self) -> Result<u8> {
        let mut value = 0;
        for _ in 0..8 {
            value = (value << 1) | self.read_bit()?;
        }
        Ok(value)
    }

    /// Reads two sequential bytes as a little-endian word.
    ///
    /// # Errors
    /// - [Error::UnexpectedEndOfStream]: the underlying source is exhausted
    /// - [Error::Io]: generic IO error while fetching the next source byte
    pub fn read_word(&mut self) -> Result<u16> {
        let low = self.read_byte()?;
        let high = self.read_byte()?;
        Ok(u16::from(high) << 8 | u16::from(low))
    }
}

/// Writes single bits into a byte sink, most significant bit first.
///
/// Bits accumulate into a pending byte which is emitted once full. [flush]
/// pads any partial pending byte with zero bits and emits it; written output
/// is incomplete until then.
///
/// [flush]: BitWriter::flush
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    writer: W,
    buffer: u8,
    pending: u8,
}

impl<W: Write> BitWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: 0,
            pending: 0,
        }
    }

    /// Writes a single bit; any nonzero `bit` is written as `1`.
    ///
    /// # Errors
    /// - [Error::Io]: generic IO error while emitting a completed byte
    pub fn write_bit(&mut self, bit: u8) -> Result<()> {
        self.buffer = (self.buffer << 1) | u8::from(bit != 0);
        self.pending += 1;
        if self.pending == 8 {
            self.writer.write_u8(self.buffer)?;
            self.buffer = 0;
            self.pending = 0;
        }
        Ok(())
    }

    /// Writes 8 bits, most significant first.
    ///
    /// # Errors
    /// - [Error::Io]: generic IO error while emitting a completed byte
    pub fn write_byte(&mut self, value: u8) -> Result<()> {
        for shift in (0..8).rev() {
            self.write_bit((value >> shift) & 1)?;
        }
        Ok(())
    }

    /// Writes a word as two bytes, least significant byte first.
    ///
    /// # Errors
    /// - [Error::Io]: generic IO error while emitting a completed byte
    pub fn write_word(&mut self, value: u16) -> Result<()> {
        self.write_byte(value as u8)?;
        self.write_byte((value >> 8) as u8)?;
        Ok(())
    }

    /// Pads the pending partial byte with zero bits, emits it, and flushes the
    /// underlying writer.
    ///
    /// # Errors
    /// - [Error::Io]: generic IO error while emitting or flushing
    pub fn flush(&mut self) -> Result<()> {
        if self.pending > 0 {
            self.buffer <<= 8 - self.pending;
            self.writer.write_u8(self.buffer)?;
            self.buffer = 0;
            self.pending = 0;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Consumes the writer and returns the underlying sink. Call [flush]
    /// first; pending bits are discarded otherwise.
    ///
    /// [flush]: BitWriter::flush
    pub fn into_inner(self) -> W {
        self.writer
    }
}
