////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! The rotating-XOR cipher protecting save-game and map records.
//!
//! The scheme is self-terminating: a 16-bit checksum of the plaintext leads
//! the block, the key byte is derived from that checksum, and decryption stops
//! the moment the running checksum of the decrypted bytes reaches the stored
//! target. Nothing else records where the ciphertext ends; any bytes left in
//! the outer block after that point are an unencrypted tail, copied verbatim.
//!
//! Because the length lives only in the checksum, a plaintext whose running
//! checksum happens to hit the target early cannot survive a round trip. Real
//! game records never do; the property is documented on [decrypt_block]
//! rather than papered over.

use std::io::{ErrorKind, Read};

use crate::{Error, Result};

/// Key byte advance per processed byte.
const KEY_STEP: u8 = 0x1F;

fn checksum_over(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0_u16, |checksum, &byte| checksum.wrapping_sub(byte.into()))
}

fn initial_key(target: u16) -> u8 {
    (target & 0xFF) as u8 ^ (target >> 8) as u8
}

/// Encrypts a plaintext buffer into a complete block: 2-byte little-endian
/// checksum target, then the ciphertext.
#[must_use]
pub fn encrypt_block(plaintext: &[u8]) -> Vec<u8> {
    let target = checksum_over(plaintext);
    let mut key = initial_key(target);

    let mut block = Vec::with_capacity(plaintext.len() + 2);
    block.push((target & 0xFF) as u8);
    block.push((target >> 8) as u8);
    for &byte in plaintext {
        block.push(byte ^ key);
        key = key.wrapping_add(KEY_STEP);
    }
    block
}

/// Decrypts a complete outer block: the encrypted prefix terminated by the
/// checksum match, then the verbatim unencrypted tail.
///
/// The returned buffer is the decrypted prefix followed by the tail, i.e. the
/// full plaintext content of the block. The loop never reads past the block,
/// so corrupt data cannot cause a runaway scan.
///
/// # Errors
/// - [Error::UnexpectedEndOfStream]: the block is shorter than the 2-byte
///   checksum
/// - [Error::ChecksumNeverMet]: the block ran out before the running checksum
///   reached the stored target
pub fn decrypt_block(block: &[u8]) -> Result<Vec<u8>> {
    if block.len() < 2 {
        return Err(Error::UnexpectedEndOfStream);
    }
    let target = u16::from(block[0]) | u16::from(block[1]) << 8;
    let mut key = initial_key(target);
    let mut checksum = 0_u16;

    let body = &block[2..];
    let mut plaintext = Vec::with_capacity(body.len());
    let mut position = 0;
    while checksum != target {
        let Some(&cipher_byte) = body.get(position) else {
            return Err(Error::ChecksumNeverMet { target, checksum });
        };
        let byte = cipher_byte ^ key;
        checksum = checksum.wrapping_sub(byte.into());
        key = key.wrapping_add(KEY_STEP);
        plaintext.push(byte);
        position += 1;
    }
    plaintext.extend_from_slice(&body[position..]);
    Ok(plaintext)
}

/// Streaming variant of [decrypt_block] for callers that hold a reader and
/// the externally supplied outer block length rather than a slice.
///
/// # Errors
/// - [Error::UnexpectedEndOfStream]: the reader held fewer than `outer_length`
///   bytes
/// - [Error::ChecksumNeverMet]: the block ran out before the running checksum
///   reached the stored target
/// - [Error::Io]: generic IO error while reading
pub fn decrypt<R: Read>(reader: &mut R, outer_length: usize) -> Result<Vec<u8>> {
    let mut block = vec![0_u8; outer_length];
    reader.read_exact(&mut block).map_err(|err| {
        if err.kind() == ErrorKind::UnexpectedEof {
            Error::UnexpectedEndOfStream
        } else {
            Error::from(err)
        }
    })?;
    decrypt_block(&block)
}
