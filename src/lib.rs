////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! Bit-exact encoders and decoders for the proprietary binary asset formats
//! of Wasteland (1988): the byte-level transforms every picture, tile set,
//! animation, font, sprite and save-game reader in an asset toolkit is built
//! on.
//!
//! The crate deliberately stops at the byte-sequence layer. Palettes, image
//! wrappers, XML serialization, file layout and CLI concerns belong to the
//! callers; composition happens by feeding one codec's output bytes to the
//! next (MSQ record -> Huffman payload -> vertical-XOR raster, or MSQ record
//! -> rotating-XOR save block).
//!
//! - [container]: MSQ record framing (`msq` tag, disk index, payload sizes)
//! - [huffman]: the game's Huffman variant with its serialized-tree header
//! - [bitio]: the MSB-first bit reader/writer the Huffman layer runs on
//! - [cipher]: the checksum-terminated rotating-XOR save-game cipher
//! - [vxor]: the vertical-XOR row prediction applied to packed rasters
//! - [anim]: the sparse frame-diff animation codec

#![warn(clippy::pedantic, clippy::cargo)]
// Due to the high amount of byte conversions, sometimes intentional lossy conversions are necessary.
#![allow(clippy::cast_possible_truncation)]
// Default::default() is more idiomatic imo
#![allow(clippy::default_trait_access)]
// too many lines is a dumb metric
#![allow(clippy::too_many_lines)]

pub mod anim;
pub mod bitio;
pub mod cipher;
pub mod container;
mod error;
pub mod huffman;
pub mod vxor;

pub use crate::error::{Error, Result};
