////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! The prefix-code tree itself: construction from byte frequencies, the
//! serialized header form, and code lookup.
//!
//! Nodes live in an arena and address each other by index, so the root-to-leaf
//! walks need no reference graph. The construction tie-break is load-bearing:
//! compressed output must match the original encoder byte for byte, and that
//! encoder resolved equal frequencies through node creation order.

use std::io::{Read, Write};

use crate::bitio::{BitReader, BitWriter};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Leaf(u8),
    Internal { left: usize, right: usize },
}

#[derive(Debug, Clone, Copy)]
struct Node {
    /// Occurrence count; only meaningful while the tree is being built.
    frequency: usize,
    /// Creation-order id, the tie-break for equal frequencies.
    id: usize,
    kind: NodeKind,
}

/// A full binary prefix-code tree over byte values.
///
/// Built once per compressed unit, either from the bytes being compressed or
/// by deserializing the header the encoder wrote, and immutable afterward.
/// Every payload value appears in at most one leaf; code lookup is O(1)
/// through a per-value path table built at construction time.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: usize,
    paths: Vec<Option<Vec<u8>>>,
}

impl HuffmanTree {
    /// Builds the tree for a buffer about to be compressed.
    ///
    /// Leaves are created in ascending byte-value order for every value that
    /// occurs, then the two smallest candidates are merged repeatedly. Ties on
    /// frequency treat the earlier-created node as the larger element, so
    /// newer nodes merge first; the first node extracted becomes the left
    /// child. An input with a single distinct value gets a phantom
    /// zero-frequency sibling leaf (payload `value ^ 0xFF`) so the tree stays
    /// full.
    ///
    /// # Errors
    /// - [Error::EmptyInput]: `input` contains no bytes
    pub fn build(input: &[u8]) -> Result<Self> {
        if input.is_empty() {
            return Err(Error::EmptyInput);
        }
        let mut frequencies = [0_usize; 256];
        for &byte in input {
            frequencies[byte as usize] += 1;
        }

        let mut nodes: Vec<Node> = Vec::new();
        for (value, &frequency) in frequencies.iter().enumerate() {
            if frequency > 0 {
                nodes.push(Node {
                    frequency,
                    id: nodes.len(),
                    kind: NodeKind::Leaf(value as u8),
                });
            }
        }

        if nodes.len() == 1 {
            let NodeKind::Leaf(value) = nodes[0].kind else {
                unreachable!()
            };
            nodes.push(Node {
                frequency: 0,
                id: 1,
                kind: NodeKind::Leaf(value ^ 0xFF),
            });
        }

        let mut candidates: Vec<usize> = (0..nodes.len()).collect();
        while candidates.len() > 1 {
            let left = extract_min(&mut candidates, &nodes);
            let right = extract_min(&mut candidates, &nodes);
            let merged = Node {
                frequency: nodes[left].frequency + nodes[right].frequency,
                id: nodes.len(),
                kind: NodeKind::Internal { left, right },
            };
            candidates.push(nodes.len());
            nodes.push(merged);
        }

        let root = candidates[0];
        let paths = index_paths(&nodes, root);
        Ok(Self { nodes, root, paths })
    }

    /// Deserializes a tree header from a bit source.
    ///
    /// A `0` bit introduces an internal node: left subtree, one discarded
    /// separator bit, right subtree. A `1` bit introduces a leaf followed by
    /// its 8 payload bits.
    ///
    /// # Errors
    /// - [Error::UnexpectedEndOfStream]: the source ended mid-tree
    /// - [Error::Io]: generic IO error while reading
    pub fn read<R: Read>(reader: &mut BitReader<R>) -> Result<Self> {
        let mut nodes = Vec::new();
        let root = read_node(reader, &mut nodes)?;
        let paths = index_paths(&nodes, root);
        Ok(Self { nodes, root, paths })
    }

    /// Serializes the tree header into a bit sink, mirroring [read].
    ///
    /// [read]: HuffmanTree::read
    ///
    /// # Errors
    /// - [Error::Io]: generic IO error while writing
    pub fn write<W: Write>(&self, writer: &mut BitWriter<W>) -> Result<()> {
        self.write_node(self.root, writer)
    }

    fn write_node<W: Write>(&self, index: usize, writer: &mut BitWriter<W>) -> Result<()> {
        match self.nodes[index].kind {
            NodeKind::Leaf(value) => {
                writer.write_bit(1)?;
                writer.write_byte(value)?;
            }
            NodeKind::Internal { left, right } => {
                writer.write_bit(0)?;
                self.write_node(left, writer)?;
                // Separator bit; the value is discarded on read but the
                // original decoder consumes it, so it must be present.
                writer.write_bit(0)?;
                self.write_node(right, writer)?;
            }
        }
        Ok(())
    }

    /// The root-to-leaf bit path for a byte value, if it has a leaf.
    #[must_use]
    pub fn path(&self, value: u8) -> Option<&[u8]> {
        self.paths[value as usize].as_deref()
    }

    /// Emits the code for one byte value.
    ///
    /// # Errors
    /// - [Error::SymbolNotInTree]: `value` has no leaf; the alphabet was fixed
    ///   when the tree was built, so this is a caller bug
    /// - [Error::Io]: generic IO error while writing
    pub fn encode_byte<W: Write>(&self, value: u8, writer: &mut BitWriter<W>) -> Result<()> {
        let path = self.path(value).ok_or(Error::SymbolNotInTree(value))?;
        for &bit in path {
            writer.write_bit(bit)?;
        }
        Ok(())
    }

    /// Walks the tree from the root, one bit per level, until a leaf.
    ///
    /// # Errors
    /// - [Error::UnexpectedEndOfStream]: the source ended mid-path
    /// - [Error::Io]: generic IO error while reading
    pub fn decode_byte<R: Read>(&self, reader: &mut BitReader<R>) -> Result<u8> {
        let mut index = self.root;
        loop {
            match self.nodes[index].kind {
                NodeKind::Leaf(value) => return Ok(value),
                NodeKind::Internal { left, right } => {
                    index = if reader.read_bit()? == 0 { left } else { right };
                }
            }
        }
    }
}

// Smallest under (frequency ascending, id descending): between equal
// frequencies the earlier-created node is the larger element.
fn is_smaller(a: &Node, b: &Node) -> bool {
    a.frequency < b.frequency || (a.frequency == b.frequency && a.id > b.id)
}

fn extract_min(candidates: &mut Vec<usize>, nodes: &[Node]) -> usize {
    let mut best = 0;
    for i in 1..candidates.len() {
        if is_smaller(&nodes[candidates[i]], &nodes[candidates[best]]) {
            best = i;
        }
    }
    candidates.swap_remove(best)
}

fn read_node<R: Read>(reader: &mut BitReader<R>, nodes: &mut Vec<Node>) -> Result<usize> {
    if reader.read_bit()? == 1 {
        let value = reader.read_byte()?;
        nodes.push(Node {
            frequency: 0,
            id: nodes.len(),
            kind: NodeKind::Leaf(value),
        });
    } else {
        let left = read_node(reader, nodes)?;
        reader.read_bit()?;
        let right = read_node(reader, nodes)?;
        nodes.push(Node {
            frequency: 0,
            id: nodes.len(),
            kind: NodeKind::Internal { left, right },
        });
    }
    Ok(nodes.len() - 1)
}

fn index_paths(nodes: &[Node], root: usize) -> Vec<Option<Vec<u8>>> {
    let mut paths = vec![None; 256];
    let mut stack = vec![(root, Vec::new())];
    while let Some((index, path)) = stack.pop() {
        match nodes[index].kind {
            NodeKind::Leaf(value) => {
                paths[value as usize] = Some(path);
            }
            NodeKind::Internal { left, right } => {
                let mut left_path = path.clone();
                left_path.push(0);
                stack.push((left, left_path));
                let mut right_path = path;
                right_path.push(1);
                stack.push((right, right_path));
            }
        }
    }
    paths
}
