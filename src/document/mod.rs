//! Block flow model: the immutable source document

mod block;
mod markup;

pub use block::{Block, BlockKind, MarkupFragment};
pub use markup::parse_blocks;

use std::ops::{Index, Range};

/// The full ordered sequence of blocks making up a document.
///
/// A block's identity is its zero-based index in the flow. The flow is
/// immutable once built; pagination only ever borrows slices of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flow {
    blocks: Vec<Block>,
}

impl Flow {
    /// Create a flow from already-classified blocks
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Parse source markup into a flow. Never fails.
    pub fn parse(raw: &str) -> Self {
        Self::new(parse_blocks(raw))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Borrow a contiguous run of blocks, clamped to the flow
    pub fn slice(&self, range: Range<usize>) -> &[Block] {
        let end = range.end.min(self.blocks.len());
        let start = range.start.min(end);
        &self.blocks[start..end]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }
}

impl Index<usize> for Flow {
    type Output = Block;

    fn index(&self, index: usize) -> &Block {
        &self.blocks[index]
    }
}

impl From<Vec<Block>> for Flow {
    fn from(blocks: Vec<Block>) -> Self {
        Self::new(blocks)
    }
}

impl FromIterator<Block> for Flow {
    fn from_iter<I: IntoIterator<Item = Block>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Flow {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
