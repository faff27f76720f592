//! Reference measurement service built on the line breaker

use crate::document::{Block, BlockKind};
use crate::layout::font::FontMetrics;
use crate::layout::line_break::{LineBreaker, LineLayout};
use crate::layout::measure::Measurer;
use crate::LineBox;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Cached layouts are dropped wholesale past this many entries
const CACHE_LIMIT: usize = 4096;

/// Layout result for one block at a given width and font size
#[derive(Debug, Clone)]
pub struct BlockLayout {
    pub lines: Vec<LineLayout>,
    pub line_height: f64,
    /// Space below the last line
    pub spacing_after: f64,
}

impl BlockLayout {
    /// Total height including spacing
    pub fn total_height(&self) -> f64 {
        self.lines.len() as f64 * self.line_height + self.spacing_after
    }
}

/// Geometry a layout depends on besides the text itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct LayoutKey {
    kind: BlockKind,
    width_bits: u64,
    font_size_bits: u64,
}

/// Deterministic text measurer for hosts without a layout engine.
///
/// Blocks are stacked with no margin collapsing; headings are set at a
/// larger size and every block is followed by kind-dependent spacing.
/// Block layouts are memoized, so one measurer should be reused across
/// pagination passes. The cache makes it `!Sync`.
#[derive(Debug, Default)]
pub struct TextMeasurer {
    line_breaker: LineBreaker,
    /// Layouts per geometry, keyed by the full block text
    cache: RefCell<FxHashMap<LayoutKey, FxHashMap<String, Rc<BlockLayout>>>>,
}

impl TextMeasurer {
    pub fn new(metrics: FontMetrics) -> Self {
        Self {
            line_breaker: LineBreaker::new(metrics),
            cache: RefCell::default(),
        }
    }

    pub fn metrics(&self) -> &FontMetrics {
        self.line_breaker.metrics()
    }

    /// Layout a single block, reusing a cached result when possible
    pub fn layout_block(&self, block: &Block, width: f64, font_size: f64) -> Rc<BlockLayout> {
        let key = LayoutKey {
            kind: block.kind,
            width_bits: width.to_bits(),
            font_size_bits: font_size.to_bits(),
        };

        if let Some(layout) = self
            .cache
            .borrow()
            .get(&key)
            .and_then(|layouts| layouts.get(block.text()))
        {
            return Rc::clone(layout);
        }

        let block_font_size = font_size * block.kind.font_scale();
        let layout = Rc::new(BlockLayout {
            lines: self
                .line_breaker
                .break_lines(block.text(), width, block_font_size),
            line_height: self.metrics().line_height(block_font_size),
            spacing_after: block.kind.spacing_after() * font_size,
        });

        if self.cached_layouts() >= CACHE_LIMIT {
            self.cache.borrow_mut().clear();
        }
        self.cache
            .borrow_mut()
            .entry(key)
            .or_default()
            .insert(block.text().to_string(), Rc::clone(&layout));
        layout
    }

    /// Number of memoized block layouts
    pub fn cached_layouts(&self) -> usize {
        self.cache.borrow().values().map(|layouts| layouts.len()).sum()
    }
}

impl Measurer for TextMeasurer {
    fn measure_height(&self, blocks: &[Block], width: f64, font_size: f64) -> f64 {
        blocks
            .iter()
            .map(|block| self.layout_block(block, width, font_size).total_height())
            .sum()
    }

    fn line_boxes(&self, blocks: &[Block], width: f64, font_size: f64) -> Vec<LineBox> {
        let mut boxes = Vec::new();
        let mut y = 0.0;

        for block in blocks {
            let layout = self.layout_block(block, width, font_size);
            for line in &layout.lines {
                boxes.push(LineBox::new(y, 0.0, line.width, layout.line_height));
                y += layout.line_height;
            }
            y += layout.spacing_after;
        }

        boxes
    }

    fn average_line_height(&self, font_size: f64) -> f64 {
        let glyph = Block::paragraph("X");
        let layout = self.layout_block(&glyph, f64::MAX, font_size);
        layout.lines.len() as f64 * layout.line_height
    }
}
