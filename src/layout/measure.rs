//! Measurement service consumed by the pagination engine

use crate::document::Block;
use crate::LineBox;

/// Renders blocks at a fixed width and font size and reports geometry.
///
/// The engine treats every call as expensive and assumes results are
/// deterministic for fixed inputs and that height never shrinks when blocks
/// are appended.
pub trait Measurer {
    /// Height of `blocks` stacked vertically from zero. An empty slice is 0.
    fn measure_height(&self, blocks: &[Block], width: f64, font_size: f64) -> f64;

    /// Every wrapped line of `blocks`, in document order, relative to the
    /// top of the first block.
    fn line_boxes(&self, blocks: &[Block], width: f64, font_size: f64) -> Vec<LineBox>;

    /// Height of a single-glyph paragraph at `font_size`
    fn average_line_height(&self, font_size: f64) -> f64;
}

impl<M: Measurer + ?Sized> Measurer for &M {
    fn measure_height(&self, blocks: &[Block], width: f64, font_size: f64) -> f64 {
        (**self).measure_height(blocks, width, font_size)
    }

    fn line_boxes(&self, blocks: &[Block], width: f64, font_size: f64) -> Vec<LineBox> {
        (**self).line_boxes(blocks, width, font_size)
    }

    fn average_line_height(&self, font_size: f64) -> f64 {
        (**self).average_line_height(font_size)
    }
}

impl<M: Measurer + ?Sized> Measurer for Box<M> {
    fn measure_height(&self, blocks: &[Block], width: f64, font_size: f64) -> f64 {
        (**self).measure_height(blocks, width, font_size)
    }

    fn line_boxes(&self, blocks: &[Block], width: f64, font_size: f64) -> Vec<LineBox> {
        (**self).line_boxes(blocks, width, font_size)
    }

    fn average_line_height(&self, font_size: f64) -> f64 {
        (**self).average_line_height(font_size)
    }
}

/// Test double: every whitespace-separated word of a block is one line.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct ScriptedMeasurer {
    pub line_height: f64,
    pub heading_line_height: f64,
    /// Space after every block
    pub gap: f64,
}

#[cfg(test)]
impl ScriptedMeasurer {
    pub fn new(line_height: f64) -> Self {
        Self {
            line_height,
            heading_line_height: line_height,
            gap: 0.0,
        }
    }

    fn block_line_height(&self, block: &Block) -> f64 {
        if block.is_heading() {
            self.heading_line_height
        } else {
            self.line_height
        }
    }

    fn block_height(&self, block: &Block) -> f64 {
        block.text().split_whitespace().count() as f64 * self.block_line_height(block) + self.gap
    }
}

#[cfg(test)]
impl Measurer for ScriptedMeasurer {
    fn measure_height(&self, blocks: &[Block], _width: f64, _font_size: f64) -> f64 {
        blocks.iter().map(|b| self.block_height(b)).sum()
    }

    fn line_boxes(&self, blocks: &[Block], width: f64, _font_size: f64) -> Vec<LineBox> {
        let mut lines = Vec::new();
        let mut top = 0.0;
        for block in blocks {
            let height = self.block_line_height(block);
            for _ in block.text().split_whitespace() {
                lines.push(LineBox::new(top, 0.0, width, height));
                top += height;
            }
            top += self.gap;
        }
        lines
    }

    fn average_line_height(&self, _font_size: f64) -> f64 {
        self.line_height
    }
}

/// A paragraph (or heading) the scripted measurer lays out as `lines` lines
#[cfg(test)]
pub(crate) fn scripted_block(kind: crate::document::BlockKind, lines: usize) -> Block {
    let text = (0..lines).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
    Block::from_text(kind, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockKind;

    #[test]
    fn test_scripted_measurer() {
        let measurer = ScriptedMeasurer::new(20.0);
        let blocks = vec![
            scripted_block(BlockKind::Heading1, 1),
            scripted_block(BlockKind::Paragraph, 3),
        ];

        assert_eq!(measurer.measure_height(&blocks, 100.0, 16.0), 80.0);
        assert_eq!(measurer.measure_height(&[], 100.0, 16.0), 0.0);

        let lines = measurer.line_boxes(&blocks, 100.0, 16.0);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3].top, 60.0);
        assert_eq!(lines[3].bottom(), 80.0);
    }

    #[test]
    fn test_measurer_through_reference() {
        let measurer = ScriptedMeasurer::new(10.0);
        let boxed: Box<dyn Measurer> = Box::new(measurer.clone());

        assert_eq!((&measurer).average_line_height(12.0), 10.0);
        assert_eq!(boxed.average_line_height(12.0), 10.0);
    }
}
