//! Line breaking algorithm

use crate::layout::font::FontMetrics;
use std::ops::Range;
use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_segmentation::UnicodeSegmentation;

/// Layout result for a single line
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    /// Byte range within the block text, trailing whitespace excluded
    pub byte_range: Range<usize>,
    /// Width of the visible content
    pub width: f64,
}

/// Last place the current line may be wrapped at
#[derive(Debug, Clone, Copy)]
struct WrapPoint {
    offset: usize,
    /// Line advance up to `offset`, trailing spaces included
    x: f64,
    /// Line advance up to the last visible grapheme before `offset`
    visible: f64,
}

/// Greedy first-fit line breaker
#[derive(Debug, Clone, Default)]
pub struct LineBreaker {
    metrics: FontMetrics,
}

impl LineBreaker {
    pub fn new(metrics: FontMetrics) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Break `text` into lines no wider than `max_width`.
    ///
    /// Lines wrap at UAX #14 opportunities; a word wider than the line is cut
    /// between grapheme clusters. Trailing whitespace hangs past the edge.
    pub fn break_lines(&self, text: &str, max_width: f64, font_size: f64) -> Vec<LineLayout> {
        let mut lines = Vec::new();
        let mut opportunities = linebreaks(text).peekable();

        let mut line_start: usize = 0;
        let mut x: f64 = 0.0;
        let mut visible: f64 = 0.0;
        let mut wrap_at: Option<WrapPoint> = None;

        for (byte_idx, grapheme) in text.grapheme_indices(true) {
            while let Some(&(pos, opportunity)) = opportunities.peek() {
                if pos > byte_idx {
                    break;
                }
                opportunities.next();
                if pos != byte_idx || pos == line_start {
                    continue;
                }
                match opportunity {
                    BreakOpportunity::Mandatory => {
                        lines.push(trimmed_line(text, line_start..byte_idx, visible));
                        line_start = byte_idx;
                        x = 0.0;
                        visible = 0.0;
                        wrap_at = None;
                    }
                    BreakOpportunity::Allowed => {
                        wrap_at = Some(WrapPoint {
                            offset: byte_idx,
                            x,
                            visible,
                        });
                    }
                }
            }

            let advance = self.metrics.grapheme_advance(grapheme, font_size);
            let is_space = grapheme.chars().all(char::is_whitespace);

            // Check for soft wrap
            if !is_space && x + advance > max_width && visible > 0.0 {
                match wrap_at.take() {
                    Some(point) => {
                        lines.push(trimmed_line(text, line_start..point.offset, point.visible));
                        line_start = point.offset;
                        x -= point.x;
                        visible = (visible - point.x).max(0.0);
                    }
                    None => {
                        // Emergency break inside an over-long word
                        lines.push(trimmed_line(text, line_start..byte_idx, visible));
                        line_start = byte_idx;
                        x = 0.0;
                        visible = 0.0;
                    }
                }
            }

            x += advance;
            if !is_space {
                visible = x;
            }
        }

        // Final line
        if line_start < text.len() {
            lines.push(trimmed_line(text, line_start..text.len(), visible));
        }

        lines
    }
}

fn trimmed_line(text: &str, range: Range<usize>, width: f64) -> LineLayout {
    let kept = text[range.clone()].trim_end().len();
    LineLayout {
        byte_range: range.start..range.start + kept,
        width,
    }
}
