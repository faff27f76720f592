//! Page descriptors: the render-ready result of pagination

use crate::document::Block;
use crate::render::diagnostics::InvariantViolation;
use crate::LineBox;
use serde::Serialize;
use smallvec::SmallVec;

/// Derived, read-only statistics of one page
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStats {
    /// Lines the viewer could hold at the average line height
    pub total_lines: usize,
    /// Lines fully visible on the page
    pub good_lines: usize,
    /// Measured lines rejected because they do not fit fully
    pub bad_lines: usize,
    pub empty_lines: usize,
    /// Height of the visible region
    pub viewer_height: f64,
    /// Height of everything accumulated for the page, minus the carry
    pub content_height: f64,
    pub available_height: f64,
    /// Carry offset handed to the next page
    pub handoff_next_offset: f64,
    pub element_index_start: usize,
    pub element_index_end: usize,
    /// The last block is cut: part of it is shown here and the rest
    /// resumes on the next page at `handoff_next_offset`
    pub last_element_split: bool,
    /// Position of the page in the overall document flow
    pub global_start: f64,
    pub global_end: f64,
}

/// One finished page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    /// Page index (0-based)
    pub index: usize,
    /// Blocks rendered on the page; the last may be cut by the clip
    pub content: Vec<Block>,
    /// How far the first block is shifted up. Positive only when the page
    /// continues a block started on an earlier page.
    pub initial_offset: f64,
    /// Height the renderer clips the viewer to, for split pages
    pub clip_height: Option<f64>,
    /// Fully visible line boxes, relative to the shifted page origin
    pub lines: Vec<LineBox>,
    pub stats: PageStats,
    pub violations: SmallVec<[InvariantViolation; 2]>,
}

impl PageDescriptor {
    /// Markup of the page content
    pub fn html(&self) -> String {
        self.content.iter().map(Block::markup).collect()
    }

    /// The page was clipped at a line boundary
    pub fn is_split(&self) -> bool {
        self.clip_height.is_some()
    }

    /// The page resumes a block from the previous page
    pub fn is_continuation(&self) -> bool {
        self.initial_offset > 0.0
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Range of flow indices on the page, `None` for an empty page
    pub fn element_range(&self) -> Option<std::ops::RangeInclusive<usize>> {
        (!self.content.is_empty())
            .then(|| self.stats.element_index_start..=self.stats.element_index_end)
    }
}

/// What the engine decided for a page, before stats are derived
#[derive(Debug, Clone)]
pub(crate) struct PageDraft {
    pub content: Vec<Block>,
    pub lines: Vec<LineBox>,
    pub bad_lines: usize,
    /// Clip height when the page was split
    pub clip: Option<f64>,
    /// Accumulated height minus the carry
    pub displayed: f64,
    pub handoff: f64,
    pub last_element_split: bool,
}

/// Inputs of the stats builder that come from the pass, not the page
#[derive(Debug, Clone, Copy)]
pub(crate) struct PagePosition {
    pub index: usize,
    pub element_index: usize,
    pub carry_offset: f64,
    pub global_offset: f64,
    pub available_height: f64,
    pub average_line_height: f64,
}

impl PageDescriptor {
    pub(crate) fn build(draft: PageDraft, position: PagePosition) -> Self {
        let viewer_height = draft.clip.unwrap_or(draft.displayed);
        let good_lines = draft.lines.len();

        // The observed line count wins over the estimate
        let estimate = (viewer_height / position.average_line_height).floor();
        let total_lines = if estimate.is_finite() && estimate > 0.0 {
            (estimate as usize).max(good_lines)
        } else {
            good_lines
        };

        let stats = PageStats {
            total_lines,
            good_lines,
            bad_lines: draft.bad_lines,
            empty_lines: total_lines - good_lines,
            viewer_height,
            content_height: draft.displayed,
            available_height: position.available_height,
            handoff_next_offset: draft.handoff,
            element_index_start: position.element_index,
            element_index_end: position.element_index + draft.content.len().saturating_sub(1),
            last_element_split: draft.last_element_split,
            global_start: position.global_offset,
            global_end: position.global_offset + viewer_height,
        };

        Self {
            index: position.index,
            content: draft.content,
            initial_offset: position.carry_offset,
            clip_height: draft.clip,
            lines: draft.lines,
            stats,
            violations: SmallVec::new(),
        }
    }
}
