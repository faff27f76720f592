//! Per-page pagination state machine
//!
//! Each step builds at most one page:
//!
//! ```text
//! FreshStart -> Accumulate -> NoSplit | Split -> Resolve -> Emit | Skip
//! ```
//!
//! Blocks are appended and remeasured until they overflow the available
//! height. An overflowing page is clipped at the bottom of its last fully
//! visible line. A splittable last block is resumed on the next page through
//! the carry offset; a heading is deferred whole.

use crate::document::{Block, Flow};
use crate::error::{PaginationError, Result};
use crate::layout::geometry::{PagerConfig, PaginationOptions};
use crate::layout::measure::Measurer;
use crate::render::{PageDescriptor, PageDraft, PagePosition};
use crate::LineBox;

/// Lines ending this close to the page origin were shown on an earlier page
const SHOWN_TOLERANCE: f64 = 1e-6;

/// Fallback line height factor when the measured line height is unusable
const FALLBACK_LINE_HEIGHT_EM: f64 = 1.5;

/// The only state threaded from one page to the next
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PaginationState {
    /// First block of the next page
    pub element_index: usize,
    /// Pixels of that block already shown on earlier pages
    pub carry_offset: f64,
    /// Viewer height of all pages emitted so far
    pub global_offset: f64,
}

impl PaginationState {
    /// State at the start of a full repagination
    pub fn fresh() -> Self {
        Self::default()
    }
}

/// Result of one engine step
#[derive(Debug, Clone)]
pub struct PageStep {
    pub next: PaginationState,
    /// `None` when the attempt was abandoned or the page came out empty
    pub page: Option<PageDescriptor>,
}

/// Builds pages one at a time over a borrowed flow
pub struct PageEngine<'a, M: Measurer + ?Sized> {
    flow: &'a Flow,
    measurer: &'a M,
    width: f64,
    font_size: f64,
    available: f64,
    options: PaginationOptions,
    average_line_height: f64,
}

impl<'a, M: Measurer + ?Sized> PageEngine<'a, M> {
    /// Create an engine; measures the average line height once
    pub fn new(flow: &'a Flow, measurer: &'a M, config: &PagerConfig) -> Self {
        let geometry = config.geometry;
        let sampled = measurer.average_line_height(geometry.font_size);
        let average_line_height = if sampled.is_finite() && sampled > 0.0 {
            sampled
        } else {
            log::debug!(
                "Average line height came back as {}; assuming {}em",
                sampled,
                FALLBACK_LINE_HEIGHT_EM
            );
            geometry.font_size * FALLBACK_LINE_HEIGHT_EM
        };

        Self {
            flow,
            measurer,
            width: geometry.content_width(),
            font_size: geometry.font_size,
            available: geometry.available_height(),
            options: config.options,
            average_line_height,
        }
    }

    pub fn average_line_height(&self) -> f64 {
        self.average_line_height
    }

    pub fn available_height(&self) -> f64 {
        self.available
    }

    /// Build the page starting at `state`.
    ///
    /// `pages_emitted` decides whether an empty page is still emitted: only
    /// the very first one is.
    pub fn step(&self, state: PaginationState, pages_emitted: usize) -> Result<PageStep> {
        let start = state.element_index;
        let carry = state.carry_offset;

        // Accumulate
        let (count, height) = self.accumulate(start, carry)?;
        let blocks = self.flow.slice(start..start + count);
        let displayed = height - carry;
        let lines = self.page_lines(blocks, start, carry)?;

        let resolved = if displayed <= self.available + self.options.epsilon {
            Some(self.no_split(blocks, lines, displayed))
        } else {
            self.split(blocks, start, carry, lines, displayed)?
        };

        let Some((mut draft, mut advance_by)) = resolved else {
            let skipped = count.max(1);
            log::warn!(
                "No line of blocks {}..{} fits on a page; skipping them",
                start,
                start + skipped
            );
            return Ok(PageStep {
                next: PaginationState {
                    element_index: start + skipped,
                    carry_offset: 0.0,
                    global_offset: state.global_offset,
                },
                page: None,
            });
        };

        if advance_by == 0 && draft.handoff <= carry {
            log::warn!(
                "Block {} cannot be placed on an empty page without splitting it; skipping it",
                start
            );
            advance_by = 1;
            draft.handoff = 0.0;
            draft.last_element_split = false;
        }

        let element_index = start + advance_by;
        if element_index >= self.flow.len() && draft.handoff > 0.0 {
            log::debug!("Dropping dangling carry {} at end of flow", draft.handoff);
            draft.handoff = 0.0;
        }
        let handoff = draft.handoff;

        let page = if draft.content.is_empty() && pages_emitted > 0 {
            log::debug!("Skipping empty page at block {}", start);
            None
        } else {
            Some(PageDescriptor::build(
                draft,
                PagePosition {
                    index: pages_emitted,
                    element_index: start,
                    carry_offset: carry,
                    global_offset: state.global_offset,
                    available_height: self.available,
                    average_line_height: self.average_line_height,
                },
            ))
        };

        if let Some(page) = &page {
            log::debug!(
                "Page {}: blocks {}..={}, offset {}, viewer {}, handoff {}",
                page.index,
                page.stats.element_index_start,
                page.stats.element_index_end,
                page.initial_offset,
                page.stats.viewer_height,
                handoff
            );
        }

        let viewer_height = page.as_ref().map_or(0.0, |p| p.stats.viewer_height);
        Ok(PageStep {
            next: PaginationState {
                element_index,
                carry_offset: handoff,
                global_offset: state.global_offset + viewer_height,
            },
            page,
        })
    }

    /// Append blocks from `start` until the page overflows or the flow ends.
    /// Returns the number of blocks appended and their unshifted height.
    fn accumulate(&self, start: usize, carry: f64) -> Result<(usize, f64)> {
        let remaining = self.flow.len().saturating_sub(start);
        let mut count = 0;
        let mut height = 0.0;

        while count < remaining {
            count += 1;
            height = self.measure(self.flow.slice(start..start + count), start)?;
            if self.overflows(height - carry, carry) {
                break;
            }
        }

        Ok((count, height))
    }

    fn overflows(&self, displayed: f64, carry: f64) -> bool {
        if carry > 0.0 {
            displayed > self.available + self.options.epsilon
        } else {
            displayed > self.available
        }
    }

    fn measure(&self, blocks: &[Block], start: usize) -> Result<f64> {
        if blocks.is_empty() {
            return Ok(0.0);
        }
        let height = self
            .measurer
            .measure_height(blocks, self.width, self.font_size);
        if height.is_finite() && height >= 0.0 {
            Ok(height)
        } else {
            Err(PaginationError::unmeasurable(
                start + blocks.len() - 1,
                format!("measured height {height}"),
            ))
        }
    }

    /// Measured lines in page coordinates, without noise and without lines
    /// already shown on earlier pages
    fn page_lines(&self, blocks: &[Block], start: usize, carry: f64) -> Result<Vec<LineBox>> {
        let measured = self
            .measurer
            .line_boxes(blocks, self.width, self.font_size);
        let mut lines = Vec::with_capacity(measured.len());

        for line in measured {
            if !line.is_well_formed() {
                return Err(PaginationError::unmeasurable(
                    start,
                    format!("line box {line:?}"),
                ));
            }
            if line.is_noise(self.options.min_line_box) {
                continue;
            }
            let line = line.shifted(-carry);
            if line.bottom() > SHOWN_TOLERANCE {
                lines.push(line);
            }
        }

        Ok(lines)
    }

    /// A good line lies fully inside `[0, available]`
    fn fits(&self, line: &LineBox) -> bool {
        let epsilon = self.options.epsilon;
        line.top >= -epsilon && line.bottom() <= self.available + epsilon
    }

    fn no_split(&self, blocks: &[Block], lines: Vec<LineBox>, displayed: f64) -> (PageDraft, usize) {
        let total = lines.len();
        let good: Vec<LineBox> = lines.into_iter().filter(|l| self.fits(l)).collect();

        let draft = PageDraft {
            content: blocks.to_vec(),
            bad_lines: total - good.len(),
            lines: good,
            clip: None,
            displayed,
            handoff: 0.0,
            last_element_split: false,
        };
        (draft, blocks.len())
    }

    /// Clip an overflowing page at a line boundary. `None` means no line fits.
    fn split(
        &self,
        blocks: &[Block],
        start: usize,
        carry: f64,
        lines: Vec<LineBox>,
        displayed: f64,
    ) -> Result<Option<(PageDraft, usize)>> {
        let epsilon = self.options.epsilon;
        let mut good: Vec<LineBox> = lines.iter().copied().filter(|l| self.fits(l)).collect();
        let (Some(last_good), Some((last, preceding))) = (good.last(), blocks.split_last()) else {
            return Ok(None);
        };
        let clip = last_good.bottom();
        let count = blocks.len();

        // Top edge of the last block, in page coordinates
        let last_top = self.measure(preceding, start)? - carry;

        if last.kind.is_splittable() {
            // Only trailing spacing may overflow; then the block is complete
            let resumes = lines.iter().any(|l| l.bottom() > clip + epsilon);
            let (handoff, advance_by) = if resumes {
                ((clip - last_top).max(0.0), count - 1)
            } else {
                (0.0, count)
            };

            let draft = PageDraft {
                content: blocks.to_vec(),
                bad_lines: lines.len() - good.len(),
                lines: good,
                clip: Some(clip),
                displayed,
                handoff,
                // A block starting at the clip moves whole
                last_element_split: resumes && handoff > 0.0,
            };
            return Ok(Some((draft, advance_by)));
        }

        // Headings are deferred whole
        good.retain(|l| l.bottom() <= last_top + epsilon);
        let clip = good.last().map_or(0.0, LineBox::bottom);
        let before_heading = lines
            .iter()
            .filter(|l| l.bottom() <= last_top + epsilon)
            .count();

        let draft = PageDraft {
            content: preceding.to_vec(),
            bad_lines: before_heading.saturating_sub(good.len()),
            lines: good,
            clip: Some(clip),
            displayed,
            handoff: 0.0,
            last_element_split: false,
        };
        Ok(Some((draft, count - 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockKind;
    use crate::layout::geometry::PageGeometry;
    use crate::layout::measure::{scripted_block, ScriptedMeasurer};

    fn config(available: f64) -> PagerConfig {
        PagerConfig::new(PageGeometry::unpadded(400.0, available, 16.0))
    }

    fn para(lines: usize) -> Block {
        scripted_block(BlockKind::Paragraph, lines)
    }

    fn heading(lines: usize) -> Block {
        scripted_block(BlockKind::Heading2, lines)
    }

    #[test]
    fn test_page_that_fits() {
        let flow = Flow::new(vec![para(5), para(3)]);
        let measurer = ScriptedMeasurer::new(20.0);
        let engine = PageEngine::new(&flow, &measurer, &config(300.0));

        let step = engine.step(PaginationState::fresh(), 0).unwrap();
        let page = step.page.unwrap();

        assert_eq!(page.content.len(), 2);
        assert!(!page.is_split());
        assert_eq!(page.lines.len(), 8);
        assert_eq!(page.stats.viewer_height, 160.0);
        assert_eq!(step.next.element_index, 2);
        assert_eq!(step.next.carry_offset, 0.0);
        assert_eq!(step.next.global_offset, 160.0);
    }

    #[test]
    fn test_split_paragraph_carries_offset() {
        let flow = Flow::new(vec![para(25)]);
        let measurer = ScriptedMeasurer::new(20.0);
        let engine = PageEngine::new(&flow, &measurer, &config(300.0));

        let first = engine.step(PaginationState::fresh(), 0).unwrap();
        let page = first.page.unwrap();
        assert_eq!(page.clip_height, Some(300.0));
        assert_eq!(page.lines.len(), 15);
        assert_eq!(page.stats.bad_lines, 10);
        assert!(page.stats.last_element_split);
        assert_eq!(first.next.element_index, 0);
        assert_eq!(first.next.carry_offset, 300.0);

        let second = engine.step(first.next, 1).unwrap();
        let page = second.page.unwrap();
        assert_eq!(page.initial_offset, 300.0);
        assert_eq!(page.lines.len(), 10);
        assert_eq!(page.lines[0].top, 0.0);
        assert_eq!(page.stats.bad_lines, 0);
        assert_eq!(second.next.element_index, 1);
        assert_eq!(second.next.carry_offset, 0.0);
    }

    #[test]
    fn test_carry_accumulates_across_pages() {
        let flow = Flow::new(vec![para(40)]);
        let measurer = ScriptedMeasurer::new(20.0);
        let engine = PageEngine::new(&flow, &measurer, &config(300.0));

        let first = engine.step(PaginationState::fresh(), 0).unwrap();
        let second = engine.step(first.next, 1).unwrap();

        assert_eq!(second.next.element_index, 0);
        assert_eq!(second.next.carry_offset, 600.0);
        assert_eq!(second.page.unwrap().stats.handoff_next_offset, 600.0);
    }

    #[test]
    fn test_handoff_relative_to_last_block() {
        // 10 lines, then a 20-line paragraph cut after its 5th line
        let flow = Flow::new(vec![para(10), para(20)]);
        let measurer = ScriptedMeasurer::new(20.0);
        let engine = PageEngine::new(&flow, &measurer, &config(300.0));

        let step = engine.step(PaginationState::fresh(), 0).unwrap();
        assert_eq!(step.next.element_index, 1);
        assert_eq!(step.next.carry_offset, 100.0);

        let page = step.page.unwrap();
        assert_eq!(page.stats.element_index_start, 0);
        assert_eq!(page.stats.element_index_end, 1);
    }

    #[test]
    fn test_heading_is_deferred_whole() {
        let flow = Flow::new(vec![para(14), heading(2), para(3)]);
        let measurer = ScriptedMeasurer::new(20.0);
        let engine = PageEngine::new(&flow, &measurer, &config(300.0));

        let step = engine.step(PaginationState::fresh(), 0).unwrap();
        let page = step.page.unwrap();

        assert_eq!(page.content.len(), 1);
        assert!(page.content.iter().all(|b| !b.is_heading()));
        assert_eq!(page.clip_height, Some(280.0));
        assert_eq!(page.lines.len(), 14);
        assert!(!page.stats.last_element_split);
        assert_eq!(step.next.element_index, 1);
        assert_eq!(step.next.carry_offset, 0.0);
    }

    #[test]
    fn test_trailing_spacing_does_not_split() {
        let flow = Flow::new(vec![para(14), para(2)]);
        let measurer = ScriptedMeasurer {
            gap: 30.0,
            ..ScriptedMeasurer::new(20.0)
        };
        let engine = PageEngine::new(&flow, &measurer, &config(300.0));

        let step = engine.step(PaginationState::fresh(), 0).unwrap();
        let page = step.page.unwrap();

        assert_eq!(page.content.len(), 1);
        assert_eq!(page.clip_height, Some(280.0));
        assert!(!page.stats.last_element_split);
        assert_eq!(step.next.element_index, 1);
        assert_eq!(step.next.carry_offset, 0.0);
    }

    #[test]
    fn test_last_block_carried_whole() {
        // The second paragraph starts exactly at the clip
        let flow = Flow::new(vec![para(15), para(5)]);
        let measurer = ScriptedMeasurer::new(20.0);
        let engine = PageEngine::new(&flow, &measurer, &config(300.0));

        let step = engine.step(PaginationState::fresh(), 0).unwrap();
        let page = step.page.unwrap();

        assert_eq!(page.clip_height, Some(300.0));
        assert_eq!(page.content.len(), 2);
        assert_eq!(page.stats.handoff_next_offset, 0.0);
        assert!(!page.stats.last_element_split);
        assert_eq!(step.next.element_index, 1);
        assert_eq!(step.next.carry_offset, 0.0);

        let next = engine.step(step.next, 1).unwrap().page.unwrap();
        assert_eq!(next.stats.element_index_start, 1);
        assert_eq!(next.initial_offset, 0.0);
        assert!(!next.is_continuation());
    }

    #[test]
    fn test_starved_page_is_abandoned() {
        let flow = Flow::new(vec![para(1), para(1)]);
        let measurer = ScriptedMeasurer::new(400.0);
        let engine = PageEngine::new(&flow, &measurer, &config(300.0));

        let step = engine.step(PaginationState::fresh(), 0).unwrap();

        assert!(step.page.is_none());
        assert_eq!(step.next.element_index, 1);
        assert_eq!(step.next.global_offset, 0.0);
    }

    #[test]
    fn test_oversized_heading_is_skipped() {
        // 20 heading lines do not fit into 300px
        let flow = Flow::new(vec![heading(20), para(2)]);
        let measurer = ScriptedMeasurer::new(20.0);
        let engine = PageEngine::new(&flow, &measurer, &config(300.0));

        // The first page is emitted even though it came out empty
        let first = engine.step(PaginationState::fresh(), 0).unwrap();
        let page = first.page.unwrap();
        assert!(page.is_empty());
        assert_eq!(page.stats.viewer_height, 0.0);
        assert_eq!(first.next.element_index, 1);
        assert_eq!(first.next.carry_offset, 0.0);

        // Later empty pages are not
        let flow = Flow::new(vec![para(2), heading(20), para(2)]);
        let engine = PageEngine::new(&flow, &measurer, &config(300.0));
        let state = PaginationState {
            element_index: 1,
            ..PaginationState::default()
        };
        let step = engine.step(state, 1).unwrap();
        assert!(step.page.is_none());
        assert_eq!(step.next.element_index, 2);
    }

    struct BrokenMeasurer;

    impl Measurer for BrokenMeasurer {
        fn measure_height(&self, _: &[Block], _: f64, _: f64) -> f64 {
            f64::NAN
        }

        fn line_boxes(&self, _: &[Block], _: f64, _: f64) -> Vec<LineBox> {
            Vec::new()
        }

        fn average_line_height(&self, _: f64) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_unmeasurable_content() {
        let flow = Flow::new(vec![para(1)]);
        let engine = PageEngine::new(&flow, &BrokenMeasurer, &config(300.0));

        // The line height fell back to 1.5em
        assert_eq!(engine.average_line_height(), 24.0);

        let err = engine.step(PaginationState::fresh(), 0).unwrap_err();
        assert!(matches!(err, PaginationError::Unmeasurable { index: 0, .. }));
    }

    #[test]
    fn test_noise_lines_are_ignored() {
        struct NoisyMeasurer;

        impl Measurer for NoisyMeasurer {
            fn measure_height(&self, blocks: &[Block], _: f64, _: f64) -> f64 {
                blocks.len() as f64 * 20.0
            }

            fn line_boxes(&self, blocks: &[Block], _: f64, _: f64) -> Vec<LineBox> {
                (0..blocks.len())
                    .flat_map(|i| {
                        let top = i as f64 * 20.0;
                        [
                            LineBox::new(top, 0.0, 100.0, 20.0),
                            LineBox::new(top, 0.0, 0.5, 20.0),
                        ]
                    })
                    .collect()
            }

            fn average_line_height(&self, _: f64) -> f64 {
                20.0
            }
        }

        let flow = Flow::new(vec![para(1), para(1)]);
        let engine = PageEngine::new(&flow, &NoisyMeasurer, &config(300.0));
        let page = engine.step(PaginationState::fresh(), 0).unwrap().page.unwrap();

        assert_eq!(page.lines.len(), 2);
        assert_eq!(page.stats.bad_lines, 0);
    }
}
