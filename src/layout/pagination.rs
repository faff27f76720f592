//! Full pagination pass over a flow

use crate::document::Flow;
use crate::error::Result;
use crate::layout::engine::{PageEngine, PaginationState};
use crate::layout::geometry::PagerConfig;
use crate::layout::measure::Measurer;
use crate::render::{check_page, PageDescriptor, PageViolation};
use serde::Serialize;

/// Result of one pagination pass
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub pages: Vec<PageDescriptor>,
    /// Invariant violations found on any page
    pub violations: Vec<PageViolation>,
    pub average_line_height: f64,
}

impl Pagination {
    /// No pages, for empty flows and degenerate geometry
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The run produced pages that failed the invariant checks
    pub fn is_degraded(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn page(&self, index: usize) -> Option<&PageDescriptor> {
        self.pages.get(index)
    }

    /// Height of all pages in the document flow
    pub fn total_height(&self) -> f64 {
        self.pages.last().map_or(0.0, |p| p.stats.global_end)
    }
}

/// Paginate a whole flow from a fresh state.
///
/// Non-finite geometry is an error; a non-positive content box or font size
/// yields no pages. The pass is deterministic for a deterministic measurer.
pub fn paginate<M: Measurer + ?Sized>(
    flow: &Flow,
    config: &PagerConfig,
    measurer: &M,
) -> Result<Pagination> {
    let geometry = config.geometry;
    geometry.validate()?;

    if geometry.is_degenerate() {
        log::warn!(
            "Nothing fits a {}x{} content box at font size {}",
            geometry.content_width(),
            geometry.available_height(),
            geometry.font_size
        );
        return Ok(Pagination::empty());
    }
    if flow.is_empty() {
        return Ok(Pagination::empty());
    }

    let engine = PageEngine::new(flow, measurer, config);
    let mut state = PaginationState::fresh();
    let mut pages: Vec<PageDescriptor> = Vec::new();
    let mut violations = Vec::new();

    while state.element_index < flow.len() {
        let step = engine.step(state, pages.len())?;
        state = step.next;

        let Some(mut page) = step.page else {
            continue;
        };

        if config.options.check_invariants {
            page.violations = check_page(&page, config.options.epsilon);
            for violation in &page.violations {
                log::warn!("Page {}: {}", page.index, violation);
                violations.push(PageViolation {
                    page_index: page.index,
                    violation: *violation,
                });
            }
        }
        pages.push(page);
    }

    log::debug!(
        "Paginated {} blocks into {} pages ({} violations)",
        flow.len(),
        pages.len(),
        violations.len()
    );

    Ok(Pagination {
        pages,
        violations,
        average_line_height: engine.average_line_height(),
    })
}
