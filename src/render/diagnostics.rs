//! Post-construction invariant checks on page descriptors

use crate::render::page::PageDescriptor;
use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;

/// A page whose numbers disagree with each other.
///
/// Violations never abort a run: the page is still emitted so callers can
/// inspect it, and the run is marked degraded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InvariantViolation {
    #[error("split page shows {viewer}px of only {content}px of content")]
    ViewerNotBelowContent { viewer: f64, content: f64 },

    #[error("viewer height {viewer}px exceeds available height {available}px")]
    ViewerExceedsAvailable { viewer: f64, available: f64 },

    #[error("{good} good lines but only {total} total lines")]
    GoodLinesExceedTotal { good: usize, total: usize },

    #[error("negative initial offset {offset}px")]
    NegativeOffset { offset: f64 },
}

/// A violation together with the page it was found on
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViolation {
    pub page_index: usize,
    pub violation: InvariantViolation,
}

/// Check one page against the descriptor invariants
pub fn check_page(page: &PageDescriptor, epsilon: f64) -> SmallVec<[InvariantViolation; 2]> {
    let stats = &page.stats;
    let mut violations = SmallVec::new();

    if page.is_split() && stats.viewer_height >= stats.content_height {
        violations.push(InvariantViolation::ViewerNotBelowContent {
            viewer: stats.viewer_height,
            content: stats.content_height,
        });
    }
    if stats.viewer_height > stats.available_height + epsilon {
        violations.push(InvariantViolation::ViewerExceedsAvailable {
            viewer: stats.viewer_height,
            available: stats.available_height,
        });
    }
    if stats.good_lines > stats.total_lines {
        violations.push(InvariantViolation::GoodLinesExceedTotal {
            good: stats.good_lines,
            total: stats.total_lines,
        });
    }
    if page.initial_offset < 0.0 {
        violations.push(InvariantViolation::NegativeOffset {
            offset: page.initial_offset,
        });
    }

    violations
}
