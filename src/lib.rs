//! Mini-Book: block-flow pagination for reading views
//!
//! This crate splits a flow of headings and paragraphs into fixed-size pages:
//! - Paragraphs are split only at line boundaries and resumed on the next
//!   page through a carry offset
//! - Headings are never split; an overflowing heading moves to the next page
//! - Every page carries line statistics and its position in the document
//!
//! Measurement is pluggable through [`Measurer`]; [`TextMeasurer`] is a
//! deterministic reference implementation.

pub mod document;
pub mod error;
pub mod layout;
pub mod render;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmPager;

// Re-export primary types
pub use document::{Block, BlockKind, Flow, MarkupFragment};
pub use error::{PaginationError, Result};
pub use layout::{
    paginate, Measurer, PageGeometry, PagerConfig, Pagination, PaginationOptions, TextMeasurer,
};
pub use render::{InvariantViolation, PageDescriptor, PageStats, PageViolation};

use serde::{Deserialize, Serialize};

/// One rendered line, relative to the top of the first measured block
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl LineBox {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// The same box moved down by `dy`
    pub fn shifted(&self, dy: f64) -> Self {
        Self {
            top: self.top + dy,
            ..*self
        }
    }

    /// Too small to be a line of text
    pub fn is_noise(&self, min_size: f64) -> bool {
        self.width < min_size || self.height < min_size
    }

    /// Finite coordinates and a non-negative size
    pub fn is_well_formed(&self) -> bool {
        self.top.is_finite()
            && self.left.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// A flow, its measurer and the result of the last pagination pass
pub struct Pager<M: Measurer = TextMeasurer> {
    flow: Flow,
    measurer: M,
    config: PagerConfig,
    run: Option<Pagination>,
    layout_dirty: bool,
}

impl Pager<TextMeasurer> {
    /// Parse `markup` and paginate it with the reference measurer
    pub fn from_markup(markup: &str, config: PagerConfig) -> Self {
        Self::new(Flow::parse(markup), config, TextMeasurer::default())
    }
}

impl<M: Measurer> Pager<M> {
    pub fn new(flow: Flow, config: PagerConfig, measurer: M) -> Self {
        Self {
            flow,
            measurer,
            config,
            run: None,
            layout_dirty: true,
        }
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    /// Replace the geometry; pages are recomputed on the next update
    pub fn set_geometry(&mut self, geometry: PageGeometry) {
        if self.config.geometry != geometry {
            self.config.geometry = geometry;
            self.layout_dirty = true;
        }
    }

    /// Resize the page, keeping font size and padding
    pub fn set_page_size(&mut self, page_width: f64, page_height: f64) {
        self.set_geometry(PageGeometry {
            page_width,
            page_height,
            ..self.config.geometry
        });
    }

    pub fn set_font_size(&mut self, font_size: f64) {
        self.set_geometry(PageGeometry {
            font_size,
            ..self.config.geometry
        });
    }

    pub fn set_options(&mut self, options: PaginationOptions) {
        if self.config.options != options {
            self.config.options = options;
            self.layout_dirty = true;
        }
    }

    /// Repaginate if anything changed since the last pass.
    ///
    /// Returns whether a pass ran. A failed pass leaves the previous
    /// pages in place and the pager dirty.
    pub fn update_layout(&mut self) -> Result<bool> {
        if !self.layout_dirty {
            return Ok(false);
        }

        let run = paginate(&self.flow, &self.config, &self.measurer)?;
        self.run = Some(run);
        self.layout_dirty = false;

        Ok(true)
    }

    /// Pages of the last successful pass
    pub fn pages(&self) -> &[PageDescriptor] {
        self.run
            .as_ref()
            .map(|run| run.pages.as_slice())
            .unwrap_or_default()
    }

    pub fn page_count(&self) -> usize {
        self.pages().len()
    }

    pub fn last_run(&self) -> Option<&Pagination> {
        self.run.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.layout_dirty
    }
}
