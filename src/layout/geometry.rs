//! Page geometry and pagination options

use crate::error::{PaginationError, Result};
use serde::{Deserialize, Serialize};

/// Default vertical padding (2rem at 16px)
pub const PADDING_Y: f64 = 32.0;

/// Default horizontal padding (2.5rem at 16px)
pub const PADDING_X: f64 = 40.0;

/// Slack allowed for sub-pixel and font-metric jitter
pub const EPSILON: f64 = 1.0;

/// Line boxes narrower or shorter than this are measurement noise
pub const MIN_LINE_BOX: f64 = 1.0;

/// Page geometry; everything in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub font_size: f64,
    pub padding_x: f64,
    pub padding_y: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width: 500.0,
            page_height: 440.0,
            font_size: 19.0,
            padding_x: PADDING_X,
            padding_y: PADDING_Y,
        }
    }
}

impl PageGeometry {
    /// Geometry with the default padding
    pub fn new(page_width: f64, page_height: f64, font_size: f64) -> Self {
        Self {
            page_width,
            page_height,
            font_size,
            ..Self::default()
        }
    }

    /// Geometry whose content box is exactly `width` x `height`
    pub fn unpadded(width: f64, height: f64, font_size: f64) -> Self {
        Self {
            page_width: width,
            page_height: height,
            font_size,
            padding_x: 0.0,
            padding_y: 0.0,
        }
    }

    /// Get usable content width
    pub fn content_width(&self) -> f64 {
        self.page_width - self.padding_x * 2.0
    }

    /// Get usable content height per page
    pub fn available_height(&self) -> f64 {
        self.page_height - self.padding_y * 2.0
    }

    /// Reject NaN and infinite inputs
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("font_size", self.font_size),
            ("padding_x", self.padding_x),
            ("padding_y", self.padding_y),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(PaginationError::InvalidGeometry { field, value });
            }
        }
        Ok(())
    }

    /// True when nothing can be laid out (non-positive content box or font)
    pub fn is_degenerate(&self) -> bool {
        self.available_height() <= 0.0 || self.content_width() <= 0.0 || self.font_size <= 0.0
    }
}

/// Tunables of the pagination pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationOptions {
    pub epsilon: f64,
    pub min_line_box: f64,
    /// Run the post-construction invariant checks on every page
    pub check_invariants: bool,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            epsilon: EPSILON,
            min_line_box: MIN_LINE_BOX,
            check_invariants: true,
        }
    }
}

/// Everything a pagination pass needs besides the flow and the measurer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PagerConfig {
    pub geometry: PageGeometry,
    pub options: PaginationOptions,
}

impl PagerConfig {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            options: PaginationOptions::default(),
        }
    }
}

impl From<PageGeometry> for PagerConfig {
    fn from(geometry: PageGeometry) -> Self {
        Self::new(geometry)
    }
}
