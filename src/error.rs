//! Error types for pagination

use thiserror::Error;

/// Faults that stop a pagination run.
///
/// Degenerate but finite geometry is not an error: it yields an empty page
/// sequence. Starvation and invariant violations are handled inside the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaginationError {
    /// A geometry input was NaN or infinite
    #[error("invalid geometry: {field} = {value}")]
    InvalidGeometry { field: &'static str, value: f64 },

    /// The measurer returned a height or line box the engine cannot work with
    #[error("unmeasurable content at block {index}: {detail}")]
    Unmeasurable { index: usize, detail: String },
}

impl PaginationError {
    pub(crate) fn unmeasurable(index: usize, detail: impl Into<String>) -> Self {
        Self::Unmeasurable {
            index,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PaginationError>;
