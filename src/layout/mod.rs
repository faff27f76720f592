//! Measurement and pagination

mod engine;
pub mod font;
pub mod geometry;
mod line_break;
mod measure;
mod pagination;
mod text_measurer;

pub use engine::{PageEngine, PageStep, PaginationState};
pub use font::FontMetrics;
pub use geometry::{PageGeometry, PagerConfig, PaginationOptions, EPSILON, MIN_LINE_BOX};
pub use line_break::{LineBreaker, LineLayout};
pub use measure::Measurer;
pub use pagination::{paginate, Pagination};
pub use text_measurer::{BlockLayout, TextMeasurer};
