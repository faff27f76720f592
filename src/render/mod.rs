//! Render-ready page descriptors and their diagnostics

mod diagnostics;
mod page;

pub use diagnostics::{check_page, InvariantViolation, PageViolation};
pub use page::{PageDescriptor, PageStats};
pub(crate) use page::{PageDraft, PagePosition};
