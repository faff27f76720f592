//! Flat buffer protocol for handing page geometry to JS
//!
//! ## u32 Buffer Layout:
//! ```text
//! Header:
//! [0]     MAGIC (0x4D42504B = "MBPK" for validation)
//! [1]     SCHEMA_VERSION (currently 1)
//! [2]     page_count
//! [3..]   page data...
//!
//! Per-page: [page_index, element_index_start, element_index_end, flags, line_count]
//!   flags: bit0=split, bit1=continuation, bit2=last_element_split, bit3=empty
//! ```
//!
//! ## f64 Buffer Layout:
//! ```text
//! Per-page: [initial_offset, viewer_height, global_start]
//! Per-line: [top, left, width, height] (line_count times)
//! ```

use crate::render::PageDescriptor;

/// Magic number for format validation: "MBPK" (Mini-Book PacK)
pub const MAGIC: u32 = 0x4D42504B;

/// Schema version for protocol compatibility checking
pub const SCHEMA_VERSION: u32 = 1;

/// Header size in u32 elements
pub const HEADER_SIZE: usize = 3;

/// Flags bitmask
pub const FLAG_SPLIT: u32 = 0b0001;
pub const FLAG_CONTINUATION: u32 = 0b0010;
pub const FLAG_LAST_ELEMENT_SPLIT: u32 = 0b0100;
pub const FLAG_EMPTY: u32 = 0b1000;

/// Number of u32 values per page
pub const U32_PER_PAGE: usize = 5;

/// Number of f64 values per page, before its lines
pub const F64_PER_PAGE: usize = 3;

/// Number of f64 values per line
pub const F64_PER_LINE: usize = 4;

/// Page geometry packed into two flat arrays
#[derive(Debug, Clone, Default)]
pub struct PageBuffer {
    /// Integer data (header, indices, flags, counts)
    pub u32_data: Vec<u32>,
    /// Float data (offsets and line boxes)
    pub f64_data: Vec<f64>,
}

impl PageBuffer {
    /// Pack `pages`, sizing both buffers up front
    pub fn encode(pages: &[PageDescriptor]) -> Self {
        let line_count: usize = pages.iter().map(|p| p.lines.len()).sum();
        let mut buffer = Self {
            u32_data: Vec::with_capacity(HEADER_SIZE + pages.len() * U32_PER_PAGE),
            f64_data: Vec::with_capacity(pages.len() * F64_PER_PAGE + line_count * F64_PER_LINE),
        };

        buffer
            .u32_data
            .extend_from_slice(&[MAGIC, SCHEMA_VERSION, pages.len() as u32]);
        for page in pages {
            buffer.write_page(page);
        }
        buffer
    }

    fn write_page(&mut self, page: &PageDescriptor) {
        let stats = &page.stats;
        self.u32_data.extend_from_slice(&[
            page.index as u32,
            stats.element_index_start as u32,
            stats.element_index_end as u32,
            page_flags(page),
            page.lines.len() as u32,
        ]);

        self.f64_data.extend_from_slice(&[
            page.initial_offset,
            stats.viewer_height,
            stats.global_start,
        ]);
        for line in &page.lines {
            self.f64_data
                .extend_from_slice(&[line.top, line.left, line.width, line.height]);
        }
    }
}

fn page_flags(page: &PageDescriptor) -> u32 {
    let mut flags = 0;
    if page.is_split() {
        flags |= FLAG_SPLIT;
    }
    if page.is_continuation() {
        flags |= FLAG_CONTINUATION;
    }
    if page.stats.last_element_split {
        flags |= FLAG_LAST_ELEMENT_SPLIT;
    }
    if page.is_empty() {
        flags |= FLAG_EMPTY;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Flow};
    use crate::layout::{paginate, PageGeometry, PagerConfig};
    use crate::layout::TextMeasurer;

    #[test]
    fn test_empty_buffer() {
        let buffer = PageBuffer::encode(&[]);
        assert_eq!(buffer.u32_data, vec![MAGIC, SCHEMA_VERSION, 0]);
        assert!(buffer.f64_data.is_empty());
    }

    #[test]
    fn test_encode_split_pages() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(40);
        let flow = Flow::new(vec![Block::heading(1, "Title"), Block::paragraph(&text)]);
        let config = PagerConfig::new(PageGeometry::new(400.0, 360.0, 16.0));
        let pagination = paginate(&flow, &config, &TextMeasurer::default()).unwrap();
        assert!(pagination.page_count() >= 2);

        let buffer = PageBuffer::encode(&pagination.pages);
        assert_eq!(buffer.u32_data[2] as usize, pagination.page_count());

        let lines: usize = pagination.pages.iter().map(|p| p.lines.len()).sum();
        assert_eq!(
            buffer.u32_data.len(),
            HEADER_SIZE + pagination.page_count() * U32_PER_PAGE
        );
        assert_eq!(
            buffer.f64_data.len(),
            pagination.page_count() * F64_PER_PAGE + lines * F64_PER_LINE
        );

        // First page: split, not a continuation
        let flags = buffer.u32_data[HEADER_SIZE + 3];
        assert_ne!(flags & FLAG_SPLIT, 0);
        assert_eq!(flags & FLAG_CONTINUATION, 0);

        // Second page resumes the paragraph
        let second = HEADER_SIZE + U32_PER_PAGE;
        assert_eq!(buffer.u32_data[second + 1], 1);
        assert_ne!(buffer.u32_data[second + 3] & FLAG_CONTINUATION, 0);

        let first_lines = buffer.u32_data[HEADER_SIZE + 4] as usize;
        let second_page_f64 = F64_PER_PAGE + first_lines * F64_PER_LINE;
        assert_eq!(
            buffer.f64_data[second_page_f64],
            pagination.pages[1].initial_offset
        );
    }
}
