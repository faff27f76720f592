//! WASM bindings for the pager

mod flat_buffer;

pub use flat_buffer::PageBuffer;

use crate::layout::{PageGeometry, PagerConfig};
use crate::Pager;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WASM-exposed pager wrapper
#[wasm_bindgen]
pub struct WasmPager {
    pager: Pager,
}

#[wasm_bindgen]
impl WasmPager {
    /// Paginate `markup` with the default geometry (500x440, 19px)
    #[wasm_bindgen(constructor)]
    pub fn new(markup: &str) -> Result<WasmPager, JsError> {
        let mut pager = Pager::from_markup(markup, PagerConfig::default());
        pager.update_layout()?;
        Ok(Self { pager })
    }

    /// Paginate `markup` on pages of the given size
    #[wasm_bindgen(js_name = withGeometry)]
    pub fn with_geometry(
        markup: &str,
        page_width: f64,
        page_height: f64,
        font_size: f64,
    ) -> Result<WasmPager, JsError> {
        let geometry = PageGeometry::new(page_width, page_height, font_size);
        let mut pager = Pager::from_markup(markup, PagerConfig::new(geometry));
        pager.update_layout()?;
        Ok(Self { pager })
    }

    /// Change page size or font size; repaginates only when something changed
    #[wasm_bindgen(js_name = setGeometry)]
    pub fn set_geometry(
        &mut self,
        page_width: f64,
        page_height: f64,
        font_size: f64,
    ) -> Result<bool, JsError> {
        self.pager.set_geometry(PageGeometry {
            page_width,
            page_height,
            font_size,
            ..self.pager.config().geometry
        });
        Ok(self.pager.update_layout()?)
    }

    /// Get page count
    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.pager.page_count()
    }

    /// All page descriptors as plain JS objects
    #[wasm_bindgen(js_name = getPages)]
    pub fn get_pages(&self) -> Result<JsValue, JsError> {
        to_js(self.pager.pages())
    }

    /// Markup of one page, `undefined` when out of range
    #[wasm_bindgen(js_name = getPageHtml)]
    pub fn get_page_html(&self, index: usize) -> Option<String> {
        self.pager.pages().get(index).map(|page| page.html())
    }

    /// Stats of one page, `null` when out of range
    #[wasm_bindgen(js_name = getPageStats)]
    pub fn get_page_stats(&self, index: usize) -> Result<JsValue, JsError> {
        match self.pager.pages().get(index) {
            Some(page) => to_js(&page.stats),
            None => Ok(JsValue::NULL),
        }
    }

    /// Integer half of the packed page geometry
    #[wasm_bindgen(js_name = getPageBufferU32)]
    pub fn get_page_buffer_u32(&self) -> Vec<u32> {
        PageBuffer::encode(self.pager.pages()).u32_data
    }

    /// Float half of the packed page geometry
    #[wasm_bindgen(js_name = getPageBufferF64)]
    pub fn get_page_buffer_f64(&self) -> Vec<f64> {
        PageBuffer::encode(self.pager.pages()).f64_data
    }

    /// Whether the last pass produced pages failing the invariant checks
    #[wasm_bindgen(js_name = isDegraded)]
    pub fn is_degraded(&self) -> bool {
        self.pager.last_run().is_some_and(|run| run.is_degraded())
    }
}

/// Serialize through JSON so the JS side gets plain objects
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    let json = serde_json::to_string(value)?;
    js_sys::JSON::parse(&json).map_err(|_| JsError::new("page data is not valid JSON"))
}
