// src/pdf/mod.rs
mod color;
pub mod models;
pub mod reader;

pub use models::PageImage;
pub use reader::PdfReader;

use crate::utils::error::PdfError;

/// Page-by-page access to a document's text lines and embedded images.
/// Pages are addressed by 0-based index.
pub trait PageSource {
    fn page_count(&self) -> usize;

    fn page_lines(&self, page: usize) -> Result<Vec<String>, PdfError>;

    /// Raster images in the page's intrinsic order.
    fn page_images(&self, page: usize) -> Result<Vec<PageImage>, PdfError>;
}
