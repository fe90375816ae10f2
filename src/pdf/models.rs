// src/pdf/models.rs

/// An embedded raster image, ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// Position among the page's image XObjects, in resource order.
    pub index: usize,
    pub width: u32,
    pub height: u32,
    /// File extension matching `data` ("jpeg", "jpx", "png" or "bin").
    pub extension: String,
    pub data: Vec<u8>,
}

impl PageImage {
    /// Base filename for this image when attached to a question.
    pub fn file_name(&self, question_number: Option<u32>) -> String {
        let prefix = question_number
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        format!("{}_{}.{}", prefix, self.index, self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_uses_page_index() {
        let image = PageImage {
            index: 3,
            width: 300,
            height: 200,
            extension: "jpeg".to_string(),
            data: vec![],
        };
        assert_eq!(image.file_name(Some(44)), "44_3.jpeg");
        assert_eq!(image.file_name(None), "unknown_3.jpeg");
    }
}
