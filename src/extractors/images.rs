// src/extractors/images.rs
use crate::pdf::PageImage;
use crate::storage::StorageManager;
use crate::utils::error::StorageError;

/// Images at or below this size in both dimensions are treated as bullets or icons.
pub const DEFAULT_DECORATIVE_THRESHOLD: u32 = 20;

/// Whether the first qualifying image on the page should be dropped.
///
/// A block that carries a correct-answer line usually has a checkmark artifact
/// rendered as the page's first real image.
pub fn should_skip_first_image(correct_answer_seen: bool) -> bool {
    correct_answer_seen
}

pub fn is_decorative(width: u32, height: u32, threshold: u32) -> bool {
    width <= threshold && height <= threshold
}

pub struct ImageExtractor {
    threshold: u32,
}

impl ImageExtractor {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    /// Picks the images worth keeping, in page order. Decorative images never
    /// count toward `skip_first`.
    pub fn select<'a>(&self, images: &'a [PageImage], skip_first: bool) -> Vec<&'a PageImage> {
        let mut pending_skip = skip_first;
        images
            .iter()
            .filter(|image| !is_decorative(image.width, image.height, self.threshold))
            .filter(|image| {
                if pending_skip {
                    tracing::debug!("Skipping first qualifying image (index {})", image.index);
                    pending_skip = false;
                    return false;
                }
                true
            })
            .collect()
    }

    /// Writes the selected images for a question and returns their paths.
    /// Any write failure aborts the whole extraction.
    pub fn extract(
        &self,
        images: &[PageImage],
        question_number: Option<u32>,
        skip_first: bool,
        storage: &StorageManager,
    ) -> Result<Vec<String>, StorageError> {
        self.select(images, skip_first)
            .into_iter()
            .map(|image| storage.save_image(image, question_number))
            .collect()
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn page(sizes: &[(u32, u32)]) -> Vec<PageImage> {
        sizes
            .iter()
            .enumerate()
            .map(|(index, &(width, height))| PageImage {
                index,
                width,
                height,
                extension: "png".to_string(),
                data: vec![index as u8],
            })
            .collect()
    }

    fn kept_sizes(selected: &[&PageImage]) -> Vec<(u32, u32)> {
        selected.iter().map(|image| (image.width, image.height)).collect()
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(is_decorative(20, 20, DEFAULT_DECORATIVE_THRESHOLD));
        assert!(!is_decorative(21, 20, DEFAULT_DECORATIVE_THRESHOLD));
        assert!(!is_decorative(20, 21, DEFAULT_DECORATIVE_THRESHOLD));
    }

    #[test]
    fn test_skip_first_ignores_decorative_images() {
        let images = page(&[(15, 15), (300, 200), (18, 10), (400, 300)]);
        let extractor = ImageExtractor::new(DEFAULT_DECORATIVE_THRESHOLD);

        let kept = extractor.select(&images, true);
        assert_eq!(kept_sizes(&kept), vec![(400, 300)]);
        assert_eq!(kept[0].index, 3);

        let kept = extractor.select(&images, false);
        assert_eq!(kept_sizes(&kept), vec![(300, 200), (400, 300)]);
    }

    #[test]
    fn test_skip_first_on_page_without_real_images() {
        let images = page(&[(10, 10), (20, 20)]);
        let extractor = ImageExtractor::new(DEFAULT_DECORATIVE_THRESHOLD);
        assert!(extractor.select(&images, true).is_empty());
    }

    #[test]
    fn test_skip_policy_follows_correct_answer() {
        assert!(should_skip_first_image(true));
        assert!(!should_skip_first_image(false));
    }

    #[test]
    fn test_extract_writes_with_page_index_names() {
        let dir = tempfile::tempdir().unwrap();
        let image_dir = dir.path().join("extracted_images");
        let storage = StorageManager::new(dir.path().join("q.json"), &image_dir).unwrap();
        let images = page(&[(15, 15), (300, 200), (21, 5)]);

        let paths = ImageExtractor::new(DEFAULT_DECORATIVE_THRESHOLD)
            .extract(&images, Some(9), false, &storage)
            .unwrap();

        let expected: Vec<String> = ["9_1.png", "9_2.png"]
            .iter()
            .map(|name| image_dir.join(name).to_string_lossy().into_owned())
            .collect();
        assert_eq!(paths, expected);
        assert_eq!(std::fs::read(image_dir.join("9_2.png")).unwrap(), vec![2]);
        assert!(!image_dir.join("9_0.png").exists());
    }
}
