// src/config.rs
use crate::extractors::images::DEFAULT_DECORATIVE_THRESHOLD;
use crate::utils::AppError;
use std::path::PathBuf;

/// Environment override for the decorative image threshold.
pub const THRESHOLD_ENV: &str = "IMAGE_SIZE_THRESHOLD";

/// Which page a finished question pulls its images from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAttribution {
    /// The page on which the next question's marker was found (or the last
    /// page for the final question). Matches the established output.
    ClosingMarker,
    /// The page on which the question's own marker appeared.
    BlockStart,
}

impl PageAttribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageAttribution::ClosingMarker => "closing-marker",
            PageAttribution::BlockStart => "block-start",
        }
    }

    pub fn image_page(&self, block_start: usize, closing: usize) -> usize {
        match self {
            PageAttribution::ClosingMarker => closing,
            PageAttribution::BlockStart => block_start,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub pdf_path: PathBuf,
    pub output_path: PathBuf,
    pub image_dir: PathBuf,
    pub decorative_threshold: u32,
    pub attribution: PageAttribution,
    pub debug: bool,
}

/// Command-line value first, then the environment, then the default.
pub fn resolve_threshold(flag: Option<u32>, env_value: Option<String>) -> Result<u32, AppError> {
    if let Some(threshold) = flag {
        tracing::debug!("Using decorative threshold {} from command-line argument", threshold);
        return Ok(threshold);
    }

    match env_value {
        Some(raw) => {
            let threshold = raw.trim().parse::<u32>().map_err(|e| {
                AppError::Config(format!("{} must be a non-negative integer, got '{}': {}", THRESHOLD_ENV, raw, e))
            })?;
            tracing::debug!("Using decorative threshold {} from {}", threshold, THRESHOLD_ENV);
            Ok(threshold)
        }
        None => {
            tracing::debug!("Using default decorative threshold {}", DEFAULT_DECORATIVE_THRESHOLD);
            Ok(DEFAULT_DECORATIVE_THRESHOLD)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_precedence() {
        assert_eq!(resolve_threshold(Some(5), Some("40".to_string())).unwrap(), 5);
        assert_eq!(resolve_threshold(None, Some(" 40 ".to_string())).unwrap(), 40);
        assert_eq!(resolve_threshold(None, None).unwrap(), DEFAULT_DECORATIVE_THRESHOLD);
    }

    #[test]
    fn test_bad_env_threshold_is_config_error() {
        assert!(matches!(
            resolve_threshold(None, Some("big".to_string())),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_image_page_selection() {
        assert_eq!(PageAttribution::ClosingMarker.image_page(1, 3), 3);
        assert_eq!(PageAttribution::BlockStart.image_page(1, 3), 1);
    }
}
