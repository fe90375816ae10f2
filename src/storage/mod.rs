// src/storage/mod.rs
use crate::extractors::document::ExtractionReport;
use crate::extractors::question::QuestionRecord;
use crate::pdf::PageImage;
use crate::utils::error::StorageError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct StorageManager {
    output_path: PathBuf,
    image_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager, making sure the image directory and the
    /// output file's parent directory exist.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(output_path: P, image_dir: Q) -> Result<Self, StorageError> {
        let output_path = output_path.as_ref().to_path_buf();
        let image_dir = image_dir.as_ref().to_path_buf();

        if !image_dir.exists() {
            fs::create_dir_all(&image_dir).map_err(StorageError::IoError)?;
        }
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(StorageError::IoError)?;
            }
        }

        Ok(Self { output_path, image_dir })
    }

    /// Directory for annotated page dumps, next to the JSON output.
    pub fn debug_dir(&self) -> PathBuf {
        match self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.join("debug"),
            None => PathBuf::from("debug"),
        }
    }

    /// Writes one image under the image directory and returns the path as it
    /// is recorded in the question's `images` list.
    pub fn save_image(&self, image: &PageImage, question_number: Option<u32>) -> Result<String, StorageError> {
        let file_path = self.image_dir.join(image.file_name(question_number));

        let mut file = fs::File::create(&file_path).map_err(StorageError::IoError)?;
        file.write_all(&image.data).map_err(StorageError::IoError)?;

        tracing::debug!("Saved image to {}", file_path.display());

        Ok(file_path.to_string_lossy().into_owned())
    }

    /// Serializes all records as one pretty-printed JSON array. The array is
    /// written to a sibling `.tmp` file and renamed over the output, so the
    /// output is either the complete new dump or left untouched.
    pub fn save_questions(&self, questions: &[QuestionRecord]) -> Result<PathBuf, StorageError> {
        let json = serde_json::to_string_pretty(questions)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let tmp_path = self.staging_path();
        if let Err(e) = write_synced(&tmp_path, json.as_bytes()) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StorageError::IoError(e));
        }
        fs::rename(&tmp_path, &self.output_path).map_err(StorageError::IoError)?;

        tracing::info!("Saved {} questions to {}", questions.len(), self.output_path.display());

        Ok(self.output_path.clone())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.output_path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Saves a summary of the run in JSON format beside the question dump.
    pub fn save_run_metadata(&self, source_pdf: &Path, report: &ExtractionReport) -> Result<PathBuf, StorageError> {
        let file_path = self.output_path.with_extension("meta.json");

        let metadata = serde_json::json!({
            "source_pdf": source_pdf.display().to_string(),
            "output": self.output_path.display().to_string(),
            "image_dir": self.image_dir.display().to_string(),
            "pages": report.pages,
            "blocks": report.blocks,
            "questions": report.questions.len(),
            "case_studies_discarded": report.case_studies_discarded,
            "unnumbered_questions": report.unnumbered,
            "images_written": report.images_written,
            "image_attribution": report.attribution.as_str(),
            "decorative_threshold": report.decorative_threshold,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved run metadata to {}", file_path.display());

        Ok(file_path)
    }

    /// Reads a JSON dump produced by `save_questions`.
    pub fn load_questions<P: AsRef<Path>>(path: P) -> Result<Vec<QuestionRecord>, StorageError> {
        let content = fs::read_to_string(path.as_ref()).map_err(StorageError::IoError)?;
        serde_json::from_str(&content).map_err(|e| StorageError::SerializationError(e.to_string()))
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
