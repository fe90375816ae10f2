// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF file not found: {0}")]
    NotFound(String),

    #[error("Failed to load PDF document: {0}")]
    Load(#[from] lopdf::Error), // Corrupt or unreadable documents

    #[error("Failed to read page {page}: {reason}")]
    Page { page: u32, reason: String },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDF reading failed: {0}")]
    Pdf(#[from] PdfError),

    #[error("Image persistence failed: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("PDF input failed: {0}")]
    Pdf(#[from] PdfError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
