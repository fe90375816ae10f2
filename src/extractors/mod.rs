// src/extractors/mod.rs
pub mod document;
pub mod images;
pub mod question;
pub mod text;

// Re-export key extraction types for convenience
pub use document::DocumentDriver;
pub use question::QuestionRecord;
