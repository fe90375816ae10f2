// src/extractors/document.rs
use crate::config::{ExtractorConfig, PageAttribution};
use crate::extractors::images::{should_skip_first_image, ImageExtractor};
use crate::extractors::question::{parse_question_block, QuestionRecord};
use crate::extractors::text;
use crate::pdf::PageSource;
use crate::storage::StorageManager;
use crate::utils::error::ExtractError;
use std::collections::HashSet;

/// Accepted records plus counters describing the run.
#[derive(Debug)]
pub struct ExtractionReport {
    pub questions: Vec<QuestionRecord>,
    pub pages: usize,
    pub blocks: usize,
    pub case_studies_discarded: usize,
    pub unnumbered: usize,
    pub images_written: usize,
    pub attribution: PageAttribution,
    pub decorative_threshold: u32,
}

/// Walks a document line by line, cutting it into question blocks at marker
/// lines and turning each block into a record with its images.
pub struct DocumentDriver<'a> {
    storage: &'a StorageManager,
    images: ImageExtractor,
    attribution: PageAttribution,
    threshold: u32,
}

impl<'a> DocumentDriver<'a> {
    pub fn new(config: &ExtractorConfig, storage: &'a StorageManager) -> Self {
        Self {
            storage,
            images: ImageExtractor::new(config.decorative_threshold),
            attribution: config.attribution,
            threshold: config.decorative_threshold,
        }
    }

    pub fn run<S: PageSource>(&self, source: &S) -> Result<ExtractionReport, ExtractError> {
        let mut report = ExtractionReport {
            questions: Vec::new(),
            pages: 0,
            blocks: 0,
            case_studies_discarded: 0,
            unnumbered: 0,
            images_written: 0,
            attribution: self.attribution,
            decorative_threshold: self.threshold,
        };

        let mut block = String::new();
        let mut block_start_page = 0;
        let mut last_page = None;

        for page in 0..source.page_count() {
            last_page = Some(page);
            report.pages += 1;

            for line in source.page_lines(page)? {
                if text::is_question_marker(&line) {
                    if !block.is_empty() {
                        let image_page = self.attribution.image_page(block_start_page, page);
                        self.finish_block(&block, image_page, source, &mut report)?;
                    }
                    block.clear();
                    block_start_page = page;
                }
                block.push_str(&line);
                block.push('\n');
            }
        }

        // The last block has no following marker to close it.
        if let Some(page) = last_page {
            if !block.is_empty() {
                let image_page = self.attribution.image_page(block_start_page, page);
                self.finish_block(&block, image_page, source, &mut report)?;
            }
        }

        warn_on_duplicate_numbers(&report.questions);

        tracing::info!(
            "Parsed {} blocks over {} pages: {} questions kept, {} case studies discarded, {} images written",
            report.blocks,
            report.pages,
            report.questions.len(),
            report.case_studies_discarded,
            report.images_written
        );
        Ok(report)
    }

    fn finish_block<S: PageSource>(
        &self,
        block: &str,
        image_page: usize,
        source: &S,
        report: &mut ExtractionReport,
    ) -> Result<(), ExtractError> {
        report.blocks += 1;
        let parsed = parse_question_block(block);

        let Some(mut record) = parsed.record else {
            report.case_studies_discarded += 1;
            return Ok(());
        };

        if record.question_number.is_none() {
            tracing::warn!(
                "Block {} has no question marker; keeping it without a number",
                report.blocks
            );
            report.unnumbered += 1;
        }

        let skip_first = should_skip_first_image(parsed.correct_answer_seen);
        let page_images = source.page_images(image_page)?;
        record.images = self
            .images
            .extract(&page_images, record.question_number, skip_first, self.storage)?;

        tracing::debug!(
            "Question {:?}: {} options, {} images from page {}",
            record.question_number,
            record.answers.len(),
            record.images.len(),
            image_page + 1
        );

        report.images_written += record.images.len();
        report.questions.push(record);
        Ok(())
    }
}

fn warn_on_duplicate_numbers(questions: &[QuestionRecord]) {
    let mut seen = HashSet::new();
    for number in questions.iter().filter_map(|q| q.question_number) {
        if !seen.insert(number) {
            tracing::warn!("Question number {} appears more than once in the output", number);
        }
    }
}
