// src/utils/text_debug.rs
use crate::extractors::text::{self, LineKind};
use crate::pdf::PageSource;
use crate::utils::error::AppError;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Labels every line of a page the way the block parser would see it.
/// `option_open` carries across pages and resets at each question marker.
pub fn annotate_lines(lines: &[String], option_open: &mut bool) -> Vec<(LineKind, String)> {
    lines
        .iter()
        .map(|raw| {
            let cleaned = text::clean_text(raw);
            let kind = text::classify_line(&cleaned, *option_open);
            match kind {
                LineKind::QuestionMarker(_) => *option_open = false,
                LineKind::OptionStart { .. } => *option_open = true,
                _ => {}
            }
            (kind, cleaned)
        })
        .collect()
}

/// Saves one page's annotated lines to a text file.
pub fn save_debug_page(path: &Path, page: usize, annotated: &[(LineKind, String)]) -> Result<(), AppError> {
    let mut file = File::create(path)?;

    writeln!(file, "# page {} ({} lines)", page + 1, annotated.len())?;
    for (kind, line) in annotated {
        writeln!(file, "[{:<12}] {}", kind.label(), line)?;
    }

    tracing::debug!("Saved debug page to {}", path.display());
    Ok(())
}

/// Writes `page_<n>.txt` for every page of the document into `debug_dir`.
pub fn create_debug_dump<S: PageSource>(source: &S, debug_dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(debug_dir)?;

    let mut option_open = false;
    let mut written = Vec::with_capacity(source.page_count());
    for page in 0..source.page_count() {
        let lines = source.page_lines(page)?;
        let annotated = annotate_lines(&lines, &mut option_open);
        let path = debug_dir.join(format!("page_{}.txt", page + 1));
        save_debug_page(&path, page, &annotated)?;
        written.push(path);
    }

    tracing::info!("Saved {} annotated pages to {}", written.len(), debug_dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_option_state_spans_pages_and_resets_at_marker() {
        let mut option_open = false;
        let first = annotate_lines(&lines(&["Question #1", "Body", "A. one"]), &mut option_open);
        assert!(option_open);
        let second = annotate_lines(&lines(&["more of one", "Question #2", "Topic 3"]), &mut option_open);

        let labels: Vec<_> = first.iter().chain(second.iter()).map(|(k, _)| k.label()).collect();
        assert_eq!(labels, vec!["marker", "question", "option", "continuation", "marker", "topic"]);
        assert!(!option_open);
    }

    #[test]
    fn test_save_debug_page_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page_1.txt");
        let mut option_open = false;
        let annotated = annotate_lines(&lines(&["• Question #4", "Correct Answer: C"]), &mut option_open);
        save_debug_page(&path, 0, &annotated).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# page 1 (2 lines)\n"));
        assert!(content.contains("[marker      ] Question #4\n"));
        assert!(content.contains("[correct     ] Correct Answer: C\n"));
    }
}
