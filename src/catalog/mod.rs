// src/catalog/mod.rs
use crate::extractors::question::{AnswerOptions, QuestionRecord};
use crate::storage::StorageManager;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

static FIRST_PERCENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)%").expect("Failed to compile FIRST_PERCENT_RE")
});

/// How strongly the community agreed, from the first percentage in the vote line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Consensus {
    Strong,
    Moderate,
    Split,
    Debated,
}

impl Consensus {
    pub fn from_votes(votes: &str) -> Option<Self> {
        let caps = FIRST_PERCENT_RE.captures(votes)?;
        let share: u32 = caps[1].parse().ok()?;
        Some(match share {
            90.. => Consensus::Strong,
            70..=89 => Consensus::Moderate,
            50..=69 => Consensus::Split,
            _ => Consensus::Debated,
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Consensus::Strong => "strong consensus (90-100%)",
            Consensus::Moderate => "moderate consensus (70-89%)",
            Consensus::Split => "split opinion (50-69%)",
            Consensus::Debated => "highly debated (<50%)",
        }
    }
}

/// A question's images split into question-level images and per-option images.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImageGroups {
    pub question: Vec<String>,
    /// Option letter to image paths, in order of first appearance.
    pub options: Vec<(char, Vec<String>)>,
}

impl ImageGroups {
    /// Option images whose letter has no answer option in `answers`.
    pub fn unmatched(&self, answers: &AnswerOptions) -> Vec<&(char, Vec<String>)> {
        self.options
            .iter()
            .filter(|(letter, _)| answers.get(*letter).is_none())
            .collect()
    }
}

/// Images named `<anything>_<letter>.<ext>` belong to that answer option.
pub fn group_images(images: &[String]) -> ImageGroups {
    let mut groups = ImageGroups::default();
    for path in images {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let stem = file_name.split('.').next().unwrap_or(file_name);
        let tail: Vec<char> = stem.chars().rev().take(2).collect();

        match tail.as_slice() {
            [letter, '_'] if stem.chars().count() > 2 && letter.is_alphabetic() => {
                let letter = letter.to_ascii_uppercase();
                match groups.options.iter_mut().find(|(l, _)| *l == letter) {
                    Some((_, paths)) => paths.push(path.clone()),
                    None => groups.options.push((letter, vec![path.clone()])),
                }
            }
            _ => groups.question.push(path.clone()),
        }
    }
    groups
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    pub total: usize,
    pub with_correct_answer: usize,
    pub with_images: usize,
    pub with_votes: usize,
    pub correct_answers: BTreeMap<String, usize>,
    pub consensus: BTreeMap<Consensus, usize>,
}

/// Read-only view over a question dump, as consumed by study tools.
pub struct QuestionCatalog {
    questions: Vec<QuestionRecord>,
    image_dir: PathBuf,
}

impl QuestionCatalog {
    pub fn new(questions: Vec<QuestionRecord>, image_dir: PathBuf) -> Self {
        Self { questions, image_dir }
    }

    /// Loads the dump at `path`. A missing or unparsable file is logged and
    /// yields an empty catalog.
    pub fn load<P: AsRef<Path>>(path: P, image_dir: PathBuf) -> Self {
        let path = path.as_ref();
        match StorageManager::load_questions(path) {
            Ok(questions) => {
                tracing::info!("Loaded {} questions from {}", questions.len(), path.display());
                Self::new(questions, image_dir)
            }
            Err(e) => {
                tracing::error!("Could not load questions from {}: {}", path.display(), e);
                Self::new(Vec::new(), image_dir)
            }
        }
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    /// Case-insensitive substring search over question text.
    pub fn search(&self, term: &str) -> Vec<&QuestionRecord> {
        let needle = term.to_lowercase();
        self.questions
            .iter()
            .filter(|q| q.question_text.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn find(&self, number: u32) -> Option<&QuestionRecord> {
        self.questions.iter().find(|q| q.question_number == Some(number))
    }

    /// Locations tried for a stored image path, in priority order.
    pub fn candidate_paths(&self, image_path: &str) -> Vec<PathBuf> {
        let prefix = format!("{}/", self.image_dir.to_string_lossy());
        let name = image_path.replace(&prefix, "");
        let stem = name.split('.').next().unwrap_or(&name);

        vec![
            self.image_dir.join(&name),
            self.image_dir.join(name.replace('-', "_")),
            self.image_dir.join(name.replace('_', "-")),
            PathBuf::from(&name),
            self.image_dir.join(format!("{}.png", stem)),
        ]
    }

    /// First candidate location that exists on disk.
    pub fn resolve_image(&self, image_path: &str) -> Option<PathBuf> {
        let found = self.candidate_paths(image_path).into_iter().find(|p| p.exists());
        if found.is_none() {
            tracing::warn!("Image not found: {}", image_path);
        }
        found
    }

    pub fn summary(&self) -> CatalogSummary {
        let mut summary = CatalogSummary { total: self.questions.len(), ..Default::default() };
        for question in &self.questions {
            if let Some(answer) = &question.correct_answer {
                summary.with_correct_answer += 1;
                *summary.correct_answers.entry(answer.clone()).or_insert(0) += 1;
            }
            if !question.images.is_empty() {
                summary.with_images += 1;
            }
            if let Some(votes) = &question.community_vote_distribution {
                summary.with_votes += 1;
                if let Some(level) = Consensus::from_votes(votes) {
                    *summary.consensus.entry(level).or_insert(0) += 1;
                }
            }
        }
        summary
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn record(number: u32, text: &str, correct: Option<&str>, votes: Option<&str>, images: &[&str]) -> QuestionRecord {
        QuestionRecord {
            question_number: Some(number),
            question_text: text.to_string(),
            correct_answer: correct.map(str::to_string),
            community_vote_distribution: votes.map(str::to_string),
            images: images.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_or_invalid_file_gives_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = QuestionCatalog::load(dir.path().join("absent.json"), dir.path().to_path_buf());
        assert!(catalog.questions().is_empty());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "[{").unwrap();
        let catalog = QuestionCatalog::load(&bad, dir.path().to_path_buf());
        assert!(catalog.questions().is_empty());
    }

    #[test]
    fn test_load_reads_unset_fields_as_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.json");
        fs::write(
            &path,
            r#"[{"question_number": null, "question_text": "Q ", "answers": {"A": "x"}, "correct_answer": null, "Community vote distribution": null, "images": []}]"#,
        )
        .unwrap();
        let catalog = QuestionCatalog::load(&path, dir.path().to_path_buf());
        assert_eq!(catalog.questions().len(), 1);
        assert_eq!(catalog.questions()[0].question_number, None);
        assert_eq!(catalog.questions()[0].answers.get('A'), Some("x"));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let catalog = QuestionCatalog::new(
            vec![
                record(1, "What is BigQuery? ", None, None, &[]),
                record(2, "Choose a Dataflow template ", None, None, &[]),
            ],
            PathBuf::from("extracted_images"),
        );
        let hits: Vec<_> = catalog.search("bigquery").iter().map(|q| q.question_number).collect();
        assert_eq!(hits, vec![Some(1)]);
        assert_eq!(catalog.search("").len(), 2);
        assert_eq!(catalog.find(2).map(|q| q.question_number), Some(Some(2)));
    }

    #[test]
    fn test_unmatched_option_images() {
        let images = vec!["img/3_a.png".to_string(), "img/3_e.png".to_string(), "img/3_0.png".to_string()];
        let mut answers = AnswerOptions::new();
        answers.insert('A', "Pub/Sub".to_string());
        answers.insert('B', "Dataflow".to_string());

        let groups = group_images(&images);
        let unmatched: Vec<char> = groups.unmatched(&answers).iter().map(|(letter, _)| *letter).collect();
        assert_eq!(unmatched, vec!['E']);
        assert!(group_images(&images[..1]).unmatched(&answers).is_empty());
    }

    #[test]
    fn test_group_images_by_option_suffix() {
        let images: Vec<String> = [
            "extracted_images/44_1.png",
            "extracted_images/44_a.png",
            "extracted_images/44_b.jpeg",
            "44_A.png",
            "a_b",
            "_c.png",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let groups = group_images(&images);
        assert_eq!(groups.question, vec!["extracted_images/44_1.png".to_string(), "_c.png".to_string()]);
        assert_eq!(
            groups.options,
            vec![
                ('A', vec!["extracted_images/44_a.png".to_string(), "44_A.png".to_string()]),
                ('B', vec!["extracted_images/44_b.jpeg".to_string(), "a_b".to_string()]),
            ]
        );
    }

    #[test]
    fn test_resolve_image_tries_filename_variants() {
        let dir = tempfile::tempdir().unwrap();
        let image_dir = dir.path().join("extracted_images");
        fs::create_dir_all(&image_dir).unwrap();
        fs::write(image_dir.join("12-3.png"), b"x").unwrap();
        fs::write(image_dir.join("13_0.png"), b"x").unwrap();

        let catalog = QuestionCatalog::new(Vec::new(), image_dir.clone());
        let stored = format!("{}/12_3.png", image_dir.to_string_lossy());
        assert_eq!(catalog.resolve_image(&stored), Some(image_dir.join("12-3.png")));
        assert_eq!(catalog.resolve_image("13_0.jpeg"), Some(image_dir.join("13_0.png")));
        assert_eq!(catalog.resolve_image("99_0.png"), None);
        assert_eq!(catalog.candidate_paths("1_0.png").len(), 5);
    }

    #[test]
    fn test_summary_counts() {
        let catalog = QuestionCatalog::new(
            vec![
                record(1, "a", Some("B"), Some("B (95%) A (5%)"), &["x/1_0.png"]),
                record(2, "b", Some("AC"), Some("AC (72%)"), &[]),
                record(3, "c", Some("B"), Some("no numbers"), &[]),
                record(4, "d", None, None, &[]),
            ],
            PathBuf::from("extracted_images"),
        );
        let summary = catalog.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.with_correct_answer, 3);
        assert_eq!(summary.with_images, 1);
        assert_eq!(summary.with_votes, 3);
        assert_eq!(summary.correct_answers.get("B"), Some(&2));
        assert_eq!(summary.consensus.get(&Consensus::Strong), Some(&1));
        assert_eq!(summary.consensus.get(&Consensus::Moderate), Some(&1));
        assert_eq!(summary.consensus.get(&Consensus::Debated), None);
    }

    #[test]
    fn test_consensus_levels() {
        assert_eq!(Consensus::from_votes("D (50%)"), Some(Consensus::Split));
        assert_eq!(Consensus::from_votes("D (49%) C (40%)"), Some(Consensus::Debated));
        assert_eq!(Consensus::from_votes(""), None);
    }
}
