// src/extractors/question.rs

// --- Imports ---
use crate::extractors::text::{self, LineKind, VOTE_DISTRIBUTION_PHRASE};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// --- Data Structures ---

/// Answer options keyed by their letter, kept in the order they first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerOptions(Vec<(char, String)>);

impl AnswerOptions {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Sets the text for `letter`. A repeated letter replaces the earlier text
    /// but keeps its original position.
    pub fn insert(&mut self, letter: char, text: String) {
        match self.0.iter_mut().find(|(existing, _)| *existing == letter) {
            Some(entry) => entry.1 = text,
            None => self.0.push((letter, text)),
        }
    }

    /// Appends a continuation fragment to `letter`, separated by one space.
    pub fn append(&mut self, letter: char, fragment: &str) {
        if let Some((_, text)) = self.0.iter_mut().find(|(existing, _)| *existing == letter) {
            text.push(' ');
            text.push_str(fragment);
        }
    }

    pub fn get(&self, letter: char) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| *existing == letter)
            .map(|(_, text)| text.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &str)> + '_ {
        self.0.iter().map(|(letter, text)| (*letter, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for AnswerOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (letter, text) in &self.0 {
            map.serialize_entry(&letter.to_string(), text)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AnswerOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AnswerOptionsVisitor;

        impl<'de> Visitor<'de> for AnswerOptionsVisitor {
            type Value = AnswerOptions;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from single option letters to answer text")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut options = AnswerOptions::new();
                while let Some((key, text)) = access.next_entry::<String, String>()? {
                    let mut chars = key.chars();
                    match (chars.next(), chars.next()) {
                        (Some(letter), None) => options.insert(letter, text),
                        _ => {
                            return Err(de::Error::custom(format!(
                                "answer key '{}' is not a single letter",
                                key
                            )))
                        }
                    }
                }
                Ok(options)
            }
        }

        deserializer.deserialize_map(AnswerOptionsVisitor)
    }
}

/// One exam question as written to the JSON dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question_number: Option<u32>,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub answers: AnswerOptions,
    pub correct_answer: Option<String>,
    #[serde(rename = "Community vote distribution", default)]
    pub community_vote_distribution: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Outcome of parsing one block.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBlock {
    /// `None` when the block was a case-study question.
    pub record: Option<QuestionRecord>,
    /// Whether a non-empty `Correct Answer:` line was seen, even for discarded blocks.
    pub correct_answer_seen: bool,
}

/// Per-block parse state folded over the block's lines.
#[derive(Debug, Default)]
struct BlockState {
    record: QuestionRecord,
    open_option: Option<char>,
    correct_answer_seen: bool,
}

impl BlockState {
    fn apply(mut self, kind: LineKind, line: &str) -> Self {
        match kind {
            LineKind::QuestionMarker(number) => {
                if self.record.question_number.is_none() {
                    self.record.question_number = number;
                }
            }
            LineKind::CorrectAnswer(Some(value)) => {
                self.record.correct_answer = Some(value);
                self.correct_answer_seen = true;
            }
            LineKind::CorrectAnswer(None) => {}
            LineKind::OptionStart { letter, text } => {
                self.open_option = Some(letter);
                self.record.answers.insert(letter, text);
            }
            LineKind::Continuation(fragment) => {
                if let Some(letter) = self.open_option {
                    self.record.answers.append(letter, &fragment);
                }
            }
            LineKind::QuestionText => {
                self.record.question_text.push_str(line);
                self.record.question_text.push(' ');
            }
            LineKind::VoteDistribution | LineKind::Topic => {}
        }
        self
    }
}

// --- Parsing ---

/// First line mentioning the vote distribution, reduced to what follows the phrase.
fn extract_vote_distribution<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<String> {
    lines
        .into_iter()
        .find_map(|line| line.split_once(VOTE_DISTRIBUTION_PHRASE))
        .map(|(_, rest)| text::clean_text(rest))
}

/// Parses the raw text of one question block into a record.
pub fn parse_question_block(block: &str) -> ParsedBlock {
    let raw_lines: Vec<&str> = block.trim().lines().collect();

    let state = raw_lines.iter().fold(BlockState::default(), |state, raw| {
        let line = text::clean_text(raw);
        let kind = text::classify_line(&line, state.open_option.is_some());
        state.apply(kind, &line)
    });

    let BlockState { mut record, correct_answer_seen, .. } = state;
    record.community_vote_distribution = extract_vote_distribution(raw_lines.iter().copied());

    if text::is_case_study(&record.question_text) {
        tracing::debug!(
            "Discarding case-study block (question number {:?})",
            record.question_number
        );
        return ParsedBlock { record: None, correct_answer_seen };
    }

    ParsedBlock { record: Some(record), correct_answer_seen }
}
