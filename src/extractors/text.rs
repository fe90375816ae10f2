// src/extractors/text.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;

// --- Constants ---
// Bullet, ellipsis and ballot-box glyphs the exam export scatters over lines.
const NOISE_GLYPHS: &[char] = &[
    '\u{2022}', // •
    '\u{2023}', // ‣
    '\u{25CF}', // ●
    '\u{25E6}', // ◦
    '\u{2026}', // …
    '\u{1F5F3}', // 🗳
    '\u{FE0F}', // emoji presentation selector trailing the ballot box
];

pub const CORRECT_ANSWER_PREFIX: &str = "correct answer:";
pub const VOTE_DISTRIBUTION_PHRASE: &str = "Community vote distribution";
const TOPIC_PREFIX: &str = "topic";
const CASE_STUDY_PHRASE: &str = "case study";

// --- Regex Patterns (Lazy Static) ---
// Shared by block boundary detection and question number extraction.
static QUESTION_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^Question\s+#(\d+)").expect("Failed to compile QUESTION_MARKER_RE")
});

static OPTION_START_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z])\.").expect("Failed to compile OPTION_START_RE")
});

// "Most Voted" badge plus whatever the layout glued after it (usually a percentage).
static MOST_VOTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bMost Voted\b.*").expect("Failed to compile MOST_VOTED_RE")
});

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\W").expect("Failed to compile NON_WORD_RE")
});

// --- Normalization ---

/// Removes decoration glyphs from a raw line and trims surrounding whitespace.
pub fn clean_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| !NOISE_GLYPHS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Case-insensitive ASCII prefix test that never slices through a multi-byte char.
pub fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}

pub fn is_question_marker(line: &str) -> bool {
    QUESTION_MARKER_RE.is_match(line)
}

/// Number carried by a marker line. `None` when the line is not a marker or the
/// digits do not fit a `u32`.
pub fn question_number(line: &str) -> Option<u32> {
    let caps = QUESTION_MARKER_RE.captures(line)?;
    match caps[1].parse::<u32>() {
        Ok(number) => Some(number),
        Err(e) => {
            tracing::warn!("Question marker '{}' has an unusable number: {}", line, e);
            None
        }
    }
}

pub fn strip_most_voted(text: &str) -> String {
    MOST_VOTED_RE.replace(text, "").trim().to_string()
}

pub fn strip_non_word(text: &str) -> String {
    NON_WORD_RE.replace_all(text, "").into_owned()
}

pub fn is_case_study(question_text: &str) -> bool {
    question_text.to_lowercase().contains(CASE_STUDY_PHRASE)
}

// --- Classification ---

/// What a cleaned line contributes to the question being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `Question #N`; the number is `None` only if it overflows.
    QuestionMarker(Option<u32>),
    /// `Correct Answer: ...` with non-word characters removed. `None` when
    /// nothing survives the stripping.
    CorrectAnswer(Option<String>),
    OptionStart { letter: char, text: String },
    Continuation(String),
    /// Vote tally line while an option is open; contributes nothing to the text.
    VoteDistribution,
    /// Topic header before any option has opened.
    Topic,
    QuestionText,
}

impl LineKind {
    pub fn label(&self) -> &'static str {
        match self {
            LineKind::QuestionMarker(_) => "marker",
            LineKind::CorrectAnswer(_) => "correct",
            LineKind::OptionStart { .. } => "option",
            LineKind::Continuation(_) => "continuation",
            LineKind::VoteDistribution => "votes",
            LineKind::Topic => "topic",
            LineKind::QuestionText => "question",
        }
    }
}

/// Classifies an already-cleaned line. `option_open` tells whether an answer
/// option has been opened earlier in the same block; the first matching rule wins.
pub fn classify_line(line: &str, option_open: bool) -> LineKind {
    if is_question_marker(line) {
        return LineKind::QuestionMarker(question_number(line));
    }

    if starts_with_ignore_case(line, CORRECT_ANSWER_PREFIX) {
        let value = strip_non_word(&line[CORRECT_ANSWER_PREFIX.len()..]);
        return LineKind::CorrectAnswer(if value.is_empty() { None } else { Some(value) });
    }

    if let Some(caps) = OPTION_START_RE.captures(line) {
        let letter = caps[1].chars().next().unwrap_or('A');
        // The letter and its period are both single-byte ASCII.
        let text = strip_most_voted(line[2..].trim());
        return LineKind::OptionStart { letter, text };
    }

    if option_open {
        if starts_with_ignore_case(line, VOTE_DISTRIBUTION_PHRASE) {
            return LineKind::VoteDistribution;
        }
        return LineKind::Continuation(strip_most_voted(line));
    }

    if starts_with_ignore_case(line, TOPIC_PREFIX) {
        return LineKind::Topic;
    }

    LineKind::QuestionText
}
