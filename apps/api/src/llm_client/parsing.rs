//! Parsing of free-text model replies into typed results.

use thiserror::Error;

use crate::llm_client::prompts::{QUESTIONS_MARKER, QUESTION_COUNT};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("reply does not contain the 'QUESTIONS:' marker")]
    MissingMarker,

    #[error("expected {expected} numbered questions, found {found}")]
    TooFewQuestions { expected: usize, found: usize },
}

/// Extracts the numbered questions that follow the `QUESTIONS:` marker.
///
/// Lines that are not of the form `<n>. <text>` are skipped. Fewer than
/// `QUESTION_COUNT` valid lines is an error; extra lines past the first
/// `QUESTION_COUNT` are ignored.
pub fn parse_questions(raw: &str) -> Result<Vec<String>, ParseError> {
    let start = raw.find(QUESTIONS_MARKER).ok_or(ParseError::MissingMarker)?;
    let body = &raw[start + QUESTIONS_MARKER.len()..];

    let questions: Vec<String> = body
        .lines()
        .filter_map(numbered_line)
        .take(QUESTION_COUNT)
        .collect();

    if questions.len() < QUESTION_COUNT {
        return Err(ParseError::TooFewQuestions {
            expected: QUESTION_COUNT,
            found: questions.len(),
        });
    }
    Ok(questions)
}

/// `"  3. What is REST? "` → `Some("What is REST?")`. Also accepts `3)`.
fn numbered_line(line: &str) -> Option<String> {
    let line = line.trim();
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    let text = rest
        .strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))?
        .trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Best-effort extraction of a 1–10 score from evaluation text.
///
/// A fraction `N/10` wins wherever it appears. Otherwise a line labelled
/// `score ...: N` is used, with the number right after the colon.
pub fn extract_score(text: &str) -> Option<u8> {
    let lower = text.to_ascii_lowercase();
    fraction_score(&lower).or_else(|| labelled_score(&lower))
}

fn fraction_score(lower: &str) -> Option<u8> {
    for (idx, _) in lower.match_indices("/10") {
        let after = &lower[idx + "/10".len()..];
        if after.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let before = lower[..idx].trim_end();
        let digits = before.bytes().rev().take_while(u8::is_ascii_digit).count();
        let number = &before[before.len() - digits..];
        if let Some(score) = number.parse::<u32>().ok().and_then(in_range) {
            return Some(score);
        }
    }
    None
}

/// `"Score (1-10): 7"` → 7. The label may carry digits; the score is the
/// number that directly follows the colon.
fn labelled_score(lower: &str) -> Option<u8> {
    lower.lines().find_map(|line| {
        let label_end = line.find("score")? + "score".len();
        let colon = line[label_end..].find(':')? + label_end;
        let value = line[colon + 1..].trim_start();
        let digits = value
            .find(|c: char| !c.is_ascii_digit())
            .map_or(value, |i| &value[..i]);
        digits.parse::<u32>().ok().and_then(in_range)
    })
}

fn in_range(n: u32) -> Option<u8> {
    if (1..=10).contains(&n) {
        Some(n as u8)
    } else {
        None
    }
}
