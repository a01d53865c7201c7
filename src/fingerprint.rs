use serde_json::json;
use sha2::{Digest, Sha256};

use crate::models::Question;

/// Content-derived identity of a question. Trims the stem and answer texts and
/// sorts answers by (text, correctness), so reordering answers or padding them
/// with whitespace leaves the digest unchanged.
pub fn fingerprint_question(question: &Question) -> String {
    let mut answers: Vec<(&str, bool)> = question
        .answers
        .iter()
        .map(|answer| (answer.text.trim(), answer.correct))
        .collect();
    answers.sort();

    let canonical = json!({
        "question": question.question.trim(),
        "answers": answers,
    });

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
