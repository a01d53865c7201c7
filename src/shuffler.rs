use anyhow::{Context, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use tracing::warn;

use crate::models::{Question, WrongFeedback};

pub const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DEFAULT_CONJUNCTIONS: &[&str] = &["y", "and"];

pub fn letter_for(position: usize) -> Option<char> {
    LETTERS.chars().nth(position)
}

pub fn position_of(letter: char) -> Option<usize> {
    LETTERS.find(letter.to_ascii_uppercase())
}

/// Where each answer went: `new_position(original) -> display position`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffleMapping {
    new_positions: Vec<usize>,
}

impl ShuffleMapping {
    pub fn identity(len: usize) -> Self {
        Self {
            new_positions: (0..len).collect(),
        }
    }

    /// Build from a display order, where `order[display] = original`.
    pub fn from_display_order(order: &[usize]) -> Self {
        let mut new_positions = vec![0; order.len()];
        for (display, original) in order.iter().enumerate() {
            new_positions[*original] = display;
        }
        Self { new_positions }
    }

    pub fn random<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(rng);
        Self::from_display_order(&order)
    }

    pub fn len(&self) -> usize {
        self.new_positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.new_positions.is_empty()
    }

    pub fn new_position(&self, original: usize) -> Option<usize> {
        self.new_positions.get(original).copied()
    }

    pub fn original_position(&self, display: usize) -> Option<usize> {
        self.new_positions.iter().position(|p| *p == display)
    }
}

/// Rewrites stand-alone lower-case letter references ("a", "c") to the
/// letters the answers carry after shuffling, then puts conjoined letters
/// ("C, B y A") back in ascending order.
#[derive(Debug, Clone)]
pub struct ReferenceRemapper {
    letter: Regex,
    conjoined: Regex,
    upper_letter: Regex,
}

impl ReferenceRemapper {
    pub fn new<S: AsRef<str>>(conjunctions: &[S]) -> Result<Self> {
        let words: Vec<String> = conjunctions
            .iter()
            .map(|c| c.as_ref().trim())
            .filter(|c| !c.is_empty())
            .map(regex::escape)
            .collect();

        let separator = if words.is_empty() {
            r"\s*,\s*".to_string()
        } else {
            format!(r"(?:\s*,?\s+(?:{})\s+|\s*,\s*)", words.join("|"))
        };
        let conjoined = Regex::new(&format!(r"\b[A-Z](?:{}[A-Z])+\b", separator))
            .context("building conjoined-letter pattern")?;

        Ok(Self {
            letter: Regex::new(r"\b[a-z]\b").context("building letter pattern")?,
            conjoined,
            upper_letter: Regex::new(r"\b[A-Z]\b").context("building letter pattern")?,
        })
    }

    pub fn remap(&self, text: &str, mapping: &ShuffleMapping) -> String {
        let substituted = self.letter.replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            token
                .chars()
                .next()
                .and_then(position_of)
                .and_then(|original| mapping.new_position(original))
                .and_then(letter_for)
                .map(String::from)
                .unwrap_or_else(|| token.to_string())
        });

        self.conjoined
            .replace_all(&substituted, |caps: &Captures| self.sort_letters(&caps[0]))
            .into_owned()
    }

    fn sort_letters(&self, phrase: &str) -> String {
        let mut letters: Vec<&str> = self.upper_letter.find_iter(phrase).map(|m| m.as_str()).collect();
        letters.sort_unstable();
        let mut sorted = letters.into_iter();
        self.upper_letter
            .replace_all(phrase, |caps: &Captures| {
                sorted.next().map(str::to_string).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayAnswer {
    pub letter: char,
    pub text: String,
    pub correct: bool,
    pub original_position: usize,
}

/// One question as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub answers: Vec<DisplayAnswer>,
    pub correct_letters: BTreeSet<char>,
    pub explanation: Option<String>,
    pub mapping: ShuffleMapping,
}

impl Presentation {
    /// A question with no answer flagged correct cannot be failed.
    pub fn auto_pass(&self) -> bool {
        self.correct_letters.is_empty()
    }

    pub fn is_multi_select(&self) -> bool {
        self.correct_letters.len() > 1
    }
}

#[derive(Debug, Clone)]
pub struct Shuffler {
    remapper: ReferenceRemapper,
}

impl Shuffler {
    pub fn new(remapper: ReferenceRemapper) -> Self {
        Self { remapper }
    }

    pub fn remapper(&self) -> &ReferenceRemapper {
        &self.remapper
    }

    pub fn present<R: Rng + ?Sized>(&self, question: &Question, rng: &mut R) -> Presentation {
        let count = question.answers.len().min(LETTERS.len());
        self.present_with_mapping(question, ShuffleMapping::random(count, rng))
    }

    pub fn present_with_mapping(&self, question: &Question, mapping: ShuffleMapping) -> Presentation {
        if question.answers.len() > mapping.len() {
            warn!(
                answers = question.answers.len(),
                shown = mapping.len(),
                "Question has more answers than letters, extra answers are not shown"
            );
        }

        let mut answers: Vec<DisplayAnswer> = question
            .answers
            .iter()
            .enumerate()
            .filter_map(|(original, answer)| {
                let letter = mapping.new_position(original).and_then(letter_for)?;
                Some(DisplayAnswer {
                    letter,
                    text: self.remapper.remap(&answer.text, &mapping),
                    correct: answer.correct,
                    original_position: original,
                })
            })
            .collect();
        answers.sort_by_key(|answer| answer.letter);

        let correct_letters = answers
            .iter()
            .filter(|answer| answer.correct)
            .map(|answer| answer.letter)
            .collect();

        let explanation = question
            .explanation
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(|text| self.remapper.remap(text, &mapping));

        Presentation {
            answers,
            correct_letters,
            explanation,
            mapping,
        }
    }

    /// Feedback for the wrongly chosen letters, remapped like the explanation.
    pub fn wrong_feedback(
        &self,
        question: &Question,
        presentation: &Presentation,
        chosen: &BTreeSet<char>,
    ) -> Vec<String> {
        match &question.wrongmsg {
            None => Vec::new(),
            Some(WrongFeedback::Message(message)) if message.trim().is_empty() => Vec::new(),
            Some(WrongFeedback::Message(message)) => {
                vec![self.remapper.remap(message.trim(), &presentation.mapping)]
            }
            Some(WrongFeedback::PerChoice(messages)) => presentation
                .answers
                .iter()
                .filter(|answer| chosen.contains(&answer.letter) && !answer.correct)
                .filter_map(|answer| messages.get(answer.original_position))
                .map(|message| message.trim())
                .filter(|message| !message.is_empty())
                .map(|message| self.remapper.remap(message, &presentation.mapping))
                .collect(),
        }
    }
}

impl Default for Shuffler {
    fn default() -> Self {
        // The default conjunctions are plain words, so the patterns always build.
        let remapper = ReferenceRemapper::new(DEFAULT_CONJUNCTIONS)
            .unwrap_or_else(|e| unreachable!("default remapper patterns are valid: {e}"));
        Self { remapper }
    }
}
