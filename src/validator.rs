use std::collections::BTreeSet;

pub const EXIT_SENTINEL: &str = "0";

pub fn is_exit_sentinel(user_text: &str) -> bool {
    user_text.trim() == EXIT_SENTINEL
}

/// Upper-cased tokens of a submission split on any run of commas, semicolons
/// or whitespace.
pub fn parse_letters(user_text: &str) -> Vec<String> {
    user_text
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_uppercase())
        .collect()
}

/// Whether a submission names exactly the correct letters, ignoring order and
/// delimiter style. Repeated tokens do not count as a match, and an empty
/// submission is never correct.
pub fn validate(user_text: &str, correct_letters: &BTreeSet<char>) -> bool {
    let tokens = parse_letters(user_text);
    if tokens.is_empty() || tokens.len() != correct_letters.len() {
        return false;
    }
    let submitted: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
    let expected: BTreeSet<String> = correct_letters.iter().map(|c| c.to_string()).collect();
    submitted.len() == expected.len() && expected.iter().all(|letter| submitted.contains(letter.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(s: &str) -> BTreeSet<char> {
        s.chars().collect()
    }

    #[test]
    fn test_delimiter_and_order_insensitive() {
        let correct = letters("AC");
        for input in ["A,C", "A C", "a;c", "a  c", "C,A", " c ; a ", "A, C", "c\ta"] {
            assert!(validate(input, &correct), "input {:?}", input);
        }
    }

    #[test]
    fn test_duplicate_tokens_rejected() {
        assert!(!validate("A,A", &letters("A")));
        assert!(!validate("A,A,C", &letters("AC")));
    }

    #[test]
    fn test_empty_submission_is_incorrect() {
        assert!(!validate("", &letters("A")));
        assert!(!validate(" ,; ", &letters("A")));
        assert!(!validate("", &BTreeSet::new()));
    }

    #[test]
    fn test_partial_and_extra_selections() {
        let correct = letters("AC");
        assert!(!validate("A", &correct));
        assert!(!validate("A,B,C", &correct));
        assert!(!validate("AC", &correct));
    }

    #[test]
    fn test_garbage_input_is_just_wrong() {
        assert!(!validate("¿?", &letters("A")));
        assert!(!validate("10", &letters("A")));
    }

    #[test]
    fn test_exit_sentinel() {
        assert!(is_exit_sentinel(" 0 "));
        assert!(!is_exit_sentinel("0,A"));
        assert_eq!(parse_letters("b; a,,c"), vec!["B", "A", "C"]);
    }
}
