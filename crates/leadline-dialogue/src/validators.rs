//! Slot validators and text normalizers.
//!
//! Each validator takes the caller's utterance and returns the normalized
//! slot value, or `None` when the step should be asked again.

use crate::lexicon::Lexicon;
use leadline_types::Role;

/// Country calling code stripped from spoken Spanish numbers.
const COUNTRY_PREFIX: &str = "34";

/// Collapses runs of whitespace and trims.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Only the ASCII digits of `text`, in order.
pub fn digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Uppercases the first letter of each word and lowercases the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

pub fn validate_role(lexicon: &Lexicon, text: &str) -> Option<Role> {
    lexicon.role(&text.to_lowercase())
}

/// City or zone: any text of at least two characters, title-cased.
pub fn validate_place(text: &str) -> Option<String> {
    let text = normalize(text);
    if text.chars().count() >= 2 {
        Some(title_case(&text))
    } else {
        None
    }
}

/// Full name: at least two whitespace-separated tokens.
pub fn validate_name(text: &str) -> Option<String> {
    let text = normalize(text);
    if text.split(' ').count() >= 2 {
        Some(text)
    } else {
        None
    }
}

/// Spanish phone number: nine digits starting with 6, 7, 8 or 9.
///
/// A leading `34` is dropped when at least eleven digits were spoken,
/// keeping the trailing nine.
pub fn validate_phone(text: &str) -> Option<String> {
    let mut number = digits(text);
    if number.starts_with(COUNTRY_PREFIX) && number.len() >= 11 {
        number = number.split_off(number.len() - 9);
    }
    let valid = number.len() == 9 && matches!(number.as_bytes()[0], b'6'..=b'9');
    valid.then_some(number)
}

/// Free text of at least two characters, used for franchise details.
pub fn validate_free_text(text: &str) -> Option<String> {
    let text = normalize(text);
    (text.chars().count() >= 2).then_some(text)
}
