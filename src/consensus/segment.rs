//! Tokenizer
//!
//! A reading is split into whitespace-delimited segments. Each segment keeps
//! the whitespace that followed it in the source, so a consensus text can be
//! reassembled with the original line breaks and spacing.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

static TOKEN: OnceLock<Option<Regex>> = OnceLock::new();

fn token_pattern() -> Option<&'static Regex> {
    TOKEN.get_or_init(|| Regex::new(r"\S+").ok()).as_ref()
}

/// One token of a reading and the whitespace following it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub separator: &'a str,
}

impl<'a> Segment<'a> {
    /// Comparison key. Case folding is opt-in; by default keys are exact.
    pub fn key(&self, fold_case: bool) -> Cow<'a, str> {
        if fold_case {
            Cow::Owned(self.text.to_lowercase())
        } else {
            Cow::Borrowed(self.text)
        }
    }
}

/// Split `text` into segments. Leading whitespace is dropped.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    match token_pattern() {
        Some(re) => {
            let spans: Vec<(usize, usize)> = re.find_iter(text).map(|m| (m.start(), m.end())).collect();
            spans
                .iter()
                .enumerate()
                .map(|(i, &(start, end))| {
                    let next = spans.get(i + 1).map_or(text.len(), |&(s, _)| s);
                    Segment {
                        text: &text[start..end],
                        separator: &text[end..next],
                    }
                })
                .collect()
        }
        None => split_fallback(text),
    }
}

// Used only if the token pattern fails to compile.
fn split_fallback(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (token, tail) = rest.split_at(end);
        let sep_len = tail.len() - tail.trim_start().len();
        let (separator, next) = tail.split_at(sep_len);
        out.push(Segment { text: token, separator });
        rest = next;
    }
    out
}
