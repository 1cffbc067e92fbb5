//! Query parsing.
//!
//! A raw query is a space-separated sequence of terms; a leading `-` marks
//! a term the results must not contain. Parsed terms borrow from the raw
//! query string and are collapsed into ordered sets, so downstream ranking
//! iterates distinct terms in a stable order.

use std::collections::BTreeSet;

use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words, StopWordSet};

/// A query split into distinct plus-terms and minus-terms
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedQuery<'a> {
    pub plus: BTreeSet<&'a str>,
    pub minus: BTreeSet<&'a str>,
}

struct QueryWord<'a> {
    text: &'a str,
    is_minus: bool,
    is_stop: bool,
}

impl<'a> ParsedQuery<'a> {
    /// Parse a raw query against a stop-word set.
    ///
    /// Empty slices produced by adjacent or leading spaces are skipped;
    /// malformed terms (`-`, `--x`, control bytes) are rejected.
    pub fn parse(raw_query: &'a str, stop_words: &StopWordSet) -> Result<Self> {
        let mut query = ParsedQuery::default();
        for token in split_into_words(raw_query) {
            if token.is_empty() {
                continue;
            }
            let word = parse_query_word(token, stop_words)?;
            if word.is_stop {
                continue;
            }
            if word.is_minus {
                query.minus.insert(word.text);
            } else {
                query.plus.insert(word.text);
            }
        }
        Ok(query)
    }
}

fn parse_query_word<'a>(token: &'a str, stop_words: &StopWordSet) -> Result<QueryWord<'a>> {
    let (text, is_minus) = match token.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (token, false),
    };
    if is_minus && text.is_empty() {
        return Err(SearchError::EmptyMinusTerm(token.to_string()));
    }
    if is_minus && text.starts_with('-') {
        return Err(SearchError::DoubleMinusTerm(token.to_string()));
    }
    if !is_valid_word(text) {
        return Err(SearchError::InvalidWord(text.to_string()));
    }
    Ok(QueryWord {
        text,
        is_minus,
        is_stop: stop_words.contains(text),
    })
}
