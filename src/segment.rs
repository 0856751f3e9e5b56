use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::coerce::is_numeric;

static CLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}:\d{1,2}$").unwrap());

pub fn is_clock(token: &str) -> bool {
    CLOCK_RE.is_match(token)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Break,
}

impl Token {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Token::Text(s) => Some(s),
            Token::Break => None,
        }
    }
}

/// Which part of the token stream carries the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeaderCut {
    Keep,
    /// Drop a fixed number of leading tokens.
    Skip { count: usize },
    /// Drop everything up to and including the first `cutoff` token.
    After { cutoff: String },
    /// Keep tokens strictly between `start` and the first `stop` after it.
    Between { start: String, stop: String },
}

/// How row boundaries are recovered from a flat token stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segmenter {
    /// Flat stream, no boundaries (anchor-scan feeds).
    None,
    /// Break `lead` tokens before every clock token, and right before any sentinel.
    Pattern { lead: usize, sentinels: Vec<String> },
    /// Break at the first non-numeric token after an `enter` pair.
    Range { enter: (String, String) },
}

/// Blank tokens carry no cell and are dropped.
pub fn split_raw(text: &str, separator: &str) -> Vec<String> {
    text.split(separator)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn cut_header(tokens: Vec<String>, cut: &HeaderCut) -> Vec<String> {
    match cut {
        HeaderCut::Keep => tokens,
        HeaderCut::Skip { count } => tokens.into_iter().skip(*count).collect(),
        HeaderCut::After { cutoff } => match tokens.iter().position(|t| t == cutoff) {
            Some(idx) => tokens.into_iter().skip(idx + 1).collect(),
            None => {
                log::warn!("header cutoff {cutoff:?} not found, keeping all tokens");
                tokens
            }
        },
        HeaderCut::Between { start, stop } => {
            let Some(from) = tokens.iter().position(|t| t == start) else {
                log::warn!("table start {start:?} not found");
                return Vec::new();
            };
            let until = tokens[from + 1..]
                .iter()
                .position(|t| t == stop)
                .map(|rel| from + 1 + rel)
                .unwrap_or(tokens.len());
            tokens[from + 1..until].to_vec()
        }
    }
}

/// First pass: marker positions against the unmodified sequence.
///
/// A position `p` means "a marker goes before `tokens[p]`". Positions at or
/// before the first token are dropped. The result is sorted and unique.
pub fn boundaries(tokens: &[String], segmenter: &Segmenter) -> Vec<usize> {
    let mut out = BTreeSet::new();
    match segmenter {
        Segmenter::None => {}
        Segmenter::Pattern { lead, sentinels } => {
            for (idx, token) in tokens.iter().enumerate() {
                if is_clock(token) {
                    if let Some(pos) = idx.checked_sub(*lead) {
                        out.insert(pos);
                    }
                } else if sentinels.iter().any(|s| s == token) {
                    out.insert(idx);
                }
            }
        }
        Segmenter::Range { enter } => {
            let mut in_range = false;
            for idx in 1..tokens.len() {
                if in_range && !is_numeric(&tokens[idx]) {
                    in_range = false;
                    out.insert(idx);
                } else if tokens[idx - 1] == enter.0 && tokens[idx] == enter.1 {
                    in_range = true;
                }
            }
        }
    }
    out.remove(&0);
    out.into_iter().collect()
}

/// Second pass: rebuild the sequence with markers at `positions` (sorted).
pub fn insert_markers(tokens: Vec<String>, positions: &[usize]) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len() + positions.len());
    let mut next = positions.iter().peekable();
    for (idx, token) in tokens.into_iter().enumerate() {
        while next.next_if(|&&p| p == idx).is_some() {
            out.push(Token::Break);
        }
        out.push(Token::Text(token));
    }
    out
}

pub fn segment(tokens: Vec<String>, segmenter: &Segmenter) -> Vec<Token> {
    let positions = boundaries(&tokens, segmenter);
    insert_markers(tokens, &positions)
}
