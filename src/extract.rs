use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::coerce::joint_odds;
use crate::record::{BetType, OddsSet};
use crate::segment::is_clock;
use crate::table::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    First,
    /// Second occurrence when the anchor repeats, else the first.
    SecondOrFirst,
}

/// Index of the `skip`-th token equal to `needle`.
pub fn find_exact(row: &[String], needle: &str, skip: usize) -> Option<usize> {
    row.iter()
        .enumerate()
        .filter(|(_, token)| *token == needle)
        .nth(skip)
        .map(|(idx, _)| idx)
}

pub fn find_containing(row: &[String], needle: &str) -> Option<usize> {
    row.iter().position(|token| token.contains(needle))
}

pub fn find_clock(row: &[String]) -> Option<usize> {
    row.iter().position(|token| is_clock(token))
}

pub fn find_anchor(row: &[String], needle: &str, tie: TieBreak) -> Option<usize> {
    match tie {
        TieBreak::First => find_exact(row, needle, 0),
        TieBreak::SecondOrFirst => {
            find_exact(row, needle, 1).or_else(|| find_exact(row, needle, 0))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAnchor {
    Clock(usize),
    /// In-progress match; the kickoff time is not on the page.
    Keyword(usize),
}

impl TimeAnchor {
    pub fn index(self) -> usize {
        match self {
            TimeAnchor::Clock(idx) | TimeAnchor::Keyword(idx) => idx,
        }
    }
}

pub fn time_anchor(row: &[String], keyword: &str) -> Option<TimeAnchor> {
    find_clock(row)
        .map(TimeAnchor::Clock)
        .or_else(|| find_containing(row, keyword).map(TimeAnchor::Keyword))
}

/// Exact-match tournament name: the token set minus stopwords must hold
/// exactly one distinct token.
pub fn tournament_name<'a, I>(tokens: I, stopwords: &HashSet<String>) -> Option<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let remaining: HashSet<&String> = tokens
        .into_iter()
        .filter(|token| !stopwords.contains(*token))
        .collect();
    if remaining.len() != 1 {
        return None;
    }
    remaining.into_iter().next().cloned()
}

pub fn classify_bet(row: &[String], three_way_marker: &str, winner_keyword: &str) -> BetType {
    if row.concat().contains(three_way_marker) {
        BetType::ThreeWay
    } else if find_exact(row, winner_keyword, 0).is_some() {
        BetType::Winner
    } else {
        BetType::Unknown
    }
}

pub fn token_at(row: &[String], idx: usize, offset: isize) -> Option<&str> {
    let pos = idx.checked_add_signed(offset)?;
    row.get(pos).map(String::as_str)
}

/// Price positions relative to an anchor token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsRule {
    pub anchor: String,
    pub tie: TieBreak,
    pub c1: isize,
    pub c2: isize,
    #[serde(default)]
    pub draw: Option<isize>,
}

impl OddsRule {
    /// `None` when the anchor is absent, so the caller can try the next rule.
    pub fn apply(&self, row: &[String], bet_type: BetType) -> Option<OddsSet> {
        let idx = find_anchor(row, &self.anchor, self.tie)?;
        let draw = self.draw.and_then(|offset| token_at(row, idx, offset));
        Some(joint_odds(
            bet_type,
            token_at(row, idx, self.c1),
            token_at(row, idx, self.c2),
            draw,
        ))
    }
}

/// First rule whose anchor is present decides the prices.
pub fn extract_odds(row: &[String], bet_type: BetType, rules: &[OddsRule]) -> OddsSet {
    rules
        .iter()
        .find_map(|rule| rule.apply(row, bet_type))
        .unwrap_or_else(|| joint_odds(bet_type, None, None, None))
}

/// Contestant positions relative to a separator token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestantRule {
    pub anchor: String,
    pub tie: TieBreak,
    pub c1: isize,
    pub c2: isize,
}

impl ContestantRule {
    pub fn apply(&self, row: &[String]) -> (Option<String>, Option<String>) {
        let Some(idx) = find_anchor(row, &self.anchor, self.tie) else {
            return (None, None);
        };
        (
            token_at(row, idx, self.c1).map(str::to_string),
            token_at(row, idx, self.c2).map(str::to_string),
        )
    }
}

/// Rows sharing one tournament header, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentBlock {
    pub rows: Vec<Row>,
}

impl TournamentBlock {
    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }
}

/// Tournament name carried by the tokens before a row's time anchor.
pub fn header_name(row: &[String], keyword: &str, stopwords: &HashSet<String>) -> Option<String> {
    let cut = time_anchor(row, keyword)?.index();
    tournament_name(&row[..cut], stopwords)
}

/// Groups rows into tournament blocks by scanning from the bottom of the page.
///
/// A row with a resolvable tournament name closes the block collected so far.
/// Rows above the first header have no tournament context; they are returned
/// as the orphan count.
pub fn group_blocks(
    rows: Vec<Row>,
    keyword: &str,
    stopwords: &HashSet<String>,
) -> (Vec<TournamentBlock>, usize) {
    let mut blocks = Vec::new();
    let mut current: Vec<Row> = Vec::new();
    for row in rows.into_iter().rev() {
        let is_header = header_name(&row, keyword, stopwords).is_some();
        current.push(row);
        if is_header {
            current.reverse();
            blocks.push(TournamentBlock {
                rows: std::mem::take(&mut current),
            });
        }
    }
    blocks.reverse();
    (blocks, current.len())
}
