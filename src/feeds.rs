use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::extract::{ContestantRule, OddsRule, TieBreak};
use crate::record::BetType;
use crate::segment::{HeaderCut, Segmenter};

/// Grammar of one upstream source. New feeds are added as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedProfile {
    pub source: String,
    #[serde(default = "default_separator")]
    pub separator: String,
    pub header: HeaderCut,
    pub segmenter: Segmenter,
    /// Exact token count of a well-formed row, when the feed has one.
    #[serde(default)]
    pub arity: Option<usize>,
    pub layout: Layout,
}

fn default_separator() -> String {
    "\n".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    Columns(ColumnLayout),
    Blocks(BlockLayout),
    Scan(ScanLayout),
}

/// Fixed column positions within a fixed-arity row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub date: usize,
    pub time: usize,
    pub tournament: usize,
    pub c1: usize,
    pub c1_odds: usize,
    pub c2: usize,
    pub c2_odds: usize,
    #[serde(default)]
    pub draw_odds: Option<usize>,
    pub bet_type: BetType,
    pub date_format: String,
}

/// Rows grouped under tournament headers; prices located by anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockLayout {
    pub time_keyword: String,
    /// Position of the date token relative to the clock token.
    pub date_offset: isize,
    pub date_format: String,
    pub stopwords: Vec<String>,
    pub three_way_marker: String,
    pub winner_keyword: String,
    pub contestants: ContestantRule,
    pub three_way_odds: Vec<OddsRule>,
    pub winner_odds: Vec<OddsRule>,
}

impl BlockLayout {
    pub fn odds_rules(&self, bet_type: BetType) -> &[OddsRule] {
        match bet_type {
            BetType::ThreeWay => &self.three_way_odds,
            BetType::Winner => &self.winner_odds,
            BetType::Unknown => &[],
        }
    }
}

/// Flat stream; one record per separator anchor, fields at fixed offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanLayout {
    pub anchor: String,
    pub c1: isize,
    pub c2: isize,
    pub c1_odds: isize,
    pub c2_odds: isize,
    pub tournament: isize,
    pub time: isize,
    #[serde(default)]
    pub time_suffix: String,
    /// Tokens that set the calendar day for the rows below them.
    pub day_markers: Vec<DayMarker>,
    pub bet_type: BetType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayMarker {
    pub token: String,
    pub days_from_today: i64,
}

const GGBET_STOPWORDS: &[&str] = &[
    "Counter-Strike",
    "Counter-Strike 2",
    "CS:GO",
    "CS2",
    "Esports",
    "LIVE",
    "Live",
    "Favourites",
    "Upcoming",
    "Show more",
    "WINNER",
    "1X2",
    "Over",
    "Under",
    "Total",
    "Handicap",
];

pub fn egb() -> FeedProfile {
    FeedProfile {
        source: "egb".to_string(),
        separator: default_separator(),
        header: HeaderCut::Skip { count: 6 },
        segmenter: Segmenter::Pattern {
            lead: 1,
            sentinels: vec!["Live!".to_string()],
        },
        arity: Some(7),
        layout: Layout::Columns(ColumnLayout {
            date: 0,
            time: 1,
            tournament: 2,
            c1: 3,
            c1_odds: 4,
            c2: 5,
            c2_odds: 6,
            draw_odds: None,
            bet_type: BetType::Winner,
            date_format: "%d.%m".to_string(),
        }),
    }
}

pub fn ggbet() -> FeedProfile {
    let x = |tie, c1, c2, draw| OddsRule {
        anchor: "X".to_string(),
        tie,
        c1,
        c2,
        draw,
    };
    FeedProfile {
        source: "ggbet".to_string(),
        separator: default_separator(),
        header: HeaderCut::After {
            cutoff: "RESULTS".to_string(),
        },
        segmenter: Segmenter::Range {
            enter: ("Over".to_string(), "Under".to_string()),
        },
        arity: None,
        layout: Layout::Blocks(BlockLayout {
            time_keyword: "TODAY".to_string(),
            date_offset: 1,
            date_format: "%b %d".to_string(),
            stopwords: GGBET_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            three_way_marker: "1X2".to_string(),
            winner_keyword: "WINNER".to_string(),
            contestants: ContestantRule {
                anchor: "X".to_string(),
                tie: TieBreak::First,
                c1: -1,
                c2: 1,
            },
            three_way_odds: vec![x(TieBreak::SecondOrFirst, 2, 3, Some(4))],
            winner_odds: vec![
                OddsRule {
                    anchor: "WINNER".to_string(),
                    tie: TieBreak::First,
                    c1: 1,
                    c2: 2,
                    draw: None,
                },
                x(TieBreak::First, 2, 3, None),
            ],
        }),
    }
}

pub fn rivalry() -> FeedProfile {
    FeedProfile {
        source: "rivalry".to_string(),
        separator: default_separator(),
        header: HeaderCut::Between {
            start: "Counter Strike Betting - Bet on Counter Strike Matches".to_string(),
            stop: "CONNECT WITH US:".to_string(),
        },
        segmenter: Segmenter::None,
        arity: None,
        layout: Layout::Scan(ScanLayout {
            anchor: "VS".to_string(),
            c1: -2,
            c2: 2,
            c1_odds: -1,
            c2_odds: 1,
            tournament: -4,
            time: -5,
            time_suffix: " UTC".to_string(),
            day_markers: vec![
                DayMarker {
                    token: "Today".to_string(),
                    days_from_today: 0,
                },
                DayMarker {
                    token: "Tomorrow".to_string(),
                    days_from_today: 1,
                },
            ],
            bet_type: BetType::Winner,
        }),
    }
}

pub fn builtin() -> Vec<FeedProfile> {
    vec![egb(), ggbet(), rivalry()]
}

/// Extra profiles from a JSON array; a profile with a builtin `source`
/// replaces the builtin.
pub fn load_profiles(path: &Path) -> Result<Vec<FeedProfile>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read feed profiles {}", path.display()))?;
    serde_json::from_str::<Vec<FeedProfile>>(&raw).context("invalid feed profiles json")
}

pub fn merge_profiles(mut base: Vec<FeedProfile>, extra: Vec<FeedProfile>) -> Vec<FeedProfile> {
    for profile in extra {
        match base.iter_mut().find(|p| p.source == profile.source) {
            Some(slot) => *slot = profile,
            None => base.push(profile),
        }
    }
    base
}

pub fn find_profile(profiles: &[FeedProfile], source: &str) -> Result<FeedProfile> {
    profiles
        .iter()
        .find(|p| p.source.eq_ignore_ascii_case(source))
        .cloned()
        .ok_or_else(|| {
            let known = profiles
                .iter()
                .map(|p| p.source.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            anyhow!("unknown feed {source:?}, expected one of: {known}")
        })
}
