use serde::{Deserialize, Serialize};

pub const NA: &str = "NA";
pub const MISSING: i64 = -1;
const MISSING_ODDS: f64 = -1.0;

/// Outcome of extracting a single optional field.
///
/// `Absent` means the page never carried the value (a live match has no
/// kickoff time), `Invalid` means a token was there but did not parse.
/// Both collapse to the same sentinel when written out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extracted<T> {
    Found(T),
    Absent,
    Invalid,
}

impl<T> Extracted<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Extracted::Found(v) => Some(v),
            _ => None,
        }
    }
}

impl Extracted<i64> {
    pub fn or_sentinel(self) -> i64 {
        self.found().unwrap_or(MISSING)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetType {
    #[serde(rename = "winner")]
    Winner,
    #[serde(rename = "three-way")]
    ThreeWay,
    #[serde(rename = "NA")]
    Unknown,
}

impl BetType {
    pub fn as_str(self) -> &'static str {
        match self {
            BetType::Winner => "winner",
            BetType::ThreeWay => "three-way",
            BetType::Unknown => NA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoidReason {
    /// Market type could not be determined for the row.
    NoMarket,
    /// At least one price token was missing or non-numeric.
    Unparsed,
}

/// Prices for one row. Either the full set for the market or nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OddsSet {
    Winner { c1: f64, c2: f64 },
    ThreeWay { c1: f64, c2: f64, draw: f64 },
    Void(VoidReason),
}

impl OddsSet {
    pub fn is_void(&self) -> bool {
        matches!(self, OddsSet::Void(_))
    }

    /// `(contestant_1, contestant_2, draw)` with -1 for anything not quoted.
    pub fn sentinel_triple(&self) -> (f64, f64, f64) {
        match *self {
            OddsSet::Winner { c1, c2 } => (c1, c2, MISSING_ODDS),
            OddsSet::ThreeWay { c1, c2, draw } => (c1, c2, draw),
            OddsSet::Void(_) => (MISSING_ODDS, MISSING_ODDS, MISSING_ODDS),
        }
    }
}

/// Field set produced by one extraction pass over a row.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFields {
    pub contestant_1: Option<String>,
    pub contestant_2: Option<String>,
    pub odds: OddsSet,
    pub bet_type: BetType,
    pub match_time: Extracted<i64>,
    pub tournament_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub contestant_1: Option<String>,
    pub contestant_2: Option<String>,
    pub odds: OddsSet,
    pub bet_type: BetType,
    pub scrape_time: i64,
    pub match_time: Extracted<i64>,
    pub tournament_name: Option<String>,
    pub source: String,
}

pub fn assemble(fields: MatchFields, scrape_time: i64, source: &str) -> MatchRecord {
    MatchRecord {
        contestant_1: fields.contestant_1,
        contestant_2: fields.contestant_2,
        odds: fields.odds,
        bet_type: fields.bet_type,
        scrape_time,
        match_time: fields.match_time,
        tournament_name: fields.tournament_name,
        source: source.to_string(),
    }
}

impl MatchRecord {
    pub fn to_odds_row(&self) -> OddsRow {
        let (team_1_odds, team_2_odds, draw_odds) = self.odds.sentinel_triple();
        OddsRow {
            team_1: or_na(self.contestant_1.as_deref()),
            team_2: or_na(self.contestant_2.as_deref()),
            team_1_odds,
            team_2_odds,
            draw_odds,
            bet_type: self.bet_type.as_str().to_string(),
            scrape_time: self.scrape_time,
            match_time: self.match_time.or_sentinel(),
            tournament_name: or_na(self.tournament_name.as_deref()),
            source: self.source.clone(),
        }
    }
}

/// Odds schema row as stored. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsRow {
    pub team_1: String,
    pub team_2: String,
    pub team_1_odds: f64,
    pub team_2_odds: f64,
    pub draw_odds: f64,
    pub bet_type: String,
    pub scrape_time: i64,
    pub match_time: i64,
    pub tournament_name: String,
    pub source: String,
}

/// Results schema row; `hash_id` is the upsert key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub hash_id: String,
    pub team_1: String,
    pub team_2: String,
    pub team_1_score: i32,
    pub team_2_score: i32,
    pub tournament: String,
    pub matchtype: String,
    pub match_time: i64,
}

fn or_na(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NA.to_string(),
    }
}
