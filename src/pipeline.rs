use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};

use crate::coerce::{clock_on_day, joint_odds, match_timestamp};
use crate::extract::{
    TimeAnchor, classify_bet, extract_odds, group_blocks, time_anchor, token_at, tournament_name,
};
use crate::feeds::{BlockLayout, ColumnLayout, FeedProfile, Layout, ScanLayout};
use crate::record::{Extracted, MatchFields, MatchRecord, assemble};
use crate::segment::{cut_header, segment, split_raw};
use crate::table::{Row, retain_arity, split_rows};

/// Per-run values every extractor may need. Fixed at pipeline entry.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext {
    pub scrape_time: i64,
    /// Year assumed for year-less date tokens.
    pub year: i32,
    pub today: NaiveDate,
}

impl ParseContext {
    pub fn at(scrape_time: i64) -> Self {
        let now = DateTime::<Utc>::from_timestamp(scrape_time, 0).unwrap_or_default();
        Self {
            scrape_time,
            year: now.year(),
            today: now.date_naive(),
        }
    }

    pub fn now() -> Self {
        Self::at(Utc::now().timestamp())
    }

    pub fn with_year(mut self, year: Option<i32>) -> Self {
        if let Some(year) = year {
            self.year = year;
        }
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedOutput {
    pub records: Vec<MatchRecord>,
    /// Rows removed by the arity filter or lacking tournament context.
    pub dropped_rows: usize,
}

pub fn run_feed(profile: &FeedProfile, text: &str, ctx: &ParseContext) -> FeedOutput {
    let tokens = cut_header(split_raw(text, &profile.separator), &profile.header);
    let marked = segment(tokens, &profile.segmenter);
    let mut rows = split_rows(&marked);
    let mut dropped_rows = 0;
    if let Some(arity) = profile.arity {
        let (kept, dropped) = retain_arity(rows, arity);
        rows = kept;
        dropped_rows += dropped;
    }

    let fields: Vec<MatchFields> = match &profile.layout {
        Layout::Columns(layout) => rows.iter().map(|row| columns_row(row, layout, ctx)).collect(),
        Layout::Blocks(layout) => {
            let (fields, orphans) = block_fields(rows, layout, ctx);
            dropped_rows += orphans;
            fields
        }
        Layout::Scan(layout) => rows.iter().flat_map(|row| scan(row, layout, ctx)).collect(),
    };

    let records = fields
        .into_iter()
        .map(|f| assemble(f, ctx.scrape_time, &profile.source))
        .collect::<Vec<_>>();
    log::info!(
        "{}: {} records, {} rows dropped",
        profile.source,
        records.len(),
        dropped_rows
    );
    FeedOutput {
        records,
        dropped_rows,
    }
}

fn columns_row(row: &Row, layout: &ColumnLayout, ctx: &ParseContext) -> MatchFields {
    let cell = |idx: usize| row.get(idx).map(String::as_str);
    let odds = joint_odds(
        layout.bet_type,
        cell(layout.c1_odds),
        cell(layout.c2_odds),
        layout.draw_odds.and_then(cell),
    );
    let match_time = match (cell(layout.date), cell(layout.time)) {
        (Some(date), Some(time)) => match_timestamp(date, time, &layout.date_format, ctx.year),
        _ => Extracted::Invalid,
    };
    MatchFields {
        contestant_1: cell(layout.c1).map(str::to_string),
        contestant_2: cell(layout.c2).map(str::to_string),
        odds,
        bet_type: layout.bet_type,
        match_time,
        tournament_name: cell(layout.tournament).map(str::to_string),
    }
}

fn block_fields(
    rows: Vec<Row>,
    layout: &BlockLayout,
    ctx: &ParseContext,
) -> (Vec<MatchFields>, usize) {
    let stopwords: HashSet<String> = layout.stopwords.iter().cloned().collect();
    let (blocks, orphans) = group_blocks(rows, &layout.time_keyword, &stopwords);
    if orphans > 0 {
        log::debug!("{orphans} rows above the first tournament header");
    }

    let mut out = Vec::new();
    for block in &blocks {
        let Some(header) = block.header() else {
            continue;
        };
        let cut = time_anchor(header, &layout.time_keyword).map(TimeAnchor::index);
        let tournament = cut.and_then(|cut| tournament_name(&header[..cut], &stopwords));
        let bet_type = classify_bet(header, &layout.three_way_marker, &layout.winner_keyword);

        for row in &block.rows {
            let (contestant_1, contestant_2) = layout.contestants.apply(row);
            out.push(MatchFields {
                contestant_1,
                contestant_2,
                odds: extract_odds(row, bet_type, layout.odds_rules(bet_type)),
                bet_type,
                match_time: block_match_time(row, layout, ctx),
                tournament_name: tournament.clone(),
            });
        }
    }
    (out, orphans)
}

fn block_match_time(row: &[String], layout: &BlockLayout, ctx: &ParseContext) -> Extracted<i64> {
    match time_anchor(row, &layout.time_keyword) {
        Some(TimeAnchor::Clock(idx)) => match token_at(row, idx, layout.date_offset) {
            Some(date) => match_timestamp(date, &row[idx], &layout.date_format, ctx.year),
            None => Extracted::Invalid,
        },
        Some(TimeAnchor::Keyword(_)) => Extracted::Absent,
        None => Extracted::Invalid,
    }
}

fn scan(tokens: &[String], layout: &ScanLayout, ctx: &ParseContext) -> Vec<MatchFields> {
    let mut day: Option<NaiveDate> = None;
    let mut out = Vec::new();
    for (idx, token) in tokens.iter().enumerate() {
        if let Some(marker) = layout.day_markers.iter().find(|m| &m.token == token) {
            day = TimeDelta::try_days(marker.days_from_today)
                .and_then(|delta| ctx.today.checked_add_signed(delta));
            if day.is_none() {
                log::warn!(
                    "day marker {:?} is {} days out of range",
                    marker.token,
                    marker.days_from_today
                );
            }
        }
        if token != &layout.anchor {
            continue;
        }
        let at = |offset| token_at(tokens, idx, offset);
        let match_time = match (day, at(layout.time)) {
            (Some(day), Some(time)) => clock_on_day(day, time, &layout.time_suffix),
            _ => Extracted::Invalid,
        };
        out.push(MatchFields {
            contestant_1: at(layout.c1).map(str::to_string),
            contestant_2: at(layout.c2).map(str::to_string),
            odds: joint_odds(layout.bet_type, at(layout.c1_odds), at(layout.c2_odds), None),
            bet_type: layout.bet_type,
            match_time,
            tournament_name: at(layout.tournament).map(str::to_string),
        });
    }
    if out.is_empty() && !tokens.is_empty() {
        log::warn!("no {:?} anchors in {} tokens", layout.anchor, tokens.len());
    }
    out
}
