use chrono::{NaiveDate, TimeZone, Utc};
use sha2::{Digest, Sha256};

use crate::coerce::parse_score;
use crate::record::{MISSING, ResultRecord};
use crate::table::check_arity;

const HEADER_PREFIX: &str = "Results for";
const RESULT_LINES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsPage {
    pub headers: Vec<String>,
    pub entries: Vec<String>,
}

/// Splits a results page dump into date headers and result entries.
/// Entries are separated by blank lines.
pub fn split_entries(text: &str) -> ResultsPage {
    let mut page = ResultsPage::default();
    let normalized = text.replace("\r\n", "\n");
    for chunk in normalized.split("\n\n") {
        let chunk = chunk.trim_matches('\n');
        if chunk.trim().is_empty() {
            continue;
        }
        if chunk.trim_start().starts_with(HEADER_PREFIX) {
            page.headers.push(chunk.trim().to_string());
        } else {
            page.entries.push(chunk.to_string());
        }
    }
    page
}

/// Midnight UTC of a `Results for June 2nd 2019` header.
pub fn parse_header_date(header: &str) -> Option<i64> {
    let rest = header.trim().strip_prefix(HEADER_PREFIX)?;
    let mut parts = rest.split_whitespace();
    let month: String = parts.next()?.chars().take(3).collect();
    let day = parts.next()?.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let year = parts.next()?;
    let date = NaiveDate::parse_from_str(&format!("{month} {day} {year}"), "%b %d %Y").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).timestamp())
}

/// Mean of all parseable header dates; short headers are ignored.
pub fn average_header_date(headers: &[String]) -> Option<i64> {
    let dates: Vec<i64> = headers
        .iter()
        .filter(|h| h.len() >= 8)
        .filter_map(|h| {
            let parsed = parse_header_date(h);
            if parsed.is_none() {
                log::debug!("unparseable results header {h:?}");
            }
            parsed
        })
        .collect();
    if dates.is_empty() {
        return None;
    }
    Some(dates.iter().sum::<i64>() / dates.len() as i64)
}

pub fn hash_id(entry: &str) -> String {
    format!("{:x}", Sha256::digest(entry.as_bytes()))
}

/// One record per well-formed entry; returns the number of entries dropped.
pub fn transcribe(entries: &[String], match_time: Option<i64>) -> (Vec<ResultRecord>, usize) {
    let mut out = Vec::with_capacity(entries.len());
    let mut dropped = 0;
    for entry in entries {
        let lines: Vec<String> = entry.split('\n').map(|l| l.trim().to_string()).collect();
        if let Err(err) = check_arity(&lines, RESULT_LINES) {
            log::debug!("dropping result entry {entry:?}: {err}");
            dropped += 1;
            continue;
        }
        let (team_1_score, team_2_score) = parse_score(&lines[1]).unwrap_or_else(|| {
            log::debug!("unparseable score {:?}", lines[1]);
            (MISSING as i32, MISSING as i32)
        });
        out.push(ResultRecord {
            hash_id: hash_id(entry),
            team_1: lines[0].clone(),
            team_2: lines[2].clone(),
            team_1_score,
            team_2_score,
            tournament: lines[3].clone(),
            matchtype: lines[4].clone(),
            match_time: match_time.unwrap_or(MISSING),
        });
    }
    (out, dropped)
}

pub fn run_results(text: &str) -> (Vec<ResultRecord>, usize) {
    let page = split_entries(text);
    let match_time = average_header_date(&page.headers);
    let (records, dropped) = transcribe(&page.entries, match_time);
    log::info!(
        "results: {} records from {} entries, {} dropped",
        records.len(),
        page.entries.len(),
        dropped
    );
    (records, dropped)
}
