use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

use crate::record::{BetType, Extracted, OddsSet, VoidReason};

const CLOCK_FORMAT: &str = "%H:%M";

/// Single-field failure. Always resolved locally to a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("token missing at anchor offset")]
    MissingToken,
    #[error("not a number: {0:?}")]
    NotNumeric(String),
    #[error("unparseable timestamp {raw:?} for format {format:?}")]
    BadTimestamp { raw: String, format: String },
}

pub fn parse_odds(raw: &str) -> Result<f64, FieldError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(FieldError::NotNumeric(trimmed.to_string())),
    }
}

pub fn is_numeric(raw: &str) -> bool {
    parse_odds(raw).is_ok()
}

fn price(token: Option<&str>) -> Result<f64, FieldError> {
    parse_odds(token.ok_or(FieldError::MissingToken)?)
}

/// Validates the prices of one row as a unit.
///
/// A winner market ignores `draw`. Any failure voids the whole set.
pub fn joint_odds(
    bet_type: BetType,
    c1: Option<&str>,
    c2: Option<&str>,
    draw: Option<&str>,
) -> OddsSet {
    let parsed = match bet_type {
        BetType::Unknown => return OddsSet::Void(VoidReason::NoMarket),
        BetType::Winner => price(c1)
            .and_then(|c1| price(c2).map(|c2| OddsSet::Winner { c1, c2 })),
        BetType::ThreeWay => price(c1).and_then(|c1| {
            let c2 = price(c2)?;
            let draw = price(draw)?;
            Ok(OddsSet::ThreeWay { c1, c2, draw })
        }),
    };
    match parsed {
        Ok(set) => set,
        Err(err) => {
            log::debug!("voiding odds for {} market: {err}", bet_type.as_str());
            OddsSet::Void(VoidReason::Unparsed)
        }
    }
}

/// Builds a UTC timestamp from a year-less date token and a `H:MM` clock token.
pub fn match_timestamp(date: &str, time: &str, date_format: &str, year: i32) -> Extracted<i64> {
    let raw = format!("{} {} {year}", date.trim(), time.trim());
    let format = format!("{date_format} {CLOCK_FORMAT} %Y");
    match NaiveDateTime::parse_from_str(&raw, &format) {
        Ok(naive) => Extracted::Found(Utc.from_utc_datetime(&naive).timestamp()),
        Err(_) => {
            log::debug!("{}", FieldError::BadTimestamp { raw, format });
            Extracted::Invalid
        }
    }
}

/// Combines a known calendar day with a clock token such as `18:45 UTC`.
pub fn clock_on_day(day: NaiveDate, time: &str, suffix: &str) -> Extracted<i64> {
    let trimmed = time.trim();
    let clock = trimmed.strip_suffix(suffix).unwrap_or(trimmed).trim();
    match NaiveTime::parse_from_str(clock, CLOCK_FORMAT) {
        Ok(t) => Extracted::Found(Utc.from_utc_datetime(&day.and_time(t)).timestamp()),
        Err(_) => Extracted::Invalid,
    }
}

/// Parses `"16 - 12"` style scores.
pub fn parse_score(raw: &str) -> Option<(i32, i32)> {
    let (a, b) = raw.split_once('-')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odds_coercion_never_panics() {
        assert_eq!(parse_odds(" 2.10 "), Ok(2.10));
        assert!(parse_odds("").is_err());
        assert!(parse_odds("TeamB").is_err());
        assert!(parse_odds("NaN").is_err());
    }

    #[test]
    fn one_bad_price_voids_the_whole_three_way_set() {
        let set = joint_odds(BetType::ThreeWay, Some("2.10"), Some("1.95"), Some("-"));
        assert_eq!(set, OddsSet::Void(VoidReason::Unparsed));
        assert_eq!(set.sentinel_triple(), (-1.0, -1.0, -1.0));
    }

    #[test]
    fn missing_token_voids_winner_set() {
        let set = joint_odds(BetType::Winner, Some("1.50"), None, None);
        assert!(set.is_void());
    }

    #[test]
    fn winner_market_ignores_draw_token() {
        let set = joint_odds(BetType::Winner, Some("1.50"), Some("2.45"), Some("junk"));
        assert_eq!(set, OddsSet::Winner { c1: 1.5, c2: 2.45 });
    }

    #[test]
    fn unknown_market_has_no_odds() {
        let set = joint_odds(BetType::Unknown, Some("1.50"), Some("2.45"), None);
        assert_eq!(set, OddsSet::Void(VoidReason::NoMarket));
    }

    #[test]
    fn timestamps_from_dotted_and_month_name_dates() {
        let dotted = match_timestamp("18.10", "18:45", "%d.%m", 2026);
        assert_eq!(dotted, Extracted::Found(1_792_349_100));
        let named = match_timestamp("Oct 18", "9:05", "%b %d", 2026);
        assert_eq!(named, Extracted::Found(1_792_314_300));
    }

    #[test]
    fn placeholder_date_is_invalid_not_fatal() {
        assert_eq!(
            match_timestamp("TODAY", "18:45", "%b %d", 2026),
            Extracted::Invalid
        );
    }

    #[test]
    fn clock_on_day_strips_suffix() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(
            clock_on_day(day, "18:45 UTC", " UTC"),
            Extracted::Found(1_792_349_100)
        );
        assert_eq!(clock_on_day(day, "LIVE", " UTC"), Extracted::Invalid);
    }

    #[test]
    fn score_pairs() {
        assert_eq!(parse_score("16 - 12"), Some((16, 12)));
        assert_eq!(parse_score("2-0"), Some((2, 0)));
        assert_eq!(parse_score("forfeit"), None);
    }
}
