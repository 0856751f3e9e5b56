use std::fs;
use std::path::PathBuf;

use esports_odds::feeds::{self, FeedProfile, Layout};
use esports_odds::pipeline::{ParseContext, run_feed};
use esports_odds::record::{BetType, Extracted, OddsRow, OddsSet, VoidReason};
use esports_odds::segment::{Segmenter, Token, segment, split_raw};
use esports_odds::table::split_rows;

// 2026-10-18 12:00:00 UTC
const SCRAPE_TIME: i64 = 1_792_324_800;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn ctx() -> ParseContext {
    ParseContext::at(SCRAPE_TIME)
}

fn rows_for(profile: &FeedProfile, fixture: &str) -> (Vec<OddsRow>, usize) {
    let out = run_feed(profile, &read_fixture(fixture), &ctx());
    let rows = out.records.iter().map(|r| r.to_odds_row()).collect();
    (rows, out.dropped_rows)
}

#[test]
fn egb_fixture_keeps_seven_token_rows() {
    let (rows, dropped) = rows_for(&feeds::egb(), "egb_page.txt");
    // The in-play row has no date and fails the arity filter.
    assert_eq!(dropped, 1);
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].team_1, "Astralis");
    assert_eq!(rows[0].team_2, "NaVi");
    assert_eq!(rows[0].team_1_odds, 1.85);
    assert_eq!(rows[0].team_2_odds, 1.95);
    assert_eq!(rows[0].draw_odds, -1.0);
    assert_eq!(rows[0].bet_type, "winner");
    assert_eq!(rows[0].match_time, 1_792_349_100);
    assert_eq!(rows[0].tournament_name, "ESL Pro League");
    assert_eq!(rows[0].scrape_time, SCRAPE_TIME);
    assert_eq!(rows[0].source, "egb");

    // One unparseable price voids both.
    assert_eq!(rows[1].team_1, "Vitality");
    assert_eq!(rows[1].team_1_odds, -1.0);
    assert_eq!(rows[1].team_2_odds, -1.0);
    assert_eq!(rows[1].match_time, 1_792_440_000);

    // The last row has no trailing marker and is still emitted.
    assert_eq!(rows[2].team_1, "MOUZ");
    assert_eq!(rows[2].tournament_name, "CCT Europe");
    assert_eq!(rows[2].match_time, 1_792_531_800);
}

#[test]
fn ggbet_fixture_resolves_blocks_in_page_order() {
    let out = run_feed(&feeds::ggbet(), &read_fixture("ggbet_page.txt"), &ctx());
    // The row above the first tournament header has no context.
    assert_eq!(out.dropped_rows, 1);
    assert_eq!(out.records.len(), 5);

    let names = out
        .records
        .iter()
        .map(|r| r.contestant_1.as_deref().unwrap_or("?"))
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Astralis", "Vitality", "FaZe", "MOUZ", "Spirit"]);

    let first = &out.records[0];
    assert_eq!(first.contestant_2.as_deref(), Some("NaVi"));
    assert_eq!(first.bet_type, BetType::ThreeWay);
    assert_eq!(first.odds, OddsSet::ThreeWay { c1: 2.10, c2: 1.95, draw: 3.40 });
    assert_eq!(first.match_time, Extracted::Found(1_792_349_100));
    assert_eq!(first.tournament_name.as_deref(), Some("BLAST Premier"));

    // Rows below a header inherit its tournament and market.
    let second = &out.records[1];
    assert_eq!(second.tournament_name.as_deref(), Some("BLAST Premier"));
    assert_eq!(second.bet_type, BetType::ThreeWay);
    assert_eq!(second.odds, OddsSet::ThreeWay { c1: 1.60, c2: 2.40, draw: 3.90 });
    assert_eq!(second.match_time, Extracted::Found(1_792_351_800));

    let live = &out.records[2];
    assert_eq!(live.tournament_name.as_deref(), Some("IEM Cologne"));
    assert_eq!(live.bet_type, BetType::Winner);
    assert_eq!(live.odds, OddsSet::Winner { c1: 1.45, c2: 2.70 });
    assert_eq!(live.match_time, Extracted::Absent);

    assert_eq!(out.records[3].odds, OddsSet::Void(VoidReason::Unparsed));
    assert_eq!(out.records[3].match_time, Extracted::Found(1_792_440_000));

    // No WINNER token in the row: prices fall back to the separator.
    let fallback = &out.records[4];
    assert_eq!(fallback.tournament_name.as_deref(), Some("IEM Cologne"));
    assert_eq!(fallback.odds, OddsSet::Winner { c1: 1.30, c2: 3.20 });
    assert_eq!(fallback.match_time, Extracted::Found(1_792_443_600));
}

#[test]
fn ggbet_live_row_writes_missing_match_time() {
    let (rows, _) = rows_for(&feeds::ggbet(), "ggbet_page.txt");
    assert_eq!(rows[2].match_time, -1);
    assert_eq!(rows[2].draw_odds, -1.0);
    assert_eq!(rows[0].bet_type, "three-way");
}

#[test]
fn rivalry_fixture_uses_day_markers() {
    let (rows, dropped) = rows_for(&feeds::rivalry(), "rivalry_page.txt");
    assert_eq!(dropped, 0);
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].team_1, "Astralis");
    assert_eq!(rows[0].team_2, "NaVi");
    assert_eq!(rows[0].team_1_odds, 1.85);
    assert_eq!(rows[0].team_2_odds, 1.95);
    assert_eq!(rows[0].tournament_name, "ESL Pro League");
    assert_eq!(rows[0].match_time, 1_792_349_100);

    assert_eq!(rows[1].team_1, "FaZe");
    assert_eq!(rows[1].team_2, "G2");
    assert_eq!(rows[1].team_1_odds, -1.0);
    assert_eq!(rows[1].team_2_odds, -1.0);
    assert_eq!(rows[1].match_time, 1_792_440_000);
}

#[test]
fn out_of_range_day_marker_invalidates_time_only() {
    let mut profile = feeds::rivalry();
    if let Layout::Scan(scan) = &mut profile.layout {
        scan.day_markers[0].days_from_today = i64::MAX / 2;
    }
    let out = run_feed(&profile, &read_fixture("rivalry_page.txt"), &ctx());
    assert_eq!(out.records.len(), 2);
    assert_eq!(out.records[0].match_time, Extracted::Invalid);
    assert_eq!(out.records[0].odds, OddsSet::Winner { c1: 1.85, c2: 1.95 });
    // The next marker restores the day context.
    assert_eq!(out.records[1].match_time, Extracted::Found(1_792_440_000));
}

#[test]
fn rivalry_without_start_marker_yields_nothing() {
    let out = run_feed(&feeds::rivalry(), "Astralis\n1.85\nVS\n1.95\nNaVi", &ctx());
    assert!(out.records.is_empty());
}

#[test]
fn segmentation_only_inserts_markers() {
    for (profile, fixture) in [
        (feeds::egb(), "egb_page.txt"),
        (feeds::ggbet(), "ggbet_page.txt"),
    ] {
        let tokens = split_raw(&read_fixture(fixture), &profile.separator);
        let marked = segment(tokens.clone(), &profile.segmenter);
        let restored = marked
            .iter()
            .filter_map(Token::as_text)
            .map(str::to_string)
            .collect::<Vec<_>>();
        assert_eq!(restored, tokens, "{fixture}");
        let spans: usize = split_rows(&marked).iter().map(Vec::len).sum();
        assert_eq!(spans, tokens.len(), "{fixture}");
    }
}

#[test]
fn range_rows_end_after_numeric_run() {
    let tokens = split_raw("A\nX\nB\nOver\nUnder\n1.5\n1.5\n2.0\nNextTeam\nX", "\n");
    let seg = Segmenter::Range { enter: ("Over".into(), "Under".into()) };
    let rows = split_rows(&segment(tokens, &seg));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].last().map(String::as_str), Some("2.0"));
    assert_eq!(rows[1][0], "NextTeam");
}

#[test]
fn configured_year_overrides_scrape_year() {
    let ctx = ParseContext::at(SCRAPE_TIME).with_year(Some(2019));
    let out = run_feed(&feeds::egb(), &read_fixture("egb_page.txt"), &ctx);
    // 2019-10-18 18:45 UTC
    assert_eq!(out.records[0].match_time, Extracted::Found(1_571_424_300));
}

#[test]
fn empty_page_is_not_an_error() {
    for profile in feeds::builtin() {
        let out = run_feed(&profile, "", &ctx());
        assert!(out.records.is_empty(), "{}", profile.source);
    }
}
