use std::fs;
use std::path::PathBuf;

use esports_odds::results::{hash_id, run_results, split_entries};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn splits_headers_from_entries() {
    let page = split_entries(&read_fixture("results_page.txt"));
    assert_eq!(page.headers.len(), 2);
    assert_eq!(page.entries.len(), 4);
    assert!(page.headers[1].ends_with("October 19th 2026"));
}

#[test]
fn transcribes_fixture_with_average_header_date() {
    let (records, dropped) = run_results(&read_fixture("results_page.txt"));
    // MOUZ vs Heroic is missing its match type line.
    assert_eq!(dropped, 1);
    assert_eq!(records.len(), 3);

    // Mean of 2026-10-17 and 2026-10-19 midnight UTC.
    assert!(records.iter().all(|r| r.match_time == 1_792_281_600));

    let first = &records[0];
    assert_eq!(first.team_1, "Astralis");
    assert_eq!(first.team_2, "NaVi");
    assert_eq!((first.team_1_score, first.team_2_score), (16, 12));
    assert_eq!(first.tournament, "BLAST Premier");
    assert_eq!(first.matchtype, "bo3");
    assert_eq!(first.hash_id, hash_id("Astralis\n16 - 12\nNaVi\nBLAST Premier\nbo3"));

    assert_eq!(records[2].team_1, "Spirit");
    assert_eq!((records[2].team_1_score, records[2].team_2_score), (1, 2));
}

#[test]
fn page_without_headers_gets_missing_time() {
    let (records, dropped) = run_results("A\n2 - 0\nB\nCup\nbo1\n\nC\nlive\nD\nCup\nbo3");
    assert_eq!(dropped, 0);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.match_time == -1));
    assert_eq!((records[1].team_1_score, records[1].team_2_score), (-1, -1));
}

#[test]
fn hash_is_stable_across_pages() {
    let entry = "Astralis\n16 - 12\nNaVi\nBLAST Premier\nbo3";
    assert_eq!(hash_id(entry), hash_id(entry));
    assert_ne!(hash_id(entry), hash_id("Astralis\n16 - 13\nNaVi\nBLAST Premier\nbo3"));
    assert!(hash_id(entry).chars().all(|c| c.is_ascii_hexdigit()));
}
