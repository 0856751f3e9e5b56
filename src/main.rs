use std::path::PathBuf;

use anyhow::{Context, Result};

use esports_odds::config::{ScrapeConfig, init_logger};
use esports_odds::feeds::{self, FeedProfile};
use esports_odds::page_source::source_for;
use esports_odds::persist::{RecordSink, RunStats, SqliteStore};
use esports_odds::pipeline::{ParseContext, run_feed};
use esports_odds::record::{MatchRecord, OddsRow};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = ScrapeConfig::from_env();
    init_logger(cfg.environment);

    let feed = parse_arg("--feed").context("missing --feed <source>")?;
    let target = parse_arg("--input").context("missing --input <page dump or url>")?;
    let profile = resolve_profile(&cfg, &feed)?;

    log::info!("Starting scrape job for {} table data.", profile.source);
    let ctx = ParseContext::now().with_year(cfg.year);
    let text = source_for(&target, cfg.http_timeout)?
        .fetch_text(&target)
        .with_context(|| format!("{} page retrieval failed", profile.source))?;

    let output = run_feed(&profile, &text, &ctx);
    let rows = output
        .records
        .iter()
        .map(MatchRecord::to_odds_row)
        .collect::<Vec<OddsRow>>();
    log::info!("Finished processing of {} rows.", rows.len());
    if rows.is_empty() {
        log::warn!("{} data scrape produced 0 data points.", profile.source);
        return Ok(());
    }

    if !cfg.should_persist() {
        for row in &rows {
            println!("{}", serde_json::to_string(row).context("serialize odds row")?);
        }
        return Ok(());
    }

    let db_path = parse_path_arg("--db")
        .or_else(|| cfg.db_path.clone())
        .context("unable to resolve sqlite path")?;
    let mut store = SqliteStore::new(db_path);
    log::info!("Inserting {} rows into database.", rows.len());
    let written = RecordSink::<OddsRow>::write(&mut store, &rows);
    store.record_run(
        &profile.source,
        ctx.scrape_time,
        &RunStats {
            parsed: rows.len(),
            written,
            dropped: output.dropped_rows,
        },
    );
    Ok(())
}

fn resolve_profile(cfg: &ScrapeConfig, feed: &str) -> Result<FeedProfile> {
    let mut profiles = feeds::builtin();
    if let Some(path) = cfg.feed_profiles.as_deref() {
        profiles = feeds::merge_profiles(profiles, feeds::load_profiles(path)?);
    }
    feeds::find_profile(&profiles, feed)
}

fn parse_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_arg(name).map(PathBuf::from)
}
