use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;

use esports_odds::config::{ResultsBatchConfig, ScrapeConfig, init_logger};
use esports_odds::page_source::{PageSource, source_for};
use esports_odds::persist::{RecordSink, RunStats, SqliteStore};
use esports_odds::record::ResultRecord;
use esports_odds::results::run_results;

const FEED: &str = "results";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = ScrapeConfig::from_env();
    init_logger(cfg.environment);

    let mut store = if cfg.should_persist() {
        let db_path = parse_db_path_arg()
            .or_else(|| cfg.db_path.clone())
            .context("unable to resolve sqlite path")?;
        Some(SqliteStore::new(db_path))
    } else {
        None
    };

    if let Some(target) = parse_input_arg() {
        let source = source_for(&target, cfg.http_timeout)?;
        scrape_page(source.as_ref(), &target, store.as_mut())?;
        return Ok(());
    }

    let batch = ResultsBatchConfig::from_env();
    log::info!(
        "Starting batch scrape job for match results, offsets {}..{} step {}.",
        batch.offset_start,
        batch.offset_end,
        batch.offset_step
    );
    run_batch(&cfg, &batch, store.as_mut())
}

fn run_batch(
    cfg: &ScrapeConfig,
    batch: &ResultsBatchConfig,
    mut store: Option<&mut SqliteStore>,
) -> Result<()> {
    let mut rng = rand::thread_rng();
    let base_url = batch
        .base_url
        .as_deref()
        .context("RESULTS_URL must name a text-rendering results endpoint")?;
    let offsets = batch.offsets().collect::<Vec<_>>();
    let source = source_for(base_url, cfg.http_timeout)?;
    for (idx, offset) in offsets.iter().enumerate() {
        let url = format!("{base_url}{offset}");
        let written = scrape_page(source.as_ref(), &url, store.as_deref_mut())?;
        log::info!("Finished offset {offset}: {written} rows written.");

        if idx + 1 < offsets.len() {
            let min = batch.pace_min.as_millis() as u64;
            let max = batch.pace_max.as_millis() as u64;
            let delay = rng.gen_range(min..=max);
            thread::sleep(Duration::from_millis(delay));
        }
    }
    Ok(())
}

fn scrape_page(
    source: &dyn PageSource,
    target: &str,
    store: Option<&mut SqliteStore>,
) -> Result<usize> {
    let started_at = Utc::now().timestamp();
    let text = source
        .fetch_text(target)
        .with_context(|| format!("results page retrieval failed: {target}"))?;
    let (records, dropped) = run_results(&text);
    if records.is_empty() {
        log::warn!("Results scrape of {target} produced 0 data points.");
        return Ok(0);
    }

    let Some(store) = store else {
        for record in &records {
            println!("{}", serde_json::to_string(record).context("serialize result row")?);
        }
        return Ok(0);
    };

    log::info!("Upserting {} rows into database.", records.len());
    let written = RecordSink::<ResultRecord>::write(&mut *store, &records);
    store.record_run(
        FEED,
        started_at,
        &RunStats {
            parsed: records.len(),
            written,
            dropped,
        },
    );
    Ok(written)
}

fn parse_db_path_arg() -> Option<PathBuf> {
    parse_arg("--db").map(PathBuf::from)
}

fn parse_input_arg() -> Option<String> {
    parse_arg("--input")
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
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
