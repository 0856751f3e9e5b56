use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};

use crate::record::{OddsRow, ResultRecord};

/// Consumer of normalized records. Never fails past this boundary: errors
/// are logged and reported as zero rows written.
pub trait RecordSink<R> {
    fn write(&mut self, records: &[R]) -> usize;
}

/// SQLite store. A connection is opened per batch and released on return.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub parsed: usize,
    pub written: usize,
    pub dropped: usize,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(&self) -> Result<Connection> {
        open_db(&self.path)
    }

    /// Appends a row to the run ledger. Failures are logged only.
    pub fn record_run(&self, feed: &str, started_at: i64, stats: &RunStats) {
        let outcome = self.open().and_then(|conn| {
            conn.execute(
                "INSERT INTO scrape_runs(feed, started_at, finished_at, rows_parsed, rows_written, rows_dropped)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    feed,
                    started_at,
                    Utc::now().timestamp(),
                    stats.parsed as i64,
                    stats.written as i64,
                    stats.dropped as i64
                ],
            )
            .context("insert scrape run")
        });
        if let Err(err) = outcome {
            log::warn!("failed to record {feed} run: {err:#}");
        }
    }

    fn try_insert_odds(&self, rows: &[OddsRow]) -> Result<usize> {
        let mut conn = self.open()?;
        let tx = conn.transaction().context("begin odds transaction")?;
        for row in rows {
            insert_odds(&tx, row)?;
        }
        tx.commit().context("commit odds transaction")?;
        Ok(rows.len())
    }

    fn try_upsert_results(&self, rows: &[ResultRecord]) -> Result<usize> {
        let mut conn = self.open()?;
        let tx = conn.transaction().context("begin results transaction")?;
        for row in rows {
            upsert_result(&tx, row)?;
        }
        tx.commit().context("commit results transaction")?;
        Ok(rows.len())
    }
}

impl RecordSink<OddsRow> for SqliteStore {
    fn write(&mut self, records: &[OddsRow]) -> usize {
        absorb("odds", records.len(), self.try_insert_odds(records))
    }
}

impl RecordSink<ResultRecord> for SqliteStore {
    fn write(&mut self, records: &[ResultRecord]) -> usize {
        absorb("results", records.len(), self.try_upsert_results(records))
    }
}

fn absorb(kind: &str, attempted: usize, outcome: Result<usize>) -> usize {
    match outcome {
        Ok(n) => {
            log::info!("inserted {n} {kind} rows");
            n
        }
        Err(err) => {
            log::error!("failed to insert {attempted} {kind} rows: {err:#}");
            0
        }
    }
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS odds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            team_1 TEXT NOT NULL,
            team_2 TEXT NOT NULL,
            team_1_odds REAL NOT NULL,
            team_2_odds REAL NOT NULL,
            draw_odds REAL NOT NULL,
            bet_type TEXT NOT NULL,
            scrape_time INTEGER NOT NULL,
            match_time INTEGER NOT NULL,
            tournament_name TEXT NOT NULL,
            source TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_odds_source ON odds(source);
        CREATE INDEX IF NOT EXISTS idx_odds_scrape_time ON odds(scrape_time);

        CREATE TABLE IF NOT EXISTS match_results (
            hash_id TEXT PRIMARY KEY,
            team_1 TEXT NOT NULL,
            team_2 TEXT NOT NULL,
            team_1_score INTEGER NOT NULL,
            team_2_score INTEGER NOT NULL,
            tournament TEXT NOT NULL,
            matchtype TEXT NOT NULL,
            match_time INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_results_match_time ON match_results(match_time);

        CREATE TABLE IF NOT EXISTS scrape_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            feed TEXT NOT NULL,
            started_at INTEGER NOT NULL,
            finished_at INTEGER NOT NULL,
            rows_parsed INTEGER NOT NULL,
            rows_written INTEGER NOT NULL,
            rows_dropped INTEGER NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn insert_odds(tx: &rusqlite::Transaction<'_>, r: &OddsRow) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO odds (
            team_1, team_2, team_1_odds, team_2_odds, draw_odds,
            bet_type, scrape_time, match_time, tournament_name, source
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            r.team_1,
            r.team_2,
            r.team_1_odds,
            r.team_2_odds,
            r.draw_odds,
            r.bet_type,
            r.scrape_time,
            r.match_time,
            r.tournament_name,
            r.source,
        ],
    )
    .context("insert odds row")?;
    Ok(())
}

fn upsert_result(tx: &rusqlite::Transaction<'_>, r: &ResultRecord) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO match_results (
            hash_id, team_1, team_2, team_1_score, team_2_score,
            tournament, matchtype, match_time
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(hash_id) DO UPDATE SET
            match_time = excluded.match_time
        "#,
        params![
            r.hash_id,
            r.team_1,
            r.team_2,
            r.team_1_score,
            r.team_2_score,
            r.tournament,
            r.matchtype,
            r.match_time,
        ],
    )
    .context("upsert match result")?;
    Ok(())
}

pub fn load_odds(conn: &Connection, source: &str) -> Result<Vec<OddsRow>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT team_1, team_2, team_1_odds, team_2_odds, draw_odds,
                   bet_type, scrape_time, match_time, tournament_name, source
            FROM odds
            WHERE source = ?1
            ORDER BY id ASC
            "#,
        )
        .context("prepare load odds query")?;
    let rows = stmt
        .query_map(params![source], |row| {
            Ok(OddsRow {
                team_1: row.get(0)?,
                team_2: row.get(1)?,
                team_1_odds: row.get(2)?,
                team_2_odds: row.get(3)?,
                draw_odds: row.get(4)?,
                bet_type: row.get(5)?,
                scrape_time: row.get(6)?,
                match_time: row.get(7)?,
                tournament_name: row.get(8)?,
                source: row.get(9)?,
            })
        })
        .context("query load odds")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode odds row")?);
    }
    Ok(out)
}

pub fn load_results(conn: &Connection) -> Result<Vec<ResultRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT hash_id, team_1, team_2, team_1_score, team_2_score,
                   tournament, matchtype, match_time
            FROM match_results
            ORDER BY hash_id ASC
            "#,
        )
        .context("prepare load results query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ResultRecord {
                hash_id: row.get(0)?,
                team_1: row.get(1)?,
                team_2: row.get(2)?,
                team_1_score: row.get(3)?,
                team_2_score: row.get(4)?,
                tournament: row.get(5)?,
                matchtype: row.get(6)?,
                match_time: row.get(7)?,
            })
        })
        .context("query load results")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode result row")?);
    }
    Ok(out)
}

pub fn count_runs(conn: &Connection, feed: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM scrape_runs WHERE feed = ?1",
        params![feed],
        |row| row.get::<_, i64>(0),
    )
    .context("count scrape runs")
}
