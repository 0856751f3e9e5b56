use thiserror::Error;

use crate::segment::Token;

pub type Row = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("malformed row: expected {expected} fields, found {found}")]
    MalformedRow { expected: usize, found: usize },
}

/// One row per span between markers, trailing span included.
pub fn split_rows(tokens: &[Token]) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut row = Row::new();
    for token in tokens {
        match token {
            Token::Break => rows.push(std::mem::take(&mut row)),
            Token::Text(text) => row.push(text.clone()),
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }
    rows
}

pub fn check_arity(row: &[String], expected: usize) -> Result<(), RowError> {
    if row.len() == expected {
        Ok(())
    } else {
        Err(RowError::MalformedRow {
            expected,
            found: row.len(),
        })
    }
}

/// Keeps rows with exactly `expected` fields; returns the number dropped.
pub fn retain_arity(rows: Vec<Row>, expected: usize) -> (Vec<Row>, usize) {
    let total = rows.len();
    let kept: Vec<Row> = rows
        .into_iter()
        .filter(|row| match check_arity(row, expected) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("dropping {row:?}: {err}");
                false
            }
        })
        .collect();
    let dropped = total - kept.len();
    (kept, dropped)
}
