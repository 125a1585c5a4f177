use crate::error::{AnalyzerError, Result};
use crate::periods::parse_period;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Recognized header aliases for the ledger-code column.
const CODE_ALIASES: &[&str] = &["gl_code", "gl code", "glcode", "ledger_code", "code"];
const AMOUNT_ALIASES: &[&str] = &["amount"];
const PERIOD_ALIASES: &[&str] = &["month", "period"];

/// The raw table handed over by the upload collaborator: a header row plus
/// string cells. Column names are matched case- and whitespace-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularData {
    pub fn new(
        columns: impl IntoIterator<Item = impl Into<String>>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
        }
    }
}

/// What to do with a row whose period value cannot be parsed.
///
/// The reference behavior is `Drop`: the row disappears from the run
/// entirely. `Keep` retains the row without a period (it still feeds the
/// all-periods metrics but no segment), `Fail` turns the first offender into
/// a terminal error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnparseablePeriod {
    #[default]
    Drop,
    Keep,
    Fail,
}

/// A transaction row as produced by ingestion, before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub code: String,
    pub amount: f64,
    /// Normalized to the first day of the calendar month.
    pub period: Option<NaiveDate>,
}

fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase()
}

fn find_column(columns: &[String], aliases: &[&str]) -> Option<usize> {
    columns
        .iter()
        .position(|c| aliases.contains(&normalize_header(c).as_str()))
}

/// Converts a raw table into transaction rows.
///
/// Fails before any classification when a required column is missing or an
/// amount cell is not numeric. Period handling follows `policy`; a table
/// without a period column yields rows with no period.
pub fn ingest(table: &TabularData, policy: UnparseablePeriod) -> Result<Vec<RawRow>> {
    let code_idx = find_column(&table.columns, CODE_ALIASES)
        .ok_or_else(|| AnalyzerError::MissingColumn("gl_code".to_string()))?;
    let amount_idx = find_column(&table.columns, AMOUNT_ALIASES)
        .ok_or_else(|| AnalyzerError::MissingColumn("amount".to_string()))?;
    let period_idx = find_column(&table.columns, PERIOD_ALIASES);

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut dropped = 0usize;

    for (row_number, cells) in table.rows.iter().enumerate() {
        let cell = |idx: usize| cells.get(idx).map(String::as_str).unwrap_or("");

        let amount_text = cell(amount_idx).trim().replace(',', "");
        let amount: f64 =
            amount_text
                .parse()
                .map_err(|_| AnalyzerError::InvalidAmount {
                    row: row_number,
                    value: cell(amount_idx).to_string(),
                })?;

        let period = match period_idx {
            Some(idx) => {
                let text = cell(idx);
                match parse_period(text) {
                    Some(date) => Some(date),
                    None => match policy {
                        UnparseablePeriod::Drop => {
                            dropped += 1;
                            continue;
                        }
                        UnparseablePeriod::Keep => None,
                        UnparseablePeriod::Fail => {
                            return Err(AnalyzerError::UnparseablePeriod {
                                row: row_number,
                                value: text.to_string(),
                            })
                        }
                    },
                }
            }
            None => None,
        };

        rows.push(RawRow {
            code: cell(code_idx).trim().to_string(),
            amount,
            period,
        });
    }

    if dropped > 0 {
        debug!("Dropped {} rows with unparseable periods", dropped);
    }

    Ok(rows)
}
