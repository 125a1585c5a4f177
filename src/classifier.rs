use crate::ingestion::RawRow;
use crate::registry::{CodeRegistry, StatementType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How many distinct unknown codes the diagnostic preview shows.
pub const UNKNOWN_CODE_PREVIEW: usize = 5;

/// Registry metadata attached to a row. Present as a whole or not at all:
/// a classified row never carries a name without its category and type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub name: String,
    pub category: String,
    pub statement_type: StatementType,
}

/// A transaction row after registry lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRow {
    pub code: String,
    pub amount: f64,
    pub period: Option<NaiveDate>,
    /// `None` marks an unknown code; such rows never reach aggregation.
    pub classification: Option<Classification>,
}

impl ClassifiedRow {
    pub fn is_known(&self) -> bool {
        self.classification.is_some()
    }

    pub fn statement_type(&self) -> Option<StatementType> {
        self.classification.as_ref().map(|c| c.statement_type)
    }

    pub fn category(&self) -> Option<&str> {
        self.classification.as_ref().map(|c| c.category.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.classification.as_ref().map(|c| c.name.as_str())
    }
}

/// An ordered set of classified rows.
///
/// Unknown-code rows are retained for display and diagnostics but are
/// invisible to every downstream consumer that goes through `known_rows`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedDataset {
    rows: Vec<ClassifiedRow>,
}

impl ClassifiedDataset {
    pub fn from_rows(rows: Vec<ClassifiedRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ClassifiedRow] {
        &self.rows
    }

    /// Rows that resolved against the registry; the only rows aggregation sees.
    pub fn known_rows(&self) -> impl Iterator<Item = &ClassifiedRow> {
        self.rows.iter().filter(|r| r.is_known())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_periods(&self) -> bool {
        self.rows.iter().any(|r| r.period.is_some())
    }

    /// Serializes the known rows as delimited text for download.
    ///
    /// Columns: gl_code, name, category, type, amount, plus month when any
    /// exported row carries a period.
    pub fn to_csv(&self) -> String {
        let with_month = self.known_rows().any(|r| r.period.is_some());

        let mut output = String::new();
        output.push_str("gl_code,name,category,type,amount");
        if with_month {
            output.push_str(",month");
        }
        output.push('\n');

        for row in self.rows() {
            let Some(classification) = &row.classification else {
                continue;
            };
            output.push_str(&format!(
                "{},{},{},{},{}",
                csv_field(&row.code),
                csv_field(&classification.name),
                csv_field(&classification.category),
                classification.statement_type,
                row.amount
            ));
            if with_month {
                output.push(',');
                if let Some(period) = row.period {
                    output.push_str(&crate::periods::period_label(period));
                }
            }
            output.push('\n');
        }

        output
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Distinct codes that missed the registry, surfaced for a warning banner.
/// Set semantics: a code appears once no matter how many rows carried it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnknownCodes {
    codes: BTreeSet<String>,
}

impl UnknownCodes {
    pub fn count(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    /// Up to `UNKNOWN_CODE_PREVIEW` codes for display.
    pub fn preview(&self) -> Vec<&str> {
        self.codes
            .iter()
            .take(UNKNOWN_CODE_PREVIEW)
            .map(String::as_str)
            .collect()
    }

    /// True when more codes exist than the preview shows.
    pub fn has_more(&self) -> bool {
        self.codes.len() > UNKNOWN_CODE_PREVIEW
    }

    /// Renders the user-facing warning line, or `None` when everything mapped.
    pub fn warning(&self) -> Option<String> {
        if self.codes.is_empty() {
            return None;
        }
        let suffix = if self.has_more() { "..." } else { "" };
        Some(format!(
            "{} GL codes not recognized: {}{}",
            self.count(),
            self.preview().join(", "),
            suffix
        ))
    }
}

/// Annotates each row with registry metadata.
///
/// Codes are trimmed and then matched verbatim against the registry's stored
/// case. An absent code is an expected outcome: the row is kept with no
/// classification and its code lands in the diagnostic set. Never fails.
pub fn classify(rows: &[RawRow], registry: &CodeRegistry) -> (ClassifiedDataset, UnknownCodes) {
    let mut classified = Vec::with_capacity(rows.len());
    let mut unknown = BTreeSet::new();

    for row in rows {
        let code = row.code.trim();
        let classification = registry.lookup(code).map(|entry| Classification {
            name: entry.name.clone(),
            category: entry.category.clone(),
            statement_type: entry.statement_type,
        });

        if classification.is_none() {
            unknown.insert(code.to_string());
        }

        classified.push(ClassifiedRow {
            code: code.to_string(),
            amount: row.amount,
            period: row.period,
            classification,
        });
    }

    (
        ClassifiedDataset { rows: classified },
        UnknownCodes { codes: unknown },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(code: &str, amount: f64) -> RawRow {
        RawRow {
            code: code.to_string(),
            amount,
            period: None,
        }
    }

    #[test]
    fn test_classify_known_and_unknown() {
        let registry = CodeRegistry::standard();
        let rows = vec![raw("41110", 1000.0), raw("99999", 50.0)];

        let (dataset, unknown) = classify(&rows, &registry);

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.known_rows().count(), 1);

        let known = &dataset.rows()[0];
        assert_eq!(known.name(), Some("Scheduled Flight"));
        assert_eq!(known.category(), Some("Flight Revenue"));
        assert_eq!(known.statement_type(), Some(StatementType::Revenue));

        assert!(!dataset.rows()[1].is_known());
        assert_eq!(unknown.count(), 1);
        assert!(unknown.contains("99999"));
    }

    #[test]
    fn test_codes_trimmed_before_lookup() {
        let registry = CodeRegistry::standard();
        let (dataset, unknown) = classify(&[raw("  41110 ", 10.0)], &registry);

        assert!(unknown.is_empty());
        assert_eq!(dataset.rows()[0].code, "41110");
        assert!(dataset.rows()[0].is_known());
    }

    #[test]
    fn test_unknown_codes_are_a_set() {
        let registry = CodeRegistry::standard();
        let rows = vec![raw("99999", 1.0), raw("99999", 2.0), raw("88888", 3.0)];

        let (_, unknown) = classify(&rows, &registry);

        assert_eq!(unknown.count(), 2);
        assert_eq!(unknown.preview(), vec!["88888", "99999"]);
        assert!(!unknown.has_more());
    }

    #[test]
    fn test_unknown_preview_capped_at_five() {
        let registry = CodeRegistry::standard();
        let rows: Vec<RawRow> = (0..7).map(|i| raw(&format!("X{}", i), 1.0)).collect();

        let (_, unknown) = classify(&rows, &registry);

        assert_eq!(unknown.count(), 7);
        assert_eq!(unknown.preview().len(), 5);
        assert!(unknown.has_more());

        let warning = unknown.warning().unwrap();
        assert!(warning.starts_with("7 GL codes not recognized: "));
        assert!(warning.ends_with("..."));
    }

    #[test]
    fn test_no_warning_when_all_known() {
        let registry = CodeRegistry::standard();
        let (_, unknown) = classify(&[raw("41110", 1.0)], &registry);
        assert_eq!(unknown.warning(), None);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let registry = CodeRegistry::standard();
        let rows = vec![raw("41110", 500.0), raw("51711", -20.0), raw("ZZZ", 1.0)];

        let (first, _) = classify(&rows, &registry);

        let reinput: Vec<RawRow> = first
            .rows()
            .iter()
            .map(|r| RawRow {
                code: r.code.clone(),
                amount: r.amount,
                period: r.period,
            })
            .collect();
        let (second, _) = classify(&reinput, &registry);

        assert_eq!(first, second);
    }

    #[test]
    fn test_to_csv_known_rows_only() {
        let registry = CodeRegistry::standard();
        let rows = vec![raw("41110", 1000.0), raw("99999", 5.0)];
        let (dataset, _) = classify(&rows, &registry);

        let csv = dataset.to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "gl_code,name,category,type,amount");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "41110,Scheduled Flight,Flight Revenue,Revenue,1000");
    }

    #[test]
    fn test_to_csv_quotes_embedded_commas() {
        let registry = CodeRegistry::standard();
        // "Travel, Lifestyle and Shopping" carries a comma in its display name.
        let (dataset, _) = classify(&[raw("4160C", 42.0)], &registry);

        let csv = dataset.to_csv();
        assert!(csv.contains("\"Travel, Lifestyle and Shopping\""));
    }
}
