//! # P&L Analyzer
//!
//! A library for turning a tabular general-ledger extract into income-statement
//! metrics and prioritized, rule-based optimization findings.
//!
//! ## Core Concepts
//!
//! - **Code Registry**: static mapping from ledger code to name, category and
//!   statement-line type. Unknown codes are expected, never an error.
//! - **Classifier**: annotates raw rows from the registry and partitions known
//!   from unknown codes.
//! - **Metrics Engine**: reduces classified rows into the fixed cascade
//!   revenue → gross profit → EBITDA → EBIT → PBT, with zero-revenue margin
//!   guards.
//! - **Recommendation Engine**: a battery of independent threshold rules that
//!   produce a priority-ordered finding list.
//! - **Period Segmenter**: partitions rows by calendar month so the same pure
//!   engines can be re-run per period for trend and comparison views.
//!
//! ## Example
//!
//! ```rust
//! use pl_analyzer::{Analyzer, TabularData};
//!
//! let table = TabularData::new(
//!     ["gl_code", "amount"],
//!     vec![
//!         vec!["41110".to_string(), "1000000".to_string()],
//!         vec!["51711".to_string(), "-50000".to_string()],
//!     ],
//! );
//!
//! let report = Analyzer::default().analyze(&table).unwrap();
//! assert_eq!(report.metrics.total_revenue, 1_000_000.0);
//! ```

pub mod classifier;
pub mod error;
pub mod ingestion;
pub mod metrics;
pub mod periods;
pub mod recommend;
pub mod registry;

pub use classifier::{
    classify, ClassifiedDataset, ClassifiedRow, Classification, UnknownCodes,
    UNKNOWN_CODE_PREVIEW,
};
pub use error::{AnalyzerError, Result};
pub use ingestion::{ingest, RawRow, TabularData, UnparseablePeriod};
pub use metrics::{format_currency, format_percent, MetricsSnapshot};
pub use periods::{parse_period, period_label, segment};
pub use recommend::{evaluate, Priority, Recommendation, Thresholds};
pub use registry::{CodeEntry, CodeRegistry, StatementType};

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics and findings for a single calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub metrics: MetricsSnapshot,
    pub recommendations: Vec<Recommendation>,
}

/// Everything one analysis run produces for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// All rows with registry annotations, unknown rows included.
    pub dataset: ClassifiedDataset,
    /// Metrics over the full (all-periods) dataset.
    pub metrics: MetricsSnapshot,
    /// Findings over the full dataset, ordered by priority.
    pub recommendations: Vec<Recommendation>,
    /// Distinct codes that missed the registry.
    pub unknown_codes: UnknownCodes,
    /// Per-month breakdown, present only when the input carried a period
    /// column with at least one parseable value.
    pub by_period: Option<BTreeMap<NaiveDate, PeriodReport>>,
}

/// The analysis pipeline: registry, thresholds and period policy wired
/// together. Holds no per-run state; each `analyze` call works on its own
/// copy of the data, so one instance can serve any number of runs.
#[derive(Debug, Clone)]
pub struct Analyzer {
    registry: CodeRegistry,
    thresholds: Thresholds,
    period_policy: UnparseablePeriod,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            registry: CodeRegistry::standard(),
            thresholds: Thresholds::default(),
            period_policy: UnparseablePeriod::default(),
        }
    }
}

impl Analyzer {
    pub fn new(
        registry: CodeRegistry,
        thresholds: Thresholds,
        period_policy: UnparseablePeriod,
    ) -> Self {
        Self {
            registry,
            thresholds,
            period_policy,
        }
    }

    pub fn with_registry(mut self, registry: CodeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_period_policy(mut self, policy: UnparseablePeriod) -> Self {
        self.period_policy = policy;
        self
    }

    pub fn registry(&self) -> &CodeRegistry {
        &self.registry
    }

    /// Runs the full pipeline: ingest, classify, compute metrics, evaluate
    /// rules, and segment by period when a time dimension is present.
    ///
    /// Fails only at the ingestion boundary (missing column, malformed
    /// amount, or an unparseable period under the `Fail` policy); everything
    /// past it is absorbed into diagnostics.
    pub fn analyze(&self, table: &TabularData) -> Result<AnalysisReport> {
        info!(
            "Analyzing {} rows across {} columns",
            table.rows.len(),
            table.columns.len()
        );

        let raw_rows = ingest(table, self.period_policy)?;
        let (dataset, unknown_codes) = classify(&raw_rows, &self.registry);

        if let Some(warning) = unknown_codes.warning() {
            warn!("{}", warning);
        }
        debug!(
            "Classified {} rows ({} known, {} distinct unknown codes)",
            dataset.len(),
            dataset.known_rows().count(),
            unknown_codes.count()
        );

        let metrics = MetricsSnapshot::compute(&dataset);
        let recommendations = evaluate(&dataset, &metrics, &self.thresholds);

        let by_period = if dataset.has_periods() {
            let mut reports = BTreeMap::new();
            for (period, sub_dataset) in segment(&dataset) {
                let period_metrics = MetricsSnapshot::compute(&sub_dataset);
                let period_findings = evaluate(&sub_dataset, &period_metrics, &self.thresholds);
                reports.insert(
                    period,
                    PeriodReport {
                        metrics: period_metrics,
                        recommendations: period_findings,
                    },
                );
            }
            debug!("Segmented dataset into {} periods", reports.len());
            Some(reports)
        } else {
            None
        };

        info!(
            "Analysis complete: revenue {}, {} findings",
            format_currency(metrics.total_revenue),
            recommendations.len()
        );

        Ok(AnalysisReport {
            dataset,
            metrics,
            recommendations,
            unknown_codes,
            by_period,
        })
    }
}

/// Convenience wrapper running `Analyzer::default()` over a table.
pub fn analyze_table(table: &TabularData) -> Result<AnalysisReport> {
    Analyzer::default().analyze(table)
}
