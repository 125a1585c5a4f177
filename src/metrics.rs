use crate::classifier::ClassifiedDataset;
use crate::registry::StatementType;
use serde::{Deserialize, Serialize};

/// The fixed hierarchy of income-statement figures computed from one
/// classified dataset. Recomputed wholesale whenever the dataset or period
/// selection changes; never mutated in place.
///
/// Sign conventions: revenue is summed as stored (refunds may be negative),
/// COGS / OPEX / D&A are normalized to positive cost figures, interest is
/// split into income minus expense, non-operating keeps its sign (FX can
/// swing either way). All margins are percentages of total revenue and are
/// exactly 0 when revenue is 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_revenue: f64,
    pub total_cogs: f64,
    pub gross_profit: f64,
    pub gross_margin: f64,
    pub total_opex: f64,
    pub ebitda: f64,
    pub ebitda_margin: f64,
    pub total_da: f64,
    pub ebit: f64,
    pub ebit_margin: f64,
    pub net_interest: f64,
    pub non_operating: f64,
    pub pbt: f64,
    pub pbt_margin: f64,
}

impl MetricsSnapshot {
    /// Reduces a classified dataset into the metric cascade:
    /// revenue → gross profit → EBITDA → EBIT → PBT.
    ///
    /// Pure and deterministic; unknown-code rows never contribute. An empty
    /// dataset yields all zeros rather than a fault.
    pub fn compute(dataset: &ClassifiedDataset) -> Self {
        let mut revenue = 0.0;
        let mut cogs = 0.0;
        let mut opex = 0.0;
        let mut da = 0.0;
        let mut interest_income = 0.0;
        let mut interest_expense = 0.0;
        let mut non_operating = 0.0;

        for row in dataset.rows() {
            let Some(classification) = &row.classification else {
                continue;
            };
            match classification.statement_type {
                StatementType::Revenue => revenue += row.amount,
                StatementType::Cogs => cogs += row.amount,
                StatementType::Opex => opex += row.amount,
                StatementType::DepreciationAmortization => da += row.amount,
                StatementType::Interest => {
                    if classification.category == "Interest Income" {
                        interest_income += row.amount;
                    } else {
                        interest_expense += row.amount;
                    }
                }
                StatementType::NonOperating => non_operating += row.amount,
            }
        }

        // Costs are stored negative by convention; report them positive.
        let total_cogs = cogs.abs();
        let total_opex = opex.abs();
        let total_da = da.abs();

        let gross_profit = revenue - total_cogs;
        let ebitda = gross_profit - total_opex;
        let ebit = ebitda - total_da;
        let net_interest = interest_income - interest_expense.abs();
        let pbt = ebit + net_interest + non_operating;

        let margin = |value: f64| {
            if revenue != 0.0 {
                value / revenue * 100.0
            } else {
                0.0
            }
        };

        Self {
            total_revenue: revenue,
            total_cogs,
            gross_profit,
            gross_margin: margin(gross_profit),
            total_opex,
            ebitda,
            ebitda_margin: margin(ebitda),
            total_da,
            ebit,
            ebit_margin: margin(ebit),
            net_interest,
            non_operating,
            pbt,
            pbt_margin: margin(pbt),
        }
    }
}

/// Formats a monetary value as whole currency units with thousands grouping,
/// e.g. `$1,234,568` or `-$500`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round() as i64;
    let sign = if rounded < 0 { "-" } else { "" };
    format!("{}${}", sign, group_thousands(rounded.unsigned_abs()))
}

/// Formats a percentage to one decimal place, e.g. `12.3%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

fn group_thousands(mut value: u64) -> String {
    let mut groups = Vec::new();
    loop {
        let group = value % 1000;
        value /= 1000;
        if value == 0 {
            groups.push(group.to_string());
            break;
        }
        groups.push(format!("{:03}", group));
    }
    groups.reverse();
    groups.join(",")
}
