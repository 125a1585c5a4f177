use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The income-statement bucket a ledger code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementType {
    Revenue,
    #[serde(rename = "COGS")]
    Cogs,
    #[serde(rename = "OPEX")]
    Opex,
    #[serde(rename = "D&A")]
    DepreciationAmortization,
    Interest,
    #[serde(rename = "Non-Operating")]
    NonOperating,
}

impl StatementType {
    /// Display string matching the statement-line labels used in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::Revenue => "Revenue",
            StatementType::Cogs => "COGS",
            StatementType::Opex => "OPEX",
            StatementType::DepreciationAmortization => "D&A",
            StatementType::Interest => "Interest",
            StatementType::NonOperating => "Non-Operating",
        }
    }
}

impl std::fmt::Display for StatementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the registry knows about a single ledger code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub name: String,
    pub category: String,
    pub statement_type: StatementType,
}

/// Static mapping from ledger code to classification metadata.
///
/// Constructed once at startup and injected by reference wherever lookups are
/// needed; absence of a code is an expected outcome, not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeRegistry {
    entries: HashMap<String, CodeEntry>,
}

impl CodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, CodeEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Total lookup: `None` signals an unknown code.
    pub fn lookup(&self, code: &str) -> Option<&CodeEntry> {
        self.entries.get(code)
    }

    pub fn insert(&mut self, code: impl Into<String>, entry: CodeEntry) {
        self.entries.insert(code.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The standard airline chart of accounts this analyzer ships with.
    ///
    /// Codes are matched verbatim (case-sensitive, pre-trimmed by the
    /// classifier); the table is data, extending it never touches the
    /// downstream components.
    pub fn standard() -> Self {
        use StatementType::*;

        let table: &[(&str, &str, &str, StatementType)] = &[
        ("41110", "Scheduled Flight", "Flight Revenue", Revenue),
        ("41116", "Revenue - Loyalty Point Redemption", "Flight Revenue", Revenue),
        ("41150", "Refund and Chargeback", "Flight Revenue", Revenue),
        ("41151", "Refund", "Flight Revenue", Revenue),
        ("4160C", "Travel, Lifestyle and Shopping", "Non-Airline Direct Revenue", Revenue),
        ("41641", "Commission", "Non-Airline Direct Revenue", Revenue),
        ("41643", "Gross Billing - Merchandise", "Non-Airline Direct Revenue", Revenue),
        ("41648", "Inflight Shopping Commission", "Non-Airline Direct Revenue", Revenue),
        ("41654", "Gross Billing - Discount Pass", "Non-Airline Direct Revenue", Revenue),
        ("41658", "Advertising and Partnerships", "Non-Airline Direct Revenue", Revenue),
        ("41649", "Inflight Shopping Merchant Fees", "Non-Airline Direct Revenue", Revenue),
        ("41651", "Refund", "Non-Airline Direct Revenue", Revenue),
        ("41675", "Revenue - Discount", "Non-Airline Direct Revenue", Revenue),
        ("41332", "Revenue - Inflight Duty Free Onboard", "Non-Inflight Revenues", Revenue),
        ("41321", "Revenue - Inflight Merchandise Pre-book", "Non-Inflight Revenues", Revenue),
        ("41322", "Revenue - Inflight Merchandise Onboard", "Non-Inflight Revenues", Revenue),
        ("41331", "Revenue - Inflight Duty Free Pre-book", "Non-Inflight Revenues", Revenue),
        ("41264", "Revenue - Service Fees", "Non-Inflight Revenues", Revenue),
        ("42114", "Advertising - Publication", "Non-Inflight Revenues", Revenue),
        ("41801", "Management Fee", "Non-Inflight Revenues", Revenue),
        ("45130", "Gain / (Loss) on Disposal", "Other Income", Revenue),
        ("45132", "Other Income - Gain/(Loss) on Asset Disposal", "Other Income", Revenue),
        ("45150", "Others", "Other Income", Revenue),
        ("45199", "Other Income - Others", "Other Income", Revenue),
        ("51711", "Credit Card Commission", "Sales And Distribution", Cogs),
        ("51621", "Inflight Merchandise", "Sales And Distribution", Cogs),
        ("51631", "Duty Free", "Sales And Distribution", Cogs),
        ("51664", "Merchandise", "Sales And Distribution", Cogs),
        ("51717", "Commission paid to Partner", "Sales And Distribution", Cogs),
        ("51718", "Payment Gateway Fee", "Sales And Distribution", Cogs),
        ("51719", "Commission to AA.Com", "Sales And Distribution", Cogs),
        ("51726", "Collection Shortage", "Sales And Distribution", Cogs),
        ("51749", "Other Distribution Cost", "Sales And Distribution", Cogs),
        ("51754", "Merchant Fee", "Sales And Distribution", Cogs),
        ("51256", "Travelling - Others", "Sales And Distribution", Cogs),
        ("51536", "Freight Charges", "Sales And Distribution", Cogs),
        ("51610", "Inflight Meal and Beverage", "Sales And Distribution", Cogs),
        ("51615", "Inflight Amenities", "Sales And Distribution", Cogs),
        ("51640", "Other Inflight Cost", "Sales And Distribution", Cogs),
        ("51648", "Other Operating Cost - Inflight", "Sales And Distribution", Cogs),
        ("51912", "COS - First Mile/Last Mile", "Other Cost Of Sales", Cogs),
        ("51913", "COS - Teleportal", "Other Cost Of Sales", Cogs),
        ("51942", "Online Advertising Cost", "Other Cost Of Sales", Cogs),
        ("51966", "Point of Issuing Cost", "Other Cost Of Sales", Cogs),
        ("51211", "Basic Salary", "Direct Payroll", Opex),
        ("51215", "Allowance - Others", "Direct Payroll", Opex),
        ("51218", "Provident Fund - Employer", "Direct Payroll", Opex),
        ("51219", "Social Security Fund - Employer", "Direct Payroll", Opex),
        ("51251", "Human Resource Development Fund (HRDF)", "Direct Payroll", Opex),
        ("51257", "Accommodation - Hotels", "Direct Payroll", Opex),
        ("61111", "Basic Salary", "Indirect Payroll", Opex),
        ("61113", "Bonus", "Indirect Payroll", Opex),
        ("61114", "Allowance", "Indirect Payroll", Opex),
        ("61116", "Medical Expenses", "Indirect Payroll", Opex),
        ("61117", "Provident Fund - Employer", "Indirect Payroll", Opex),
        ("61118", "Social Security Fund - Employer", "Indirect Payroll", Opex),
        ("61149", "Other Payroll Cost", "Indirect Payroll", Opex),
        ("61151", "Human Resource Development Fund (HRDF)", "Indirect Payroll", Opex),
        ("61152", "Housing Fund Contribution", "Indirect Payroll", Opex),
        ("61153", "Training", "Indirect Payroll", Opex),
        ("61154", "Uniform & Accessories", "Indirect Payroll", Opex),
        ("61155", "Travelling - Air Ticket / Other Transport", "Indirect Payroll", Opex),
        ("61156", "Travelling - Others", "Indirect Payroll", Opex),
        ("61157", "Accommodation", "Indirect Payroll", Opex),
        ("61160", "Recruitment Expenses", "Indirect Payroll", Opex),
        ("61189", "Other Personnel Cost", "Indirect Payroll", Opex),
        ("61211", "Advertising - Outdoor", "Marketing & Advertising", Opex),
        ("61213", "Advertising - Radio", "Marketing & Advertising", Opex),
        ("61215", "Advertising - Internet", "Marketing & Advertising", Opex),
        ("61218", "Point Of Display", "Marketing & Advertising", Opex),
        ("61219", "Design/Production", "Marketing & Advertising", Opex),
        ("61220", "Events and Fairs", "Marketing & Advertising", Opex),
        ("61221", "Gift - General", "Marketing & Advertising", Opex),
        ("61223", "Sponsorship", "Marketing & Advertising", Opex),
        ("61226", "Special Projects", "Marketing & Advertising", Opex),
        ("61227", "Photography", "Marketing & Advertising", Opex),
        ("61228", "License Fee", "Marketing & Advertising", Opex),
        ("61229", "Web Transaction Fees", "Marketing & Advertising", Opex),
        ("61230", "Communication Materials", "Marketing & Advertising", Opex),
        ("61232", "Merchandise Consumption", "Marketing & Advertising", Opex),
        ("61233", "Loyalty Cost", "Marketing & Advertising", Opex),
        ("61237", "Regional Special Project", "Marketing & Advertising", Opex),
        ("61239", "Advertising - Always On Digital (MKT)", "Marketing & Advertising", Opex),
        ("61240", "Marketing Incentive", "Marketing & Advertising", Opex),
        ("61241", "Partnership Funds Spending", "Marketing & Advertising", Opex),
        ("61249", "Other Advertising Cost", "Marketing & Advertising", Opex),
        ("61311", "Group Hospitalisation", "Insurance", Opex),
        ("61312", "Group Term Life", "Insurance", Opex),
        ("61313", "Group Personal Accident", "Insurance", Opex),
        ("61349", "Other Insurance Cost", "Insurance", Opex),
        ("61411", "Management Fees", "Professional Fees", Opex),
        ("61412", "Audit Fees", "Professional Fees", Opex),
        ("61413", "Professional Fees", "Professional Fees", Opex),
        ("61415", "Secretarial Fees", "Professional Fees", Opex),
        ("61419", "Consultant Fees", "Professional Fees", Opex),
        ("61420", "Stamping Fees", "Professional Fees", Opex),
        ("61421", "Tax Fees", "Professional Fees", Opex),
        ("61422", "Fines / Penalties", "Professional Fees", Opex),
        ("61423", "Brand License Cost", "Professional Fees", Opex),
        ("61425", "AASEA Service Cost", "Professional Fees", Opex),
        ("61426", "ICT Shared Service Cost", "Professional Fees", Opex),
        ("61449", "Other Fees", "Professional Fees", Opex),
        ("61511", "Printing", "General & Administrative", Opex),
        ("61512", "Stationeries and Office Supplies", "General & Administrative", Opex),
        ("61513", "Telephone and Faxes", "General & Administrative", Opex),
        ("61514", "Utility", "General & Administrative", Opex),
        ("61515", "Postage & Courier", "General & Administrative", Opex),
        ("61516", "Entertainment - Staff", "General & Administrative", Opex),
        ("61517", "Entertainment - Business", "General & Administrative", Opex),
        ("61522", "Rental - Warehouse", "General & Administrative", Opex),
        ("61526", "Maintainance - Others", "General & Administrative", Opex),
        ("61527", "Refreshments", "General & Administrative", Opex),
        ("61532", "Staff Welfare", "General & Administrative", Opex),
        ("61535", "Maintenance - Office Equipment", "General & Administrative", Opex),
        ("61549", "Other Office Expenses", "General & Administrative", Opex),
        ("61552", "Communication Service - Internet Access Fee", "IT Expenses", Opex),
        ("61554", "Hosted System", "IT Expenses", Opex),
        ("61556", "Maintenance - Computer Software", "IT Expenses", Opex),
        ("61557", "License Fee - Computer Software", "IT Expenses", Opex),
        ("61558", "Web Services", "IT Expenses", Opex),
        ("61569", "Other IT Expenses", "IT Expenses", Opex),
        ("61713", "FA Expensed Off", "Other Operating Expenses", Opex),
        ("61714", "Provision for Doubtful Debts", "Other Operating Expenses", Opex),
        ("61716", "Provision for Impairment PPE", "Other Operating Expenses", Opex),
        ("61720", "AEP Expenses", "Other Operating Expenses", Opex),
        ("61724", "Rounding Account", "Other Operating Expenses", Opex),
        ("61727", "Bad Debts Written Off", "Other Operating Expenses", Opex),
        ("61725", "Imported Service Tax Expense", "Other Operating Expenses", Opex),
        ("617A6", "Provision for Impairment of Investment", "Other Operating Expenses", Opex),
        ("61629", "Depreciation - Computer Hardware", "Depreciation & Amortization", DepreciationAmortization),
        ("61630", "Depreciation - Computer Software", "Depreciation & Amortization", DepreciationAmortization),
        ("61685", "Amortisation - Intangibles", "Depreciation & Amortization", DepreciationAmortization),
        ("71111", "Interest Income - Bank Interest", "Interest Income", Interest),
        ("71121", "Term Loan Interest", "Interest Expense", Interest),
        ("71130", "Lease Interest - IFRS 16", "Interest Expense", Interest),
        ("71141", "Bank Charges", "Financial Charges", Interest),
        ("71142", "Bank Guarantee Charges", "Financial Charges", Interest),
        ("71149", "Other Financial Charges", "Financial Charges", Interest),
        ("81111", "FOREX - Realised Gain /(Loss)", "Forex", NonOperating),
        ("81121", "FOREX - Unrealised Gain/(Loss)", "Forex", NonOperating),
        ];

        Self {
            entries: table
                .iter()
                .map(|(code, name, category, statement_type)| {
                    (
                        (*code).to_string(),
                        CodeEntry {
                            name: (*name).to_string(),
                            category: (*category).to_string(),
                            statement_type: *statement_type,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_lookup() {
        let registry = CodeRegistry::standard();

        let entry = registry.lookup("41110").unwrap();
        assert_eq!(entry.name, "Scheduled Flight");
        assert_eq!(entry.category, "Flight Revenue");
        assert_eq!(entry.statement_type, StatementType::Revenue);

        let entry = registry.lookup("51711").unwrap();
        assert_eq!(entry.category, "Sales And Distribution");
        assert_eq!(entry.statement_type, StatementType::Cogs);

        let entry = registry.lookup("81121").unwrap();
        assert_eq!(entry.statement_type, StatementType::NonOperating);
    }

    #[test]
    fn test_absent_code_is_none_not_error() {
        let registry = CodeRegistry::standard();
        assert!(registry.lookup("99999").is_none());
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn test_alphanumeric_codes_present() {
        // Codes are strings, not numbers: some carry letters.
        let registry = CodeRegistry::standard();
        assert!(registry.lookup("4160C").is_some());
        assert!(registry.lookup("617A6").is_some());
    }

    #[test]
    fn test_custom_registry_substitution() {
        let mut registry = CodeRegistry::new();
        registry.insert(
            "1000",
            CodeEntry {
                name: "Test Sales".to_string(),
                category: "Sales".to_string(),
                statement_type: StatementType::Revenue,
            },
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("1000").unwrap().name, "Test Sales");
        assert!(registry.lookup("41110").is_none());
    }

    #[test]
    fn test_statement_type_display() {
        assert_eq!(StatementType::Cogs.to_string(), "COGS");
        assert_eq!(StatementType::DepreciationAmortization.to_string(), "D&A");
        assert_eq!(StatementType::NonOperating.to_string(), "Non-Operating");
    }
}
