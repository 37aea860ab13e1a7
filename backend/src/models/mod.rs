//! Domain models for the report transformation pipeline.
//!
//! This module contains the core data structures passed between pipeline
//! stages:
//!
//! - [`RawRecord`] - A sanitized input row with financials still as text
//! - [`BillingRecord`] - A fully coerced billing row
//! - [`GroupKey`] - Trunk group + country destination grouping identity
//! - [`OutputRow`] - Detail / Subtotal / Spacer output variants
//! - [`ReportSummary`] - Counters rendered as the processing summary

use serde::{Deserialize, Serialize};

// =============================================================================
// Input Records
// =============================================================================

/// A single input row after column sanitization.
///
/// Financial fields are kept as raw text here: numeric coercion is a later
/// pipeline stage and must apply to every row that survives filtering, not
/// at extraction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub customer_relationship: String,
    pub trunk_group: String,
    pub country_destination: String,
    pub vendor: String,
    pub revenue: String,
    pub cost: String,
    pub profit: String,
}

/// A billing row with coerced financial values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingRecord {
    pub customer_relationship: String,
    pub trunk_group: String,
    pub country_destination: String,
    pub vendor: String,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
}

impl BillingRecord {
    /// Grouping identity of this row.
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            trunk_group: self.trunk_group.clone(),
            country_destination: self.country_destination.clone(),
        }
    }
}

// =============================================================================
// Group Key
// =============================================================================

/// Identity of an output group.
///
/// Two rows belong to the same group iff both fields are exactly equal,
/// case-sensitive. Group order follows first appearance in the filtered
/// input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub trunk_group: String,
    pub country_destination: String,
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.trunk_group, self.country_destination)
    }
}

// =============================================================================
// Output Rows
// =============================================================================

/// One row of the final report.
///
/// All three variants render to the same record shape; fields that do not
/// apply are written as empty strings, never as a null marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutputRow {
    /// One per surviving input row.
    Detail {
        record: BillingRecord,
        /// Present only when the percent column is enabled.
        profit_percent: Option<f64>,
    },
    /// One per group: column sums over the group's detail rows.
    Subtotal {
        revenue: f64,
        cost: f64,
        profit: f64,
        profit_percent: Option<f64>,
    },
    /// Fully blank row separating groups.
    Spacer,
}

impl OutputRow {
    pub fn is_detail(&self) -> bool {
        matches!(self, OutputRow::Detail { .. })
    }

    pub fn is_subtotal(&self) -> bool {
        matches!(self, OutputRow::Subtotal { .. })
    }

    pub fn is_spacer(&self) -> bool {
        matches!(self, OutputRow::Spacer)
    }

    /// Render this row as output fields, in header order.
    ///
    /// `include_profit_percent` must match the header the caller writes;
    /// it controls whether the trailing percent cell exists at all.
    pub fn to_fields(&self, include_profit_percent: bool) -> Vec<String> {
        let width = if include_profit_percent { 8 } else { 7 };
        let mut fields = match self {
            OutputRow::Detail {
                record,
                profit_percent,
            } => {
                let mut f = vec![
                    record.customer_relationship.clone(),
                    record.trunk_group.clone(),
                    record.country_destination.clone(),
                    record.vendor.clone(),
                    fmt_amount(record.revenue),
                    fmt_amount(record.cost),
                    fmt_amount(record.profit),
                ];
                if include_profit_percent {
                    f.push(profit_percent.map(fmt_amount).unwrap_or_default());
                }
                f
            }
            OutputRow::Subtotal {
                revenue,
                cost,
                profit,
                profit_percent,
            } => {
                let mut f = vec![
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    fmt_amount(*revenue),
                    fmt_amount(*cost),
                    fmt_amount(*profit),
                ];
                if include_profit_percent {
                    f.push(profit_percent.map(fmt_amount).unwrap_or_default());
                }
                f
            }
            OutputRow::Spacer => vec![String::new(); width],
        };
        fields.resize(width, String::new());
        fields
    }
}

/// Header row matching [`OutputRow::to_fields`].
pub fn output_header(include_profit_percent: bool) -> Vec<String> {
    let mut header = vec![
        "Customer Relationships".to_string(),
        "Trunk Group".to_string(),
        "Country Destination".to_string(),
        "Vendor".to_string(),
        "Revenue".to_string(),
        "Cost".to_string(),
        "Profit".to_string(),
    ];
    if include_profit_percent {
        header.push("Profit %".to_string());
    }
    header
}

/// Format a financial value for output cells.
///
/// Uses the shortest round-trip representation, so whole amounts print
/// without a trailing `.0`.
pub fn fmt_amount(value: f64) -> String {
    value.to_string()
}

// =============================================================================
// Summary
// =============================================================================

/// Counters gathered while processing one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Rows that survived filtering and were written as detail rows.
    pub processed_rows: usize,
    /// Rows whose vendor matched the zero-cost marker set.
    pub zero_cost_rows: usize,
    /// Distinct (trunk group, country destination) combinations.
    pub group_count: usize,
    /// Total rows in the output, subtotals and spacers included.
    pub output_rows: usize,
}

impl ReportSummary {
    /// Human-readable summary shown to the operator after processing.
    pub fn render(&self, file_name: &str) -> String {
        let mut text = String::from("Processing complete!\n\n");
        text.push_str(&format!("Total rows processed: {}\n", self.processed_rows));
        text.push_str(&format!(
            "Zero-cost vendors (Cost recalculated): {}\n",
            self.zero_cost_rows
        ));
        text.push_str(&format!(
            "Trunk Group + Country combinations: {}\n",
            self.group_count
        ));
        text.push_str(&format!("Output rows: {}\n", self.output_rows));
        text.push_str(&format!("\nFile saved as: {}", file_name));
        text
    }
}
