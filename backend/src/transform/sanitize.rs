//! Stage (a): column sanitization and schema validation.
//!
//! Trims header whitespace, drops the informational call-quality columns
//! the review never looks at, and verifies the seven required billing
//! columns are present before any row is touched.

use serde_json::Value;

use crate::error::{ReportError, ReportResult};
use crate::models::RawRecord;

/// Columns the transformation requires, by trimmed header name.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Customer Relationships",
    "Trunk Group",
    "Country Destination",
    "Vendor",
    "Revenue",
    "Cost",
    "Profit",
];

/// Call-quality metric columns removed when present, by trimmed header name.
pub const DROPPED_COLUMNS: [&str; 13] = [
    "Attempts",
    "Completions",
    "Minutes",
    "ASR %",
    "NER %",
    "Aloc",
    "PPM",
    "PRV",
    "NEPR %",
    "SDR %",
    "MOS",
    "PDD",
    "LCR Depth",
];

/// The table after column pruning, ready for row filtering.
#[derive(Debug, Clone)]
pub struct SanitizedTable {
    /// Trimmed column names that survived pruning.
    pub columns: Vec<String>,
    /// Extracted rows, one per input row, original order.
    pub records: Vec<RawRecord>,
}

/// Prune and validate columns, then extract the billing fields.
///
/// Fails with [`ReportError::MissingColumns`] naming every absent required
/// column alongside the columns actually found; nothing is mutated on
/// failure. Unknown extra columns are tolerated and simply not extracted.
pub fn sanitize(headers: &[String], records: &[Value]) -> ReportResult<SanitizedTable> {
    // (trimmed name, original key) for every non-denylisted column.
    let kept: Vec<(String, &String)> = headers
        .iter()
        .map(|h| (h.trim().to_string(), h))
        .filter(|(trimmed, _)| !DROPPED_COLUMNS.contains(&trimmed.as_str()))
        .collect();

    let columns: Vec<String> = kept.iter().map(|(trimmed, _)| trimmed.clone()).collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|required| !columns.iter().any(|c| c.as_str() == *required))
        .map(str::to_string)
        .collect();

    if !missing.is_empty() {
        return Err(ReportError::MissingColumns {
            missing,
            found: columns,
        });
    }

    let key_of = |name: &str| -> String {
        // Present: checked above.
        kept.iter()
            .find(|(trimmed, _)| trimmed == name)
            .map(|(_, original)| (*original).clone())
            .unwrap()
    };

    let field = |record: &Value, key: &str| -> String {
        record
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    let customer_key = key_of("Customer Relationships");
    let trunk_key = key_of("Trunk Group");
    let country_key = key_of("Country Destination");
    let vendor_key = key_of("Vendor");
    let revenue_key = key_of("Revenue");
    let cost_key = key_of("Cost");
    let profit_key = key_of("Profit");

    let records = records
        .iter()
        .map(|record| RawRecord {
            customer_relationship: field(record, &customer_key),
            trunk_group: field(record, &trunk_key),
            country_destination: field(record, &country_key),
            vendor: field(record, &vendor_key),
            revenue: field(record, &revenue_key),
            cost: field(record, &cost_key),
            profit: field(record, &profit_key),
        })
        .collect();

    Ok(SanitizedTable { columns, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn full_headers() -> Vec<String> {
        headers(&[
            "Customer Relationships",
            "Trunk Group",
            "Country Destination",
            "Vendor",
            "Revenue",
            "Cost",
            "Profit",
        ])
    }

    #[test]
    fn test_extracts_required_fields() {
        let records = vec![json!({
            "Customer Relationships": "Acme",
            "Trunk Group": "T1",
            "Country Destination": "US",
            "Vendor": "ACME",
            "Revenue": "100",
            "Cost": "40",
            "Profit": "60",
        })];

        let table = sanitize(&full_headers(), &records).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].trunk_group, "T1");
        assert_eq!(table.records[0].revenue, "100");
    }

    #[test]
    fn test_drops_call_quality_columns() {
        let mut hdrs = full_headers();
        hdrs.push("ASR %".into());
        hdrs.push("MOS".into());

        let table = sanitize(&hdrs, &[]).unwrap();
        assert!(!table.columns.contains(&"ASR %".to_string()));
        assert!(!table.columns.contains(&"MOS".to_string()));
        assert_eq!(table.columns.len(), 7);
    }

    #[test]
    fn test_missing_column_error_names_missing_and_found() {
        let hdrs = headers(&[
            "Customer Relationships",
            "Trunk Group",
            "Country Destination",
            "Vendor",
            "Revenue",
            "Profit",
        ]);

        let err = sanitize(&hdrs, &[]).unwrap_err();
        match err {
            ReportError::MissingColumns { missing, found } => {
                assert_eq!(missing, vec!["Cost".to_string()]);
                assert!(found.contains(&"Revenue".to_string()));
                assert!(!found.contains(&"Cost".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_header_whitespace_is_trimmed() {
        let hdrs = headers(&[
            " Customer Relationships ",
            "Trunk Group",
            "Country Destination",
            "Vendor",
            "Revenue ",
            "Cost",
            "Profit",
        ]);
        let records = vec![json!({
            " Customer Relationships ": "Acme",
            "Trunk Group": "T1",
            "Country Destination": "US",
            "Vendor": "V",
            "Revenue ": "5",
            "Cost": "1",
            "Profit": "4",
        })];

        let table = sanitize(&hdrs, &records).unwrap();
        assert_eq!(table.records[0].customer_relationship, "Acme");
        assert_eq!(table.records[0].revenue, "5");
    }

    #[test]
    fn test_unknown_extra_columns_are_tolerated() {
        let mut hdrs = full_headers();
        hdrs.push("Route Notes".into());

        let table = sanitize(&hdrs, &[]).unwrap();
        // Kept in the column list, just never extracted into records.
        assert!(table.columns.contains(&"Route Notes".to_string()));
    }

    #[test]
    fn test_denylisted_column_not_listed_as_found() {
        let hdrs = headers(&["Attempts", "Vendor"]);
        let err = sanitize(&hdrs, &[]).unwrap_err();
        match err {
            ReportError::MissingColumns { found, .. } => {
                assert_eq!(found, vec!["Vendor".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
