//! Stage (b): row filtering.
//!
//! Rows without a vendor or a country destination are routing artifacts
//! (region header lines, switch totals) and carry no billable traffic.

use crate::error::{ReportError, ReportResult};
use crate::models::RawRecord;

/// Drop rows whose `Vendor` or `Country Destination` is empty or
/// whitespace-only after trimming.
///
/// The filter is stable: survivors keep their relative input order. Fails
/// with [`ReportError::EmptyAfterFilter`] when nothing survives.
pub fn filter_rows(records: Vec<RawRecord>) -> ReportResult<Vec<RawRecord>> {
    let survivors: Vec<RawRecord> = records
        .into_iter()
        .filter(|r| !r.vendor.trim().is_empty() && !r.country_destination.trim().is_empty())
        .collect();

    if survivors.is_empty() {
        return Err(ReportError::EmptyAfterFilter);
    }

    Ok(survivors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vendor: &str, country: &str) -> RawRecord {
        RawRecord {
            customer_relationship: "Acme".into(),
            trunk_group: "T1".into(),
            country_destination: country.into(),
            vendor: vendor.into(),
            revenue: "1".into(),
            cost: "1".into(),
            profit: "0".into(),
        }
    }

    #[test]
    fn test_drops_empty_vendor() {
        let survivors = filter_rows(vec![row("", "US"), row("ACME", "US")]).unwrap();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].vendor, "ACME");
    }

    #[test]
    fn test_drops_empty_country() {
        let survivors = filter_rows(vec![row("ACME", ""), row("ACME", "FR")]).unwrap();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].country_destination, "FR");
    }

    #[test]
    fn test_whitespace_only_counts_as_empty() {
        let survivors = filter_rows(vec![row("   ", "US"), row("ACME", " \t")]);
        assert!(matches!(survivors, Err(ReportError::EmptyAfterFilter)));
    }

    #[test]
    fn test_survivor_order_is_preserved() {
        let survivors = filter_rows(vec![
            row("A", "US"),
            row("", "US"),
            row("B", "FR"),
            row("C", "DE"),
        ])
        .unwrap();
        let vendors: Vec<&str> = survivors.iter().map(|r| r.vendor.as_str()).collect();
        assert_eq!(vendors, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_all_filtered_is_an_error() {
        let result = filter_rows(vec![row("", ""), row("", "US")]);
        assert!(matches!(result, Err(ReportError::EmptyAfterFilter)));
    }
}
