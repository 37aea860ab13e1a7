//! Stage (c): numeric coercion and vendor recalculation.
//!
//! Every surviving row gets its financial columns coerced to numbers
//! first; coercion failures (including blanks) become `0.0` and are only
//! counted, never fatal. Rows routed through vendors in the configured
//! zero-cost marker set then get their cost zeroed and profit restated as
//! the full revenue.

use crate::models::{BillingRecord, RawRecord};

/// Vendor-name substrings whose traffic carries no vendor cost.
///
/// Matched case-insensitively and independently; the set started as
/// OPS/IVG and has grown since, so it stays configuration rather than
/// conditionals.
pub const DEFAULT_ZERO_COST_VENDORS: [&str; 3] = ["OPS", "IVG", "PROXY 2"];

/// Case-insensitive substring matcher over the configured marker set.
#[derive(Debug, Clone)]
pub struct ZeroCostMatcher {
    markers: Vec<String>,
}

impl ZeroCostMatcher {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().to_uppercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// True when the vendor name contains any configured marker.
    pub fn matches(&self, vendor: &str) -> bool {
        let vendor = vendor.to_uppercase();
        self.markers.iter().any(|m| vendor.contains(m))
    }
}

impl Default for ZeroCostMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_ZERO_COST_VENDORS)
    }
}

/// Outcome of the coercion + recalculation stage.
#[derive(Debug, Clone)]
pub struct RecalcResult {
    pub records: Vec<BillingRecord>,
    /// Rows whose vendor matched the marker set.
    pub zero_cost_rows: usize,
    /// Financial cells that failed numeric coercion and were zeroed.
    pub coercion_failures: usize,
}

/// Coerce financials on every row, then apply the zero-cost vendor rule.
pub fn coerce_and_recalculate(records: Vec<RawRecord>, matcher: &ZeroCostMatcher) -> RecalcResult {
    let mut zero_cost_rows = 0;
    let mut coercion_failures = 0;

    let records = records
        .into_iter()
        .map(|raw| {
            let (revenue, revenue_ok) = coerce_amount(&raw.revenue);
            let (cost, cost_ok) = coerce_amount(&raw.cost);
            let (profit, profit_ok) = coerce_amount(&raw.profit);
            coercion_failures += [revenue_ok, cost_ok, profit_ok]
                .iter()
                .filter(|ok| !**ok)
                .count();

            let mut record = BillingRecord {
                customer_relationship: raw.customer_relationship,
                trunk_group: raw.trunk_group,
                country_destination: raw.country_destination,
                vendor: raw.vendor,
                revenue,
                cost,
                profit,
            };

            if matcher.matches(&record.vendor) {
                zero_cost_rows += 1;
                record.cost = 0.0;
                // Profit = Revenue - Cost, with the cost forced to zero.
                record.profit = record.revenue;
            }

            record
        })
        .collect();

    RecalcResult {
        records,
        zero_cost_rows,
        coercion_failures,
    }
}

/// Parse one financial cell; `(0.0, false)` when the value is not numeric.
///
/// Non-finite values count as failures so a stray "NaN" cell cannot
/// poison the group sums.
fn coerce_amount(raw: &str) -> (f64, bool) {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => (value, true),
        Ok(_) | Err(_) => (0.0, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vendor: &str, revenue: &str, cost: &str, profit: &str) -> RawRecord {
        RawRecord {
            customer_relationship: "Acme".into(),
            trunk_group: "T1".into(),
            country_destination: "US".into(),
            vendor: vendor.into(),
            revenue: revenue.into(),
            cost: cost.into(),
            profit: profit.into(),
        }
    }

    #[test]
    fn test_matching_vendor_zeroes_cost_and_restates_profit() {
        let result = coerce_and_recalculate(
            vec![row("OPS-1", "50", "20", "30")],
            &ZeroCostMatcher::default(),
        );
        let record = &result.records[0];
        assert_eq!(record.cost, 0.0);
        assert_eq!(record.profit, 50.0);
        assert_eq!(record.revenue, 50.0);
        assert_eq!(result.zero_cost_rows, 1);
    }

    #[test]
    fn test_non_matching_vendor_keeps_coerced_values() {
        let result = coerce_and_recalculate(
            vec![row("ACME", "100", "40", "60")],
            &ZeroCostMatcher::default(),
        );
        let record = &result.records[0];
        assert_eq!(record.cost, 40.0);
        assert_eq!(record.profit, 60.0);
        assert_eq!(result.zero_cost_rows, 0);
    }

    #[test]
    fn test_match_is_case_insensitive_substring() {
        let matcher = ZeroCostMatcher::default();
        assert!(matcher.matches("ops-east"));
        assert!(matcher.matches("Ivg Wholesale"));
        assert!(matcher.matches("proxy 2 carrier"));
        assert!(!matcher.matches("PROXY 1"));
        assert!(!matcher.matches("ACME"));
    }

    #[test]
    fn test_markers_match_independently() {
        // One marker hitting is enough; no combined pattern semantics.
        let matcher = ZeroCostMatcher::new(["OPS", "IVG"]);
        assert!(matcher.matches("IVG only"));
        assert!(matcher.matches("OPS only"));
    }

    #[test]
    fn test_custom_marker_set() {
        let matcher = ZeroCostMatcher::new(["ONNET"]);
        assert!(matcher.matches("OnNet GmbH"));
        assert!(!matcher.matches("OPS-1"));
    }

    #[test]
    fn test_unparseable_values_become_zero() {
        let result = coerce_and_recalculate(
            vec![row("ACME", "n/a", "", "12.5")],
            &ZeroCostMatcher::default(),
        );
        let record = &result.records[0];
        assert_eq!(record.revenue, 0.0);
        assert_eq!(record.cost, 0.0);
        assert_eq!(record.profit, 12.5);
        assert_eq!(result.coercion_failures, 2);
    }

    #[test]
    fn test_coercion_happens_before_vendor_rule() {
        // Blank revenue on a matching vendor: profit restates to the
        // coerced revenue, not to the stale profit cell.
        let result = coerce_and_recalculate(
            vec![row("IVG", "", "20", "99")],
            &ZeroCostMatcher::default(),
        );
        let record = &result.records[0];
        assert_eq!(record.revenue, 0.0);
        assert_eq!(record.cost, 0.0);
        assert_eq!(record.profit, 0.0);
    }

    #[test]
    fn test_non_finite_values_are_zeroed() {
        let result = coerce_and_recalculate(
            vec![row("ACME", "NaN", "inf", "1")],
            &ZeroCostMatcher::default(),
        );
        let record = &result.records[0];
        assert_eq!(record.revenue, 0.0);
        assert_eq!(record.cost, 0.0);
        assert_eq!(result.coercion_failures, 2);
    }

    #[test]
    fn test_negative_and_decimal_values_parse() {
        let result = coerce_and_recalculate(
            vec![row("ACME", "-12.75", "0.25", "-13.0")],
            &ZeroCostMatcher::default(),
        );
        let record = &result.records[0];
        assert_eq!(record.revenue, -12.75);
        assert_eq!(record.cost, 0.25);
        assert_eq!(record.profit, -13.0);
        assert_eq!(result.coercion_failures, 0);
    }
}
