//! Stage (d): grouping with subtotal and spacer injection.
//!
//! Partitions recalculated rows into groups keyed by trunk group and
//! country destination, then lays out the final report:
//!
//! ```text
//! Recalculated rows              →  Report layout
//! ┌──────────────────────────┐      ┌───────────────────────────┐
//! │ T1/US  ACME   100/40/60  │      │ detail  T1/US ACME        │
//! │ T1/US  OPS-1   50/0/50   │  →   │ detail  T1/US OPS-1       │
//! │ T2/FR  ACME    10/4/6    │      │ subtotal      150/40/110  │
//! └──────────────────────────┘      │ (5 blank spacer rows)     │
//!                                   │ detail  T2/FR ACME        │
//!                                   │ subtotal      10/4/6      │
//!                                   └───────────────────────────┘
//! ```
//!
//! Groups are visited in the order their key first occurs in the input;
//! rows inside a group keep their original relative order.

use std::collections::HashMap;

use crate::models::{BillingRecord, GroupKey, OutputRow};

/// Blank rows inserted after every group except the last.
pub const SPACER_ROWS_BETWEEN_GROUPS: usize = 5;

/// Grouped report layout plus the group count for the summary.
#[derive(Debug, Clone)]
pub struct GroupedRows {
    pub rows: Vec<OutputRow>,
    pub group_count: usize,
}

/// Lay out detail rows, subtotals and spacers for the final report.
///
/// This stage performs no validation; empty input yields empty output
/// (the filter stage upstream already rejects it).
pub fn group_with_subtotals(
    records: Vec<BillingRecord>,
    include_profit_percent: bool,
) -> GroupedRows {
    let mut order: Vec<GroupKey> = Vec::new();
    let mut builders: HashMap<GroupKey, GroupBuilder> = HashMap::new();

    for record in records {
        let key = record.group_key();
        builders
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                GroupBuilder::new()
            })
            .add(record);
    }

    let group_count = order.len();
    let mut rows = Vec::new();

    for (idx, key) in order.iter().enumerate() {
        // Key came from `order`, so the builder exists.
        let builder = builders.remove(key).unwrap();
        builder.emit(include_profit_percent, &mut rows);

        if idx + 1 < group_count {
            for _ in 0..SPACER_ROWS_BETWEEN_GROUPS {
                rows.push(OutputRow::Spacer);
            }
        }
    }

    GroupedRows { rows, group_count }
}

/// Accumulates one group's rows and running column sums.
struct GroupBuilder {
    records: Vec<BillingRecord>,
    revenue: f64,
    cost: f64,
    profit: f64,
}

impl GroupBuilder {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            revenue: 0.0,
            cost: 0.0,
            profit: 0.0,
        }
    }

    fn add(&mut self, record: BillingRecord) {
        self.revenue += record.revenue;
        self.cost += record.cost;
        self.profit += record.profit;
        self.records.push(record);
    }

    fn emit(self, include_profit_percent: bool, rows: &mut Vec<OutputRow>) {
        for record in self.records {
            let profit_percent =
                include_profit_percent.then(|| profit_percent(record.profit, record.revenue));
            rows.push(OutputRow::Detail {
                record,
                profit_percent,
            });
        }

        let revenue = round2(self.revenue);
        let cost = round2(self.cost);
        let profit = round2(self.profit);
        // Percent derives from the rounded sums the reader actually sees.
        let profit_percent = include_profit_percent.then(|| profit_percent(profit, revenue));

        rows.push(OutputRow::Subtotal {
            revenue,
            cost,
            profit,
            profit_percent,
        });
    }
}

/// Round to 2 decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Profit as a percentage of revenue, 0.0 when there is no revenue.
fn profit_percent(profit: f64, revenue: f64) -> f64 {
    if revenue == 0.0 {
        0.0
    } else {
        round2(profit / revenue * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        trunk: &str,
        country: &str,
        vendor: &str,
        rev: f64,
        cost: f64,
        profit: f64,
    ) -> BillingRecord {
        BillingRecord {
            customer_relationship: "Acme".into(),
            trunk_group: trunk.into(),
            country_destination: country.into(),
            vendor: vendor.into(),
            revenue: rev,
            cost,
            profit,
        }
    }

    #[test]
    fn test_single_group_layout() {
        let grouped = group_with_subtotals(
            vec![
                record("T1", "US", "ACME", 100.0, 40.0, 60.0),
                record("T1", "US", "OPS-1", 50.0, 0.0, 50.0),
            ],
            false,
        );

        assert_eq!(grouped.group_count, 1);
        assert_eq!(grouped.rows.len(), 3);
        assert!(grouped.rows[0].is_detail());
        assert!(grouped.rows[1].is_detail());
        match &grouped.rows[2] {
            OutputRow::Subtotal {
                revenue,
                cost,
                profit,
                ..
            } => {
                assert_eq!(*revenue, 150.0);
                assert_eq!(*cost, 40.0);
                assert_eq!(*profit, 110.0);
            }
            other => panic!("expected subtotal, got {other:?}"),
        }
    }

    #[test]
    fn test_groups_follow_first_occurrence_order() {
        let grouped = group_with_subtotals(
            vec![
                record("T2", "FR", "A", 1.0, 0.0, 1.0),
                record("T1", "US", "B", 1.0, 0.0, 1.0),
                record("T2", "FR", "C", 1.0, 0.0, 1.0),
            ],
            false,
        );

        assert_eq!(grouped.group_count, 2);
        // T2/FR rows first (its key appeared first), C follows A.
        let vendors: Vec<String> = grouped
            .rows
            .iter()
            .filter_map(|row| match row {
                OutputRow::Detail { record, .. } => Some(record.vendor.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(vendors, vec!["A", "C", "B"]);
    }

    #[test]
    fn test_exactly_five_spacers_between_groups_none_after_last() {
        let grouped = group_with_subtotals(
            vec![
                record("T1", "US", "A", 1.0, 0.0, 1.0),
                record("T2", "FR", "B", 1.0, 0.0, 1.0),
            ],
            false,
        );

        // detail, subtotal, 5 spacers, detail, subtotal
        assert_eq!(grouped.rows.len(), 9);
        let spacer_positions: Vec<usize> = grouped
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_spacer())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(spacer_positions, vec![2, 3, 4, 5, 6]);
        assert!(grouped.rows.last().unwrap().is_subtotal());
    }

    #[test]
    fn test_output_row_count_formula() {
        let records = vec![
            record("T1", "US", "A", 1.0, 0.0, 1.0),
            record("T1", "US", "B", 1.0, 0.0, 1.0),
            record("T2", "FR", "C", 1.0, 0.0, 1.0),
            record("T3", "DE", "D", 1.0, 0.0, 1.0),
        ];
        let survivors = records.len();
        let grouped = group_with_subtotals(records, true);

        let expected = survivors + grouped.group_count + 5 * (grouped.group_count - 1);
        assert_eq!(grouped.rows.len(), expected);
    }

    #[test]
    fn test_subtotal_sums_are_rounded_to_cents() {
        let grouped = group_with_subtotals(
            vec![
                record("T1", "US", "A", 0.105, 0.105, 0.001),
                record("T1", "US", "B", 0.10, 0.10, 0.004),
            ],
            false,
        );

        match grouped.rows.last().unwrap() {
            OutputRow::Subtotal {
                revenue,
                cost,
                profit,
                ..
            } => {
                assert_eq!(*revenue, 0.21);
                assert_eq!(*cost, 0.21);
                assert_eq!(*profit, 0.01);
            }
            other => panic!("expected subtotal, got {other:?}"),
        }
    }

    #[test]
    fn test_profit_percent_on_detail_rows() {
        let grouped =
            group_with_subtotals(vec![record("T1", "US", "A", 200.0, 50.0, 150.0)], true);
        match &grouped.rows[0] {
            OutputRow::Detail { profit_percent, .. } => {
                assert_eq!(*profit_percent, Some(75.0));
            }
            other => panic!("expected detail, got {other:?}"),
        }
    }

    #[test]
    fn test_profit_percent_zero_when_no_revenue() {
        let grouped = group_with_subtotals(vec![record("T1", "US", "A", 0.0, 3.0, -3.0)], true);
        match &grouped.rows[0] {
            OutputRow::Detail { profit_percent, .. } => {
                assert_eq!(*profit_percent, Some(0.0));
            }
            other => panic!("expected detail, got {other:?}"),
        }
        match grouped.rows.last().unwrap() {
            OutputRow::Subtotal { profit_percent, .. } => {
                assert_eq!(*profit_percent, Some(0.0));
            }
            other => panic!("expected subtotal, got {other:?}"),
        }
    }

    #[test]
    fn test_percent_flag_off_leaves_rows_bare() {
        let grouped = group_with_subtotals(vec![record("T1", "US", "A", 10.0, 5.0, 5.0)], false);
        match &grouped.rows[0] {
            OutputRow::Detail { profit_percent, .. } => assert!(profit_percent.is_none()),
            other => panic!("expected detail, got {other:?}"),
        }
    }

    #[test]
    fn test_subtotal_percent_uses_rounded_sums() {
        // Sums round to revenue 0.33, profit 0.11 → 33.33%.
        let grouped = group_with_subtotals(
            vec![
                record("T1", "US", "A", 0.165, 0.11, 0.055),
                record("T1", "US", "B", 0.165, 0.11, 0.055),
            ],
            true,
        );
        match grouped.rows.last().unwrap() {
            OutputRow::Subtotal {
                revenue,
                profit,
                profit_percent,
                ..
            } => {
                assert_eq!(*revenue, 0.33);
                assert_eq!(*profit, 0.11);
                assert_eq!(*profit_percent, Some(33.33));
            }
            other => panic!("expected subtotal, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_yields_empty_layout() {
        let grouped = group_with_subtotals(Vec::new(), true);
        assert_eq!(grouped.group_count, 0);
        assert!(grouped.rows.is_empty());
    }
}
