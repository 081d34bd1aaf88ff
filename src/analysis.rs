// 📊 Crop profitability
//
// Pure aggregation over a user's expenses and yields. Nothing here touches
// the database; callers load both lists and hand them in.

use crate::entities::{Expense, ExpenseCategory, YieldRecord};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Bucket for records with a missing or blank crop name
pub const UNKNOWN_CROP: &str = "unknown";

/// Anything that can be grouped by crop and summed
pub trait CropEntry {
    fn crop_name(&self) -> Option<&str>;
    /// Amount contributed to the crop total. Non-finite values count as zero.
    fn recorded_value(&self) -> f64;
}

impl CropEntry for Expense {
    fn crop_name(&self) -> Option<&str> {
        Some(&self.crop)
    }

    fn recorded_value(&self) -> f64 {
        self.amount
    }
}

impl CropEntry for YieldRecord {
    fn crop_name(&self) -> Option<&str> {
        Some(&self.crop)
    }

    fn recorded_value(&self) -> f64 {
        self.total_revenue
    }
}

/// Grouping key: trimmed, lower-cased crop name, or `"unknown"`
pub fn crop_key(crop: Option<&str>) -> String {
    match crop.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_lowercase(),
        _ => UNKNOWN_CROP.to_string(),
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropAnalysisRow {
    /// Display name, from the first record seen for this crop
    pub crop: String,
    pub expenses: f64,
    pub revenue: f64,
    pub profit: f64,
}

impl CropAnalysisRow {
    /// Profit as a percentage of revenue; zero when there is no revenue
    pub fn margin_percent(&self) -> f64 {
        if self.revenue > 0.0 {
            self.profit / self.revenue * 100.0
        } else {
            0.0
        }
    }
}

/// Index of the row for `crop`, creating it on first sight
fn row_slot(
    index: &mut HashMap<String, usize>,
    rows: &mut Vec<CropAnalysisRow>,
    crop: Option<&str>,
) -> usize {
    *index.entry(crop_key(crop)).or_insert_with(|| {
        let display = match crop {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => UNKNOWN_CROP.to_string(),
        };
        rows.push(CropAnalysisRow {
            crop: display,
            expenses: 0.0,
            revenue: 0.0,
            profit: 0.0,
        });
        rows.len() - 1
    })
}

/// Per-crop expense, revenue and profit totals.
///
/// Rows come back in first-appearance order: expenses first, then yields.
/// "Wheat", "wheat " and "WHEAT" share one row; blank names share the
/// `"unknown"` row.
pub fn crop_analysis<E: CropEntry, Y: CropEntry>(
    expenses: &[E],
    yields: &[Y],
) -> Vec<CropAnalysisRow> {
    let mut rows: Vec<CropAnalysisRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for expense in expenses {
        let slot = row_slot(&mut index, &mut rows, expense.crop_name());
        rows[slot].expenses += finite_or_zero(expense.recorded_value());
    }

    for record in yields {
        let slot = row_slot(&mut index, &mut rows, record.crop_name());
        rows[slot].revenue += finite_or_zero(record.recorded_value());
    }

    for row in &mut rows {
        row.profit = row.revenue - row.expenses;
    }

    rows
}

// ============================================================================
// DASHBOARD BREAKDOWNS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub total: f64,
}

/// Expense totals per category, in first-seen order
pub fn expenses_by_category(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();

    for expense in expenses {
        let amount = finite_or_zero(expense.amount);
        match totals.iter_mut().find(|t| t.category == expense.category) {
            Some(total) => total.total += amount,
            None => totals.push(CategoryTotal {
                category: expense.category,
                total: amount,
            }),
        }
    }

    totals
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`
    pub month: String,
    pub total: f64,
}

/// Expense totals per calendar month, oldest month first
pub fn expenses_by_month(expenses: &[Expense]) -> Vec<MonthlyTotal> {
    let mut months: BTreeMap<String, f64> = BTreeMap::new();

    for expense in expenses {
        let month = expense.date.format("%Y-%m").to_string();
        *months.entry(month).or_insert(0.0) += finite_or_zero(expense.amount);
    }

    months
        .into_iter()
        .map(|(month, total)| MonthlyTotal { month, total })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmSummary {
    pub total_expenses: f64,
    pub total_revenue: f64,
    pub net_profit: f64,
}

pub fn farm_summary(expenses: &[Expense], yields: &[YieldRecord]) -> FarmSummary {
    // fold from +0.0; `Sum` for f64 starts at -0.0
    let total_expenses = expenses
        .iter()
        .fold(0.0, |acc, e| acc + finite_or_zero(e.amount));
    let total_revenue = yields
        .iter()
        .fold(0.0, |acc, y| acc + finite_or_zero(y.total_revenue));

    FarmSummary {
        total_expenses,
        total_revenue,
        net_profit: total_revenue - total_expenses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Loosely-typed record, like a row from an old export
    struct Entry {
        crop: Option<&'static str>,
        value: f64,
    }

    impl CropEntry for Entry {
        fn crop_name(&self) -> Option<&str> {
            self.crop
        }

        fn recorded_value(&self) -> f64 {
            self.value
        }
    }

    fn entry(crop: Option<&'static str>, value: f64) -> Entry {
        Entry { crop, value }
    }

    #[test]
    fn test_wheat_scenario() {
        let expenses = vec![entry(Some("Wheat"), 100.0)];
        let yields = vec![entry(Some("wheat"), 150.0)];

        let rows = crop_analysis(&expenses, &yields);

        assert_eq!(
            rows,
            vec![CropAnalysisRow {
                crop: "Wheat".to_string(),
                expenses: 100.0,
                revenue: 150.0,
                profit: 50.0,
            }]
        );
    }

    #[test]
    fn test_case_and_whitespace_variants_collapse() {
        let expenses = vec![entry(Some("Wheat "), 10.0), entry(Some("WHEAT"), 5.0)];
        let yields = vec![entry(Some("wheat"), 40.0)];

        let rows = crop_analysis(&expenses, &yields);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].crop, "Wheat ");
        assert_eq!(rows[0].expenses, 15.0);
        assert_eq!(rows[0].profit, 25.0);
    }

    #[test]
    fn test_missing_and_blank_crops_share_unknown() {
        let expenses = vec![entry(None, 10.0), entry(Some("   "), 20.0)];
        let yields = vec![entry(Some(""), 5.0)];

        let rows = crop_analysis(&expenses, &yields);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].crop, UNKNOWN_CROP);
        assert_eq!(rows[0].expenses, 30.0);
        assert_eq!(rows[0].revenue, 5.0);
    }

    #[test]
    fn test_non_finite_values_count_as_zero() {
        let expenses = vec![entry(Some("Rice"), f64::NAN), entry(Some("Rice"), 7.0)];
        let yields = vec![entry(Some("Rice"), f64::INFINITY)];

        let rows = crop_analysis(&expenses, &yields);

        assert_eq!(rows[0].expenses, 7.0);
        assert_eq!(rows[0].revenue, 0.0);
        assert_eq!(rows[0].profit, -7.0);
    }

    #[test]
    fn test_empty_expenses_gives_zero_expense_rows() {
        let expenses: Vec<Entry> = Vec::new();
        let yields = vec![entry(Some("Cotton"), 900.0), entry(Some("Maize"), 300.0)];

        let rows = crop_analysis(&expenses, &yields);

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.expenses == 0.0));
        assert!(rows.iter().all(|r| r.profit == r.revenue));
    }

    #[test]
    fn test_both_empty() {
        let rows = crop_analysis::<Entry, Entry>(&[], &[]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_insertion_order_expenses_then_yields() {
        let expenses = vec![entry(Some("Maize"), 1.0), entry(Some("Rice"), 1.0)];
        let yields = vec![entry(Some("Cotton"), 1.0), entry(Some("maize"), 1.0)];

        let crops: Vec<String> = crop_analysis(&expenses, &yields)
            .into_iter()
            .map(|r| r.crop)
            .collect();

        assert_eq!(crops, vec!["Maize", "Rice", "Cotton"]);
    }

    #[test]
    fn test_profit_equals_revenue_minus_expenses_per_key() {
        let expenses = vec![
            entry(Some("Wheat"), 120.0),
            entry(Some("Rice"), 80.0),
            entry(Some("wheat"), 30.0),
            entry(None, 12.5),
        ];
        let yields = vec![
            entry(Some("RICE"), 200.0),
            entry(Some("Sugarcane"), 1000.0),
            entry(Some(" wheat"), 100.0),
        ];

        let rows = crop_analysis(&expenses, &yields);

        let mut keys: Vec<String> = rows.iter().map(|r| crop_key(Some(&r.crop))).collect();
        keys.sort();
        assert_eq!(keys, vec!["rice", "sugarcane", "unknown", "wheat"]);

        for row in &rows {
            let key = crop_key(Some(&row.crop));
            let spent: f64 = expenses
                .iter()
                .filter(|e| crop_key(e.crop) == key)
                .map(|e| e.value)
                .sum();
            let earned: f64 = yields
                .iter()
                .filter(|y| crop_key(y.crop) == key)
                .map(|y| y.value)
                .sum();
            assert_eq!(row.profit, earned - spent, "profit mismatch for {}", key);
        }
    }

    #[test]
    fn test_margin_percent() {
        let row = CropAnalysisRow {
            crop: "Wheat".to_string(),
            expenses: 100.0,
            revenue: 150.0,
            profit: 50.0,
        };
        assert!((row.margin_percent() - 33.333).abs() < 0.01);

        let loss_only = CropAnalysisRow {
            crop: "Wheat".to_string(),
            expenses: 100.0,
            revenue: 0.0,
            profit: -100.0,
        };
        assert_eq!(loss_only.margin_percent(), 0.0);
    }

    fn expense(date: (i32, u32, u32), category: ExpenseCategory, amount: f64) -> Expense {
        let now = chrono::Utc::now();
        Expense {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: "farmer-a".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            crop: "Cotton".to_string(),
            category,
            season: None,
            description: None,
            amount,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_summary_is_positive_zero() {
        let summary = farm_summary(&[], &[]);
        println!("{:?}", summary);

        assert!(summary.total_expenses.is_sign_positive());
        assert!(summary.total_revenue.is_sign_positive());
        assert!(summary.net_profit.is_sign_positive());
        assert_eq!(
            serde_json::to_string(&summary).unwrap(),
            r#"{"totalExpenses":0.0,"totalRevenue":0.0,"netProfit":0.0}"#
        );
    }

    #[test]
    fn test_category_and_month_totals() {
        let expenses = vec![
            expense((2025, 3, 2), ExpenseCategory::Labor, 200.0),
            expense((2025, 1, 20), ExpenseCategory::Seeds, 50.0),
            expense((2025, 3, 28), ExpenseCategory::Labor, 100.0),
            expense((2025, 1, 5), ExpenseCategory::Fuel, f64::NAN),
        ];

        let by_category = expenses_by_category(&expenses);
        println!("{:?}", by_category);
        assert_eq!(by_category.len(), 3);
        assert_eq!(by_category[0].category, ExpenseCategory::Labor);
        assert_eq!(by_category[0].total, 300.0);
        assert_eq!(by_category[2].total, 0.0);

        let by_month = expenses_by_month(&expenses);
        assert_eq!(by_month.len(), 2);
        assert_eq!(by_month[0].month, "2025-01");
        assert_eq!(by_month[0].total, 50.0);
        assert_eq!(by_month[1].month, "2025-03");
        assert_eq!(by_month[1].total, 300.0);
    }
}
