// 🧾 Reports
// CSV export for the dashboard download and a plain-text table for the CLI.

use crate::analysis::{crop_analysis, farm_summary, CropAnalysisRow};
use crate::entities::{Expense, YieldRecord};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::io::Write;

pub const REPORT_TITLE: &str = "KisanLog - Comprehensive Report";

/// `Farm_Report_2025-03-09.csv`
pub fn report_filename(date: NaiveDate) -> String {
    format!("Farm_Report_{}.csv", date.format("%Y-%m-%d"))
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn rupees(value: f64) -> String {
    format!("₹{:.2}", value)
}

fn margin(row: &CropAnalysisRow) -> String {
    format!("{:.1}%", row.margin_percent())
}

fn section_writer<W: Write>(sink: &mut W) -> csv::Writer<&mut W> {
    csv::WriterBuilder::new().flexible(true).from_writer(sink)
}

/// Flush the section and hand back the sink
fn finish_section<W: Write>(wtr: csv::Writer<&mut W>) -> Result<&mut W> {
    Ok(wtr.into_inner().map_err(|e| e.into_error())?)
}

/// Close a section and separate it from the next with an empty line.
/// The empty line goes straight to the sink; a csv record would be `""`.
fn end_section<W: Write>(wtr: csv::Writer<&mut W>) -> Result<()> {
    finish_section(wtr)?.write_all(b"\n")?;
    Ok(())
}

/// Write the full report: expenses, yields, per-crop analysis and summary.
/// Records have different widths per section, so each writer is flexible.
pub fn write_csv_report<W: Write>(
    mut sink: W,
    expenses: &[Expense],
    yields: &[YieldRecord],
    generated_at: DateTime<Utc>,
) -> Result<()> {
    let summary = farm_summary(expenses, yields);

    let mut wtr = section_writer(&mut sink);
    wtr.write_record([REPORT_TITLE])?;
    wtr.write_record([format!(
        "Generated on: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )])?;
    end_section(wtr)?;

    // ------------------------------------------------------------------------
    // EXPENSES
    // ------------------------------------------------------------------------
    let mut wtr = section_writer(&mut sink);
    wtr.write_record(["=== EXPENSES ==="])?;
    wtr.write_record(["Date", "Crop", "Category", "Description", "Amount"])?;
    for e in expenses {
        wtr.write_record([
            e.date.format("%Y-%m-%d").to_string(),
            e.crop.clone(),
            e.category.to_string(),
            e.description.clone().unwrap_or_default(),
            money(e.amount),
        ])?;
    }
    end_section(wtr)?;

    let mut wtr = section_writer(&mut sink);
    wtr.write_record(["Total Expenses:", "", "", "", rupees(summary.total_expenses).as_str()])?;
    end_section(wtr)?;

    // ------------------------------------------------------------------------
    // YIELDS
    // ------------------------------------------------------------------------
    let mut wtr = section_writer(&mut sink);
    wtr.write_record(["=== YIELDS ==="])?;
    wtr.write_record([
        "Date",
        "Crop",
        "Quantity",
        "Unit",
        "Price Per Unit",
        "Total Revenue",
    ])?;
    for y in yields {
        wtr.write_record([
            y.date.format("%Y-%m-%d").to_string(),
            y.crop.clone(),
            y.quantity.to_string(),
            y.unit.clone(),
            money(y.price_per_unit),
            money(y.total_revenue),
        ])?;
    }
    end_section(wtr)?;

    let mut wtr = section_writer(&mut sink);
    wtr.write_record([
        "Total Revenue:",
        "",
        "",
        "",
        "",
        rupees(summary.total_revenue).as_str(),
    ])?;
    end_section(wtr)?;

    // ------------------------------------------------------------------------
    // CROP PROFITABILITY
    // ------------------------------------------------------------------------
    let mut wtr = section_writer(&mut sink);
    wtr.write_record(["=== CROP PROFITABILITY ANALYSIS ==="])?;
    wtr.write_record([
        "Crop",
        "Total Expenses",
        "Total Revenue",
        "Net Profit",
        "Profit Margin %",
    ])?;
    for row in crop_analysis(expenses, yields) {
        wtr.write_record([
            row.crop.clone(),
            money(row.expenses),
            money(row.revenue),
            money(row.profit),
            margin(&row),
        ])?;
    }
    end_section(wtr)?;

    // ------------------------------------------------------------------------
    // SUMMARY
    // ------------------------------------------------------------------------
    let mut wtr = section_writer(&mut sink);
    wtr.write_record(["=== SUMMARY ==="])?;
    wtr.write_record(["Total Expenses:", rupees(summary.total_expenses).as_str()])?;
    wtr.write_record(["Total Revenue:", rupees(summary.total_revenue).as_str()])?;
    wtr.write_record(["Net Profit:", rupees(summary.net_profit).as_str()])?;
    finish_section(wtr)?.flush()?;

    Ok(())
}

/// Same report, collected into a string
pub fn csv_report_string(
    expenses: &[Expense],
    yields: &[YieldRecord],
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv_report(&mut buffer, expenses, yields, generated_at)?;
    Ok(String::from_utf8(buffer)?)
}

/// Fixed-width table for terminal output
pub fn render_analysis_table(rows: &[CropAnalysisRow]) -> String {
    if rows.is_empty() {
        return "No data available for analysis\n".to_string();
    }

    let crop_width = rows
        .iter()
        .map(|r| r.crop.chars().count())
        .max()
        .unwrap_or(0)
        .max("Crop".len());

    let mut out = String::new();
    out.push_str(&format!(
        "{:<width$}  {:>12}  {:>12}  {:>12}  {:>8}\n",
        "Crop",
        "Expenses",
        "Revenue",
        "Profit",
        "Margin",
        width = crop_width
    ));
    out.push_str(&format!("{}\n", "─".repeat(crop_width + 54)));

    for row in rows {
        out.push_str(&format!(
            "{:<width$}  {:>12}  {:>12}  {:>12}  {:>8}\n",
            row.crop,
            money(row.expenses),
            money(row.revenue),
            money(row.profit),
            margin(row),
            width = crop_width
        ));
    }

    out
}
