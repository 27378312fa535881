//! Multi-tab report example
//!
//! Several tabs in one workbook, with a hint line, `{key}` templates,
//! hyperlink detection and a parameter mismatch that gets skipped.

use chrono::NaiveDate;
use queryexcel::cursor::memory::{MemoryExecutor, ResultSet, SqlValue};
use queryexcel::{ExcelWriter, ExportOptions, MemoryProfile, SqlType, Tab};

const SALES: &str = "SELECT region, booked, revenue FROM sales WHERE year = ?";
const VENDORS: &str = "SELECT name, homepage, note FROM vendors";
const ORPHANS: &str = "SELECT * FROM orders WHERE customer = ? AND status = ?";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Multi-Tab Report ===\n");

    let mut sales = ResultSet::new()
        .column("region", SqlType::VARCHAR)
        .column("booked", SqlType::DATE)
        .column("revenue", SqlType::NUMERIC);
    for (i, region) in ["North", "South", "East", "West"].iter().enumerate() {
        for month in 1..=12u32 {
            sales.push_row([
                SqlValue::from(*region),
                SqlValue::from(NaiveDate::from_ymd_opt(2024, month, 1).ok_or("bad date")?),
                SqlValue::Decimal(format!("{}.{:02}", 1000 * (i + 1) + month as usize, month)),
            ]);
        }
    }

    let mut executor = MemoryExecutor::new();
    executor.register(SALES, sales);
    executor.register(
        VENDORS,
        ResultSet::new()
            .column("name", SqlType::VARCHAR)
            .column("homepage", SqlType::VARCHAR)
            .column("note", SqlType::VARCHAR)
            .row(["ACME", "https://acme.example/catalog", "Contact {owner}"])
            .row(["Globex", "http://globex example", "Contact {owner}"]),
    );

    let tabs = [
        Tab::new("Sales", SALES)
            .with_parameter(2024)
            .with_hint("Preliminary figures, not audited"),
        Tab::new("Vendors", VENDORS),
        // one parameter short: exported as an empty sheet
        Tab::new("Orders", ORPHANS).with_parameter(42),
    ];

    let options = ExportOptions::new()
        .with_auto_hyperlinks(true)
        .with_memory_profile(MemoryProfile::from_env());
    let mut writer = ExcelWriter::new(executor).with_replacements([("owner", "Jane Doe")]);
    let report = writer.export_with_report(&tabs, &options)?;

    for sheet in &report.sheets {
        println!(
            "  {:<10} {:>5} rows{}",
            sheet.name,
            sheet.rows,
            if sheet.skipped { " (skipped)" } else { "" }
        );
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }

    std::fs::write("multi_tab_report.xlsx", &report.bytes)?;
    println!("\nWrote multi_tab_report.xlsx ({} bytes)", report.bytes.len());
    Ok(())
}
