//! Basic export example
//!
//! Streams a small in-memory result set into a single-sheet workbook.

use queryexcel::cursor::memory::{MemoryExecutor, ResultSet, SqlValue};
use queryexcel::{ExcelWriter, SqlType, Tab};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Creating basic export...");

    let mut executor = MemoryExecutor::new();
    executor.register(
        "SELECT name, email, age, active FROM users",
        ResultSet::new()
            .column("name", SqlType::VARCHAR)
            .column("email", SqlType::VARCHAR)
            .column("age", SqlType::INTEGER)
            .column("active", SqlType::BOOLEAN)
            .row([
                SqlValue::from("Alice"),
                SqlValue::from("alice@example.com"),
                SqlValue::from(30),
                SqlValue::from(true),
            ])
            .row([
                SqlValue::from("Bob"),
                SqlValue::from("bob@example.com"),
                SqlValue::from(25),
                SqlValue::from(false),
            ])
            .row([
                SqlValue::from("Charlie"),
                SqlValue::Null,
                SqlValue::from(35),
                SqlValue::from(true),
            ]),
    );

    let mut writer = ExcelWriter::new(executor);
    let bytes = writer.create_excel(&Tab::of_sql("SELECT name, email, age, active FROM users"))?;
    std::fs::write("basic_export.xlsx", &bytes)?;

    println!("Successfully created basic_export.xlsx ({} bytes)", bytes.len());
    Ok(())
}
