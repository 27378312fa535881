//! Integration tests for queryexcel: export through the public API and read
//! the produced workbook back with calamine

use calamine::{open_workbook, open_workbook_from_rs, Data, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use queryexcel::cursor::memory::{MemoryExecutor, ResultSet, SqlValue};
use queryexcel::{
    DecimalMode, ExcelError, ExcelWriter, ExportOptions, ExportWarning, SqlType, Tab,
};
use std::io::Cursor;

fn read_sheet(bytes: &[u8], name: &str) -> Range<Data> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec())).unwrap();
    workbook.worksheet_range(name).unwrap()
}

fn sheet_names(bytes: &[u8]) -> Vec<String> {
    let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec())).unwrap();
    workbook.sheet_names()
}

fn text(range: &Range<Data>, row: u32, col: u32) -> Option<String> {
    match range.get_value((row, col)) {
        Some(Data::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn is_absent(range: &Range<Data>, row: u32, col: u32) -> bool {
    matches!(range.get_value((row, col)), None | Some(Data::Empty))
}

fn number(range: &Range<Data>, row: u32, col: u32) -> Option<f64> {
    match range.get_value((row, col)) {
        Some(Data::Float(f)) => Some(*f),
        Some(Data::Int(i)) => Some(*i as f64),
        Some(Data::DateTime(dt)) => Some(dt.as_f64()),
        _ => None,
    }
}

#[test]
fn test_header_rows_and_null_cell() {
    let mut executor = MemoryExecutor::new();
    executor.register(
        "SELECT name FROM users",
        ResultSet::new()
            .column("name", SqlType::VARCHAR)
            .row(["alice"])
            .row(["bob"])
            .row([SqlValue::Null]),
    );

    let bytes = ExcelWriter::new(executor)
        .create_excel(&Tab::of_sql("SELECT name FROM users"))
        .unwrap();

    assert_eq!(sheet_names(&bytes), vec!["Default"]);
    let range = read_sheet(&bytes, "Default");
    assert_eq!(text(&range, 0, 0).as_deref(), Some("name"));
    assert_eq!(text(&range, 1, 0).as_deref(), Some("alice"));
    assert_eq!(text(&range, 2, 0).as_deref(), Some("bob"));
    // the null is absent, not an empty string
    assert!(is_absent(&range, 3, 0));
    assert!(range.get_value((4, 0)).is_none());
}

#[test]
fn test_parameter_mismatch_leaves_sheet_empty() {
    let mut executor = MemoryExecutor::new();
    executor.register(
        "SELECT * FROM orders WHERE a = ? AND b = ?",
        ResultSet::new().column("id", SqlType::INTEGER).row([1]),
    );
    let mut writer = ExcelWriter::new(executor);
    let tab = Tab::new("Orders", "SELECT * FROM orders WHERE a = ? AND b = ?").with_parameter(1);

    let report = writer
        .export_with_report(&[tab], &ExportOptions::default())
        .unwrap();

    assert!(writer.executor().executed().is_empty());
    assert_eq!(
        report.warnings,
        vec![ExportWarning::ParameterCountMismatch {
            tab: "Orders".into(),
            required: 2,
            given: 1,
        }]
    );
    assert_eq!(sheet_names(&report.bytes), vec!["Orders"]);
    assert!(read_sheet(&report.bytes, "Orders").is_empty());
}

#[test]
fn test_empty_cursor_has_no_header() {
    let mut executor = MemoryExecutor::new();
    executor.register(
        "SELECT id FROM nothing",
        ResultSet::new().column("id", SqlType::INTEGER),
    );
    let bytes = ExcelWriter::new(executor)
        .create_excel(&Tab::new("Nothing", "SELECT id FROM nothing"))
        .unwrap();

    assert!(read_sheet(&bytes, "Nothing").is_empty());
}

#[test]
fn test_dates_round_trip() {
    let dates: Vec<NaiveDate> = [
        (1900, 1, 1),
        (1900, 2, 28),
        (1900, 3, 1),
        (1999, 12, 31),
        (2000, 1, 1),
        (2000, 2, 29),
        (2016, 2, 29),
        (2023, 12, 31),
        (2024, 1, 1),
        (2024, 2, 29),
        (2024, 3, 1),
    ]
    .iter()
    .map(|(y, m, d)| NaiveDate::from_ymd_opt(*y, *m, *d).unwrap())
    .collect();
    let before_1900 = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();

    let mut set = ResultSet::new().column("booked", SqlType::DATE);
    for date in &dates {
        set.push_row([SqlValue::Date(*date)]);
    }
    set.push_row([SqlValue::Date(before_1900)]);
    let mut executor = MemoryExecutor::new();
    executor.register("SELECT booked FROM bookings", set);

    let bytes = ExcelWriter::new(executor)
        .create_excel(&Tab::new("Bookings", "SELECT booked FROM bookings"))
        .unwrap();
    let range = read_sheet(&bytes, "Bookings");

    for (i, date) in dates.iter().enumerate() {
        let serial = number(&range, i as u32 + 1, 0).unwrap();
        // serials below 61 count from 1899-12-31, the rest skip 1900-02-29
        let epoch = if serial < 61.0 {
            NaiveDate::from_ymd_opt(1899, 12, 31).unwrap()
        } else {
            NaiveDate::from_ymd_opt(1899, 12, 30).unwrap()
        };
        let shown = (epoch + Duration::days(serial as i64)).format("%d.%m.%Y").to_string();
        assert_eq!(shown, date.format("%d.%m.%Y").to_string());
    }
    assert_eq!(
        text(&range, dates.len() as u32 + 1, 0).as_deref(),
        Some("31.12.1899")
    );
}

#[test]
fn test_types_written_by_declared_sql_type() {
    let mut executor = MemoryExecutor::new();
    executor.register(
        "SELECT * FROM mixed",
        ResultSet::new()
            .column("qty", SqlType::INTEGER)
            .column("price", SqlType::DOUBLE)
            .column("total", SqlType::NUMERIC)
            .column("paid", SqlType::BOOLEAN)
            .column("payload", SqlType::OTHER)
            .column("ghost", SqlType::NULL)
            .row([
                SqlValue::Int(3),
                SqlValue::Float(9.99),
                SqlValue::Decimal("29.97".into()),
                SqlValue::Bool(true),
                SqlValue::Text("{\"a\":1}".into()),
                SqlValue::Int(5),
            ]),
    );

    let bytes = ExcelWriter::new(executor)
        .create_excel(&Tab::new("Mixed", "SELECT * FROM mixed"))
        .unwrap();
    let range = read_sheet(&bytes, "Mixed");

    assert_eq!(number(&range, 1, 0), Some(3.0));
    assert_eq!(number(&range, 1, 1), Some(9.99));
    assert_eq!(number(&range, 1, 2), Some(29.97));
    assert_eq!(range.get_value((1, 3)), Some(&Data::Bool(true)));
    assert_eq!(text(&range, 1, 4).as_deref(), Some("{\"a\":1}"));
    // unknown type codes fall back to text
    assert_eq!(text(&range, 1, 5).as_deref(), Some("5"));
}

#[test]
fn test_exact_decimal_text() {
    let mut executor = MemoryExecutor::new();
    executor.register(
        "SELECT big FROM ledger",
        ResultSet::new()
            .column("big", SqlType::NUMERIC)
            .row([SqlValue::Decimal("12345678901234567890.12".into())]),
    );
    let options = ExportOptions::new().with_decimal_mode(DecimalMode::ExactText);

    let bytes = ExcelWriter::new(executor)
        .create_excel_with_options(&Tab::new("Ledger", "SELECT big FROM ledger"), &options)
        .unwrap();

    assert_eq!(
        text(&read_sheet(&bytes, "Ledger"), 1, 0).as_deref(),
        Some("12345678901234567890.12")
    );
}

#[test]
fn test_template_replacement_is_single_pass() {
    let mut executor = MemoryExecutor::new();
    executor.register(
        "SELECT note FROM notes",
        ResultSet::new()
            .column("note", SqlType::VARCHAR)
            .row(["{x}"])
            .row(["Dear {customer}, see {x}"]),
    );
    let mut writer =
        ExcelWriter::new(executor).with_replacements([("x", "{y}"), ("customer", "Ms. Smith")]);

    let bytes = writer
        .create_excel(&Tab::new("Notes", "SELECT note FROM notes"))
        .unwrap();
    let range = read_sheet(&bytes, "Notes");

    assert_eq!(text(&range, 1, 0).as_deref(), Some("{y}"));
    assert_eq!(
        text(&range, 2, 0).as_deref(),
        Some("Dear Ms. Smith, see {y}")
    );
}

#[test]
fn test_hyperlink_detection_warnings() {
    let mut executor = MemoryExecutor::new();
    executor.register(
        "SELECT url FROM links",
        ResultSet::new()
            .column("url", SqlType::VARCHAR)
            .row(["http://example.com/a b"])
            .row(["http://not a uri"]),
    );
    let options = ExportOptions::new().with_auto_hyperlinks(true);

    let report = ExcelWriter::new(executor)
        .export_with_report(&[Tab::new("Links", "SELECT url FROM links")], &options)
        .unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(
        &report.warnings[0],
        ExportWarning::MalformedHyperlink { value, .. } if value == "http://not a uri"
    ));
    let range = read_sheet(&report.bytes, "Links");
    // both values stay readable as text
    assert_eq!(text(&range, 1, 0).as_deref(), Some("http://example.com/a b"));
    assert_eq!(text(&range, 2, 0).as_deref(), Some("http://not a uri"));
}

#[test]
fn test_hint_row_and_multiple_tabs() {
    let mut executor = MemoryExecutor::new();
    executor.register(
        "SELECT region, revenue FROM sales WHERE year = ?",
        ResultSet::new()
            .column("region", SqlType::VARCHAR)
            .column("revenue", SqlType::DOUBLE)
            .row([SqlValue::from("North"), SqlValue::from(1200.5)])
            .row([SqlValue::from("South"), SqlValue::from(980.0)]),
    );
    executor.register(
        "SELECT 1 AS one",
        ResultSet::new().column("one", SqlType::INTEGER).row([1]),
    );
    let tabs = [
        Tab::new("Sales", "SELECT region, revenue FROM sales WHERE year = ?")
            .with_parameter(2024)
            .with_hint("Preliminary figures"),
        Tab::new("Check", "SELECT 1 AS one"),
    ];

    let report = ExcelWriter::new(executor)
        .export_with_report(&tabs, &ExportOptions::default())
        .unwrap();

    assert_eq!(sheet_names(&report.bytes), vec!["Sales", "Check"]);
    assert_eq!(report.total_rows(), 3);

    let sales = read_sheet(&report.bytes, "Sales");
    assert_eq!(text(&sales, 0, 0).as_deref(), Some("Preliminary figures"));
    assert!(is_absent(&sales, 1, 0));
    assert_eq!(text(&sales, 2, 0).as_deref(), Some("region"));
    assert_eq!(text(&sales, 2, 1).as_deref(), Some("revenue"));
    assert_eq!(text(&sales, 3, 0).as_deref(), Some("North"));
    assert_eq!(number(&sales, 4, 1), Some(980.0));

    let check = read_sheet(&report.bytes, "Check");
    assert_eq!(number(&check, 1, 0), Some(1.0));
}

#[test]
fn test_large_export_with_small_window() {
    const ROWS: i64 = 2_500;
    let mut set = ResultSet::new()
        .column("id", SqlType::BIGINT)
        .column("label", SqlType::VARCHAR);
    for i in 0..ROWS {
        set.push_row([SqlValue::Int(i), SqlValue::Text(format!("row-{}", i))]);
    }
    let mut executor = MemoryExecutor::new();
    executor.register("SELECT id, label FROM big", set);
    let options = ExportOptions::new().with_rows_in_memory(10);

    let bytes = ExcelWriter::new(executor)
        .create_excel_with_options(&Tab::new("Big", "SELECT id, label FROM big"), &options)
        .unwrap();
    let range = read_sheet(&bytes, "Big");

    assert_eq!(range.height(), ROWS as usize + 1);
    for i in [0, 1, 9, 10, 11, 1234, ROWS - 1] {
        let row = i as u32 + 1;
        assert_eq!(number(&range, row, 0), Some(i as f64));
        assert_eq!(text(&range, row, 1), Some(format!("row-{}", i)));
    }
}

#[test]
fn test_written_file_opens() {
    let mut executor = MemoryExecutor::new();
    executor.register(
        "SELECT 'x' AS v",
        ResultSet::new().column("v", SqlType::CHAR).row(["x"]),
    );
    let bytes = ExcelWriter::new(executor)
        .create_excel(&Tab::new("File", "SELECT 'x' AS v"))
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.xlsx");
    std::fs::write(&path, &bytes).unwrap();

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    let range = workbook.worksheet_range("File").unwrap();
    assert_eq!(text(&range, 1, 0).as_deref(), Some("x"));
}

#[test]
fn test_invalid_sheet_name_is_fatal() {
    let executor = MemoryExecutor::new();
    let err = ExcelWriter::new(executor)
        .create_excel(&Tab::new("Q1/Q2", "SELECT 1"))
        .unwrap_err();

    match err {
        ExcelError::TabError { source, .. } => {
            assert!(matches!(*source, ExcelError::InvalidSheetName { .. }))
        }
        other => panic!("unexpected error: {other}"),
    }
}
