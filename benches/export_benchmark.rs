use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use queryexcel::cell_writer::format_general;
use queryexcel::cursor::memory::{MemoryExecutor, ResultSet, SqlValue};
use queryexcel::{ExcelWriter, ExportOptions, SqlType, Tab};

const SQL: &str = "SELECT id, name, amount, booked FROM orders";

fn orders(size: i64) -> ResultSet {
    let mut set = ResultSet::new()
        .column("id", SqlType::BIGINT)
        .column("name", SqlType::VARCHAR)
        .column("amount", SqlType::DOUBLE)
        .column("booked", SqlType::DATE);
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    for i in 0..size {
        set.push_row([
            SqlValue::Int(i),
            SqlValue::Text(format!("Customer_{}", i)),
            SqlValue::Float(i as f64 * 1.25),
            SqlValue::Date(start + chrono::Duration::days(i % 366)),
        ]);
    }
    set
}

fn benchmark_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");
    group.sample_size(10); // Large exports are slow

    for size in [1000, 10000, 50000].iter() {
        let mut executor = MemoryExecutor::new();
        executor.register(SQL, orders(*size));
        let mut writer = ExcelWriter::new(executor);
        let tab = Tab::new("Orders", SQL);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(writer.create_excel(&tab).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_rows_in_memory(c: &mut Criterion) {
    let mut group = c.benchmark_group("rows_in_memory");
    group.sample_size(10);

    let mut executor = MemoryExecutor::new();
    executor.register(SQL, orders(20000));
    let mut writer = ExcelWriter::new(executor);
    let tab = Tab::new("Orders", SQL);

    for window in [10, 500, 5000].iter() {
        let options = ExportOptions::new().with_rows_in_memory(*window);
        group.bench_with_input(BenchmarkId::from_parameter(window), window, |b, _| {
            b.iter(|| black_box(writer.create_excel_with_options(&tab, &options).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_format_general(c: &mut Criterion) {
    c.bench_function("format_general", |b| {
        b.iter(|| {
            for v in [0.0, 1.5, -123456.789, 1.0e-12, 98765432109.0, 3.0e15] {
                black_box(format_general(black_box(v)));
            }
        });
    });
}

criterion_group!(
    benches,
    benchmark_export,
    benchmark_rows_in_memory,
    benchmark_format_general
);
criterion_main!(benches);
