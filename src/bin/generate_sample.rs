use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Duration, NaiveDate};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const CITIES: [&str; 3] = ["Yangon", "Mandalay", "Naypyitaw"];
const PRODUCT_LINES: [&str; 6] = [
    "Health and beauty",
    "Electronic accessories",
    "Home and lifestyle",
    "Sports and travel",
    "Food and beverages",
    "Fashion accessories",
];
const TAX_RATE: f64 = 0.05;
const ROWS: usize = 1000;

/// One row of the generated file, in the column layout the dashboard reads.
#[derive(Debug, Serialize)]
struct SaleRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "City")]
    city: &'static str,
    #[serde(rename = "Product line")]
    product_line: &'static str,
    #[serde(rename = "Unit price")]
    unit_price: f64,
    #[serde(rename = "Quantity")]
    quantity: i64,
    #[serde(rename = "Total")]
    total: f64,
    #[serde(rename = "gross income")]
    gross_income: f64,
    #[serde(rename = "Rating")]
    rating: f64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn index(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn generate(rng: &mut SimpleRng) -> Result<Vec<SaleRow>> {
    let start = NaiveDate::from_ymd_opt(2019, 1, 1).context("invalid start date")?;
    let days = 90;

    let mut rows: Vec<SaleRow> = (0..ROWS)
        .map(|_| {
            let product_idx = rng.index(PRODUCT_LINES.len());
            // Lines differ in price level so the projection shows some grouping.
            let base = 20.0 + 12.0 * product_idx as f64;
            let unit_price = round2(rng.uniform(base, base + 40.0));
            let quantity = 1 + rng.index(10) as i64;
            let subtotal = unit_price * quantity as f64;
            SaleRow {
                date: start + Duration::days(rng.index(days) as i64),
                city: CITIES[rng.index(CITIES.len())],
                product_line: PRODUCT_LINES[product_idx],
                unit_price,
                quantity,
                total: round2(subtotal * (1.0 + TAX_RATE)),
                gross_income: round2(subtotal * TAX_RATE),
                rating: (rng.uniform(4.0, 10.0) * 10.0).round() / 10.0,
            }
        })
        .collect();
    rows.sort_by_key(|r| r.date);
    Ok(rows)
}

fn write_csv(rows: &[SaleRow], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(rows: &[SaleRow], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Date", DataType::Date32, false),
        Field::new("City", DataType::Utf8, false),
        Field::new("Product line", DataType::Utf8, false),
        Field::new("Unit price", DataType::Float64, false),
        Field::new("Quantity", DataType::Int64, false),
        Field::new("Total", DataType::Float64, false),
        Field::new("gross income", DataType::Float64, false),
        Field::new("Rating", DataType::Float64, false),
    ]));

    let dates = Date32Array::from(
        rows.iter()
            .map(|r| r.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            .collect::<Vec<_>>(),
    );
    let cities = StringArray::from(rows.iter().map(|r| r.city).collect::<Vec<_>>());
    let lines = StringArray::from(rows.iter().map(|r| r.product_line).collect::<Vec<_>>());
    let column = |f: fn(&SaleRow) -> f64| Float64Array::from(rows.iter().map(f).collect::<Vec<_>>());

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(dates),
            Arc::new(cities),
            Arc::new(lines),
            Arc::new(column(|r| r.unit_price)),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.quantity).collect::<Vec<_>>())),
            Arc::new(column(|r| r.total)),
            Arc::new(column(|r| r.gross_income)),
            Arc::new(column(|r| r.rating)),
        ],
    )
    .context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng)?;

    write_csv(&rows, "sample_sales.csv")?;
    write_parquet(&rows, "sample_sales.parquet")?;

    println!(
        "Wrote {} sales rows ({} cities, {} product lines) to sample_sales.csv and sample_sales.parquet",
        rows.len(),
        CITIES.len(),
        PRODUCT_LINES.len()
    );
    Ok(())
}
