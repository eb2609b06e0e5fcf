use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray, Date32Array, Date64Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use chrono::{NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::DataLoadError;
use super::model::{
    Record, Table, COL_CITY, COL_DATE, COL_GROSS_INCOME, COL_PRODUCT_LINE, COL_QUANTITY,
    COL_RATING, COL_TOTAL, COL_UNIT_PRICE,
};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sales table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the columns below (recommended)
/// * `.json`    – `[{ "Date": "2019-01-05", "City": "Yangon", ... }, ...]`
/// * `.parquet` – same column names, Date as string, Date32/Date64 or Timestamp
///
/// Required columns: `Date, City, Product line, Unit price, Quantity, Total,
/// gross income, Rating`.  Malformed numeric cells become nulls; a missing
/// column or an unparseable date fails the whole load.
pub fn load_file(path: &Path) -> Result<Table, DataLoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" | "tsv" | "txt" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(DataLoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} records from {} ({} cities, {} product lines)",
        table.len(),
        path.display(),
        table.cities().len(),
        table.product_lines().len()
    );
    Ok(table)
}

fn open(path: &Path) -> Result<File, DataLoadError> {
    File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Cell parsing shared by every format
// ---------------------------------------------------------------------------

/// Date layouts accepted in text cells, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a calendar date; datetimes keep only their date part.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Collects records and counts malformed numeric cells per column.
#[derive(Default)]
struct RecordSink {
    records: Vec<Record>,
    malformed: BTreeMap<&'static str, usize>,
}

/// A numeric cell as found in the source, before validation.
enum RawNumber<'a> {
    Null,
    Number(f64),
    Text(&'a str),
    Other,
}

impl RecordSink {
    fn number(&mut self, column: &'static str, raw: RawNumber<'_>) -> Option<f64> {
        let parsed = match raw {
            RawNumber::Null => return None,
            RawNumber::Number(v) => Some(v),
            RawNumber::Text(s) if s.trim().is_empty() => return None,
            RawNumber::Text(s) => s.trim().parse::<f64>().ok(),
            RawNumber::Other => None,
        };
        match parsed {
            Some(v) if v.is_finite() => Some(v),
            _ => {
                *self.malformed.entry(column).or_default() += 1;
                None
            }
        }
    }

    fn integer(&mut self, column: &'static str, raw: RawNumber<'_>) -> Option<i64> {
        let raw = match raw {
            RawNumber::Text(s) => match s.trim().parse::<i64>() {
                Ok(i) => return Some(i),
                Err(_) => RawNumber::Text(s),
            },
            other => other,
        };
        let v = self.number(column, raw)?;
        if v.fract() == 0.0 {
            Some(v as i64)
        } else {
            *self.malformed.entry(column).or_default() += 1;
            None
        }
    }

    fn category(row: usize, column: &'static str, value: Option<&str>) -> Result<String, DataLoadError> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(DataLoadError::MissingCategory { row, column }),
        }
    }

    fn finish(self) -> Table {
        for (column, count) in &self.malformed {
            log::warn!("{count} malformed value(s) in column '{column}' treated as null");
        }
        Table::from_records(self.records)
    }
}

fn text_date(row: usize, value: &str) -> Result<NaiveDate, DataLoadError> {
    parse_date(value).ok_or_else(|| DataLoadError::InvalidDate {
        row,
        value: value.to_string(),
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Positions of the required columns in a header row or file schema.
struct ColumnIndex {
    date: usize,
    city: usize,
    product_line: usize,
    unit_price: usize,
    quantity: usize,
    total: usize,
    gross_income: usize,
    rating: usize,
}

impl ColumnIndex {
    fn resolve(names: &[&str]) -> Result<Self, DataLoadError> {
        let find = |name: &'static str| {
            names
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}') == name)
                .ok_or(DataLoadError::MissingColumn(name))
        };
        Ok(ColumnIndex {
            date: find(COL_DATE)?,
            city: find(COL_CITY)?,
            product_line: find(COL_PRODUCT_LINE)?,
            unit_price: find(COL_UNIT_PRICE)?,
            quantity: find(COL_QUANTITY)?,
            total: find(COL_TOTAL)?,
            gross_income: find(COL_GROSS_INCOME)?,
            rating: find(COL_RATING)?,
        })
    }
}

/// CSV layout: header row with column names; extra columns are ignored.
/// `.tsv` files are read tab-delimited.
fn load_csv(path: &Path) -> Result<Table, DataLoadError> {
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(open(path)?);
    let cols = ColumnIndex::resolve(&reader.headers()?.iter().collect::<Vec<_>>())?;

    let mut sink = RecordSink::default();
    for (row, result) in reader.records().enumerate() {
        let fields = result?;
        let cell = |idx: usize| fields.get(idx).unwrap_or("");
        let text = |idx: usize| RawNumber::Text(cell(idx));

        let record = Record {
            date: text_date(row, cell(cols.date))?,
            city: RecordSink::category(row, COL_CITY, fields.get(cols.city))?,
            product_line: RecordSink::category(row, COL_PRODUCT_LINE, fields.get(cols.product_line))?,
            unit_price: sink.number(COL_UNIT_PRICE, text(cols.unit_price)),
            quantity: sink.integer(COL_QUANTITY, text(cols.quantity)),
            total: sink.number(COL_TOTAL, text(cols.total)),
            gross_income: sink.number(COL_GROSS_INCOME, text(cols.gross_income)),
            rating: sink.number(COL_RATING, text(cols.rating)),
        };
        sink.records.push(record);
    }

    Ok(sink.finish())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Date": "2019-01-05", "City": "Yangon", "Product line": "Health and beauty",
///     "Unit price": 74.69, "Quantity": 7, "Total": 548.97, "gross income": 26.14,
///     "Rating": 9.1 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Table, DataLoadError> {
    let root: JsonValue = serde_json::from_reader(std::io::BufReader::new(open(path)?))?;
    let rows = root.as_array().ok_or(DataLoadError::NotAnArray)?;

    let mut sink = RecordSink::default();
    for (row, value) in rows.iter().enumerate() {
        let obj = value.as_object().ok_or(DataLoadError::NotAnObject(row))?;
        let field = |name: &'static str| obj.get(name).ok_or(DataLoadError::MissingColumn(name));

        let date = match field(COL_DATE)? {
            JsonValue::String(s) => text_date(row, s)?,
            other => {
                return Err(DataLoadError::InvalidDate {
                    row,
                    value: other.to_string(),
                })
            }
        };
        let city = RecordSink::category(row, COL_CITY, field(COL_CITY)?.as_str())?;
        let product_line = RecordSink::category(row, COL_PRODUCT_LINE, field(COL_PRODUCT_LINE)?.as_str())?;

        let record = Record {
            date,
            city,
            product_line,
            unit_price: sink.number(COL_UNIT_PRICE, json_number(field(COL_UNIT_PRICE)?)),
            quantity: sink.integer(COL_QUANTITY, json_number(field(COL_QUANTITY)?)),
            total: sink.number(COL_TOTAL, json_number(field(COL_TOTAL)?)),
            gross_income: sink.number(COL_GROSS_INCOME, json_number(field(COL_GROSS_INCOME)?)),
            rating: sink.number(COL_RATING, json_number(field(COL_RATING)?)),
        };
        sink.records.push(record);
    }

    Ok(sink.finish())
}

fn json_number(val: &JsonValue) -> RawNumber<'_> {
    match val {
        JsonValue::Null => RawNumber::Null,
        JsonValue::Number(n) => n.as_f64().map_or(RawNumber::Other, RawNumber::Number),
        JsonValue::String(s) => RawNumber::Text(s),
        _ => RawNumber::Other,
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the same column names as the CSV layout.
///
/// `Date` may be Utf8, Date32, Date64 or a Timestamp of any unit (the date
/// part is kept).  Numeric columns may be any integer, float or decimal type,
/// or Utf8.
fn load_parquet(path: &Path) -> Result<Table, DataLoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)?;
    let names: Vec<&str> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect();
    let cols = ColumnIndex::resolve(&names)?;
    let reader = builder.build()?;

    let mut sink = RecordSink::default();
    let mut row_offset = 0;

    for batch_result in reader {
        let batch = batch_result?;
        let date_col = date_column(batch.column(cols.date))?;
        let city_col = batch.column(cols.city);
        let line_col = batch.column(cols.product_line);
        let price_col = NumberColumn::new(batch.column(cols.unit_price))?;
        let qty_col = NumberColumn::new(batch.column(cols.quantity))?;
        let total_col = NumberColumn::new(batch.column(cols.total))?;
        let income_col = NumberColumn::new(batch.column(cols.gross_income))?;
        let rating_col = NumberColumn::new(batch.column(cols.rating))?;

        for i in 0..batch.num_rows() {
            let row = row_offset + i;
            let record = Record {
                date: extract_date(&date_col, i, row)?,
                city: RecordSink::category(row, COL_CITY, extract_str(city_col, i))?,
                product_line: RecordSink::category(row, COL_PRODUCT_LINE, extract_str(line_col, i))?,
                unit_price: sink.number(COL_UNIT_PRICE, price_col.raw(i)),
                quantity: sink.integer(COL_QUANTITY, qty_col.raw(i)),
                total: sink.number(COL_TOTAL, total_col.raw(i)),
                gross_income: sink.number(COL_GROSS_INCOME, income_col.raw(i)),
                rating: sink.number(COL_RATING, rating_col.raw(i)),
            };
            sink.records.push(record);
        }
        row_offset += batch.num_rows();
    }

    Ok(sink.finish())
}

// -- Parquet / Arrow helpers --

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn extract_str(col: &ArrayRef, row: usize) -> Option<&str> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => Some(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row)),
        _ => None,
    }
}

/// Timestamps are truncated to their calendar date.
fn date_column(col: &ArrayRef) -> Result<ArrayRef, DataLoadError> {
    match col.data_type() {
        DataType::Timestamp(..) => Ok(cast(col, &DataType::Date32)?),
        _ => Ok(col.clone()),
    }
}

fn extract_date(col: &ArrayRef, i: usize, row: usize) -> Result<NaiveDate, DataLoadError> {
    let invalid = || DataLoadError::InvalidDate {
        row,
        value: format!("<{:?}>", col.data_type()),
    };
    if col.is_null(i) {
        return Err(invalid());
    }
    let days = match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            let s = extract_str(col, i).ok_or_else(invalid)?;
            return text_date(row, s);
        }
        DataType::Date32 => col
            .as_any()
            .downcast_ref::<Date32Array>()
            .map(|a| a.value(i)),
        DataType::Date64 => col
            .as_any()
            .downcast_ref::<Date64Array>()
            .and_then(|a| i32::try_from(a.value(i).div_euclid(86_400_000)).ok()),
        _ => None,
    };
    days.and_then(|d| d.checked_add(UNIX_EPOCH_DAYS_FROM_CE))
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(invalid)
}

/// A numeric source column, with every numeric Arrow type widened to Float64.
enum NumberColumn {
    Float(Float64Array),
    Text(ArrayRef),
    Other(ArrayRef),
}

impl NumberColumn {
    fn new(col: &ArrayRef) -> Result<Self, DataLoadError> {
        Ok(match col.data_type() {
            DataType::Utf8 | DataType::LargeUtf8 => NumberColumn::Text(col.clone()),
            dt if dt.is_numeric() => {
                let widened = cast(col, &DataType::Float64)?;
                NumberColumn::Float(widened.as_primitive::<Float64Type>().clone())
            }
            _ => NumberColumn::Other(col.clone()),
        })
    }

    fn raw(&self, row: usize) -> RawNumber<'_> {
        match self {
            NumberColumn::Float(a) if a.is_null(row) => RawNumber::Null,
            NumberColumn::Float(a) => RawNumber::Number(a.value(row)),
            NumberColumn::Text(a) => extract_str(a, row).map_or(RawNumber::Null, RawNumber::Text),
            NumberColumn::Other(a) if a.is_null(row) => RawNumber::Null,
            NumberColumn::Other(_) => RawNumber::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{
        Int16Array, Int64Array, StringArray, TimestampMillisecondArray, UInt8Array,
    };
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::{tempdir, NamedTempFile};

    use super::*;
    use crate::data::model::fixtures::date;

    const HEADER: &str = "Invoice ID,Date,City,Product line,Unit price,Quantity,Total,gross income,Rating";

    fn write_csv(body: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        write!(file, "{body}").unwrap();
        file
    }

    #[test]
    fn parses_dates_in_known_layouts() {
        assert_eq!(parse_date("2019-01-05"), Some(date(2019, 1, 5)));
        assert_eq!(parse_date("1/5/2019"), Some(date(2019, 1, 5)));
        assert_eq!(parse_date("2019/01/05"), Some(date(2019, 1, 5)));
        assert_eq!(parse_date("2019-01-05 13:08:00"), Some(date(2019, 1, 5)));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn loads_csv_rows_in_order() {
        let file = write_csv(
            "750-67-8428,1/5/2019,Yangon,Health and beauty,74.69,7,548.9715,26.1415,9.1\n\
             226-31-3081,3/8/2019,Naypyitaw,Electronic accessories,15.28,5,80.22,3.82,9.6\n",
        );
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        let first = &table.records()[0];
        assert_eq!(first.date, date(2019, 1, 5));
        assert_eq!(first.city, "Yangon");
        assert_eq!(first.product_line, "Health and beauty");
        assert_eq!(first.quantity, Some(7));
        assert_eq!(first.rating, Some(9.1));
        assert_eq!(table.records()[1].city, "Naypyitaw");
    }

    #[test]
    fn malformed_numbers_become_null() {
        let file = write_csv("x,2019-01-05,Yangon,Food,abc,,12.5,n/a,7\n");
        let table = load_file(file.path()).unwrap();
        let r = &table.records()[0];
        assert_eq!(r.unit_price, None);
        assert_eq!(r.quantity, None);
        assert_eq!(r.total, Some(12.5));
        assert_eq!(r.gross_income, None);
        assert_eq!(r.rating, Some(7.0));
    }

    #[test]
    fn bad_date_fails_the_load() {
        let file = write_csv("x,not-a-date,Yangon,Food,1,1,1,1,1\n");
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidDate { row: 0, .. }), "{err}");
    }

    #[test]
    fn missing_column_fails_the_load() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Date,City,Product line,Unit price,Quantity,Total,Rating").unwrap();
        writeln!(file, "2019-01-05,Yangon,Food,1,1,1,1").unwrap();
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn("gross income")), "{err}");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = load_file(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }), "{err}");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("sales.xlsx")).unwrap_err();
        assert!(matches!(err, DataLoadError::UnsupportedFormat(ref e) if e == "xlsx"));
    }

    #[test]
    fn loads_json_records() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"Date": "2019-02-01", "City": "Mandalay", "Product line": "Sports and travel",
                 "Unit price": 10.0, "Quantity": 3, "Total": 30.0, "gross income": 1.5,
                 "Rating": null}}]"#
        )
        .unwrap();
        let table = load_file(file.path()).unwrap();
        let r = &table.records()[0];
        assert_eq!(r.date, date(2019, 2, 1));
        assert_eq!(r.quantity, Some(3));
        assert_eq!(r.rating, None);
    }

    /// Write a one-row sales Parquet file with the given date, quantity and rating columns.
    fn write_parquet(path: &Path, date: ArrayRef, quantity: ArrayRef, rating: ArrayRef) {
        let columns: Vec<(&str, ArrayRef)> = vec![
            (COL_DATE, date),
            (COL_CITY, Arc::new(StringArray::from(vec!["Yangon"]))),
            (COL_PRODUCT_LINE, Arc::new(StringArray::from(vec!["Food"]))),
            (COL_UNIT_PRICE, Arc::new(Float64Array::from(vec![2.0f64]))),
            (COL_QUANTITY, quantity),
            (COL_TOTAL, Arc::new(Float64Array::from(vec![8.0f64]))),
            (COL_GROSS_INCOME, Arc::new(Float64Array::from(vec![None::<f64>]))),
            (COL_RATING, rating),
        ];
        let batch = RecordBatch::try_from_iter(columns).unwrap();
        let mut writer = ArrowWriter::try_new(File::create(path).unwrap(), batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn loads_parquet_with_date32_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sales.parquet");
        // 2019-01-05 is day 17_901 after the epoch.
        write_parquet(
            &path,
            Arc::new(Date32Array::from(vec![17_901i32])),
            Arc::new(Int64Array::from(vec![Some(4i64)])),
            Arc::new(Float64Array::from(vec![Some(5.5f64)])),
        );

        let table = load_file(&path).unwrap();
        let r = &table.records()[0];
        assert_eq!(r.date, date(2019, 1, 5));
        assert_eq!(r.city, "Yangon");
        assert_eq!(r.quantity, Some(4));
        assert_eq!(r.gross_income, None);
        assert_eq!(r.rating, Some(5.5));
    }

    #[test]
    fn parquet_small_integer_columns_are_widened() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("narrow.parquet");
        write_parquet(
            &path,
            Arc::new(StringArray::from(vec!["2019-01-05"])),
            Arc::new(Int16Array::from(vec![4i16])),
            Arc::new(UInt8Array::from(vec![7u8])),
        );

        let table = load_file(&path).unwrap();
        let r = &table.records()[0];
        assert_eq!(r.quantity, Some(4));
        assert_eq!(r.rating, Some(7.0));
    }

    #[test]
    fn parquet_date_encodings() {
        // 2019-01-05 12:00 UTC in milliseconds.
        let noon_ms = 17_901i64 * 86_400_000 + 43_200_000;
        let encodings: Vec<(&str, ArrayRef)> = vec![
            ("utf8", Arc::new(StringArray::from(vec!["1/5/2019"]))),
            ("date64", Arc::new(Date64Array::from(vec![17_901i64 * 86_400_000]))),
            ("timestamp", Arc::new(TimestampMillisecondArray::from(vec![noon_ms]))),
        ];
        let dir = tempdir().unwrap();
        for (name, dates) in encodings {
            let path = dir.path().join(format!("{name}.parquet"));
            write_parquet(
                &path,
                dates,
                Arc::new(Int64Array::from(vec![1i64])),
                Arc::new(Float64Array::from(vec![1.0f64])),
            );
            let table = load_file(&path).unwrap();
            assert_eq!(table.records()[0].date, date(2019, 1, 5), "{name}");
        }
    }

    #[test]
    fn parquet_without_rows_still_checks_columns() {
        let schema = Arc::new(Schema::new(vec![Field::new(COL_DATE, DataType::Date32, false)]));
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.parquet");
        let writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.close().unwrap();

        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn(COL_CITY)), "{err}");
    }

    #[test]
    fn tsv_files_are_tab_delimited() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "{}", HEADER.replace(',', "\t")).unwrap();
        writeln!(file, "x\t2019-01-05\tYangon\tFood, fresh\t1.5\t2\t3\t0.15\t8").unwrap();

        let table = load_file(file.path()).unwrap();
        let r = &table.records()[0];
        assert_eq!(r.product_line, "Food, fresh");
        assert_eq!(r.unit_price, Some(1.5));
        assert_eq!(r.rating, Some(8.0));
    }
}
