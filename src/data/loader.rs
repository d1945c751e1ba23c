use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Number, Value as JsonValue};

use super::cell::{Cell, CellType};
use super::column::Column;
use super::frame::DataFrame;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a data frame from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row followed by data rows; every column loads as string
/// * `.json`    – `[{ "col": value, ... }, ...]`; numbers and booleans keep their type
/// * `.parquet` – typed columns map onto int/float/string/bool, nulls to NA
pub fn load_file(path: &Path) -> Result<DataFrame> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let df = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            load_json(&text)?
        }
        "csv" => {
            let data = std::fs::read(path).context("reading CSV file")?;
            load_csv(&data)?
        }
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        df.n_rows(),
        df.names(),
        path.display()
    );
    Ok(df)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Read CSV bytes into a string matrix and load it. The first record is the header.
pub fn load_csv(data: &[u8]) -> Result<DataFrame> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(data);

    let records = reader
        .records()
        .enumerate()
        .map(|(row_no, result)| -> Result<Vec<String>> {
            let record = result.with_context(|| format!("CSV row {row_no}"))?;
            Ok(record.iter().map(str::to_string).collect())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DataFrame::from_records(&records)?)
}

/// Write the frame as CSV: header row, then one row per table row, NA as `NA`.
pub fn write_csv<W: Write>(df: &DataFrame, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for record in df.save_records() {
        out.write_record(&record).context("writing CSV record")?;
    }
    out.flush().context("flushing CSV output")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Records-oriented JSON:
///
/// ```json
/// [
///   { "sample": "A", "concentration": 1.5 },
///   { "sample": "B", "operator": "Bob" }
/// ]
/// ```
///
/// Columns appear in first-seen order. Integers, floats and booleans keep their
/// type (see [`DataFrame::from_rows`] for how a column's type is chosen); a key
/// missing from a row, or `null`, is NA.
pub fn load_json(text: &str) -> Result<DataFrame> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut header: Vec<String> = Vec::new();
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    let mut matrix: Vec<Vec<Cell>> = Vec::with_capacity(rows.len());

    for (i, rec) in rows.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = vec![Cell::String(None); header.len()];
        for (key, val) in obj {
            let j = *index.entry(key.clone()).or_insert_with(|| {
                header.push(key.clone());
                header.len() - 1
            });
            if j >= row.len() {
                row.resize(j + 1, Cell::String(None));
            }
            row[j] = json_to_cell(val);
        }
        matrix.push(row);
    }

    for row in &mut matrix {
        row.resize(header.len(), Cell::String(None));
    }
    Ok(DataFrame::from_rows(&header, &matrix)?)
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::Null => Cell::String(None),
        JsonValue::Bool(b) => Cell::from(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Cell::from(i),
            None => Cell::Float(n.as_f64()),
        },
        JsonValue::String(s) => Cell::from(s.as_str()),
        other => Cell::from(other.to_string()),
    }
}

/// Typed JSON records: numbers, strings and booleans keep their type, NA is `null`.
pub fn to_json_records(df: &DataFrame) -> JsonValue {
    let cols = df.ordered_columns();
    let rows = (0..df.n_rows())
        .map(|i| {
            let obj: Map<String, JsonValue> = cols
                .iter()
                .map(|c| (c.name().to_string(), cell_to_json(&c.cells()[i])))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();
    JsonValue::Array(rows)
}

fn cell_to_json(cell: &Cell) -> JsonValue {
    match cell {
        Cell::Int(Some(i)) => JsonValue::from(*i),
        Cell::Float(Some(f)) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        Cell::String(Some(s)) => JsonValue::String(s.clone()),
        Cell::Bool(Some(b)) => JsonValue::Bool(*b),
        _ => JsonValue::Null,
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Load a Parquet file, keeping column types where they map onto a cell type.
///
/// Integer columns of any width load as `int`, floating columns as `float`,
/// booleans as `bool`. Everything else is rendered to `string`.
pub fn load_parquet(path: &Path) -> Result<DataFrame> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let types: Vec<CellType> = schema
        .fields()
        .iter()
        .map(|f| cell_type_for(f.data_type()))
        .collect();
    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); types.len()];

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (j, ty) in types.iter().enumerate() {
            extract_cells(batch.column(j), *ty, &mut cells[j])
                .with_context(|| format!("reading column '{}'", schema.field(j).name()))?;
        }
    }

    let columns = schema
        .fields()
        .iter()
        .zip(types)
        .zip(cells)
        .map(|((field, ty), cells)| Column::new(field.name().clone(), ty, cells))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DataFrame::new(columns)?)
}

fn cell_type_for(data_type: &DataType) -> CellType {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => CellType::Int,
        DataType::Float16 | DataType::Float32 | DataType::Float64 => CellType::Float,
        DataType::Boolean => CellType::Bool,
        _ => CellType::String,
    }
}

/// Append the cells of one Arrow column, converted to `ty`.
fn extract_cells(col: &ArrayRef, ty: CellType, out: &mut Vec<Cell>) -> Result<()> {
    match ty {
        CellType::Int => {
            let ints = cast(col, &DataType::Int64)?;
            out.extend(ints.as_primitive::<Int64Type>().iter().map(Cell::Int));
        }
        CellType::Float => {
            let floats = cast(col, &DataType::Float64)?;
            out.extend(floats.as_primitive::<Float64Type>().iter().map(Cell::Float));
        }
        CellType::Bool => {
            out.extend(col.as_boolean().iter().map(Cell::Bool));
        }
        CellType::String => {
            for row in 0..col.len() {
                if col.is_null(row) {
                    out.push(Cell::String(None));
                } else {
                    out.push(Cell::String(Some(array_value_to_string(col, row)?)));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::ColumnTypes;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    use arrow::array::{BooleanArray, Float64Array, Int32Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    #[test]
    fn csv_loads_strings_and_parses() {
        let df = load_csv(b"name,age\nann,31\nbob,\n").unwrap();
        assert_eq!(df.dim(), (2, 2));
        assert_eq!(df.column("age").unwrap().cell_type(), CellType::String);

        let typed = df
            .parse(&ColumnTypes::Named(BTreeMap::from([(
                "age".to_string(),
                CellType::Int,
            )])))
            .unwrap();
        assert_eq!(typed.get_cell("age", 1).unwrap().0, &Cell::Int(None));
    }

    #[test]
    fn csv_rejects_ragged_rows() {
        assert!(load_csv(b"a,b\n1,2\n3\n").is_err());
    }

    #[test]
    fn csv_writer_renders_na() {
        let df = load_csv(b"x,y\n1,\n").unwrap();
        let df = df
            .parse(&ColumnTypes::Positional(vec![CellType::Int, CellType::Float]))
            .unwrap();
        let mut out = Vec::new();
        write_csv(&df, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "x,y\n1,NA\n");
    }

    #[test]
    fn json_fills_missing_keys_with_na() {
        let df = load_json(r#"[{"a": "x", "b": 1}, {"c": true}, {"a": null}]"#).unwrap();
        assert_eq!(df.names(), vec!["a", "b", "c"]);
        assert_eq!(
            df.save_records(),
            vec![
                vec!["a", "b", "c"],
                vec!["x", "1", "NA"],
                vec!["NA", "NA", "true"],
                vec!["NA", "NA", "NA"],
            ]
        );
    }

    #[test]
    fn json_keeps_value_types() {
        let df = load_json(
            r#"[{"id": 1, "score": 2, "ok": false, "tag": "a"},
                {"id": 2, "score": 0.5, "ok": true, "tag": 3}]"#,
        )
        .unwrap();
        assert_eq!(df.column("id").unwrap().cell_type(), CellType::Int);
        assert_eq!(
            df.column("score").unwrap().cells(),
            &[Cell::from(2.0), Cell::from(0.5)]
        );
        assert_eq!(df.column("ok").unwrap().cell_type(), CellType::Bool);
        assert_eq!(df.get_cell("tag", 1).unwrap().0, &Cell::from("3"));
        assert!(load_json(r#"[{"n": 1}, {"n": "one"}]"#).is_err());
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(load_json(r#"{"a": 1}"#).is_err());
        assert!(load_json(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn json_records_keep_types() {
        let df = load_csv(b"n,f\n1,\n").unwrap();
        let df = df
            .parse(&ColumnTypes::Positional(vec![CellType::Int, CellType::Float]))
            .unwrap();
        assert_eq!(
            to_json_records(&df),
            serde_json::json!([{ "n": 1, "f": null }])
        );
    }

    #[test]
    fn parquet_maps_types_and_nulls() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, true),
            Field::new("score", DataType::Float64, true),
            Field::new("name", DataType::Utf8, true),
            Field::new("ok", DataType::Boolean, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![Some(1), None])),
                Arc::new(Float64Array::from(vec![Some(0.5), Some(1.5)])),
                Arc::new(StringArray::from(vec![Some("a"), None])),
                Arc::new(BooleanArray::from(vec![None, Some(true)])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let df = load_file(&path).unwrap();
        assert_eq!(df.names(), vec!["id", "score", "name", "ok"]);
        assert_eq!(df.column("id").unwrap().cells(), &[Cell::from(1_i64), Cell::Int(None)]);
        assert_eq!(df.column("score").unwrap().cell_type(), CellType::Float);
        assert_eq!(df.get_cell("name", 1).unwrap().0, &Cell::String(None));
        assert_eq!(df.column("ok").unwrap().cells(), &[Cell::Bool(None), Cell::from(true)]);
    }

    #[test]
    fn load_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("t.csv");
        std::fs::write(&csv_path, "a\n1\n").unwrap();
        assert_eq!(load_file(&csv_path).unwrap().n_rows(), 1);

        let json_path = dir.path().join("t.JSON");
        std::fs::write(&json_path, r#"[{"a": 1}, {"a": 2}]"#).unwrap();
        assert_eq!(load_file(&json_path).unwrap().n_rows(), 2);

        let other = dir.path().join("t.xlsx");
        std::fs::write(&other, "").unwrap();
        assert!(load_file(&other).is_err());
    }
}
