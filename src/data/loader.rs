use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use log::debug;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::RawParticle;
use crate::error::{Error, Result};

/// Columns every input table must provide, in `RawParticle` field order.
pub const REQUIRED_COLUMNS: [&str; 8] = ["x", "y", "z", "vx", "vy", "vz", "mass", "charge"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load raw particle rows from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one particle per line (default simulation output)
/// * `.json`    – `[{ "x": ..., "vx": ..., "mass": ..., ... }, ...]`
/// * `.parquet` – one numeric column per field
///
/// Extra columns are ignored. Values are not validated beyond being numbers.
pub fn load_file(path: &Path) -> Result<Vec<RawParticle>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    debug!("loading {} as '{ext}'", path.display());
    match ext.as_str() {
        "csv" => load_csv(File::open(path)?),
        "json" => load_json(File::open(path)?),
        "parquet" | "pq" => load_parquet(File::open(path)?),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}

/// Locate every required column in `headers`, or report all that are absent.
fn required_indices<S: AsRef<str>>(headers: &[S]) -> Result<[usize; 8]> {
    let mut indices = [0usize; 8];
    let mut missing = Vec::new();
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        match headers.iter().position(|h| h.as_ref().trim() == name) {
            Some(i) => *slot = i,
            None => missing.push(name.to_string()),
        }
    }
    if missing.is_empty() {
        Ok(indices)
    } else {
        Err(Error::Schema { missing })
    }
}

fn from_values(v: [f64; 8]) -> RawParticle {
    RawParticle {
        x: v[0],
        y: v[1],
        z: v[2],
        vx: v[3],
        vy: v[4],
        vz: v[5],
        mass: v[6],
        charge: v[7],
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, numeric cells.
/// Empty cells are read as NaN and passed through.
pub fn load_csv<R: Read>(source: R) -> Result<Vec<RawParticle>> {
    let mut reader = csv::Reader::from_reader(source);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let indices = required_indices(headers.as_slice())?;

    let mut particles = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let mut values = [0.0; 8];
        for (k, (slot, &col_idx)) in values.iter_mut().zip(&indices).enumerate() {
            let cell = record.get(col_idx).unwrap_or("").trim();
            *slot = parse_cell(cell, row_no, REQUIRED_COLUMNS[k])?;
        }
        particles.push(from_values(values));
    }
    Ok(particles)
}

fn parse_cell(cell: &str, row: usize, column: &str) -> Result<f64> {
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>().map_err(|_| Error::Parse {
        row,
        column: column.to_string(),
        value: cell.to_string(),
    })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "x": 0.01, "y": 0.0, "z": -0.02, "vx": 1.0e5, "vy": 0.0, "vz": 0.0,
///     "mass": 3.34e-27, "charge": 1.6e-19, "id": 7 },
///   ...
/// ]
/// ```
///
/// The first record defines the schema; `null` reads as NaN.
pub fn load_json<R: Read>(source: R) -> Result<Vec<RawParticle>> {
    let root: JsonValue = serde_json::from_reader(source)?;
    let records = root.as_array().ok_or_else(|| Error::Parse {
        row: 0,
        column: "<root>".to_string(),
        value: "expected a top-level JSON array".to_string(),
    })?;

    if let Some(first) = records.first().and_then(|r| r.as_object()) {
        let keys: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        required_indices(keys.as_slice())?;
    }

    let mut particles = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| Error::Parse {
            row: i,
            column: "<record>".to_string(),
            value: rec.to_string(),
        })?;

        let mut values = [0.0; 8];
        for (slot, name) in values.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = match obj.get(name) {
                Some(JsonValue::Null) => f64::NAN,
                Some(v) => v.as_f64().ok_or_else(|| Error::Parse {
                    row: i,
                    column: name.to_string(),
                    value: v.to_string(),
                })?,
                None => {
                    return Err(Error::Parse {
                        row: i,
                        column: name.to_string(),
                        value: "<missing>".to_string(),
                    })
                }
            };
        }
        particles.push(from_values(values));
    }
    Ok(particles)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one numeric column per required field.
///
/// Works with files written by **Pandas** (`df.to_parquet()`), **Polars**
/// and the bundled `generate_sample` tool.
pub fn load_parquet(file: File) -> Result<Vec<RawParticle>> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let field_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let indices = required_indices(field_names.as_slice())?;
    let reader = builder.build()?;

    let mut particles = Vec::new();
    let mut row_offset = 0;
    for batch_result in reader {
        let batch = batch_result?;
        let columns: Vec<Vec<f64>> = indices
            .iter()
            .zip(REQUIRED_COLUMNS)
            .map(|(&idx, name)| numeric_column(batch.column(idx), name, row_offset))
            .collect::<Result<_>>()?;

        for row in 0..batch.num_rows() {
            let mut values = [0.0; 8];
            for (slot, column) in values.iter_mut().zip(&columns) {
                *slot = column[row];
            }
            particles.push(from_values(values));
        }
        row_offset += batch.num_rows();
    }
    Ok(particles)
}

// -- Arrow helpers --

/// Widen a numeric Arrow column to `f64`; nulls become NaN.
fn numeric_column(col: &Arc<dyn Array>, name: &str, row_offset: usize) -> Result<Vec<f64>> {
    let values = match col.data_type() {
        DataType::Float64 => downcast::<Float64Array>(col, name, row_offset)?
            .iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect(),
        DataType::Float32 => downcast::<Float32Array>(col, name, row_offset)?
            .iter()
            .map(|v| v.map(f64::from).unwrap_or(f64::NAN))
            .collect(),
        DataType::Int64 => downcast::<Int64Array>(col, name, row_offset)?
            .iter()
            .map(|v| v.map(|i| i as f64).unwrap_or(f64::NAN))
            .collect(),
        DataType::Int32 => downcast::<Int32Array>(col, name, row_offset)?
            .iter()
            .map(|v| v.map(f64::from).unwrap_or(f64::NAN))
            .collect(),
        other => {
            return Err(Error::Parse {
                row: row_offset,
                column: name.to_string(),
                value: format!("{other:?} column"),
            })
        }
    };
    Ok(values)
}

fn downcast<'a, T: 'static>(col: &'a Arc<dyn Array>, name: &str, row: usize) -> Result<&'a T> {
    col.as_any().downcast_ref::<T>().ok_or_else(|| Error::Parse {
        row,
        column: name.to_string(),
        value: format!("{:?} column", col.data_type()),
    })
}
