use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::errors::ParquetError;
use thiserror::Error;
use npyz::WriterBuilder;

use super::model::{Label, MAX_LABEL, UNSET};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Arrow: {0}")]
    Arrow(#[from] ArrowError),
    #[error("Parquet: {0}")]
    Parquet(#[from] ParquetError),
    #[error("NPY: {0}")]
    Npy(std::io::Error),
    #[error("unsupported file extension: .{0}")]
    Unsupported(String),
    #[error("{0}")]
    Schema(String),
}

type Result<T> = std::result::Result<T, FormatError>;

// ---------------------------------------------------------------------------
// Format dispatch
// ---------------------------------------------------------------------------

/// On-disk encoding of a one-dimensional array, chosen by extension.
///
/// * `.parquet` / `.pq` – a single column (`value` for series, `label` for annotations)
/// * `.json`            – a flat array of numbers: `[0.12, 0.14, ...]`
/// * `.csv`             – header row, then one value per row
/// * `.npy`             – a 1-D NumPy array (`np.save`), float or integer dtype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Parquet,
    Json,
    Csv,
    Npy,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "parquet" | "pq" => Ok(Format::Parquet),
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            "npy" => Ok(Format::Npy),
            other => Err(FormatError::Unsupported(other.to_string())),
        }
    }
}

/// Whether `name` has an extension the store can read.
pub fn is_supported(name: &str) -> bool {
    Format::from_path(Path::new(name)).is_ok()
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

pub fn read_series(path: &Path) -> Result<Vec<f64>> {
    read_values(path)
}

/// Read a label vector. Float files are accepted when every value is
/// integral; every value must be a known state or unset.
pub fn read_labels(path: &Path) -> Result<Vec<Label>> {
    read_values(path)?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            to_label(v).ok_or_else(|| {
                FormatError::Schema(format!(
                    "label [{i}] = {v} is not a state in {UNSET}..={MAX_LABEL}"
                ))
            })
        })
        .collect()
}

fn to_label(v: f64) -> Option<Label> {
    if v.fract() != 0.0 || !(UNSET as f64..=MAX_LABEL as f64).contains(&v) {
        return None;
    }
    // Integral and inside the state domain, so the cast is exact.
    Some(v as Label)
}

pub fn write_series(path: &Path, values: &[f64]) -> Result<()> {
    match Format::from_path(path)? {
        Format::Parquet => {
            let column: ArrayRef = Arc::new(Float64Array::from(values.to_vec()));
            write_parquet(path, "value", DataType::Float64, column)
        }
        Format::Json => write_json(path, values),
        Format::Csv => write_csv(path, "value", values),
        Format::Npy => write_npy(path, values),
    }
}

pub fn write_labels(path: &Path, labels: &[Label]) -> Result<()> {
    match Format::from_path(path)? {
        Format::Parquet => {
            let column: ArrayRef = Arc::new(Int64Array::from(labels.to_vec()));
            write_parquet(path, "label", DataType::Int64, column)
        }
        Format::Json => write_json(path, labels),
        Format::Csv => write_csv(path, "label", labels),
        Format::Npy => write_npy(path, labels),
    }
}

fn read_values(path: &Path) -> Result<Vec<f64>> {
    match Format::from_path(path)? {
        Format::Parquet => read_parquet(path),
        Format::Json => read_json(path),
        Format::Csv => read_csv(path),
        Format::Npy => read_npy(path),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn read_json(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn write_json<T: serde::Serialize>(path: &Path, values: &[T]) -> Result<()> {
    let text = serde_json::to_string(values)?;
    std::fs::write(path, text)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<Vec<f64>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let cell = record.get(0).unwrap_or("").trim();
        let value = cell.parse::<f64>().map_err(|_| {
            FormatError::Schema(format!("row {row_no}: '{cell}' is not a number"))
        })?;
        out.push(value);
    }

    Ok(out)
}

fn write_csv<T: ToString>(path: &Path, header: &str, values: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([header])?;
    for v in values {
        writer.write_record([v.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// NPY
// ---------------------------------------------------------------------------

/// Reads `np.save` output. `np.zeros_like` of a float series gives a float
/// annotation file, so labels go through the same float path.
fn read_npy(path: &Path) -> Result<Vec<f64>> {
    let bytes = std::fs::read(path)?;
    let npy = npyz::NpyFile::new(&bytes[..]).map_err(FormatError::Npy)?;

    let type_str = match npy.dtype() {
        npyz::DType::Plain(ts) => ts.to_string(),
        other => {
            return Err(FormatError::Schema(format!(
                "npy dtype {other:?}, expected a plain numeric array"
            )));
        }
    };

    // Endianness is the first character; npyz handles both byte orders.
    let values = match type_str.get(1..).unwrap_or("") {
        "f8" => npy.into_vec::<f64>().map_err(FormatError::Npy)?,
        "f4" => into_f64::<f32>(npy)?,
        "i8" => npy
            .into_vec::<i64>()
            .map_err(FormatError::Npy)?
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        "i4" => into_f64::<i32>(npy)?,
        "i2" => into_f64::<i16>(npy)?,
        "i1" => into_f64::<i8>(npy)?,
        "u1" => into_f64::<u8>(npy)?,
        _ => {
            return Err(FormatError::Schema(format!(
                "npy dtype {type_str}, expected a float or integer array"
            )));
        }
    };
    Ok(values)
}

fn into_f64<T>(npy: npyz::NpyFile<&[u8]>) -> Result<Vec<f64>>
where
    T: npyz::Deserialize + Into<f64>,
{
    Ok(npy
        .into_vec::<T>()
        .map_err(FormatError::Npy)?
        .into_iter()
        .map(Into::into)
        .collect())
}

fn write_npy<T: npyz::AutoSerialize + Copy>(path: &Path, values: &[T]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);
    let mut writer = npyz::WriteOptions::<T>::new()
        .default_dtype()
        .shape(&[values.len() as u64])
        .writer(&mut out)
        .begin_nd()
        .map_err(FormatError::Npy)?;
    writer.extend(values.iter().copied()).map_err(FormatError::Npy)?;
    writer.finish().map_err(FormatError::Npy)?;
    std::io::Write::flush(&mut out)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Reads the first column of every record batch.
///
/// Works with files written by Pandas (`pd.Series.to_frame().to_parquet()`),
/// Polars, and this crate.
fn read_parquet(path: &Path) -> Result<Vec<f64>> {
    let file = std::fs::File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut out = Vec::new();
    for batch in reader {
        let batch = batch?;
        if batch.num_columns() == 0 {
            return Err(FormatError::Schema("parquet file has no columns".into()));
        }
        extend_f64(&mut out, batch.column(0))?;
    }

    Ok(out)
}

fn extend_f64(out: &mut Vec<f64>, col: &ArrayRef) -> Result<()> {
    if col.null_count() > 0 {
        return Err(FormatError::Schema("null value in column".into()));
    }

    // Any of the common numeric dtypes.
    match col.data_type() {
        DataType::Float64 => {
            let arr = downcast::<Float64Array>(col)?;
            out.extend(arr.values().iter().copied());
        }
        DataType::Float32 => {
            let arr = downcast::<Float32Array>(col)?;
            out.extend(arr.values().iter().map(|&v| v as f64));
        }
        DataType::Int64 => {
            let arr = downcast::<Int64Array>(col)?;
            out.extend(arr.values().iter().map(|&v| v as f64));
        }
        DataType::Int32 => {
            let arr = downcast::<Int32Array>(col)?;
            out.extend(arr.values().iter().map(|&v| v as f64));
        }
        other => {
            return Err(FormatError::Schema(format!(
                "column type {other:?}, expected a float or integer column"
            )));
        }
    }
    Ok(())
}

fn downcast<T: 'static>(col: &ArrayRef) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| FormatError::Schema(format!("unexpected array for {:?}", col.data_type())))
}

fn write_parquet(path: &Path, name: &str, data_type: DataType, column: ArrayRef) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![Field::new(name, data_type, false)]));
    let batch = RecordBatch::try_new(schema.clone(), vec![column])?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
