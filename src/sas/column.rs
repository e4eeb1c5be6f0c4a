//! Column metadata and conversion of raw cell bytes into Arrow arrays.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, Date32Builder, Float64Builder, StringBuilder, TimestampMillisecondBuilder,
};
use arrow::datatypes::{DataType, Field, TimeUnit};

use crate::error::{MergeError, Result};
use crate::sas::constants::{
    DATE_FORMATS, DATETIME_FORMATS, SAS_EPOCH_OFFSET_DAYS, SAS_EPOCH_OFFSET_SECONDS,
};
use crate::sas::header::{Endian, decode_text};

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Character,
}

/// How a numeric column's values are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    /// Days since 1960-01-01
    Date,
    /// Seconds since 1960-01-01
    DateTime,
}

/// A column as described by the metadata subheaders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SasColumn {
    pub name: String,
    pub label: String,
    pub format: String,
    pub kind: ColumnKind,
    /// Byte offset of the cell within a row
    pub offset: usize,
    /// Cell width in bytes
    pub width: usize,
}

impl SasColumn {
    /// Date or datetime interpretation implied by the SAS format, if any
    #[must_use]
    pub fn temporal(&self) -> Option<Temporal> {
        if self.kind != ColumnKind::Numeric {
            return None;
        }
        let base = format_base_name(&self.format);
        if DATE_FORMATS.contains(&base.as_str()) {
            Some(Temporal::Date)
        } else if DATETIME_FORMATS.contains(&base.as_str()) {
            Some(Temporal::DateTime)
        } else {
            None
        }
    }

    /// Arrow type this column is read as
    #[must_use]
    pub fn data_type(&self, convert_dates: bool) -> DataType {
        match (self.kind, convert_dates.then(|| self.temporal()).flatten()) {
            (ColumnKind::Character, _) => DataType::Utf8,
            (ColumnKind::Numeric, Some(Temporal::Date)) => DataType::Date32,
            (ColumnKind::Numeric, Some(Temporal::DateTime)) => {
                DataType::Timestamp(TimeUnit::Millisecond, None)
            }
            (ColumnKind::Numeric, None) => DataType::Float64,
        }
    }

    /// Arrow field for this column; every SAS column may hold missing values
    #[must_use]
    pub fn field(&self, convert_dates: bool) -> Field {
        Field::new(&self.name, self.data_type(convert_dates), true)
    }
}

/// Strip the width/decimals suffix: `MMDDYY10.` -> `MMDDYY`
#[must_use]
pub fn format_base_name(format: &str) -> String {
    format
        .trim()
        .trim_start_matches('$')
        .trim_end_matches(|c: char| c.is_ascii_digit() || c == '.')
        .to_ascii_uppercase()
}

/// Decode a numeric cell; widths below 8 hold the high-order bytes of a double
pub fn decode_numeric(cell: &[u8], endian: Endian) -> Result<Option<f64>> {
    let width = cell.len();
    if width == 0 || width > 8 {
        return Err(MergeError::sas(format!("invalid numeric width {width}")));
    }
    let mut buf = [0u8; 8];
    let value = match endian {
        Endian::Little => {
            buf[8 - width..].copy_from_slice(cell);
            f64::from_le_bytes(buf)
        }
        Endian::Big => {
            buf[..width].copy_from_slice(cell);
            f64::from_be_bytes(buf)
        }
    };
    // SAS missing values (., .A-.Z, ._) are all NaN bit patterns
    Ok((!value.is_nan()).then_some(value))
}

/// Accumulates decoded cells of one column
pub enum ColumnBuilder {
    Float(Float64Builder),
    Date(Date32Builder),
    DateTime(TimestampMillisecondBuilder),
    Text(StringBuilder),
}

impl ColumnBuilder {
    #[must_use]
    pub fn new(column: &SasColumn, convert_dates: bool, capacity: usize) -> Self {
        match column.data_type(convert_dates) {
            DataType::Utf8 => Self::Text(StringBuilder::with_capacity(capacity, capacity * 8)),
            DataType::Date32 => Self::Date(Date32Builder::with_capacity(capacity)),
            DataType::Timestamp(..) => {
                Self::DateTime(TimestampMillisecondBuilder::with_capacity(capacity))
            }
            _ => Self::Float(Float64Builder::with_capacity(capacity)),
        }
    }

    /// Decode and append one cell
    pub fn append(&mut self, cell: &[u8], endian: Endian, encoding: u8) -> Result<()> {
        match self {
            Self::Text(builder) => {
                let text = decode_text(cell, encoding);
                if text.is_empty() {
                    builder.append_null();
                } else {
                    builder.append_value(text);
                }
            }
            Self::Float(builder) => builder.append_option(decode_numeric(cell, endian)?),
            Self::Date(builder) => {
                let days = decode_numeric(cell, endian)?
                    .filter(|v| v.abs() < f64::from(i32::MAX - SAS_EPOCH_OFFSET_DAYS))
                    .map(|v| v.floor() as i32 - SAS_EPOCH_OFFSET_DAYS);
                builder.append_option(days);
            }
            Self::DateTime(builder) => {
                let millis = decode_numeric(cell, endian)?
                    .filter(|v| v.abs() < 9.0e15)
                    .map(|v| ((v - SAS_EPOCH_OFFSET_SECONDS as f64) * 1000.0).round() as i64);
                builder.append_option(millis);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn finish(self) -> ArrayRef {
        match self {
            Self::Float(mut b) => Arc::new(b.finish()),
            Self::Date(mut b) => Arc::new(b.finish()),
            Self::DateTime(mut b) => Arc::new(b.finish()),
            Self::Text(mut b) => Arc::new(b.finish()),
        }
    }
}
