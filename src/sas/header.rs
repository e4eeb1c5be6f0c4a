//! File header parsing and bounds-checked byte access.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::{MergeError, Result};
use crate::sas::constants::*;

/// Byte order of all integers and doubles in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Bounds-checked reads over the raw file contents
#[derive(Debug, Clone, Copy)]
pub struct ByteView<'a> {
    bytes: &'a [u8],
    endian: Endian,
}

impl<'a> ByteView<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8], endian: Endian) -> Self {
        Self { bytes, endian }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Slice `length` bytes at `offset`
    pub fn slice(&self, offset: usize, length: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(length)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or_else(|| {
                MergeError::sas(format!(
                    "read of {length} bytes at offset {offset} runs past end of data ({} bytes)",
                    self.bytes.len()
                ))
            })
    }

    pub fn u8(&self, offset: usize) -> Result<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    /// Read an unsigned integer of 1, 2, 4 or 8 bytes
    pub fn uint(&self, offset: usize, width: usize) -> Result<u64> {
        let raw = self.slice(offset, width)?;
        let mut buf = [0u8; 8];
        match self.endian {
            Endian::Little => {
                buf[..width].copy_from_slice(raw);
                Ok(u64::from_le_bytes(buf))
            }
            Endian::Big => {
                buf[8 - width..].copy_from_slice(raw);
                Ok(u64::from_be_bytes(buf))
            }
        }
    }

    /// Read an unsigned integer as `usize`
    pub fn usize(&self, offset: usize, width: usize) -> Result<usize> {
        let value = self.uint(offset, width)?;
        usize::try_from(value)
            .map_err(|_| MergeError::sas(format!("value {value} at offset {offset} too large")))
    }

    pub fn f64(&self, offset: usize) -> Result<f64> {
        let raw: [u8; 8] = self
            .slice(offset, 8)?
            .try_into()
            .map_err(|_| MergeError::sas("short double"))?;
        Ok(match self.endian {
            Endian::Little => f64::from_le_bytes(raw),
            Endian::Big => f64::from_be_bytes(raw),
        })
    }
}

/// Everything the file header says about the layout of the rest of the file
#[derive(Debug, Clone)]
pub struct SasHeader {
    /// 64-bit layout (8-byte integers in subheaders)
    pub u64: bool,
    /// Extra alignment applied to header fields after offset 164
    pub align1: usize,
    pub endian: Endian,
    /// Raw encoding byte
    pub encoding: u8,
    /// 'unix' or 'windows'
    pub platform: &'static str,
    pub dataset_name: String,
    pub file_type: String,
    pub sas_release: String,
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
    pub header_length: usize,
    pub page_length: usize,
    pub page_count: usize,
}

impl SasHeader {
    /// Parse the fixed header at the start of the file
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_HEADER_LENGTH {
            return Err(MergeError::sas("file too short to be a SAS7BDAT file"));
        }
        if bytes[..MAGIC.len()] != MAGIC {
            return Err(MergeError::sas("magic number mismatch (not a SAS7BDAT file)"));
        }

        let (u64, align2) = if bytes[ALIGN_1_OFFSET] == ALIGN_CHECK_VALUE {
            (true, ALIGN_VALUE)
        } else {
            (false, 0)
        };
        let align1 = if bytes[ALIGN_2_OFFSET] == ALIGN_CHECK_VALUE {
            ALIGN_VALUE
        } else {
            0
        };
        let endian = if bytes[ENDIANNESS_OFFSET] == 0x01 {
            Endian::Little
        } else {
            Endian::Big
        };
        let platform = match bytes[PLATFORM_OFFSET] {
            b'1' => "unix",
            b'2' => "windows",
            _ => "unknown",
        };
        let encoding = bytes[ENCODING_OFFSET];
        let view = ByteView::new(bytes, endian);

        let dataset_name = decode_text(view.slice(DATASET_OFFSET, DATASET_LENGTH)?, encoding);
        let file_type = decode_text(view.slice(FILE_TYPE_OFFSET, FILE_TYPE_LENGTH)?, encoding);

        let created = sas_datetime(view.f64(DATE_CREATED_OFFSET + align1)?);
        let modified = sas_datetime(view.f64(DATE_MODIFIED_OFFSET + align1)?);

        let header_length = view.usize(HEADER_SIZE_OFFSET + align1, 4)?;
        let page_length = view.usize(PAGE_SIZE_OFFSET + align1, 4)?;
        // 64-bit files store the page count as a full 8-byte integer
        let page_count = view.usize(PAGE_COUNT_OFFSET + align1, if u64 { 8 } else { 4 })?;
        let sas_release = view
            .slice(SAS_RELEASE_OFFSET + align1 + align2, SAS_RELEASE_LENGTH)
            .map(|raw| decode_text(raw, encoding))
            .unwrap_or_default();

        if header_length < MIN_HEADER_LENGTH || header_length > bytes.len() {
            return Err(MergeError::sas(format!("invalid header length {header_length}")));
        }
        if page_length == 0 {
            return Err(MergeError::sas("page length of zero"));
        }

        Ok(Self {
            u64,
            align1,
            endian,
            encoding,
            platform,
            dataset_name,
            file_type,
            sas_release,
            created,
            modified,
            header_length,
            page_length,
            page_count,
        })
    }

    /// Width of integers inside subheaders
    #[must_use]
    pub const fn int_length(&self) -> usize {
        if self.u64 { 8 } else { 4 }
    }

    /// Offset of the page header within each page
    #[must_use]
    pub const fn page_bit_offset(&self) -> usize {
        if self.u64 {
            PAGE_BIT_OFFSET_X64
        } else {
            PAGE_BIT_OFFSET_X86
        }
    }

    #[must_use]
    pub const fn subheader_pointer_length(&self) -> usize {
        if self.u64 {
            SUBHEADER_POINTER_LENGTH_X64
        } else {
            SUBHEADER_POINTER_LENGTH_X86
        }
    }
}

/// Decode header or cell text, trimming trailing NUL and space padding
#[must_use]
pub fn decode_text(raw: &[u8], encoding: u8) -> String {
    let end = raw
        .iter()
        .rposition(|&b| b != 0 && b != b' ')
        .map_or(0, |i| i + 1);
    let trimmed = &raw[..end];
    if encoding == ENCODING_UTF8 {
        return String::from_utf8_lossy(trimmed).into_owned();
    }
    match std::str::from_utf8(trimmed) {
        Ok(s) => s.to_string(),
        // Latin-1 maps byte-for-byte onto the first 256 code points
        Err(_) => trimmed.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Convert seconds since 1960-01-01 into a timestamp
#[must_use]
pub fn sas_datetime(seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1960, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let millis = (seconds * 1000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    epoch.checked_add_signed(Duration::try_milliseconds(millis as i64)?)
}

/// Render a timestamp the way the header dump shows it
#[must_use]
pub fn format_timestamp(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.and_utc().to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string())
}
