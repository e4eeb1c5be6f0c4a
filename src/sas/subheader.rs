//! Subheader classification and metadata extraction.
//!
//! Metadata pages carry a table of subheader pointers. Each subheader starts
//! with a signature naming its kind; together they describe the row layout,
//! column names, types, formats and labels, and the compression scheme.

use crate::error::{MergeError, Result};
use crate::sas::column::{ColumnKind, SasColumn};
use crate::sas::constants::*;
use crate::sas::decompress::Compression;
use crate::sas::header::{ByteView, SasHeader, decode_text};

/// Kind of a subheader, derived from its signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubheaderKind {
    RowSize,
    ColumnSize,
    SubheaderCounts,
    ColumnText,
    ColumnName,
    ColumnAttributes,
    FormatAndLabel,
    ColumnList,
    /// A (possibly compressed) data row stored as a subheader
    Data,
}

impl SubheaderKind {
    /// Look up a 4- or 8-byte signature
    #[must_use]
    pub fn from_signature(signature: &[u8]) -> Option<Self> {
        let kind = match signature {
            [0xF7, 0xF7, 0xF7, 0xF7]
            | [0x00, 0x00, 0x00, 0x00, 0xF7, 0xF7, 0xF7, 0xF7]
            | [0xF7, 0xF7, 0xF7, 0xF7, 0x00, 0x00, 0x00, 0x00]
            | [0xF7, 0xF7, 0xF7, 0xF7, 0xFF, 0xFF, 0xFB, 0xFE] => Self::RowSize,
            [0xF6, 0xF6, 0xF6, 0xF6]
            | [0x00, 0x00, 0x00, 0x00, 0xF6, 0xF6, 0xF6, 0xF6]
            | [0xF6, 0xF6, 0xF6, 0xF6, 0x00, 0x00, 0x00, 0x00]
            | [0xF6, 0xF6, 0xF6, 0xF6, 0xFF, 0xFF, 0xFB, 0xFE] => Self::ColumnSize,
            [0x00, 0xFC, 0xFF, 0xFF]
            | [0xFF, 0xFF, 0xFC, 0x00]
            | [0x00, 0xFC, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
            | [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFC, 0x00] => Self::SubheaderCounts,
            [0xFD, 0xFF, 0xFF, 0xFF]
            | [0xFF, 0xFF, 0xFF, 0xFD]
            | [0xFD, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
            | [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFD] => Self::ColumnText,
            [0xFF, 0xFF, 0xFF, 0xFF] | [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF] => {
                Self::ColumnName
            }
            [0xFC, 0xFF, 0xFF, 0xFF]
            | [0xFF, 0xFF, 0xFF, 0xFC]
            | [0xFC, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
            | [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFC] => Self::ColumnAttributes,
            [0xFE, 0xFB, 0xFF, 0xFF]
            | [0xFF, 0xFF, 0xFB, 0xFE]
            | [0xFE, 0xFB, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
            | [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFB, 0xFE] => Self::FormatAndLabel,
            [0xFE, 0xFF, 0xFF, 0xFF]
            | [0xFF, 0xFF, 0xFF, 0xFE]
            | [0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
            | [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE] => Self::ColumnList,
            _ => return None,
        };
        Some(kind)
    }
}

/// One entry of a page's subheader pointer table
#[derive(Debug, Clone, Copy)]
pub struct SubheaderPointer {
    /// Offset from the start of the page
    pub offset: usize,
    pub length: usize,
    pub compression: u8,
    pub ptype: u8,
}

impl SubheaderPointer {
    /// Read pointer `index` of the page starting at `page_start`
    pub fn read(view: &ByteView, header: &SasHeader, page_start: usize, index: usize) -> Result<Self> {
        let int_len = header.int_length();
        let base = page_start
            + header.page_bit_offset()
            + SUBHEADER_POINTERS_OFFSET
            + index * header.subheader_pointer_length();
        Ok(Self {
            offset: view.usize(base, int_len)?,
            length: view.usize(base + int_len, int_len)?,
            compression: view.u8(base + 2 * int_len)?,
            ptype: view.u8(base + 2 * int_len + 1)?,
        })
    }

    /// Empty or truncated pointers carry nothing to read
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0 || self.compression == TRUNCATED_SUBHEADER_ID
    }

    /// Whether this pointer may reference a compressed data row
    #[must_use]
    pub const fn may_be_compressed_row(&self) -> bool {
        (self.compression == COMPRESSED_SUBHEADER_ID || self.compression == 0)
            && self.ptype == COMPRESSED_SUBHEADER_TYPE
    }
}

/// Column attributes before names and formats are attached
#[derive(Debug, Clone, Copy)]
struct ColumnAttributes {
    offset: usize,
    width: usize,
    kind: ColumnKind,
}

/// Reference into a column-text block
#[derive(Debug, Clone, Copy, Default)]
struct TextRef {
    block: usize,
    offset: usize,
    length: usize,
}

/// Everything collected from the metadata subheaders
#[derive(Debug, Default)]
pub struct MetadataBuilder {
    pub row_length: usize,
    pub row_count: usize,
    pub mix_page_row_count: usize,
    pub column_count: Option<usize>,
    pub compression: Compression,
    pub creator_proc: Option<String>,
    lcp: usize,
    text_blocks: Vec<Vec<u8>>,
    names: Vec<TextRef>,
    attributes: Vec<ColumnAttributes>,
    formats: Vec<(TextRef, TextRef)>,
}

impl MetadataBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify the subheader behind `pointer`
    pub fn classify(
        &self,
        view: &ByteView,
        header: &SasHeader,
        start: usize,
        pointer: &SubheaderPointer,
    ) -> Result<SubheaderKind> {
        let int_len = header.int_length();
        let signature = view.slice(start, int_len.min(pointer.length))?;
        let kind = SubheaderKind::from_signature(signature).or_else(|| {
            (header.u64 && signature.len() == 8)
                .then(|| SubheaderKind::from_signature(&signature[..4]))
                .flatten()
        });

        match kind {
            Some(kind) => Ok(kind),
            None if self.compression != Compression::None && pointer.may_be_compressed_row() => {
                Ok(SubheaderKind::Data)
            }
            None => Err(MergeError::sas(format!(
                "unknown subheader signature {signature:02X?}"
            ))),
        }
    }

    /// Process one metadata subheader located at absolute offset `start`
    pub fn process(
        &mut self,
        kind: SubheaderKind,
        view: &ByteView,
        header: &SasHeader,
        start: usize,
        length: usize,
    ) -> Result<()> {
        match kind {
            SubheaderKind::RowSize => self.process_row_size(view, header, start),
            SubheaderKind::ColumnSize => {
                let int_len = header.int_length();
                self.column_count = Some(view.usize(start + int_len, int_len)?);
                Ok(())
            }
            SubheaderKind::ColumnText => self.process_column_text(view, header, start),
            SubheaderKind::ColumnName => self.process_column_name(view, header, start, length),
            SubheaderKind::ColumnAttributes => {
                self.process_column_attributes(view, header, start, length)
            }
            SubheaderKind::FormatAndLabel => self.process_format(view, header, start),
            SubheaderKind::SubheaderCounts | SubheaderKind::ColumnList | SubheaderKind::Data => {
                Ok(())
            }
        }
    }

    fn process_row_size(&mut self, view: &ByteView, header: &SasHeader, start: usize) -> Result<()> {
        let int_len = header.int_length();
        self.row_length = view.usize(start + ROW_LENGTH_MULTIPLIER * int_len, int_len)?;
        self.row_count = view.usize(start + ROW_COUNT_MULTIPLIER * int_len, int_len)?;
        let p1 = view.usize(start + COL_COUNT_P1_MULTIPLIER * int_len, int_len)?;
        let p2 = view.usize(start + COL_COUNT_P2_MULTIPLIER * int_len, int_len)?;
        self.mix_page_row_count =
            view.usize(start + MIX_PAGE_ROW_COUNT_MULTIPLIER * int_len, int_len)?;
        let lcp_offset = if header.u64 { LCP_OFFSET_X64 } else { LCP_OFFSET_X86 };
        self.lcp = view.usize(start + lcp_offset, 2)?;
        log::debug!(
            "SAS row size subheader: row_length={}, row_count={}, columns={}",
            self.row_length,
            self.row_count,
            p1 + p2
        );
        Ok(())
    }

    fn process_column_text(
        &mut self,
        view: &ByteView,
        header: &SasHeader,
        start: usize,
    ) -> Result<()> {
        let int_len = header.int_length();
        let block_start = start + int_len;
        let size = view.usize(block_start, TEXT_BLOCK_SIZE_LENGTH)?;
        let block = view.slice(block_start, size)?.to_vec();

        if self.text_blocks.is_empty() {
            self.compression = if contains(&block, RLE_COMPRESSION) {
                Compression::Rle
            } else if contains(&block, RDC_COMPRESSION) {
                Compression::Rdc
            } else {
                Compression::None
            };

            // creator procedure name sits after the compression literal, if any
            let extra = if header.u64 { 4 } else { 0 };
            let proc_offset = match self.compression {
                Compression::None => 32,
                Compression::Rle => 40,
                Compression::Rdc => 0,
            };
            if proc_offset > 0 && self.lcp > 0 {
                if let Ok(raw) = view.slice(start + proc_offset + extra, self.lcp) {
                    let name = decode_text(raw, header.encoding);
                    if !name.is_empty() {
                        self.creator_proc = Some(name);
                    }
                }
            }
        }

        self.text_blocks.push(block);
        Ok(())
    }

    fn process_column_name(
        &mut self,
        view: &ByteView,
        header: &SasHeader,
        start: usize,
        length: usize,
    ) -> Result<()> {
        let int_len = header.int_length();
        let base = start + int_len;
        let count = length.saturating_sub(2 * int_len + 12) / COLUMN_NAME_POINTER_LENGTH;
        for i in 0..count {
            let pointer = base + COLUMN_NAME_POINTER_LENGTH * (i + 1);
            self.names.push(TextRef {
                block: view.usize(pointer, 2)?,
                offset: view.usize(pointer + 2, 2)?,
                length: view.usize(pointer + 4, 2)?,
            });
        }
        Ok(())
    }

    fn process_column_attributes(
        &mut self,
        view: &ByteView,
        header: &SasHeader,
        start: usize,
        length: usize,
    ) -> Result<()> {
        let int_len = header.int_length();
        let vector_length = int_len + 8;
        let count = length.saturating_sub(2 * int_len + 12) / vector_length;
        for i in 0..count {
            let vector = i * vector_length;
            let offset = view.usize(start + int_len + COLUMN_DATA_OFFSET_OFFSET + vector, int_len)?;
            let width = view.usize(start + 2 * int_len + COLUMN_DATA_LENGTH_OFFSET + vector, 4)?;
            let kind = match view.u8(start + 2 * int_len + COLUMN_TYPE_OFFSET + vector)? {
                1 => ColumnKind::Numeric,
                _ => ColumnKind::Character,
            };
            self.attributes.push(ColumnAttributes {
                offset,
                width,
                kind,
            });
        }
        Ok(())
    }

    fn process_format(&mut self, view: &ByteView, header: &SasHeader, start: usize) -> Result<()> {
        let base = start + 3 * header.int_length();
        let read_ref = |index: usize, offset: usize, length: usize| -> Result<TextRef> {
            Ok(TextRef {
                block: view.usize(base + index, 2)?,
                offset: view.usize(base + offset, 2)?,
                length: view.usize(base + length, 2)?,
            })
        };
        let format = read_ref(
            FORMAT_TEXT_INDEX_OFFSET,
            FORMAT_OFFSET_OFFSET,
            FORMAT_LENGTH_OFFSET,
        )?;
        let label = read_ref(
            LABEL_TEXT_INDEX_OFFSET,
            LABEL_OFFSET_OFFSET,
            LABEL_LENGTH_OFFSET,
        )?;
        self.formats.push((format, label));
        Ok(())
    }

    fn text(&self, text_ref: TextRef, encoding: u8) -> String {
        if text_ref.length == 0 || self.text_blocks.is_empty() {
            return String::new();
        }
        // some writers emit out-of-range block indexes; clamp like other readers do
        let block = &self.text_blocks[text_ref.block.min(self.text_blocks.len() - 1)];
        block
            .get(text_ref.offset..text_ref.offset + text_ref.length)
            .map(|raw| decode_text(raw, encoding))
            .unwrap_or_default()
    }

    /// Combine names, attributes and formats into the final column list
    pub fn columns(&self, encoding: u8) -> Result<Vec<SasColumn>> {
        if self.row_length == 0 {
            return Err(MergeError::sas("row size subheader missing"));
        }
        if self.names.len() != self.attributes.len() {
            return Err(MergeError::sas(format!(
                "{} column names but {} column attribute entries",
                self.names.len(),
                self.attributes.len()
            )));
        }
        if let Some(count) = self.column_count {
            if count != self.names.len() {
                log::warn!(
                    "SAS column size subheader declares {count} columns, found {}",
                    self.names.len()
                );
            }
        }

        self.names
            .iter()
            .zip(&self.attributes)
            .enumerate()
            .map(|(i, (name, attrs))| {
                let (format, label) = self
                    .formats
                    .get(i)
                    .map(|&(f, l)| (self.text(f, encoding), self.text(l, encoding)))
                    .unwrap_or_default();
                if attrs.offset + attrs.width > self.row_length {
                    return Err(MergeError::sas(format!(
                        "column {i} extends past the end of the row"
                    )));
                }
                Ok(SasColumn {
                    name: self.text(*name, encoding),
                    label,
                    format,
                    kind: attrs.kind,
                    offset: attrs.offset,
                    width: attrs.width,
                })
            })
            .collect()
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
