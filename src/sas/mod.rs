//! Reader for SAS7BDAT datasets.
//!
//! The whole file is read into memory, the metadata subheaders are parsed in
//! one pass over the pages, and the rows are decoded into a single Arrow
//! `RecordBatch` in a second pass. RLE and RDC compressed files are supported.

pub mod column;
pub mod constants;
pub mod decompress;
pub mod header;
pub mod subheader;

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;

use crate::error::{MergeError, Result};
use column::ColumnBuilder;
pub use column::{ColumnKind, SasColumn, Temporal};
use constants::*;
pub use decompress::Compression;
pub use header::{Endian, SasHeader};
use header::ByteView;
use subheader::{MetadataBuilder, SubheaderKind, SubheaderPointer};

/// Options for decoding a SAS7BDAT file
#[derive(Debug, Clone)]
pub struct SasReadOptions {
    /// Read date/datetime formatted numerics as Date32 / Timestamp(ms)
    pub convert_dates: bool,
}

impl Default for SasReadOptions {
    fn default() -> Self {
        Self {
            convert_dates: true,
        }
    }
}

/// Descriptive metadata of a dataset
#[derive(Debug, Clone)]
pub struct SasMetadata {
    pub dataset_name: String,
    /// Member type from the header, `DATA` for datasets
    pub file_type: String,
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
    pub sas_release: String,
    pub platform: &'static str,
    pub encoding: u8,
    pub endian: Endian,
    pub u64: bool,
    pub compression: Compression,
    pub creator_proc: Option<String>,
    pub page_count: usize,
    pub page_length: usize,
    pub row_count: usize,
    pub row_length: usize,
    pub mix_page_row_count: usize,
    pub columns: Vec<SasColumn>,
}

/// Page classification after masking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageKind {
    Meta,
    Data,
    Mix,
    Amd,
    Comp,
    Other(u16),
}

impl PageKind {
    const fn from_raw(raw: u16) -> Self {
        match raw & PAGE_TYPE_MASK {
            PAGE_META_TYPE | PAGE_META2_TYPE => Self::Meta,
            PAGE_DATA_TYPE => Self::Data,
            PAGE_MIX_TYPE => Self::Mix,
            PAGE_AMD_TYPE => Self::Amd,
            PAGE_COMP_TYPE => Self::Comp,
            other => Self::Other(other),
        }
    }

    const fn has_subheaders(self) -> bool {
        matches!(self, Self::Meta | Self::Mix | Self::Amd)
    }
}

#[derive(Debug, Clone, Copy)]
struct PageHeader {
    start: usize,
    kind: PageKind,
    block_count: usize,
    subheader_count: usize,
}

/// A parsed SAS7BDAT file ready to be decoded
pub struct SasReader {
    data: Vec<u8>,
    header: SasHeader,
    metadata: SasMetadata,
    options: SasReadOptions,
}

impl SasReader {
    /// Read and parse the file at `path`
    pub fn open(path: impl AsRef<Path>, options: SasReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| MergeError::io(path, e))?;
        Self::from_bytes(data, options)
    }

    /// Parse an in-memory SAS7BDAT image
    pub fn from_bytes(data: Vec<u8>, options: SasReadOptions) -> Result<Self> {
        let header = SasHeader::parse(&data)?;
        let view = ByteView::new(&data, header.endian);

        let mut builder = MetadataBuilder::new();
        for page in page_headers(&view, &header)? {
            if !page.kind.has_subheaders() {
                continue;
            }
            for index in 0..page.subheader_count {
                let pointer = SubheaderPointer::read(&view, &header, page.start, index)?;
                if pointer.is_empty() {
                    continue;
                }
                let start = page.start + pointer.offset;
                let kind = builder.classify(&view, &header, start, &pointer)?;
                builder.process(kind, &view, &header, start, pointer.length)?;
            }
        }

        let columns = builder.columns(header.encoding)?;
        let metadata = SasMetadata {
            dataset_name: header.dataset_name.clone(),
            file_type: header.file_type.clone(),
            created: header.created,
            modified: header.modified,
            sas_release: header.sas_release.clone(),
            platform: header.platform,
            encoding: header.encoding,
            endian: header.endian,
            u64: header.u64,
            compression: builder.compression,
            creator_proc: builder.creator_proc.clone(),
            page_count: header.page_count,
            page_length: header.page_length,
            row_count: builder.row_count,
            row_length: builder.row_length,
            mix_page_row_count: builder.mix_page_row_count,
            columns,
        };

        log::debug!(
            "Parsed SAS dataset '{}': {} rows x {} columns, compression {:?}",
            metadata.dataset_name,
            metadata.row_count,
            metadata.columns.len(),
            metadata.compression
        );

        Ok(Self {
            data,
            header,
            metadata,
            options,
        })
    }

    #[must_use]
    pub const fn metadata(&self) -> &SasMetadata {
        &self.metadata
    }

    /// Arrow schema of the decoded batch
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        let fields: Vec<_> = self
            .metadata
            .columns
            .iter()
            .map(|c| c.field(self.options.convert_dates))
            .collect();
        Arc::new(Schema::new(fields))
    }

    /// Decode every row into one record batch
    pub fn read_batch(&self) -> Result<RecordBatch> {
        let all: Vec<usize> = (0..self.metadata.columns.len()).collect();
        self.read_indices(&all)
    }

    /// Decode only the named columns, in the order given
    ///
    /// Names are matched exactly first, then ignoring ASCII case.
    pub fn read_columns(&self, names: &[&str]) -> Result<RecordBatch> {
        let columns = &self.metadata.columns;
        let indices = names
            .iter()
            .map(|name| {
                columns
                    .iter()
                    .position(|c| c.name == *name)
                    .or_else(|| columns.iter().position(|c| c.name.eq_ignore_ascii_case(name)))
                    .ok_or_else(|| MergeError::missing_column("SAS", *name))
            })
            .collect::<Result<Vec<_>>>()?;
        self.read_indices(&indices)
    }

    fn read_indices(&self, indices: &[usize]) -> Result<RecordBatch> {
        let meta = &self.metadata;
        let selected: Vec<&SasColumn> = indices.iter().map(|&i| &meta.columns[i]).collect();
        let mut builders: Vec<ColumnBuilder> = selected
            .iter()
            .map(|c| ColumnBuilder::new(c, self.options.convert_dates, meta.row_count))
            .collect();

        let mut rows_read = 0usize;
        self.for_each_row(|row| {
            for (column, builder) in selected.iter().zip(builders.iter_mut()) {
                let cell = &row[column.offset..column.offset + column.width];
                builder.append(cell, self.header.endian, self.header.encoding)?;
            }
            rows_read += 1;
            Ok(())
        })?;

        if rows_read != meta.row_count {
            return Err(MergeError::sas(format!(
                "expected {} rows, found {rows_read}",
                meta.row_count
            )));
        }

        let fields: Vec<_> = selected
            .iter()
            .map(|c| c.field(self.options.convert_dates))
            .collect();
        let arrays = builders.into_iter().map(ColumnBuilder::finish).collect();
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }

    /// Walk the pages in file order, handing each row's bytes to `visit`
    fn for_each_row<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let view = ByteView::new(&self.data, self.header.endian);
        let header = &self.header;
        let meta = &self.metadata;
        let row_length = meta.row_length;
        let mut remaining = meta.row_count;

        // metadata is complete, so the classifier knows the compression scheme
        let mut classifier = MetadataBuilder::new();
        classifier.compression = meta.compression;

        for page in page_headers(&view, header)? {
            if remaining == 0 {
                break;
            }

            if page.kind.has_subheaders() {
                for index in 0..page.subheader_count {
                    if remaining == 0 {
                        break;
                    }
                    let pointer = SubheaderPointer::read(&view, header, page.start, index)?;
                    if pointer.is_empty() {
                        continue;
                    }
                    let start = page.start + pointer.offset;
                    if classifier.classify(&view, header, start, &pointer)? != SubheaderKind::Data
                    {
                        continue;
                    }
                    let raw = view.slice(start, pointer.length)?;
                    let row: Cow<[u8]> =
                        if meta.compression != Compression::None && pointer.length < row_length {
                            Cow::Owned(meta.compression.decompress(raw, row_length)?)
                        } else {
                            Cow::Borrowed(view.slice(start, row_length)?)
                        };
                    visit(&row)?;
                    remaining -= 1;
                }
            }

            let (first_row, row_count) = match page.kind {
                PageKind::Mix => {
                    let pointers_end = header.page_bit_offset()
                        + SUBHEADER_POINTERS_OFFSET
                        + page.subheader_count * header.subheader_pointer_length();
                    let align_correction = pointers_end % 8;
                    (
                        page.start + pointers_end + align_correction,
                        meta.mix_page_row_count.min(remaining),
                    )
                }
                PageKind::Data => (
                    page.start + header.page_bit_offset() + SUBHEADER_POINTERS_OFFSET,
                    page.block_count.min(remaining),
                ),
                _ => continue,
            };

            for i in 0..row_count {
                visit(view.slice(first_row + i * row_length, row_length)?)?;
            }
            remaining -= row_count;
        }

        Ok(())
    }
}

/// Read the header of every page present in the file
fn page_headers(view: &ByteView, header: &SasHeader) -> Result<Vec<PageHeader>> {
    let available = (view.len() - header.header_length) / header.page_length;
    if available < header.page_count {
        log::warn!(
            "SAS file declares {} pages but only {available} are present",
            header.page_count
        );
    }
    let bit_offset = header.page_bit_offset();

    (0..header.page_count.min(available))
        .map(|i| {
            let start = header.header_length + i * header.page_length;
            let raw_type = view.uint(start + bit_offset, 2)? as u16;
            let kind = PageKind::from_raw(raw_type);
            if let PageKind::Other(t) = kind {
                log::debug!("Skipping page {i} of unknown type {t:#06x}");
            }
            Ok(PageHeader {
                start,
                kind,
                block_count: view.usize(start + bit_offset + 2, 2)?,
                subheader_count: view.usize(start + bit_offset + 4, 2)?,
            })
        })
        .collect()
}

/// Read a whole SAS7BDAT file into one record batch
pub fn read_sas(path: impl AsRef<Path>, options: SasReadOptions) -> Result<RecordBatch> {
    SasReader::open(path, options)?.read_batch()
}
