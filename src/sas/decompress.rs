//! Row decompression for RLE (`SASYZCRL`) and RDC (`SASYZCR2`) compressed files.

use crate::error::{MergeError, Result};

/// Compression scheme declared in the first column-text subheader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Rle,
    Rdc,
}

impl Compression {
    /// Expand one compressed row into exactly `row_length` bytes
    pub fn decompress(self, input: &[u8], row_length: usize) -> Result<Vec<u8>> {
        let output = match self {
            Self::None => input.to_vec(),
            Self::Rle => rle_decompress(input, row_length)?,
            Self::Rdc => rdc_decompress(input, row_length)?,
        };
        if output.len() != row_length {
            return Err(MergeError::sas(format!(
                "decompressed row has {} bytes, expected {row_length}",
                output.len()
            )));
        }
        Ok(output)
    }
}

/// Cursor over the compressed input that reports truncation as an error
struct Input<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Input<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    const fn has_more(&self) -> bool {
        self.pos < self.bytes.len()
    }

    fn next(&mut self) -> Result<u8> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| MergeError::sas("compressed row ends mid-command"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let chunk = self
            .bytes
            .get(self.pos..self.pos + n)
            .ok_or_else(|| MergeError::sas("compressed row ends mid-literal"))?;
        self.pos += n;
        Ok(chunk)
    }
}

/// Run-length decoding used by `COMPRESS=CHAR`
pub fn rle_decompress(input: &[u8], row_length: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(row_length);
    let mut input = Input::new(input);

    while input.has_more() {
        let first = input.next()?;
        let command = first & 0xF0;
        let low = usize::from(first & 0x0F);

        match command {
            0x00 => {
                let n = usize::from(input.next()?) + 64 + low * 256;
                out.extend_from_slice(input.take(n)?);
            }
            0x40 => {
                let n = usize::from(input.next()?) + 18 + low * 256;
                let fill = input.next()?;
                out.resize(out.len() + n, fill);
            }
            0x60 => {
                let n = low * 256 + usize::from(input.next()?) + 17;
                out.resize(out.len() + n, b' ');
            }
            0x70 => {
                let n = low * 256 + usize::from(input.next()?) + 17;
                out.resize(out.len() + n, 0x00);
            }
            0x80 | 0x90 | 0xA0 | 0xB0 => {
                let n = low + 1 + usize::from((command - 0x80) >> 4) * 16;
                out.extend_from_slice(input.take(n)?);
            }
            0xC0 => {
                let fill = input.next()?;
                out.resize(out.len() + low + 3, fill);
            }
            0xD0 => out.resize(out.len() + low + 2, b'@'),
            0xE0 => out.resize(out.len() + low + 2, b' '),
            0xF0 => out.resize(out.len() + low + 2, 0x00),
            _ => {
                return Err(MergeError::sas(format!(
                    "unknown RLE control byte {first:#04x}"
                )));
            }
        }

        if out.len() > row_length {
            return Err(MergeError::sas("RLE row overflows row length"));
        }
    }

    Ok(out)
}

/// Ross Data Compression used by `COMPRESS=BINARY`
pub fn rdc_decompress(input: &[u8], row_length: usize) -> Result<Vec<u8>> {
    let mut out: Vec<u8> = Vec::with_capacity(row_length);
    let mut input = Input::new(input);
    let mut ctrl_bits: u16 = 0;
    let mut ctrl_mask: u16 = 0;

    while input.has_more() {
        ctrl_mask >>= 1;
        if ctrl_mask == 0 {
            ctrl_bits = (u16::from(input.next()?) << 8) | u16::from(input.next()?);
            ctrl_mask = 0x8000;
        }

        if ctrl_bits & ctrl_mask == 0 {
            out.push(input.next()?);
            continue;
        }

        let byte = input.next()?;
        let cmd = usize::from(byte >> 4);
        let cnt = usize::from(byte & 0x0F);

        match cmd {
            // short run
            0 => {
                let fill = input.next()?;
                out.resize(out.len() + cnt + 3, fill);
            }
            // long run
            1 => {
                let n = cnt + (usize::from(input.next()?) << 4) + 19;
                let fill = input.next()?;
                out.resize(out.len() + n, fill);
            }
            // long back-reference
            2 => {
                let offset = cnt + 3 + (usize::from(input.next()?) << 4);
                let n = usize::from(input.next()?) + 16;
                copy_back_reference(&mut out, offset, n)?;
            }
            // short back-reference, length is the command nibble
            _ => {
                let offset = cnt + 3 + (usize::from(input.next()?) << 4);
                copy_back_reference(&mut out, offset, cmd)?;
            }
        }

        if out.len() > row_length {
            return Err(MergeError::sas("RDC row overflows row length"));
        }
    }

    Ok(out)
}

fn copy_back_reference(out: &mut Vec<u8>, offset: usize, n: usize) -> Result<()> {
    let start = out
        .len()
        .checked_sub(offset)
        .ok_or_else(|| MergeError::sas("RDC back-reference before start of row"))?;
    // Source and destination may overlap, so copy byte by byte
    for k in 0..n {
        let byte = out[start + k];
        out.push(byte);
    }
    Ok(())
}
