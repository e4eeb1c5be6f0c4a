//! Layout constants of the SAS7BDAT format.

/// First 32 bytes of every SAS7BDAT file
pub const MAGIC: [u8; 32] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xc2, 0xea, 0x81, 0x60,
    0xb3, 0x14, 0x11, 0xcf, 0xbd, 0x92, 0x08, 0x00, 0x09, 0xc7, 0x31, 0x8c, 0x18, 0x1f, 0x10, 0x11,
];

pub const ALIGN_1_OFFSET: usize = 32;
pub const ALIGN_2_OFFSET: usize = 35;
pub const ALIGN_CHECK_VALUE: u8 = b'3';
pub const ALIGN_VALUE: usize = 4;
pub const ENDIANNESS_OFFSET: usize = 37;
pub const PLATFORM_OFFSET: usize = 39;
pub const ENCODING_OFFSET: usize = 70;
pub const DATASET_OFFSET: usize = 92;
pub const DATASET_LENGTH: usize = 64;
pub const FILE_TYPE_OFFSET: usize = 156;
pub const FILE_TYPE_LENGTH: usize = 8;
pub const DATE_CREATED_OFFSET: usize = 164;
pub const DATE_MODIFIED_OFFSET: usize = 172;
pub const HEADER_SIZE_OFFSET: usize = 196;
pub const PAGE_SIZE_OFFSET: usize = 200;
pub const PAGE_COUNT_OFFSET: usize = 204;
pub const SAS_RELEASE_OFFSET: usize = 216;
pub const SAS_RELEASE_LENGTH: usize = 8;

/// Smallest header any valid file can have
pub const MIN_HEADER_LENGTH: usize = 288;

/// Encoding byte for UTF-8; everything else is decoded as Latin-1
pub const ENCODING_UTF8: u8 = 20;

pub const PAGE_BIT_OFFSET_X86: usize = 16;
pub const PAGE_BIT_OFFSET_X64: usize = 32;
pub const SUBHEADER_POINTER_LENGTH_X86: usize = 12;
pub const SUBHEADER_POINTER_LENGTH_X64: usize = 24;
pub const SUBHEADER_POINTERS_OFFSET: usize = 8;

pub const PAGE_META_TYPE: u16 = 0x0000;
pub const PAGE_DATA_TYPE: u16 = 0x0100;
pub const PAGE_MIX_TYPE: u16 = 0x0200;
pub const PAGE_AMD_TYPE: u16 = 0x0400;
pub const PAGE_META2_TYPE: u16 = 0x4000;
pub const PAGE_COMP_TYPE: u16 = 0x9000;
pub const PAGE_TYPE_MASK: u16 = 0xF000 | PAGE_DATA_TYPE | PAGE_MIX_TYPE | PAGE_AMD_TYPE;

pub const TRUNCATED_SUBHEADER_ID: u8 = 1;
pub const COMPRESSED_SUBHEADER_ID: u8 = 4;
pub const COMPRESSED_SUBHEADER_TYPE: u8 = 1;

pub const TEXT_BLOCK_SIZE_LENGTH: usize = 2;
pub const ROW_LENGTH_MULTIPLIER: usize = 5;
pub const ROW_COUNT_MULTIPLIER: usize = 6;
pub const COL_COUNT_P1_MULTIPLIER: usize = 9;
pub const COL_COUNT_P2_MULTIPLIER: usize = 10;
pub const MIX_PAGE_ROW_COUNT_MULTIPLIER: usize = 15;
pub const LCS_OFFSET_X86: usize = 354;
pub const LCS_OFFSET_X64: usize = 682;
pub const LCP_OFFSET_X86: usize = 378;
pub const LCP_OFFSET_X64: usize = 706;

pub const COLUMN_NAME_POINTER_LENGTH: usize = 8;
pub const COLUMN_DATA_OFFSET_OFFSET: usize = 8;
pub const COLUMN_DATA_LENGTH_OFFSET: usize = 8;
pub const COLUMN_TYPE_OFFSET: usize = 14;

pub const FORMAT_TEXT_INDEX_OFFSET: usize = 22;
pub const FORMAT_OFFSET_OFFSET: usize = 24;
pub const FORMAT_LENGTH_OFFSET: usize = 26;
pub const LABEL_TEXT_INDEX_OFFSET: usize = 28;
pub const LABEL_OFFSET_OFFSET: usize = 30;
pub const LABEL_LENGTH_OFFSET: usize = 32;

pub const RLE_COMPRESSION: &[u8] = b"SASYZCRL";
pub const RDC_COMPRESSION: &[u8] = b"SASYZCR2";

/// Seconds between 1960-01-01 and 1970-01-01
pub const SAS_EPOCH_OFFSET_SECONDS: i64 = 315_619_200;
/// Days between 1960-01-01 and 1970-01-01
pub const SAS_EPOCH_OFFSET_DAYS: i32 = 3653;

/// Formats whose values are days since the SAS epoch
pub const DATE_FORMATS: &[&str] = &[
    "DATE", "DAY", "DDMMYY", "DDMMYYB", "DDMMYYC", "DDMMYYD", "DDMMYYN", "DDMMYYP", "DDMMYYS",
    "DOWNAME", "E8601DA", "B8601DA", "JULDAY", "JULIAN", "MMDDYY", "MMDDYYB", "MMDDYYC", "MMDDYYD",
    "MMDDYYN", "MMDDYYP", "MMDDYYS", "MMYY", "MONNAME", "MONTH", "MONYY", "QTR", "WEEKDATE",
    "WEEKDATX", "WEEKDAY", "WORDDATE", "WORDDATX", "YEAR", "YYMM", "YYMMDD", "YYMMDDB", "YYMMDDC",
    "YYMMDDD", "YYMMDDN", "YYMMDDP", "YYMMDDS", "YYMON", "YYQ", "MINGUO", "NENGO",
];

/// Formats whose values are seconds since the SAS epoch
pub const DATETIME_FORMATS: &[&str] = &[
    "DATETIME", "DATEAMPM", "DTDATE", "DTMONYY", "DTWKDATX", "DTYEAR", "E8601DT", "E8601DX",
    "E8601DZ", "E8601LX", "B8601DT", "B8601DX", "B8601DZ", "B8601LX", "MDYAMPM",
];
