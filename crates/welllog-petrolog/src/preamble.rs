//! Binary preamble at the start of every `.data` file.
//!
//! Layout (little-endian):
//! - `[0..16]`   signature `PETROLOG`, NUL padded
//! - `[16..20]`  block length (u32), equal to the offset of the first record
//! - `[20..24]`  record width (u32)
//! - `[24..28]`  columns (u32)
//! - `[28..32]`  empty columns (u32)
//! - `[32..36]`  logs (u32)
//! - `[36..40]`  records (u32)
//! - `[40..48]`  depth start (f64, feet)
//! - `[48..56]`  depth end (f64, feet)
//! - `[56..64]`  depth frame (f64, feet)
//! - `[64..103]` reserved, zero
//!
//! One 48-byte [`ColumnSlot`] per column follows, empty columns included.

use std::io::Read;
use std::path::Path;

use welllog_codec::{
    read_ascii, read_f64, read_u16, read_u32, write_ascii, write_f64, write_u16, write_u32, Endian,
};

use crate::error::{PetrologError, Result};
use crate::header::PetrologHeader;

pub const SIGNATURE: &str = "PETROLOG";
const SIGNATURE_WIDTH: usize = 16;

/// Size of the fixed part of the preamble.
pub const FIXED_SIZE: usize = 0x67;

/// Size of one per-column slot.
pub const SLOT_SIZE: usize = 48;

const NAME_WIDTH: usize = 32;
const UNIT_WIDTH: usize = 12;

/// Slot count above which a preamble is rejected as corrupt.
const MAX_SLOTS: usize = 1 << 16;

const LE: Endian = Endian::Little;

/// Preamble size for the given column counts.
pub fn block_length(columns: usize, empty_columns: usize) -> usize {
    FIXED_SIZE + (columns + empty_columns) * SLOT_SIZE
}

/// Per-column slot. Empty columns have an all-zero slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSlot {
    pub name: String,
    pub unit: String,
    pub log_number: u16,
    /// Position within a multi-column log.
    pub sub_index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preamble {
    pub block_length: u32,
    pub record_width: u32,
    pub columns: u32,
    pub empty_columns: u32,
    pub logs: u32,
    pub records: u32,
    pub depth_start: f64,
    pub depth_end: f64,
    pub depth_frame: f64,
    pub slots: Vec<ColumnSlot>,
}

impl Preamble {
    /// Preamble describing the layout in `header`.
    pub fn from_header(header: &PetrologHeader) -> Self {
        let mut slots = Vec::with_capacity(header.number_of_columns + header.number_of_empty_columns);
        for log in &header.logs {
            for sub_index in 0..log.dimension {
                slots.push(ColumnSlot {
                    name: log.name.clone(),
                    unit: log.unit.clone(),
                    log_number: log.number as u16,
                    sub_index: sub_index as u16,
                });
            }
        }
        slots.resize(
            header.number_of_columns + header.number_of_empty_columns,
            ColumnSlot::default(),
        );

        Self {
            block_length: block_length(header.number_of_columns, header.number_of_empty_columns)
                as u32,
            record_width: header.record_width as u32,
            columns: header.number_of_columns as u32,
            empty_columns: header.number_of_empty_columns as u32,
            logs: header.number_of_logs as u32,
            records: header.number_of_records as u32,
            depth_start: header.depth_start,
            depth_end: header.depth_end,
            depth_frame: header.depth_frame,
            slots,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; FIXED_SIZE + self.slots.len() * SLOT_SIZE];
        write_ascii(&mut buf, 0, SIGNATURE_WIDTH, SIGNATURE)?;
        write_u32(&mut buf, 16, self.block_length, LE)?;
        write_u32(&mut buf, 20, self.record_width, LE)?;
        write_u32(&mut buf, 24, self.columns, LE)?;
        write_u32(&mut buf, 28, self.empty_columns, LE)?;
        write_u32(&mut buf, 32, self.logs, LE)?;
        write_u32(&mut buf, 36, self.records, LE)?;
        write_f64(&mut buf, 40, self.depth_start, LE)?;
        write_f64(&mut buf, 48, self.depth_end, LE)?;
        write_f64(&mut buf, 56, self.depth_frame, LE)?;

        for (i, slot) in self.slots.iter().enumerate() {
            let at = FIXED_SIZE + i * SLOT_SIZE;
            write_ascii(&mut buf, at, NAME_WIDTH, &slot.name)?;
            write_ascii(&mut buf, at + NAME_WIDTH, UNIT_WIDTH, &slot.unit)?;
            write_u16(&mut buf, at + 44, slot.log_number, LE)?;
            write_u16(&mut buf, at + 46, slot.sub_index, LE)?;
        }
        Ok(buf)
    }

    /// Read a preamble from the start of `reader`. `path` is only used in
    /// error messages.
    pub fn read_from<R: Read>(reader: &mut R, path: &Path) -> Result<Self> {
        let invalid = |reason: String| PetrologError::InvalidPreamble {
            path: path.to_path_buf(),
            reason,
        };

        let mut fixed = [0u8; FIXED_SIZE];
        reader
            .read_exact(&mut fixed)
            .map_err(|e| invalid(format!("fixed part unreadable: {e}")))?;
        let signature = read_ascii(&fixed, 0, SIGNATURE_WIDTH)?;
        if signature != SIGNATURE {
            return Err(invalid(format!("bad signature {signature:?}")));
        }

        let columns = read_u32(&fixed, 24, LE)?;
        let empty_columns = read_u32(&fixed, 28, LE)?;
        let slot_count = columns as usize + empty_columns as usize;
        if slot_count > MAX_SLOTS {
            return Err(invalid(format!("{slot_count} column slots")));
        }
        let block_length = read_u32(&fixed, 16, LE)?;
        if block_length as usize != block_length_for_slots(slot_count) {
            return Err(invalid(format!(
                "block length {block_length} does not match {slot_count} column slots"
            )));
        }

        let mut slot_bytes = vec![0u8; slot_count * SLOT_SIZE];
        reader
            .read_exact(&mut slot_bytes)
            .map_err(|e| invalid(format!("column slots unreadable: {e}")))?;
        let mut slots = Vec::with_capacity(slot_count);
        for i in 0..slot_count {
            let at = i * SLOT_SIZE;
            slots.push(ColumnSlot {
                name: read_ascii(&slot_bytes, at, NAME_WIDTH)?,
                unit: read_ascii(&slot_bytes, at + NAME_WIDTH, UNIT_WIDTH)?,
                log_number: read_u16(&slot_bytes, at + 44, LE)?,
                sub_index: read_u16(&slot_bytes, at + 46, LE)?,
            });
        }

        Ok(Self {
            block_length,
            record_width: read_u32(&fixed, 20, LE)?,
            columns,
            empty_columns,
            logs: read_u32(&fixed, 32, LE)?,
            records: read_u32(&fixed, 36, LE)?,
            depth_start: read_f64(&fixed, 40, LE)?,
            depth_end: read_f64(&fixed, 48, LE)?,
            depth_frame: read_f64(&fixed, 56, LE)?,
            slots,
        })
    }

    /// Read the preamble of the data file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut file = std::fs::File::open(path)?;
        Self::read_from(&mut file, path)
    }
}

fn block_length_for_slots(slots: usize) -> usize {
    FIXED_SIZE + slots * SLOT_SIZE
}
