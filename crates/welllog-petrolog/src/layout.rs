//! Record addressing inside the `.data` file.
//!
//! Every record starts with the depth as a little-endian `f64`. Samples
//! follow as little-endian `f32` columns; a channel whose first column is
//! `column_start` keeps sub-sample `dim` at
//! [`RecordLayout::sample_offset`]`(column_start, dim)`.

use std::ops::Range;

/// Bytes taken by the depth field at the start of every record.
pub const DEPTH_FIELD_WIDTH: usize = 8;

/// Bytes per sample column.
pub const COLUMN_WIDTH: usize = 4;

/// Where records live and which depth each one holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordLayout {
    /// Byte offset of the first record.
    pub data_start: u64,
    pub record_width: usize,
    pub records: usize,
    pub depth_start: f64,
    pub depth_end: f64,
    pub depth_step: f64,
}

impl RecordLayout {
    /// Record width for the given column counts.
    pub fn record_width_for(columns: usize, empty_columns: usize) -> usize {
        DEPTH_FIELD_WIDTH + COLUMN_WIDTH * (columns + empty_columns)
    }

    /// Byte offset of sub-sample `dim` of the channel starting at `column_start`.
    pub fn sample_offset(column_start: usize, dim: usize) -> usize {
        4 + (column_start + dim + 1) * COLUMN_WIDTH
    }

    /// Byte range occupied by `dimension` columns starting at `column_start`.
    pub fn column_span(column_start: usize, dimension: usize) -> Range<usize> {
        let start = Self::sample_offset(column_start, 0);
        start..start + dimension * COLUMN_WIDTH
    }

    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Byte offset of record `record`.
    pub fn record_offset(&self, record: usize) -> u64 {
        self.data_start + record as u64 * self.record_width as u64
    }

    /// Byte offset of the record holding `depth`, rounded to the nearest
    /// record. `None` outside the depth range or for a zero step.
    pub fn position(&self, depth: f64) -> Option<u64> {
        if self.depth_step == 0.0 || !self.depth_step.is_finite() || !depth.is_finite() {
            return None;
        }
        let (lo, hi) = if self.depth_step > 0.0 {
            (self.depth_start, self.depth_end)
        } else {
            (self.depth_end, self.depth_start)
        };
        if depth < lo || depth > hi {
            return None;
        }
        let record = ((depth - self.depth_start) / self.depth_step).round();
        Some(self.record_offset(record as usize))
    }

    /// Depth held by record `record`.
    pub fn depth_at(&self, record: usize) -> f64 {
        self.depth_start + record as f64 * self.depth_step
    }

    /// Total bytes of record data.
    pub fn data_block_size(&self) -> u64 {
        self.record_width as u64 * self.records as u64
    }
}

/// Generate index values from `start` stepping by `step` until the value
/// passes `end` in the step's direction, producing at most `limit` values.
pub fn generate_index(start: f64, step: f64, end: f64, limit: usize) -> Vec<f64> {
    if limit == 0 || !start.is_finite() {
        return Vec::new();
    }
    if step == 0.0 || !step.is_finite() {
        return vec![start];
    }

    // Absorb representation error in `end` without admitting a whole extra step.
    let slack = step.abs() * 1e-9;
    let passed = |value: f64| {
        if step > 0.0 {
            value > end + slack
        } else {
            value < end - slack
        }
    };

    let mut index = Vec::new();
    for i in 0..limit {
        let value = start + i as f64 * step;
        if passed(value) {
            return index;
        }
        index.push(value);
    }
    tracing::warn!(start, step, end, limit, "Index generation stopped at the iteration limit");
    index
}
