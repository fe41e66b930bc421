//! Petrolog log writer: builds a new log from in-memory channels.
//!
//! The writer follows a builder pattern: create a [`PetrologWriter`] with the
//! depth range, add channels and well-header constants, then call
//! [`PetrologWriter::finalize`] to write the three member files.
//!
//! # Example
//!
//! ```rust,no_run
//! use welllog_petrolog::PetrologWriter;
//!
//! let mut writer = PetrologWriter::new(1000.0, 0.5, 3);
//! writer
//!     .add_channel("GR", "API", "Gamma ray", 1, vec![45.0, 52.5, f64::NAN])
//!     .unwrap();
//! writer.well_header_mut().set_constant("WELL", "A-1");
//! writer.finalize("logs/well_a").unwrap();
//! ```

use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use welllog_codec::encode_sample;
use welllog_model::ModelError;

use crate::error::{PetrologError, Result};
use crate::header::{LogDescriptor, PetrologHeader};
use crate::log::INDEX_CHANNEL;
use crate::paths::LogPaths;
use crate::preamble::Preamble;
use crate::rewrite::replace_file;
use crate::stats_cache::StatisticsCache;
use crate::well_header::WellHeader;

/// Builder for new Petrolog logs. Depths are given in feet.
pub struct PetrologWriter {
    header: PetrologHeader,
    /// Samples per channel, `records * dimension` values each, record-major.
    samples: Vec<Vec<f64>>,
    well_header: WellHeader,
}

impl PetrologWriter {
    /// Writer for `records` records starting at `depth_start` and stepping
    /// by `depth_step`.
    pub fn new(depth_start: f64, depth_step: f64, records: usize) -> Self {
        Self {
            header: PetrologHeader::new(depth_start, depth_step, records),
            samples: Vec::new(),
            well_header: WellHeader::new(),
        }
    }

    /// Add a `TypeFloat` channel.
    ///
    /// `samples` holds `dimension` values per record, record after record.
    /// NaN is stored as the missing-value sentinel.
    ///
    /// # Errors
    ///
    /// [`PetrologError::InvalidDimension`] for a zero dimension,
    /// [`PetrologError::DuplicateChannel`] for a name already in use and
    /// a length mismatch when `samples` does not cover every record.
    pub fn add_channel(
        &mut self,
        name: &str,
        unit: &str,
        description: &str,
        dimension: usize,
        samples: Vec<f64>,
    ) -> Result<&mut Self> {
        if dimension == 0 {
            return Err(PetrologError::InvalidDimension {
                name: name.to_string(),
                dimension,
            });
        }
        if name == INDEX_CHANNEL || self.header.log(name).is_some() {
            return Err(PetrologError::DuplicateChannel(name.to_string()));
        }
        let expected = self.header.number_of_records * dimension;
        if samples.len() != expected {
            return Err(ModelError::LengthMismatch {
                name: name.to_string(),
                expected,
                actual: samples.len(),
            }
            .into());
        }

        tracing::debug!(channel = name, unit, dimension, "Adding channel to writer");
        let mut descriptor = LogDescriptor::new(name, unit, dimension);
        descriptor.description = description.to_string();
        self.header.logs.push(descriptor);
        self.header.recompute_layout();
        self.samples.push(samples);
        Ok(self)
    }

    /// Reserve `count` unused columns at the end of every record.
    pub fn set_empty_columns(&mut self, count: usize) -> &mut Self {
        self.header.number_of_empty_columns = count;
        self.header.recompute_layout();
        self
    }

    pub fn set_well_header(&mut self, well_header: WellHeader) -> &mut Self {
        self.well_header = well_header;
        self
    }

    pub fn well_header_mut(&mut self) -> &mut WellHeader {
        &mut self.well_header
    }

    pub fn header(&self) -> &PetrologHeader {
        &self.header
    }

    /// Write `<base>.data`, `<base>.header` and `<base>.wellheader`, and
    /// remove any stale `<base>.statistics`.
    pub fn finalize(&self, base: impl AsRef<Path>) -> Result<LogPaths> {
        let paths = LogPaths::new(base.as_ref());
        let preamble = Preamble::from_header(&self.header).to_bytes()?;
        let layout = self.header.record_layout();

        replace_file(&paths.data, |w| {
            w.write_all(&preamble)?;
            let mut record = Vec::with_capacity(layout.record_width);
            for k in 0..layout.records {
                record.clear();
                record.write_f64::<LittleEndian>(layout.depth_at(k))?;
                for (log, samples) in self.header.logs.iter().zip(&self.samples) {
                    let row = &samples[k * log.dimension..(k + 1) * log.dimension];
                    for &value in row {
                        record.write_f32::<LittleEndian>(encode_sample(value))?;
                    }
                }
                record.resize(layout.record_width, 0);
                w.write_all(&record)?;
            }
            Ok(())
        })?;
        self.header.save(&paths.header)?;
        self.well_header.save(&paths.well_header)?;
        StatisticsCache::invalidate(&paths.statistics)?;

        tracing::info!(
            path = %paths.base.display(),
            records = layout.records,
            channels = self.header.logs.len(),
            record_width = layout.record_width,
            "Finalized Petrolog log"
        );
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::RecordLayout;

    #[test]
    fn test_add_channel_validation() {
        let mut writer = PetrologWriter::new(0.0, 1.0, 2);
        assert!(matches!(
            writer.add_channel("A", "u", "", 0, vec![]),
            Err(PetrologError::InvalidDimension { .. })
        ));
        assert!(matches!(
            writer.add_channel("DEPTH", "ft", "", 1, vec![1.0, 2.0]),
            Err(PetrologError::DuplicateChannel(_))
        ));
        assert!(matches!(
            writer.add_channel("A", "u", "", 2, vec![1.0, 2.0]),
            Err(PetrologError::Model(ModelError::LengthMismatch { expected: 4, .. }))
        ));
        writer.add_channel("A", "u", "", 1, vec![1.0, 2.0]).unwrap();
        assert!(matches!(
            writer.add_channel("A", "u", "", 1, vec![1.0, 2.0]),
            Err(PetrologError::DuplicateChannel(_))
        ));
    }

    #[test]
    fn test_finalize_byte_layout() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("w");
        let mut writer = PetrologWriter::new(500.0, 0.5, 2);
        writer
            .add_channel("GR", "API", "", 1, vec![10.0, f64::NAN])
            .unwrap()
            .add_channel("ARR", "mV", "", 2, vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        writer.set_empty_columns(1);
        let paths = writer.finalize(&base).unwrap();

        let bytes = std::fs::read(&paths.data).unwrap();
        let h = writer.header();
        assert_eq!(h.record_width, 8 + 4 * 4);
        assert_eq!(bytes.len() as u64, h.data_start + 2 * h.record_width as u64);

        let second = h.data_start as usize + h.record_width;
        let f32_at = |at: usize| f32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());
        assert_eq!(
            f64::from_le_bytes(bytes[second..second + 8].try_into().unwrap()),
            500.5
        );
        assert_eq!(f32_at(second + RecordLayout::sample_offset(0, 0)), -1.0e30);
        assert_eq!(f32_at(second + RecordLayout::sample_offset(1, 1)), 4.0);
        assert_eq!(f32_at(second + RecordLayout::sample_offset(3, 0)), 0.0);

        assert!(paths.header.exists());
        assert!(paths.well_header.exists());
        assert!(!paths.statistics.exists());
    }
}
