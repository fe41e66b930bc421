//! The in-memory log file: index channel, data channels, constants and
//! parameters, plus the format-neutral versions of every log operation.

use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::constant::{self, Constant};
use crate::error::{ModelError, Result};

/// A log file held in memory.
///
/// Channel 0 is the index (depth or time) channel. Every loaded channel has
/// the same number of samples as the index channel, aligned record for
/// record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogFile {
    pub path: PathBuf,
    pub channels: Vec<Channel>,
    /// Header facts (company, well, field, ...).
    pub constants: Vec<Constant>,
    /// Acquisition parameters.
    pub parameters: Vec<Constant>,
}

impl LogFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Builder helper: append a channel.
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn constant(&self, name: &str) -> Option<&Constant> {
        constant::find(&self.constants, name)
    }

    pub fn set_constant(&mut self, name: &str, value: &str) {
        constant::upsert(&mut self.constants, name, value);
    }

    pub fn parameter(&self, name: &str) -> Option<&Constant> {
        constant::find(&self.parameters, name)
    }

    pub fn set_parameter(&mut self, name: &str, value: &str) {
        constant::upsert(&mut self.parameters, name, value);
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.name == name)
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.name == name)
    }

    pub fn channel_at(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn index_channel(&self) -> Option<&Channel> {
        self.channels.first()
    }

    /// Position of `name`, or [`ModelError::ChannelNotFound`].
    pub fn require_channel(&self, name: &str) -> Result<usize> {
        self.channel_index(name)
            .ok_or_else(|| ModelError::ChannelNotFound(name.to_string()))
    }

    /// Return the channel named `name`, creating it when absent.
    ///
    /// A new channel gets as many NaN samples as the index channel has.
    pub fn get_or_create_channel(&mut self, name: &str, unit: &str) -> &mut Channel {
        let position = match self.channel_index(name) {
            Some(i) => i,
            None => {
                let records = self.index_channel().map_or(0, Channel::len);
                let channel = Channel::new(name, unit).with_samples(vec![f64::NAN; records]);
                tracing::debug!(name, records, "Creating channel");
                self.channels.push(channel);
                self.channels.len() - 1
            }
        };
        &mut self.channels[position]
    }

    /// Check that every loaded channel matches the index channel's length.
    pub fn check_alignment(&self) -> Result<()> {
        let index = self.index_channel().ok_or(ModelError::NoIndexChannel)?;
        let expected = index.len();
        for channel in self.channels.iter().skip(1).filter(|c| !c.is_empty()) {
            if channel.len() != expected {
                return Err(ModelError::LengthMismatch {
                    name: channel.name.clone(),
                    expected,
                    actual: channel.len(),
                });
            }
        }
        Ok(())
    }

    /// Recompute statistics for every channel from its samples.
    pub fn compute_statistics(&mut self) {
        let Some(index) = self.index_channel().map(|c| c.samples.clone()) else {
            return;
        };
        for channel in &mut self.channels {
            channel.compute_statistics(&index);
        }
    }

    /// Crop all channels jointly to index values between `from` and `to`
    /// (in either order). Record alignment is preserved.
    pub fn crop(&mut self, from: f64, to: f64) -> Result<()> {
        self.check_alignment()?;
        let index = &self.channels[0].samples;
        let range = index_range(index, from, to).unwrap_or(0..0);
        tracing::debug!(from, to, start = range.start, end = range.end, "Cropping log");

        for channel in &mut self.channels {
            channel.retain_range(range.clone());
        }
        self.compute_statistics();
        Ok(())
    }

    /// Remove the named channels. Every name must exist and the index
    /// channel cannot be removed.
    pub fn delete_channels(&mut self, names: &[&str]) -> Result<usize> {
        self.check_deletable(names)?;
        let before = self.channels.len();
        self.channels.retain(|c| !names.contains(&c.name.as_str()));
        Ok(before - self.channels.len())
    }

    /// Validation shared with formats that rewrite files on deletion.
    pub fn check_deletable(&self, names: &[&str]) -> Result<()> {
        for &name in names {
            match self.channel_index(name) {
                Some(0) => return Err(ModelError::IndexChannelProtected(name.to_string())),
                Some(_) => {}
                None => return Err(ModelError::ChannelNotFound(name.to_string())),
            }
        }
        Ok(())
    }

    /// Overwrite each `(destination, source)` pair's destination samples and
    /// statistics with the source's.
    pub fn copy_channel_values(&mut self, pairs: &[(&str, &str)]) -> Result<()> {
        for &(destination, source) in pairs {
            let src = self.require_channel(source)?;
            let dst = self.require_channel(destination)?;
            let (samples, stats) = {
                let s = &self.channels[src];
                (s.samples.clone(), s.stats)
            };
            let d = &mut self.channels[dst];
            d.samples = samples;
            d.stats = stats;
        }
        Ok(())
    }

    /// Convert every channel whose unit is `from`: valid samples become
    /// `v * gain + offset`, statistics follow, and the unit becomes `to`.
    /// Returns the number of channels converted.
    pub fn convert_unit(&mut self, from: &str, to: &str, gain: f64, offset: f64) -> usize {
        let mut converted = 0;
        for channel in self.channels.iter_mut().filter(|c| c.unit == from) {
            channel.convert(gain, offset);
            channel.unit = to.to_string();
            converted += 1;
        }
        tracing::debug!(from, to, gain, offset, converted, "Converted unit");
        converted
    }
}

/// Records whose index value lies between `from` and `to` (either order).
///
/// The index is assumed monotonic; the result is the span from the first
/// to the last matching record, or `None` when nothing matches.
pub fn index_range(index: &[f64], from: f64, to: f64) -> Option<Range<usize>> {
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    let inside = |v: &f64| *v >= lo && *v <= hi;
    let start = index.iter().position(inside)?;
    let end = index.iter().rposition(inside)?;
    Some(start..end + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> LogFile {
        LogFile::new("mem.log")
            .with_channel(Channel::new("DEPTH", "ft").with_samples(vec![100.0, 100.5, 101.0, 101.5]))
            .with_channel(Channel::new("GR", "API").with_samples(vec![10.0, 20.0, f64::NAN, 40.0]))
            .with_channel(Channel::new("TEMP", "degC").with_samples(vec![50.0, 51.0, 52.0, 53.0]))
    }

    #[test]
    fn test_index_range_ascending_and_descending() {
        let asc = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(index_range(&asc, 2.0, 3.0), Some(1..3));
        assert_eq!(index_range(&asc, 3.0, 2.0), Some(1..3));
        assert_eq!(index_range(&asc, 5.0, 6.0), None);

        let desc = [4.0, 3.0, 2.0, 1.0];
        assert_eq!(index_range(&desc, 1.5, 3.5), Some(1..3));
    }

    #[test]
    fn test_crop_keeps_alignment() {
        let mut log = sample_log();
        log.crop(100.5, 101.0).unwrap();
        assert_eq!(log.channels[0].samples, vec![100.5, 101.0]);
        assert_eq!(log.channels[1].samples[0], 20.0);
        assert!(log.channels[1].samples[1].is_nan());
        assert_eq!(log.channels[2].samples, vec![51.0, 52.0]);
        assert_eq!(log.channels[2].stats.data_start_value, 100.5);
    }

    #[test]
    fn test_crop_rejects_misaligned() {
        let mut log = sample_log();
        log.channels[2].samples.pop();
        assert!(matches!(
            log.crop(100.0, 101.0),
            Err(ModelError::LengthMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_get_or_create_channel() {
        let mut log = sample_log();
        let created = log.get_or_create_channel("RT", "ohmm");
        assert_eq!(created.len(), 4);
        assert!(created.samples.iter().all(|v| v.is_nan()));
        assert_eq!(log.channels.len(), 4);

        log.get_or_create_channel("GR", "ignored").samples[0] = 11.0;
        assert_eq!(log.channels.len(), 4);
        assert_eq!(log.channel("GR").unwrap().samples[0], 11.0);
    }

    #[test]
    fn test_delete_channels() {
        let mut log = sample_log();
        assert_eq!(log.delete_channels(&["GR"]).unwrap(), 1);
        assert!(log.channel("GR").is_none());
        assert!(matches!(
            log.delete_channels(&["DEPTH"]),
            Err(ModelError::IndexChannelProtected(_))
        ));
        assert!(matches!(
            log.delete_channels(&["NOPE"]),
            Err(ModelError::ChannelNotFound(_))
        ));
    }

    #[test]
    fn test_convert_unit_matches_by_unit() {
        let mut log = sample_log();
        log.compute_statistics();
        assert_eq!(log.convert_unit("degC", "degF", 1.8, 32.0), 1);
        let temp = log.channel("TEMP").unwrap();
        assert_eq!(temp.unit, "degF");
        assert_eq!(temp.samples[0], 122.0);
        assert_eq!(temp.stats.min, 122.0);
        assert_eq!(log.convert_unit("degC", "degF", 1.8, 32.0), 0);
    }

    #[test]
    fn test_copy_channel_values() {
        let mut log = sample_log();
        log.compute_statistics();
        log.copy_channel_values(&[("GR", "TEMP")]).unwrap();
        let gr = log.channel("GR").unwrap();
        assert_eq!(gr.samples, vec![50.0, 51.0, 52.0, 53.0]);
        assert_eq!(gr.stats.average, 51.5);
        assert_eq!(gr.unit, "API");
    }

    #[test]
    fn test_constants_and_parameters_are_separate() {
        let mut log = sample_log();
        log.set_constant("WELL", "A-1");
        log.set_parameter("WELL", "ignored");
        assert_eq!(log.constant("WELL").unwrap().value, "A-1");
        assert_eq!(log.parameter("WELL").unwrap().value, "ignored");
        assert!(log.constant("well").is_none());
    }
}
