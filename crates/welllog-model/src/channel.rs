//! Channels: named, unit-tagged sample sequences aligned to the index.

use serde::{Deserialize, Serialize};

use crate::constant::{self, Constant};

/// Storage encoding of a channel's samples in formats that record one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleEncoding {
    Double,
    Float,
    #[default]
    None,
}

impl SampleEncoding {
    /// Tag used in header documents and the statistics side-car.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Double => "TypeDouble",
            Self::Float => "TypeFloat",
            Self::None => "TypeNone",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "TypeDouble" => Self::Double,
            "TypeFloat" => Self::Float,
            _ => Self::None,
        }
    }
}

/// Summary of a channel's valid samples.
///
/// `valid_count + missing_count` equals the sample count once the
/// statistics have been computed from samples. Formats that cache
/// statistics may fill this without loading samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub valid_count: usize,
    pub missing_count: usize,
    /// First record holding a valid sample.
    pub data_start_index: Option<usize>,
    /// Last record holding a valid sample.
    pub data_end_index: Option<usize>,
    /// Index-channel value at `data_start_index`.
    pub data_start_value: f64,
    /// Index-channel value at `data_end_index`.
    pub data_end_value: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

impl Default for ChannelStats {
    fn default() -> Self {
        Self {
            valid_count: 0,
            missing_count: 0,
            data_start_index: None,
            data_end_index: None,
            data_start_value: f64::NAN,
            data_end_value: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            average: f64::NAN,
        }
    }
}

impl ChannelStats {
    /// Apply `v * gain + offset` to the value statistics.
    pub fn rescale(&mut self, gain: f64, offset: f64) {
        self.min = self.min * gain + offset;
        self.max = self.max * gain + offset;
        self.average = self.average * gain + offset;
        if gain < 0.0 {
            std::mem::swap(&mut self.min, &mut self.max);
        }
    }
}

/// One named sample sequence within a log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub unit: String,
    pub description: String,
    /// One value per record; empty until loaded.
    pub samples: Vec<f64>,
    /// Number of decimals to show when printing samples.
    pub decimals: u8,
    pub stats: ChannelStats,
    pub parameters: Vec<Constant>,
    pub encoding: SampleEncoding,
    /// 1-based column number within the record.
    pub column: usize,
    pub log_number: usize,
    /// 0-based first sample column within the record.
    pub column_start: usize,
    /// Consecutive values forming one sample (1 for scalar logs).
    pub dimension: usize,
}

impl Channel {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            decimals: 4,
            dimension: 1,
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_samples(mut self, samples: Vec<f64>) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_encoding(mut self, encoding: SampleEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop the samples, keeping metadata and statistics.
    pub fn clear(&mut self) {
        self.samples = Vec::new();
    }

    pub fn parameter(&self, name: &str) -> Option<&Constant> {
        constant::find(&self.parameters, name)
    }

    pub fn set_parameter(&mut self, name: &str, value: &str) {
        constant::upsert(&mut self.parameters, name, value);
    }

    /// Recompute statistics from the loaded samples.
    ///
    /// `index` supplies the index-channel values used for the data start and
    /// end values; pass the channel's own samples for the index channel.
    pub fn compute_statistics(&mut self, index: &[f64]) {
        let mut stats = ChannelStats::default();
        let mut sum = 0.0;

        for (i, &v) in self.samples.iter().enumerate() {
            if v.is_nan() {
                stats.missing_count += 1;
                continue;
            }
            if stats.valid_count == 0 {
                stats.data_start_index = Some(i);
                stats.min = v;
                stats.max = v;
            } else {
                stats.min = stats.min.min(v);
                stats.max = stats.max.max(v);
            }
            stats.data_end_index = Some(i);
            stats.valid_count += 1;
            sum += v;
        }

        if stats.valid_count > 0 {
            stats.average = sum / stats.valid_count as f64;
        }
        let at = |i: Option<usize>| i.and_then(|i| index.get(i)).copied().unwrap_or(f64::NAN);
        stats.data_start_value = at(stats.data_start_index);
        stats.data_end_value = at(stats.data_end_index);

        self.stats = stats;
    }

    /// Apply `v * gain + offset` to every valid sample and to the statistics.
    pub fn convert(&mut self, gain: f64, offset: f64) {
        for v in self.samples.iter_mut().filter(|v| !v.is_nan()) {
            *v = *v * gain + offset;
        }
        self.stats.rescale(gain, offset);
    }

    /// Shift every valid sample by `offset` (depth-offset correction).
    pub fn shift(&mut self, offset: f64) {
        self.convert(1.0, offset);
    }

    /// Keep only the samples at `range`.
    pub(crate) fn retain_range(&mut self, range: std::ops::Range<usize>) {
        if self.samples.is_empty() {
            return;
        }
        let end = range.end.min(self.samples.len());
        let start = range.start.min(end);
        self.samples = self.samples[start..end].to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_with_gaps() {
        let mut ch = Channel::new("GR", "API").with_samples(vec![1.0, f64::NAN, 3.0, f64::NAN, 5.0]);
        let index = [100.0, 100.5, 101.0, 101.5, 102.0];
        ch.compute_statistics(&index);

        assert_eq!(ch.stats.valid_count, 3);
        assert_eq!(ch.stats.missing_count, 2);
        assert_eq!(ch.stats.min, 1.0);
        assert_eq!(ch.stats.max, 5.0);
        assert_eq!(ch.stats.average, 3.0);
        assert_eq!(ch.stats.data_start_index, Some(0));
        assert_eq!(ch.stats.data_end_index, Some(4));
        assert_eq!(ch.stats.data_start_value, 100.0);
        assert_eq!(ch.stats.data_end_value, 102.0);
        assert_eq!(ch.stats.valid_count + ch.stats.missing_count, ch.len());
    }

    #[test]
    fn test_statistics_all_missing() {
        let mut ch = Channel::new("NPHI", "v/v").with_samples(vec![f64::NAN; 4]);
        ch.compute_statistics(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(ch.stats.valid_count, 0);
        assert_eq!(ch.stats.missing_count, 4);
        assert!(ch.stats.min.is_nan());
        assert!(ch.stats.max.is_nan());
        assert!(ch.stats.average.is_nan());
        assert_eq!(ch.stats.data_start_index, None);
    }

    #[test]
    fn test_statistics_trimmed_boundaries() {
        let mut ch = Channel::new("RHOB", "g/cc").with_samples(vec![f64::NAN, 2.3, 2.5, f64::NAN]);
        ch.compute_statistics(&[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(ch.stats.data_start_index, Some(1));
        assert_eq!(ch.stats.data_end_index, Some(2));
        assert_eq!(ch.stats.data_start_value, 20.0);
        assert_eq!(ch.stats.data_end_value, 30.0);
    }

    #[test]
    fn test_convert_skips_missing() {
        let mut ch = Channel::new("T", "A").with_samples(vec![10.0, f64::NAN, 0.0]);
        ch.compute_statistics(&[0.0, 1.0, 2.0]);
        ch.convert(2.0, 1.0);
        assert_eq!(ch.samples[0], 21.0);
        assert!(ch.samples[1].is_nan());
        assert_eq!(ch.samples[2], 1.0);
        assert_eq!(ch.stats.min, 1.0);
        assert_eq!(ch.stats.max, 21.0);
        assert_eq!(ch.stats.average, 11.0);
    }

    #[test]
    fn test_negative_gain_keeps_min_below_max() {
        let mut ch = Channel::new("T", "A").with_samples(vec![1.0, 3.0]);
        ch.compute_statistics(&[0.0, 1.0]);
        ch.convert(-1.0, 0.0);
        assert_eq!(ch.stats.min, -3.0);
        assert_eq!(ch.stats.max, -1.0);
    }

    #[test]
    fn test_clear_keeps_statistics() {
        let mut ch = Channel::new("GR", "API").with_samples(vec![4.0, 6.0]);
        ch.compute_statistics(&[0.0, 1.0]);
        ch.clear();
        assert!(ch.is_empty());
        assert_eq!(ch.stats.average, 5.0);
    }

    #[test]
    fn test_encoding_tags() {
        for enc in [SampleEncoding::Double, SampleEncoding::Float, SampleEncoding::None] {
            assert_eq!(SampleEncoding::from_tag(enc.tag()), enc);
        }
        assert_eq!(SampleEncoding::from_tag("TypeShort"), SampleEncoding::None);
    }
}
