//! The `.statistics` side-car: per-channel statistics persisted as a
//! pipe-delimited text file so reopening a log skips the full scan.
//!
//! The first line is a `#` comment naming the columns. Each following row
//! holds nine fields: name, unit, type tag, description, valid count,
//! missing count, min, max and average. A field containing `|` or `"` is
//! wrapped in double quotes with inner quotes doubled.

use std::io::Write;
use std::path::Path;

use welllog_model::{Channel, ChannelStats};

use crate::error::Result;

const DELIMITER: char = '|';
const QUOTE: char = '"';
const FIELD_COUNT: usize = 9;
const COMMENT: &str =
    "# Name|Unit|Type|Description|ValidCount|MissingCount|Min|Max|Average";

/// One cached row.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsEntry {
    pub name: String,
    pub unit: String,
    pub type_tag: String,
    pub description: String,
    pub valid_count: usize,
    pub missing_count: usize,
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

impl StatisticsEntry {
    pub fn from_channel(channel: &Channel) -> Self {
        Self {
            name: channel.name.clone(),
            unit: channel.unit.clone(),
            type_tag: channel.encoding.tag().to_string(),
            description: channel.description.clone(),
            valid_count: channel.stats.valid_count,
            missing_count: channel.stats.missing_count,
            min: channel.stats.min,
            max: channel.stats.max,
            average: channel.stats.average,
        }
    }

    /// Copy the cached values into `channel`'s statistics.
    pub fn apply_to(&self, channel: &mut Channel) {
        channel.stats = ChannelStats {
            valid_count: self.valid_count,
            missing_count: self.missing_count,
            min: self.min,
            max: self.max,
            average: self.average,
            ..ChannelStats::default()
        };
    }

    fn to_row(&self) -> String {
        [
            quote(&self.name),
            quote(&self.unit),
            quote(&self.type_tag),
            quote(&self.description),
            self.valid_count.to_string(),
            self.missing_count.to_string(),
            self.min.to_string(),
            self.max.to_string(),
            self.average.to_string(),
        ]
        .join("|")
    }

    fn from_row(line: &str) -> Option<Self> {
        let fields = split_row(line)?;
        if fields.len() < FIELD_COUNT {
            return None;
        }
        Some(Self {
            name: fields[0].clone(),
            unit: fields[1].clone(),
            type_tag: fields[2].clone(),
            description: fields[3].clone(),
            valid_count: fields[4].trim().parse().ok()?,
            missing_count: fields[5].trim().parse().ok()?,
            min: fields[6].trim().parse().ok()?,
            max: fields[7].trim().parse().ok()?,
            average: fields[8].trim().parse().ok()?,
        })
    }
}

pub struct StatisticsCache;

impl StatisticsCache {
    /// Load cached rows for `channels`, in order.
    ///
    /// Returns `None` when the file is missing or unreadable, a row is
    /// malformed, the row count differs from the channel count, or any row's
    /// name or unit differs from its channel's.
    pub fn load(path: &Path, channels: &[Channel]) -> Option<Vec<StatisticsEntry>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                tracing::debug!(path = %path.display(), "No statistics cache");
                return None;
            }
        };

        let mut entries = Vec::with_capacity(channels.len());
        for line in text.lines().filter(|l| !l.trim().is_empty() && !l.starts_with('#')) {
            match StatisticsEntry::from_row(line) {
                Some(entry) => entries.push(entry),
                None => {
                    tracing::warn!(path = %path.display(), line, "Malformed statistics cache row");
                    return None;
                }
            }
        }

        if entries.len() != channels.len() {
            tracing::warn!(
                path = %path.display(),
                cached = entries.len(),
                channels = channels.len(),
                "Statistics cache does not match channel count"
            );
            return None;
        }
        for (entry, channel) in entries.iter().zip(channels) {
            if entry.name != channel.name || entry.unit != channel.unit {
                tracing::warn!(
                    path = %path.display(),
                    cached = %entry.name,
                    channel = %channel.name,
                    "Statistics cache names a different channel"
                );
                return None;
            }
        }

        tracing::debug!(path = %path.display(), rows = entries.len(), "Statistics cache hit");
        Some(entries)
    }

    pub fn save(path: &Path, entries: &[StatisticsEntry]) -> Result<()> {
        crate::rewrite::replace_file(path, |w| {
            writeln!(w, "{COMMENT}")?;
            for entry in entries {
                writeln!(w, "{}", entry.to_row())?;
            }
            Ok(())
        })
    }

    /// Delete the cache file if present.
    pub fn invalidate(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn quote(field: &str) -> String {
    if field.contains(DELIMITER) || field.contains(QUOTE) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one row, honouring quoted fields. `None` for an unterminated quote.
fn split_row(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::with_capacity(FIELD_COUNT);
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(ch) = chars.next() {
        match (in_quotes, ch) {
            (true, QUOTE) if chars.peek() == Some(&QUOTE) => {
                field.push(QUOTE);
                chars.next();
            }
            (true, QUOTE) => in_quotes = false,
            (true, c) => field.push(c),
            (false, QUOTE) if field.is_empty() => in_quotes = true,
            (false, DELIMITER) => fields.push(std::mem::take(&mut field)),
            (false, c) => field.push(c),
        }
    }
    if in_quotes {
        return None;
    }
    fields.push(field);
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str, unit: &str, samples: Vec<f64>) -> Channel {
        let mut ch = Channel::new(name, unit).with_samples(samples);
        let index: Vec<f64> = (0..ch.len()).map(|i| i as f64).collect();
        ch.compute_statistics(&index);
        ch
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("a|b"), "\"a|b\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(
            split_row("\"a|b\"|\"say \"\"hi\"\"\"|x").unwrap(),
            vec!["a|b", "say \"hi\"", "x"]
        );
        assert!(split_row("\"open").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.statistics");
        let mut gr = channel("GR", "API", vec![1.0, f64::NAN, 3.0]);
        gr.description = "Gamma | \"natural\"".into();
        let empty = channel("NPHI", "v/v", vec![f64::NAN, f64::NAN]);
        let channels = vec![gr, empty];

        let entries: Vec<_> = channels.iter().map(StatisticsEntry::from_channel).collect();
        StatisticsCache::save(&path, &entries).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with('#'));
        assert!(text.contains("\"Gamma | \"\"natural\"\"\""));

        let loaded = StatisticsCache::load(&path, &channels).unwrap();
        assert_eq!(loaded[0].description, "Gamma | \"natural\"");
        assert_eq!(loaded[0].valid_count, 2);
        assert_eq!(loaded[0].average, 2.0);
        assert_eq!(loaded[0].type_tag, "TypeNone");
        assert!(loaded[1].min.is_nan());
        assert_eq!(loaded[1].missing_count, 2);

        let mut restored = Channel::new("GR", "API");
        loaded[0].apply_to(&mut restored);
        assert_eq!(restored.stats.max, 3.0);
    }

    #[test]
    fn test_load_rejects_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.statistics");
        let channels = vec![channel("GR", "API", vec![1.0]), channel("RT", "ohmm", vec![2.0])];
        let entries: Vec<_> = channels.iter().map(StatisticsEntry::from_channel).collect();
        StatisticsCache::save(&path, &entries).unwrap();

        assert!(StatisticsCache::load(&path, &channels).is_some());
        assert!(StatisticsCache::load(&path, &channels[..1]).is_none());

        let renamed = vec![channels[0].clone(), channel("ILD", "ohmm", vec![2.0])];
        assert!(StatisticsCache::load(&path, &renamed).is_none());

        let reunited = vec![channels[0].clone(), channel("RT", "ohm.m", vec![2.0])];
        assert!(StatisticsCache::load(&path, &reunited).is_none());

        std::fs::write(&path, "# header\nGR|API|TypeFloat|x|1|0\n").unwrap();
        assert!(StatisticsCache::load(&path, &channels[..1]).is_none());

        StatisticsCache::invalidate(&path).unwrap();
        assert!(StatisticsCache::load(&path, &channels).is_none());
        StatisticsCache::invalidate(&path).unwrap();
    }
}
