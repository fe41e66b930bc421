//! Whole-file rewrites of the `.data` body.
//!
//! Every rewrite streams into a temporary file in the target's directory,
//! syncs it and renames it over the original. The original bytes stay in
//! place until that rename. The header document and the statistics
//! side-car are rewritten after the data file.

use std::collections::HashSet;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::Path;

use tempfile::NamedTempFile;
use welllog_codec::{decode_sample, encode_sample, is_missing, read_f32, write_f32, Endian};
use welllog_model::{index_range, ModelError, SampleEncoding};

use crate::error::{PetrologError, Result};
use crate::layout::{RecordLayout, COLUMN_WIDTH, DEPTH_FIELD_WIDTH};
use crate::log::{fill_record, read_record, PetrologLog};
use crate::preamble::Preamble;

/// Write a new file through `fill` and rename it over `target`.
///
/// `fill` opens and drops its own reader of `target`, so no handle on the
/// original is held across the rename. A failed rename leaves `target` as it was and surfaces as
/// [`PetrologError::PartialRewrite`]; the temporary file is removed.
pub(crate) fn replace_file<F>(target: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        fill(&mut writer)?;
        writer.flush()?;
    }
    if let Ok(meta) = std::fs::metadata(target) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| PetrologError::PartialRewrite {
        path: target.to_path_buf(),
        source: e.error,
    })?;
    tracing::debug!(path = %target.display(), "Replaced file");
    Ok(())
}

/// Map every byte offset of an old record to its offset in the new record,
/// or `None` when the byte falls inside one of `spans`.
///
/// Overlapping and unsorted spans are allowed. Bytes after a removed span
/// move left by the number of removed bytes before them.
pub fn build_remap_table(record_width: usize, spans: &[Range<usize>]) -> Vec<Option<usize>> {
    let mut removed = vec![false; record_width];
    for span in spans {
        let end = span.end.min(record_width);
        for flag in &mut removed[span.start.min(end)..end] {
            *flag = true;
        }
    }

    let mut next = 0;
    removed
        .into_iter()
        .map(|gone| {
            if gone {
                None
            } else {
                next += 1;
                Some(next - 1)
            }
        })
        .collect()
}

/// Copy `len` bytes from `reader` to `writer`.
fn copy_exact<R: Read, W: Write + ?Sized>(reader: &mut R, writer: &mut W, len: u64) -> Result<()> {
    let copied = std::io::copy(&mut reader.take(len), writer)?;
    if copied < len {
        tracing::warn!(expected = len, copied, "Data ended early during rewrite");
    }
    Ok(())
}

impl PetrologLog {
    /// Stream every record through `edit` into a fresh data file, keeping
    /// the preamble and any bytes after the last record.
    fn rewrite_records<F>(&self, mut edit: F) -> Result<()>
    where
        F: FnMut(&mut [u8]) -> Result<()>,
    {
        let layout = self.layout();
        replace_file(&self.paths.data, |w| {
            let mut reader = self.open_data()?;
            copy_exact(&mut reader, w, layout.data_start)?;
            let mut record = vec![0u8; layout.record_width];
            for _ in 0..layout.records {
                let filled = fill_record(&mut reader, &mut record)?;
                if filled < record.len() {
                    w.write_all(&record[..filled])?;
                    break;
                }
                edit(&mut record)?;
                w.write_all(&record)?;
            }
            std::io::copy(&mut reader, w)?;
            Ok(())
        })
    }

    /// Apply `v * gain + offset` to every channel whose unit is `from`, on
    /// disk and in memory, and relabel it `to`. Missing samples stay missing.
    /// Returns the number of channels converted.
    ///
    /// The index channel is never converted: it is generated from the
    /// header, so its unit follows [`PetrologConfig::depth_units`]. A
    /// matching channel that is not a `TypeFloat` log fails with
    /// [`PetrologError::UnsupportedLogType`] before anything is written.
    ///
    /// [`PetrologConfig::depth_units`]: crate::PetrologConfig::depth_units
    pub fn convert_unit(&mut self, from: &str, to: &str, gain: f64, offset: f64) -> Result<usize> {
        let targets: Vec<usize> = self
            .log
            .channels
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, c)| c.unit == from)
            .map(|(i, _)| i)
            .collect();
        if let Some(&i) = targets
            .iter()
            .find(|&&i| self.log.channels[i].encoding != SampleEncoding::Float)
        {
            return Err(self.unsupported(i));
        }
        if targets.is_empty() {
            tracing::debug!(from, "No channels in unit; nothing to convert");
            return Ok(0);
        }

        let offsets: Vec<usize> = targets
            .iter()
            .flat_map(|&i| {
                let c = &self.log.channels[i];
                (0..c.dimension).map(move |d| RecordLayout::sample_offset(c.column_start, d))
            })
            .collect();
        self.rewrite_records(|record| {
            for &at in &offsets {
                let value = decode_sample(read_f32(record, at, Endian::Little)?);
                if !is_missing(value) {
                    write_f32(record, at, encode_sample(value * gain + offset), Endian::Little)?;
                }
            }
            Ok(())
        })?;

        for &i in &targets {
            let channel = &mut self.log.channels[i];
            channel.convert(gain, offset);
            channel.unit = to.to_string();
            let name = channel.name.clone();
            if let Some(d) = self.header.log_mut(&name) {
                d.unit = to.to_string();
            }
        }
        self.header.save(&self.paths.header)?;
        self.persist_statistics()?;

        tracing::info!(from, to, gain, offset, channels = targets.len(), "Converted units");
        Ok(targets.len())
    }

    /// Remove the named channels from the log and shrink every record.
    /// Returns the number of channels removed.
    pub fn delete_channels(&mut self, names: &[&str]) -> Result<usize> {
        self.log.check_deletable(names)?;
        let doomed: HashSet<&str> = names.iter().copied().collect();
        let spans: Vec<Range<usize>> = self
            .header
            .logs
            .iter()
            .filter(|d| doomed.contains(d.name.as_str()))
            .map(|d| RecordLayout::column_span(d.column_start, d.dimension))
            .collect();
        if spans.is_empty() {
            return Ok(0);
        }

        let old = self.layout();
        let table = build_remap_table(old.record_width, &spans);
        let new_width = table.iter().flatten().count();

        let mut header = self.header.clone();
        header.logs.retain(|d| !doomed.contains(d.name.as_str()));
        header.recompute_layout();
        // Width from the table, so columns the header never described survive.
        header.record_width = new_width;
        header.data_block_size = new_width as u64 * header.number_of_records as u64;
        tracing::debug!(
            old_width = old.record_width,
            new_width,
            spans = spans.len(),
            "Built remap table"
        );

        let preamble = Preamble::from_header(&header).to_bytes()?;
        replace_file(&self.paths.data, |w| {
            let mut reader = self.open_data()?;
            reader.seek(SeekFrom::Start(old.data_start))?;
            w.write_all(&preamble)?;
            let mut record = vec![0u8; old.record_width];
            let mut shrunk = vec![0u8; new_width];
            for _ in 0..old.records {
                if !read_record(&mut reader, &mut record)? {
                    break;
                }
                for (byte, target) in record.iter().zip(&table) {
                    if let Some(at) = target {
                        shrunk[*at] = *byte;
                    }
                }
                shrunk[..DEPTH_FIELD_WIDTH].fill(0);
                w.write_all(&shrunk)?;
            }
            Ok(())
        })?;

        header.save(&self.paths.header)?;
        self.header = header;
        let removed = self.log.delete_channels(names)?;
        self.sync_channel_layout();
        self.write_index_depths()?;
        self.persist_statistics()?;

        tracing::info!(removed, record_width = new_width, "Deleted channels");
        Ok(removed)
    }

    /// Overwrite each destination channel's columns with its source's, one
    /// `(destination, source)` pair at a time. Array logs copy as many
    /// sub-columns as both channels have.
    pub fn copy_channel_values(&mut self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut windows: Vec<(usize, usize, usize)> = Vec::new();
        for &(dest, src) in pairs {
            let d = self.log.require_channel(dest)?;
            let s = self.log.require_channel(src)?;
            if d == 0 {
                return Err(ModelError::IndexChannelProtected(dest.to_string()).into());
            }
            for i in [s, d] {
                if i == 0 || self.log.channels[i].encoding != SampleEncoding::Float {
                    return Err(self.unsupported(i));
                }
            }
            let (sc, dc) = (&self.log.channels[s], &self.log.channels[d]);
            let width = sc.dimension.min(dc.dimension) * COLUMN_WIDTH;
            windows.push((
                RecordLayout::sample_offset(sc.column_start, 0),
                RecordLayout::sample_offset(dc.column_start, 0),
                width,
            ));
        }

        self.rewrite_records(|record| {
            for &(from, to, width) in &windows {
                record.copy_within(from..from + width, to);
            }
            Ok(())
        })?;

        let loaded: Vec<bool> = self.log.channels.iter().map(|c| !c.is_empty()).collect();
        self.log.copy_channel_values(pairs)?;
        for &(dest, _) in pairs {
            let d = self.log.require_channel(dest)?;
            if loaded[d] {
                self.load_channel(d)?;
            }
        }
        self.persist_statistics()?;

        tracing::info!(pairs = pairs.len(), "Remapped channel values");
        Ok(())
    }

    /// Keep only the records whose depth lies in `[from, to]` (configured
    /// units), on disk and in memory.
    pub fn crop(&mut self, from: f64, to: f64) -> Result<()> {
        let index = self.index_samples();
        self.log.channels[0].samples = index;
        self.log.check_alignment()?;
        let range = index_range(&self.log.channels[0].samples, from, to).unwrap_or(0..0);
        let old = self.layout();

        let mut header = self.header.clone();
        header.set_depth_range(old.depth_at(range.start), range.len());
        let preamble = Preamble::from_header(&header).to_bytes()?;
        // Records follow the rebuilt preamble, whatever the old start was.
        header.data_start = preamble.len() as u64;

        replace_file(&self.paths.data, |w| {
            let mut reader = self.open_data()?;
            reader.seek(SeekFrom::Start(old.record_offset(range.start)))?;
            w.write_all(&preamble)?;
            copy_exact(&mut reader, w, range.len() as u64 * old.record_width as u64)
        })?;
        header.save(&self.paths.header)?;
        self.header = header;

        self.log.crop(from, to)?;
        self.stats_ready = false;
        self.persist_statistics()?;
        self.refresh_statistics()?;

        tracing::info!(from, to, records = range.len(), "Cropped log");
        Ok(())
    }
}
