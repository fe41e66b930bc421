//! Petrolog log reader: opens the three member files, exposes the channels
//! through the entity model and reads or writes samples record by record.
//!
//! No file handle outlives a call. Each operation opens what it needs and
//! the handle closes when it goes out of scope.
//!
//! # Example
//!
//! ```rust,no_run
//! use welllog_petrolog::{PetrologConfig, PetrologLog};
//!
//! let mut log = PetrologLog::open("logs/well_a", PetrologConfig::default()).unwrap();
//! log.load_channel(1).unwrap();
//! let gr = &log.log().channels[1];
//! println!("{} has {} samples", gr.name, gr.len());
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use welllog_codec::{decode_sample, encode_sample, is_missing, read_f32, read_f64, Endian};
use welllog_model::{
    Channel, ChannelStats, FormatRegistry, LogFile, LogFormat, ModelError, SampleEncoding,
};

use crate::config::PetrologConfig;
use crate::dialect;
use crate::error::{PetrologError, Result};
use crate::header::{LogDescriptor, PetrologHeader, HEADER_ROOT};
use crate::layout::{generate_index, RecordLayout, DEPTH_FIELD_WIDTH};
use crate::paths::LogPaths;
use crate::preamble::Preamble;
use crate::stats_cache::{StatisticsCache, StatisticsEntry};
use crate::well_header::WellHeader;

/// Name of the synthesized index channel.
pub const INDEX_CHANNEL: &str = "DEPTH";

/// Name under which the format registers with a [`FormatRegistry`].
pub const FORMAT_NAME: &str = "petrolog";

/// An opened Petrolog log.
///
/// Channel 0 is the depth index, generated from the header's depth range
/// rather than read from disk. Channels 1.. follow the header's log
/// descriptors in order.
pub struct PetrologLog {
    pub(crate) paths: LogPaths,
    pub(crate) header: PetrologHeader,
    pub(crate) well_header: WellHeader,
    pub(crate) log: LogFile,
    pub(crate) config: PetrologConfig,
    /// Channel statistics are current (scanned or loaded from the side-car).
    pub(crate) stats_ready: bool,
}

impl PetrologLog {
    /// Open the log that `path` belongs to: the base path or any member file.
    ///
    /// # Errors
    ///
    /// [`PetrologError::NotFound`] if any of the header, well-header or data
    /// files is missing, [`PetrologError::MalformedHeader`] if a document
    /// lacks a required field.
    pub fn open(path: impl AsRef<Path>, config: PetrologConfig) -> Result<Self> {
        let paths = LogPaths::new(path.as_ref());
        tracing::info!(path = %paths.base.display(), "Opening Petrolog log");

        let header = PetrologHeader::load(&paths.header)?;
        if !paths.data.exists() {
            return Err(PetrologError::NotFound { path: paths.data });
        }
        let well_header = WellHeader::load(&paths.well_header)?;
        check_data_file(&paths.data, &header)?;

        let mut log = LogFile::new(&paths.base);
        log.channels = build_channels(&header, &config);
        log.constants = well_header.flatten();

        let mut this = Self {
            paths,
            header,
            well_header,
            log,
            config,
            stats_ready: false,
        };
        if this.config.use_statistics_cache {
            this.apply_cached_statistics();
        }

        tracing::info!(
            records = this.header.number_of_records,
            channels = this.log.channels.len(),
            record_width = this.header.record_width,
            "Parsed Petrolog header"
        );
        Ok(this)
    }

    pub fn log(&self) -> &LogFile {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut LogFile {
        &mut self.log
    }

    pub fn header(&self) -> &PetrologHeader {
        &self.header
    }

    pub fn well_header(&self) -> &WellHeader {
        &self.well_header
    }

    pub fn well_header_mut(&mut self) -> &mut WellHeader {
        &mut self.well_header
    }

    pub fn paths(&self) -> &LogPaths {
        &self.paths
    }

    pub fn config(&self) -> &PetrologConfig {
        &self.config
    }

    /// Record addressing in stored (feet) depths.
    pub fn layout(&self) -> RecordLayout {
        self.header.record_layout()
    }

    /// Byte offset of the record at `depth`, given in the configured units.
    pub fn position(&self, depth: f64) -> Option<u64> {
        self.layout().position(depth / self.config.depth_units.factor())
    }

    /// The generated index, in the configured units, one value per record.
    pub fn index_samples(&self) -> Vec<f64> {
        let factor = self.config.depth_units.factor();
        let h = &self.header;
        let mut index = generate_index(
            h.depth_start * factor,
            h.depth_frame * factor,
            h.depth_end * factor,
            self.config.index_iteration_limit,
        );
        index.truncate(h.number_of_records);
        index
    }

    /// Populate channel `index`. Channel 0 is generated, a `TypeDouble` log
    /// reads the depth field and a `TypeFloat` log reads its first column.
    pub fn load_channel(&mut self, index: usize) -> Result<()> {
        let channel = self.channel_at(index)?;
        let samples = if index == 0 {
            self.index_samples()
        } else {
            match channel.encoding {
                SampleEncoding::Double => self.read_depths()?,
                SampleEncoding::Float => self.read_column(index, 0)?,
                SampleEncoding::None => {
                    tracing::warn!(
                        channel = %channel.name,
                        "Log type has no sample layout; loading as missing"
                    );
                    vec![f64::NAN; self.header.number_of_records]
                }
            }
        };

        tracing::debug!(channel = %self.log.channels[index].name, samples = samples.len(), "Loaded channel");
        self.log.channels[index].samples = samples;
        Ok(())
    }

    /// Load every channel.
    pub fn load_all(&mut self) -> Result<()> {
        for index in 0..self.log.channels.len() {
            self.load_channel(index)?;
        }
        Ok(())
    }

    /// Read sub-column `sub_index` of channel `index` (an array log has
    /// `dimension` sub-columns).
    pub fn read_column(&self, index: usize, sub_index: usize) -> Result<Vec<f64>> {
        let offset = self.sample_offset(index, sub_index)?;
        let layout = self.layout();
        let mut reader = self.open_records()?;
        let mut record = vec![0u8; layout.record_width];
        let mut samples = Vec::with_capacity(layout.records);

        for k in 0..layout.records {
            if !read_record(&mut reader, &mut record)? {
                tracing::debug!(record = k, "Short record ends column read");
                break;
            }
            samples.push(decode_sample(read_f32(&record, offset, Endian::Little)?));
        }
        Ok(samples)
    }

    /// The depth field of every record, as stored (feet).
    pub fn read_depths(&self) -> Result<Vec<f64>> {
        let layout = self.layout();
        let skip = (layout.record_width - DEPTH_FIELD_WIDTH) as i64;
        let mut reader = self.open_records()?;
        let mut depths = Vec::with_capacity(layout.records);

        for _ in 0..layout.records {
            match reader.read_f64::<LittleEndian>() {
                Ok(depth) => depths.push(depth),
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            reader.seek_relative(skip)?;
        }
        Ok(depths)
    }

    /// Write channel `index`'s loaded samples back to the data file.
    ///
    /// Channel 0 rewrites every record's depth field. Nothing is written for
    /// a channel whose samples are not loaded.
    pub fn save_channel(&mut self, index: usize) -> Result<()> {
        let channel = self.channel_at(index)?;
        if channel.is_empty() {
            tracing::debug!(channel = %channel.name, "Channel not loaded; nothing to save");
            return Ok(());
        }
        let records = self.header.number_of_records;
        if channel.len() != records {
            return Err(ModelError::LengthMismatch {
                name: channel.name.clone(),
                expected: records,
                actual: channel.len(),
            }
            .into());
        }

        match (index, channel.encoding) {
            (0, _) => {
                let factor = self.config.depth_units.factor();
                let depths: Vec<f64> = channel.samples.iter().map(|d| d / factor).collect();
                self.write_depths(&depths)
            }
            (_, SampleEncoding::Double) => self.write_depths(&channel.samples),
            (_, SampleEncoding::Float) => self.write_column(index, 0, &channel.samples),
            (_, SampleEncoding::None) => Err(self.unsupported(index)),
        }
    }

    /// Write `values` into sub-column `sub_index` of channel `index`,
    /// one seek per record.
    pub fn write_column(&self, index: usize, sub_index: usize, values: &[f64]) -> Result<()> {
        let offset = self.sample_offset(index, sub_index)? as u64;
        let layout = self.layout();
        let mut writer = BufWriter::new(self.open_for_update()?);
        for (record, &value) in values.iter().enumerate().take(layout.records) {
            writer.seek(SeekFrom::Start(layout.record_offset(record) + offset))?;
            writer.write_f32::<LittleEndian>(encode_sample(value))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Overwrite the depth field of the first `depths.len()` records.
    pub fn write_depths(&self, depths: &[f64]) -> Result<()> {
        let layout = self.layout();
        let mut writer = BufWriter::new(self.open_for_update()?);
        for (record, &depth) in depths.iter().enumerate().take(layout.records) {
            writer.seek(SeekFrom::Start(layout.record_offset(record)))?;
            writer.write_f64::<LittleEndian>(depth)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Recompute the depth field of every record from the header.
    pub(crate) fn write_index_depths(&self) -> Result<()> {
        let layout = self.layout();
        let depths: Vec<f64> = (0..layout.records).map(|k| layout.depth_at(k)).collect();
        self.write_depths(&depths)
    }

    /// Fill every channel's statistics, from the side-car when it matches
    /// the channel set and from a full scan otherwise. A scan result is
    /// written back to the side-car.
    pub fn refresh_statistics(&mut self) -> Result<()> {
        let index = self.index_samples();
        let mut depth = Channel::default().with_samples(index);
        depth.compute_statistics(&depth.samples.clone());
        self.log.channels[0].stats = depth.stats;

        if self.config.use_statistics_cache && self.apply_cached_statistics() {
            return Ok(());
        }

        let stats = self.scan_statistics(&depth.samples)?;
        for (channel, stats) in self.log.channels.iter_mut().skip(1).zip(stats) {
            channel.stats = stats;
        }
        self.stats_ready = true;
        if self.config.use_statistics_cache {
            self.persist_statistics()?;
        }
        Ok(())
    }

    /// One pass over every record. Each channel accumulates the values its
    /// loaded samples hold: the first sub-column of a `Float` log and the
    /// depth field of a `Double` log. `index` supplies the depth of each
    /// record.
    pub fn scan_statistics(&self, index: &[f64]) -> Result<Vec<ChannelStats>> {
        let layout = self.layout();
        let columns: Vec<(SampleEncoding, usize)> = self
            .log
            .channels
            .iter()
            .skip(1)
            .map(|c| (c.encoding, RecordLayout::sample_offset(c.column_start, 0)))
            .collect();
        let mut accumulators = vec![Accumulator::default(); columns.len()];

        let mut reader = self.open_records()?;
        let mut record = vec![0u8; layout.record_width];
        let mut scanned = 0;
        for k in 0..layout.records {
            if !read_record(&mut reader, &mut record)? {
                break;
            }
            for (acc, &(encoding, offset)) in accumulators.iter_mut().zip(&columns) {
                match encoding {
                    SampleEncoding::Double => acc.push(k, read_f64(&record, 0, Endian::Little)?),
                    SampleEncoding::Float => {
                        acc.push(k, decode_sample(read_f32(&record, offset, Endian::Little)?))
                    }
                    SampleEncoding::None => acc.missing += 1,
                }
            }
            scanned += 1;
        }

        tracing::debug!(records = scanned, channels = columns.len(), "Scanned statistics");
        Ok(accumulators.into_iter().map(|a| a.finish(index)).collect())
    }

    /// Apply the side-car if it matches the channel set.
    pub(crate) fn apply_cached_statistics(&mut self) -> bool {
        let Some(entries) = StatisticsCache::load(&self.paths.statistics, &self.log.channels[1..])
        else {
            return false;
        };
        for (channel, entry) in self.log.channels.iter_mut().skip(1).zip(&entries) {
            entry.apply_to(channel);
        }
        self.stats_ready = true;
        true
    }

    /// Bring the side-car in line with memory after a change: rewrite it
    /// when statistics are current, delete it otherwise.
    pub(crate) fn persist_statistics(&self) -> Result<()> {
        if self.stats_ready && self.config.use_statistics_cache {
            let entries: Vec<StatisticsEntry> = self.log.channels[1..]
                .iter()
                .map(StatisticsEntry::from_channel)
                .collect();
            StatisticsCache::save(&self.paths.statistics, &entries)
        } else {
            StatisticsCache::invalidate(&self.paths.statistics)
        }
    }

    /// Assign a well-header constant (honouring `Run_<n>_`) and mirror it
    /// into the log's constants. Call [`save_well_header`](Self::save_well_header)
    /// to persist it.
    pub fn set_well_constant(&mut self, name: &str, value: &str) {
        self.well_header.set_constant(name, value);
        self.log.constants = self.well_header.flatten();
    }

    /// Write the well header, first folding in any constants set through
    /// the log.
    pub fn save_well_header(&mut self) -> Result<()> {
        for constant in &self.log.constants {
            self.well_header.set_constant(&constant.name, &constant.value);
        }
        self.well_header.save(&self.paths.well_header)?;
        self.log.constants = self.well_header.flatten();
        tracing::info!(path = %self.paths.well_header.display(), "Saved well header");
        Ok(())
    }

    /// Copy descriptor layout fields onto the matching channels.
    pub(crate) fn sync_channel_layout(&mut self) {
        for channel in self.log.channels.iter_mut().skip(1) {
            if let Some(d) = self.header.log(&channel.name) {
                channel.column = d.column;
                channel.log_number = d.number;
                channel.column_start = d.column_start;
                channel.dimension = d.dimension;
            }
        }
    }

    pub(crate) fn channel_at(&self, index: usize) -> Result<&Channel> {
        let count = self.log.channels.len();
        self.log
            .channels
            .get(index)
            .ok_or(PetrologError::Model(ModelError::ChannelIndexOutOfRange { index, count }))
    }

    fn descriptor(&self, index: usize) -> Option<&LogDescriptor> {
        index.checked_sub(1).and_then(|i| self.header.logs.get(i))
    }

    /// Error for a channel without an addressable `f32` column.
    pub(crate) fn unsupported(&self, index: usize) -> PetrologError {
        let channel = &self.log.channels[index];
        PetrologError::UnsupportedLogType {
            name: channel.name.clone(),
            log_type: self
                .descriptor(index)
                .map(|d| d.log_type.clone())
                .unwrap_or_else(|| channel.encoding.tag().to_string()),
        }
    }

    /// Byte offset of a stored sub-column, validating channel and sub-index.
    pub(crate) fn sample_offset(&self, index: usize, sub_index: usize) -> Result<usize> {
        let channel = self.channel_at(index)?;
        if index == 0 || channel.encoding != SampleEncoding::Float {
            return Err(self.unsupported(index));
        }
        if sub_index >= channel.dimension {
            return Err(PetrologError::SubColumnOutOfRange {
                name: channel.name.clone(),
                sub_index,
                dimension: channel.dimension,
            });
        }
        Ok(RecordLayout::sample_offset(channel.column_start, sub_index))
    }

    pub(crate) fn open_data(&self) -> Result<BufReader<File>> {
        if !self.paths.data.exists() {
            return Err(PetrologError::NotFound {
                path: self.paths.data.clone(),
            });
        }
        Ok(BufReader::new(File::open(&self.paths.data)?))
    }

    /// Data file positioned at the first record.
    fn open_records(&self) -> Result<BufReader<File>> {
        let mut reader = self.open_data()?;
        reader.seek(SeekFrom::Start(self.header.data_start))?;
        Ok(reader)
    }

    fn open_for_update(&self) -> Result<File> {
        if !self.paths.data.exists() {
            return Err(PetrologError::NotFound {
                path: self.paths.data.clone(),
            });
        }
        Ok(OpenOptions::new().read(true).write(true).open(&self.paths.data)?)
    }
}

impl LogFormat for PetrologLog {
    fn format_name(&self) -> &'static str {
        FORMAT_NAME
    }

    fn log(&self) -> &LogFile {
        &self.log
    }

    fn log_mut(&mut self) -> &mut LogFile {
        &mut self.log
    }

    fn load_channel(&mut self, index: usize) -> welllog_model::Result<()> {
        Ok(PetrologLog::load_channel(self, index)?)
    }

    fn save_channel(&mut self, index: usize) -> welllog_model::Result<()> {
        Ok(PetrologLog::save_channel(self, index)?)
    }

    fn save(&mut self) -> welllog_model::Result<()> {
        for index in 0..self.log.channels.len() {
            if self.log.channels[index].encoding != SampleEncoding::None {
                PetrologLog::save_channel(self, index)?;
            }
        }
        Ok(self.save_well_header()?)
    }

    fn refresh_statistics(&mut self) -> welllog_model::Result<()> {
        Ok(PetrologLog::refresh_statistics(self)?)
    }

    /// Unlike the in-memory default, the index channel is left alone and a
    /// matching non-`TypeFloat` channel is an error. See
    /// [`PetrologLog::convert_unit`].
    fn convert_unit(&mut self, from: &str, to: &str, gain: f64, offset: f64) -> welllog_model::Result<usize> {
        Ok(PetrologLog::convert_unit(self, from, to, gain, offset)?)
    }

    fn crop(&mut self, from: f64, to: f64) -> welllog_model::Result<()> {
        Ok(PetrologLog::crop(self, from, to)?)
    }

    fn delete_channels(&mut self, names: &[&str]) -> welllog_model::Result<usize> {
        Ok(PetrologLog::delete_channels(self, names)?)
    }

    fn copy_channel_values(&mut self, pairs: &[(&str, &str)]) -> welllog_model::Result<()> {
        Ok(PetrologLog::copy_channel_values(self, pairs)?)
    }
}

/// Claim `path` when it belongs to a log whose header document has a
/// `PetrologHeader` root.
pub fn sniff(path: &Path) -> Option<welllog_model::Result<Box<dyn LogFormat>>> {
    let paths = LogPaths::new(path);
    let text = std::fs::read_to_string(&paths.header).ok()?;
    let root = dialect::parse(&text).ok()?;
    if root.name != HEADER_ROOT {
        return None;
    }
    Some(
        PetrologLog::open(path, PetrologConfig::default())
            .map(|log| Box::new(log) as Box<dyn LogFormat>)
            .map_err(ModelError::from),
    )
}

/// Add the Petrolog sniffer to `registry`.
pub fn register(registry: &mut FormatRegistry) -> &mut FormatRegistry {
    registry.register(FORMAT_NAME, sniff)
}

fn build_channels(header: &PetrologHeader, config: &PetrologConfig) -> Vec<Channel> {
    let mut index = Channel::new(INDEX_CHANNEL, config.depth_units.unit())
        .with_description("Depth")
        .with_encoding(SampleEncoding::Double);
    index.decimals = 2;

    let mut channels = vec![index];
    for d in &header.logs {
        let mut channel = Channel::new(d.name.as_str(), d.unit.as_str())
            .with_description(d.description.as_str())
            .with_encoding(d.encoding());
        channel.column = d.column;
        channel.log_number = d.number;
        channel.column_start = d.column_start;
        channel.dimension = d.dimension;
        if !d.tool.is_empty() {
            channel.set_parameter("LogTool", &d.tool);
        }
        if channel.encoding == SampleEncoding::None {
            tracing::warn!(channel = %d.name, log_type = %d.log_type, "Unknown log type");
        }
        channels.push(channel);
    }
    channels
}

/// Reject data files too short to hold the preamble and warn about a
/// preamble that disagrees with the header.
fn check_data_file(path: &Path, header: &PetrologHeader) -> Result<()> {
    let len = std::fs::metadata(path)?.len();
    if len < header.data_start {
        return Err(PetrologError::InvalidPreamble {
            path: path.to_path_buf(),
            reason: format!("{len} bytes, header expects records from byte {}", header.data_start),
        });
    }
    let expected = header.data_start + header.record_layout().data_block_size();
    if len < expected {
        tracing::warn!(path = %path.display(), len, expected, "Data file shorter than the header implies");
    }
    match Preamble::load(path) {
        Ok(p) if p.record_width as usize != header.record_width => {
            tracing::warn!(
                path = %path.display(),
                preamble = p.record_width,
                header = header.record_width,
                "Preamble record width disagrees with the header"
            );
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Unreadable data preamble"),
    }
    Ok(())
}

/// Read up to `buf.len()` bytes, stopping early only at end of file.
/// Returns the number of bytes read.
pub(crate) fn fill_record<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Read one whole record. `false` means the data ended first.
pub(crate) fn read_record<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    Ok(fill_record(reader, buf)? == buf.len())
}

#[derive(Debug, Clone, Default)]
struct Accumulator {
    valid: usize,
    missing: usize,
    sum: f64,
    min: f64,
    max: f64,
    first: Option<usize>,
    last: Option<usize>,
}

impl Accumulator {
    fn push(&mut self, record: usize, value: f64) {
        if is_missing(value) {
            self.missing += 1;
            return;
        }
        if self.valid == 0 {
            self.min = value;
            self.max = value;
            self.first = Some(record);
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.last = Some(record);
        self.valid += 1;
        self.sum += value;
    }

    fn finish(self, index: &[f64]) -> ChannelStats {
        let at = |i: Option<usize>| i.and_then(|i| index.get(i)).copied().unwrap_or(f64::NAN);
        let (min, max, average) = if self.valid > 0 {
            (self.min, self.max, self.sum / self.valid as f64)
        } else {
            (f64::NAN, f64::NAN, f64::NAN)
        };
        ChannelStats {
            valid_count: self.valid,
            missing_count: self.missing,
            data_start_index: self.first,
            data_end_index: self.last,
            data_start_value: at(self.first),
            data_end_value: at(self.last),
            min,
            max,
            average,
        }
    }
}
