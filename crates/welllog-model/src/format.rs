//! The capability interface every log format implements, and the registry
//! that picks a format for a file by sniffing it.

use std::path::Path;

use crate::error::{ModelError, Result};
use crate::log_file::LogFile;

/// Operations shared by every log format.
///
/// The default methods act on the in-memory [`LogFile`] only. Formats with
/// an on-disk representation override them to keep the file in step.
pub trait LogFormat {
    /// Human-readable format name.
    fn format_name(&self) -> &'static str;

    fn log(&self) -> &LogFile;

    fn log_mut(&mut self) -> &mut LogFile;

    /// Populate the samples of channel `index`. In-memory logs are always loaded.
    fn load_channel(&mut self, index: usize) -> Result<()> {
        let count = self.log().channels.len();
        if index >= count {
            return Err(ModelError::ChannelIndexOutOfRange { index, count });
        }
        Ok(())
    }

    /// Load every channel.
    fn load_all(&mut self) -> Result<()> {
        for index in 0..self.log().channels.len() {
            self.load_channel(index)?;
        }
        Ok(())
    }

    /// Drop the samples of channel `index`, keeping its metadata.
    fn clear_channel(&mut self, index: usize) {
        if let Some(channel) = self.log_mut().channels.get_mut(index) {
            channel.clear();
        }
    }

    /// Write channel `index`'s samples back to storage.
    fn save_channel(&mut self, index: usize) -> Result<()> {
        self.load_channel(index)
    }

    /// Save every loaded channel.
    fn save(&mut self) -> Result<()> {
        for index in 0..self.log().channels.len() {
            if !self.log().channels[index].is_empty() {
                self.save_channel(index)?;
            }
        }
        Ok(())
    }

    fn refresh_statistics(&mut self) -> Result<()> {
        self.log_mut().compute_statistics();
        Ok(())
    }

    fn convert_unit(&mut self, from: &str, to: &str, gain: f64, offset: f64) -> Result<usize> {
        Ok(self.log_mut().convert_unit(from, to, gain, offset))
    }

    fn crop(&mut self, from: f64, to: f64) -> Result<()> {
        self.log_mut().crop(from, to)
    }

    fn delete_channels(&mut self, names: &[&str]) -> Result<usize> {
        self.log_mut().delete_channels(names)
    }

    fn copy_channel_values(&mut self, pairs: &[(&str, &str)]) -> Result<()> {
        self.log_mut().copy_channel_values(pairs)
    }
}

impl LogFormat for LogFile {
    fn format_name(&self) -> &'static str {
        "memory"
    }

    fn log(&self) -> &LogFile {
        self
    }

    fn log_mut(&mut self) -> &mut LogFile {
        self
    }
}

/// Inspect `path` and, if the format recognises it, open it.
///
/// `None` means "not mine"; `Some(Err(..))` means the file was recognised
/// but failed to open.
pub type Sniffer = fn(&Path) -> Option<Result<Box<dyn LogFormat>>>;

/// Ordered list of format sniffers; the first sniffer to claim a file wins.
#[derive(Default)]
pub struct FormatRegistry {
    sniffers: Vec<(&'static str, Sniffer)>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, sniffer: Sniffer) -> &mut Self {
        self.sniffers.push((name, sniffer));
        self
    }

    /// Names of the registered formats, in sniffing order.
    pub fn formats(&self) -> Vec<&'static str> {
        self.sniffers.iter().map(|(name, _)| *name).collect()
    }

    /// Open `path` with the first format that claims it.
    ///
    /// Formats made of several files may claim a base path that does not
    /// exist itself, so existence is only checked once every sniffer passed.
    pub fn open(&self, path: &Path) -> Result<Box<dyn LogFormat>> {
        for (name, sniffer) in &self.sniffers {
            if let Some(result) = sniffer(path) {
                tracing::debug!(format = name, path = %path.display(), "Format claimed file");
                return result;
            }
        }

        if !path.exists() {
            return Err(ModelError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(ModelError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}
