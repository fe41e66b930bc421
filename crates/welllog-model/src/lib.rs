//! # welllog-model
//!
//! Format-neutral entity model for well logs.
//!
//! - [`Constant`]: a named header fact or acquisition parameter
//! - [`Channel`]: a named sample sequence aligned to the index channel
//! - [`LogFile`]: the channels, constants and parameters of one log
//! - [`LogFormat`]: the operations every concrete format provides
//! - [`FormatRegistry`]: picks a format for a file by sniffing it
//! - [`LogCache`]: keeps opened logs for callers that reopen often
//!
//! ## Example
//! ```rust
//! use welllog_model::{Channel, LogFile, LogFormat};
//!
//! let mut log = LogFile::new("memory.log")
//!     .with_channel(Channel::new("DEPTH", "m").with_samples(vec![1.0, 2.0, 3.0]))
//!     .with_channel(Channel::new("GR", "API").with_samples(vec![40.0, f64::NAN, 60.0]));
//!
//! log.refresh_statistics().unwrap();
//! assert_eq!(log.channel("GR").unwrap().stats.average, 50.0);
//! ```

pub mod cache;
pub mod channel;
pub mod constant;
pub mod error;
pub mod format;
pub mod log_file;

pub use cache::LogCache;
pub use channel::{Channel, ChannelStats, SampleEncoding};
pub use constant::Constant;
pub use error::{ModelError, Result};
pub use format::{FormatRegistry, LogFormat, Sniffer};
pub use log_file::{index_range, LogFile};
