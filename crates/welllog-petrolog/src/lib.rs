//! # welllog-petrolog
//!
//! Reader, writer and in-place rewriter for Petrolog fixed-record binary
//! well logs.
//!
//! ## Format Overview
//!
//! A log is three files sharing a base name:
//! - **`<base>.header`**: tag document with the record layout, depth range
//!   and one descriptor per stored log
//! - **`<base>.wellheader`**: tag document with descriptive constants
//! - **`<base>.data`**: binary preamble, then fixed-width records, each a
//!   little-endian `f64` depth followed by `f32` sample columns
//!
//! A `<base>.statistics` side-car caches per-channel statistics.
//!
//! ## Example
//! ```rust,no_run
//! use welllog_petrolog::{PetrologConfig, PetrologLog, PetrologWriter};
//!
//! // Writing
//! let mut writer = PetrologWriter::new(1000.0, 0.5, 2);
//! writer.add_channel("GR", "API", "Gamma ray", 1, vec![41.0, 43.5]).unwrap();
//! writer.finalize("well_a").unwrap();
//!
//! // Reading
//! let mut log = PetrologLog::open("well_a", PetrologConfig::default()).unwrap();
//! log.refresh_statistics().unwrap();
//! println!("{:?}", log.log().channels[1].stats);
//! ```

pub mod config;
pub mod dialect;
pub mod error;
pub mod header;
pub mod layout;
pub mod log;
pub mod paths;
pub mod preamble;
pub mod rewrite;
pub mod stats_cache;
pub mod well_header;
pub mod writer;

pub use config::{DepthUnits, PetrologConfig};
pub use error::{PetrologError, Result};
pub use header::{LogDescriptor, PetrologHeader};
pub use layout::{generate_index, RecordLayout};
pub use log::{register, sniff, PetrologLog, INDEX_CHANNEL};
pub use paths::LogPaths;
pub use preamble::Preamble;
pub use rewrite::build_remap_table;
pub use stats_cache::{StatisticsCache, StatisticsEntry};
pub use well_header::WellHeader;
pub use writer::PetrologWriter;
