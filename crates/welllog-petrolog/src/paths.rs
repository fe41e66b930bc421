//! The files that make up one log, all named after a common base path.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const HEADER_EXTENSION: &str = "header";
pub const WELL_HEADER_EXTENSION: &str = "wellheader";
pub const DATA_EXTENSION: &str = "data";
pub const STATISTICS_EXTENSION: &str = "statistics";

const KNOWN_EXTENSIONS: [&str; 4] = [
    HEADER_EXTENSION,
    WELL_HEADER_EXTENSION,
    DATA_EXTENSION,
    STATISTICS_EXTENSION,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    pub base: PathBuf,
    pub header: PathBuf,
    pub well_header: PathBuf,
    pub data: PathBuf,
    pub statistics: PathBuf,
}

impl LogPaths {
    /// Paths for the log that `path` belongs to. `path` may be the base
    /// itself or any of the member files.
    pub fn new(path: &Path) -> Self {
        let base = base_of(path);
        Self {
            header: with_suffix(&base, HEADER_EXTENSION),
            well_header: with_suffix(&base, WELL_HEADER_EXTENSION),
            data: with_suffix(&base, DATA_EXTENSION),
            statistics: with_suffix(&base, STATISTICS_EXTENSION),
            base,
        }
    }
}

fn base_of(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if KNOWN_EXTENSIONS.contains(&ext) => path.with_extension(""),
        _ => path.to_path_buf(),
    }
}

/// `base` plus `.ext`, keeping any dots already in the base name.
fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_files_share_a_base() {
        for path in ["logs/w1", "logs/w1.header", "logs/w1.data", "logs/w1.statistics"] {
            let paths = LogPaths::new(Path::new(path));
            assert_eq!(paths.base, Path::new("logs/w1"));
            assert_eq!(paths.header, Path::new("logs/w1.header"));
            assert_eq!(paths.well_header, Path::new("logs/w1.wellheader"));
            assert_eq!(paths.data, Path::new("logs/w1.data"));
        }
    }

    #[test]
    fn test_dotted_base_names() {
        let paths = LogPaths::new(Path::new("run.v2"));
        assert_eq!(paths.base, Path::new("run.v2"));
        assert_eq!(paths.data, Path::new("run.v2.data"));
        let paths = LogPaths::new(Path::new("run.v2.header"));
        assert_eq!(paths.base, Path::new("run.v2"));
    }
}
