//! Fuzz target for opening a log with an arbitrary data file.
//!
//! The header and well header are valid; the fuzzer supplies the `.data`
//! bytes, so preamble validation and short records are exercised.

#![no_main]

use libfuzzer_sys::fuzz_target;
use welllog_petrolog::{PetrologConfig, PetrologLog, PetrologWriter};

fuzz_target!(|data: &[u8]| {
    let Ok(dir) = tempfile::tempdir() else {
        return;
    };
    let base = dir.path().join("fuzz");

    let mut writer = PetrologWriter::new(0.0, 1.0, 4);
    if writer
        .add_channel("A", "u", "", 2, vec![0.0; 8])
        .is_err()
        || writer.finalize(&base).is_err()
    {
        return;
    }
    if std::fs::write(base.with_extension("data"), data).is_err() {
        return;
    }

    let config = PetrologConfig::default().with_statistics_cache(false);
    if let Ok(mut log) = PetrologLog::open(&base, config) {
        let _ = log.load_all();
        let _ = log.refresh_statistics();
    }
});
