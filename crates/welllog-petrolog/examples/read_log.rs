//! Example: Read and inspect a Petrolog log.
//!
//! Writes a small log to a temporary directory, then opens it, loads the
//! channels and prints the header, statistics and constants.

use welllog_petrolog::{PetrologConfig, PetrologLog, PetrologWriter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("demo");

    let mut writer = PetrologWriter::new(1200.0, 0.25, 8);
    writer
        .add_channel("GR", "API", "Gamma ray", 1, vec![40.0, 42.0, 55.0, f64::NAN, 61.0, 58.0, 44.0, 41.0])?
        .add_channel("RHOB", "g/cc", "Bulk density", 1, vec![2.31, 2.35, 2.4, 2.42, 2.38, 2.36, 2.33, 2.3])?;
    writer.well_header_mut().set_constant("WELL", "Demo 1");
    writer.finalize(&base)?;

    println!("=== Petrolog Log Inspector ===\n");

    let mut log = PetrologLog::open(&base, PetrologConfig::default())?;
    let h = log.header();
    println!("Header:");
    println!("  Logs:         {}", h.number_of_logs);
    println!("  Columns:      {}", h.number_of_columns);
    println!("  Records:      {}", h.number_of_records);
    println!("  Depth:        {} - {} step {}", h.depth_start, h.depth_end, h.depth_frame);
    println!("  Record width: {} bytes from byte {}", h.record_width, h.data_start);

    log.load_all()?;
    log.refresh_statistics()?;

    println!("\nChannels:");
    for channel in &log.log().channels {
        let s = &channel.stats;
        println!(
            "  {:<6} {:<5} valid {:>2} missing {:>2} min {:>8.3} max {:>8.3} avg {:>8.3}",
            channel.name, channel.unit, s.valid_count, s.missing_count, s.min, s.max, s.average
        );
    }

    println!("\nConstants:");
    for constant in &log.log().constants {
        println!("  {} = {}", constant.name, constant.value);
    }
    Ok(())
}
