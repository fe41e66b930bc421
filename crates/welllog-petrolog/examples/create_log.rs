//! Example: Create a Petrolog log with synthetic curves.
//!
//! Writes a gamma-ray curve, a resistivity curve with a gap and a
//! four-column array log, plus a small well header.

use welllog_petrolog::{PetrologWriter, WellHeader};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let start = 5000.0;
    let step = 0.5;
    let records = 400usize;

    let gamma: Vec<f64> = (0..records)
        .map(|k| 60.0 + 25.0 * (k as f64 / 20.0).sin())
        .collect();
    // Resistivity is missing over the first 40 records (casing).
    let resistivity: Vec<f64> = (0..records)
        .map(|k| if k < 40 { f64::NAN } else { 2.0 + (k % 50) as f64 * 0.1 })
        .collect();
    let array: Vec<f64> = (0..records * 4).map(|i| (i % 4) as f64 * 10.0).collect();

    let mut well = WellHeader::new();
    well.set_constant("COMP", "Example Operating Co");
    well.set_constant("WELL", "Example 1");
    well.set_constant("R1", "Synthetic data");
    well.set_constant("Run_1_BS", "8.5");

    let mut writer = PetrologWriter::new(start, step, records);
    writer
        .add_channel("GR", "API", "Gamma ray", 1, gamma)?
        .add_channel("ILD", "ohmm", "Deep induction", 1, resistivity)?
        .add_channel("ARRAY", "mV", "Array tool", 4, array)?
        .set_well_header(well);

    let paths = writer.finalize("example_well")?;

    let header = writer.header();
    println!("Created: {}", paths.base.display());
    println!("  Records:      {}", header.number_of_records);
    println!("  Depth:        {} - {} ft", header.depth_start, header.depth_end);
    println!("  Record width: {} bytes", header.record_width);
    println!("  Data file:    {}", paths.data.display());
    Ok(())
}
