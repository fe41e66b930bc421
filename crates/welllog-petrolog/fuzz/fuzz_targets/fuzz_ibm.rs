//! Fuzz target for the IBM mainframe float codec.
//!
//! Decoding any word must not panic, and re-encoding a decoded normal
//! value must decode to the same value.

#![no_main]

use libfuzzer_sys::fuzz_target;
use welllog_codec::{ibm_to_ieee, ieee_to_ibm, read_ibm_f32, write_ibm_f32, Endian};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let word = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let value = ibm_to_ieee(word);
    if value.is_normal() {
        assert_eq!(ibm_to_ieee(ieee_to_ibm(value)), value);
    }

    let mut window = data.to_vec();
    for endian in [Endian::Big, Endian::Little] {
        if let Ok(v) = read_ibm_f32(&window, 0, endian) {
            let _ = write_ibm_f32(&mut window, data.len() % 4, v, endian);
        }
    }
});
