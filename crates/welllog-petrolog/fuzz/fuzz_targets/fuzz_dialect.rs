//! Fuzz target for the tag-document parser and the documents built on it.

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use welllog_petrolog::{dialect, PetrologHeader, WellHeader};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Should never panic, only return errors
    if let Ok(root) = dialect::parse(text) {
        let reparsed = dialect::parse(&root.to_document());
        assert!(reparsed.is_ok(), "serialised document failed to parse");
    }
    let _ = PetrologHeader::parse(text, Path::new("fuzz.header"));
    if let Ok(well) = WellHeader::parse(text) {
        let _ = well.flatten();
    }
});
