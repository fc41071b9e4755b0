#![no_main]

use letlower::CompilationUnit;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process valid UTF-8
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Limit input size to avoid timeout
    if source.len() > 100_000 {
        return;
    }

    let Ok(unit) = CompilationUnit::from_json(source) else {
        return;
    };

    // Lowering should return Ok or Err, never panic
    let _ = unit.compile();
});
