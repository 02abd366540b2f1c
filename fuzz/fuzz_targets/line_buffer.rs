//! Fuzz target for the receive line buffer
//!
//! Splits arbitrary bytes into chunks at fuzzer-chosen points and checks that
//! no line handed out still carries a line feed.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_client::line::LineBuffer;

fuzz_target!(|data: &[u8]| {
    let Some((&split, bytes)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(split).max(1);

    let Ok(mut buffer) = LineBuffer::new("utf-8") else {
        return;
    };
    for part in bytes.chunks(chunk) {
        buffer.extend(part);
        while let Some(line) = buffer.take_line() {
            assert!(!line.contains('\n'));
        }
    }
    let _ = buffer.take_rest();
});
