//! Fuzz target for IRC message decoding
//!
//! Feeds arbitrary lines to the decoder and re-encodes whatever comes out.
//! Neither step may panic, and the encoded line must respect the wire limit.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_client::message::{decode, encode, MAX_MESSAGE};
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        let decoded = decode(input);
        if let Some(message) = decoded.message {
            let encoded = encode(&message);
            assert!(encoded.line.len() <= MAX_MESSAGE + 2);
        }
    }
});
