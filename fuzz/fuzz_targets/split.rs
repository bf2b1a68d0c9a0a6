#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    jtr_replay::fuzz_split_bytes(data);
});
