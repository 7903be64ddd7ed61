#![no_main]

use libfuzzer_sys::fuzz_target;
use utxoroot_store::{decode_coin_record, encode_coin_record};

// Anything that decodes must re-encode to the exact input bytes.
fuzz_target!(|data: &[u8]| {
    let Ok(rec) = decode_coin_record([0x5a; 32], data) else {
        return;
    };
    let enc = encode_coin_record(&rec);
    if enc != data {
        panic!("coin record not canonical: got={enc:02x?} want={data:02x?}");
    }
});
