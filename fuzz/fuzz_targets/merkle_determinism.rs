#![no_main]

use libfuzzer_sys::fuzz_target;
use utxoroot_core::{merkle_root, Hash32, HashList};

fn leaves_from(data: &[u8]) -> Vec<Hash32> {
    data.chunks_exact(32)
        .map(|c| {
            let mut h = [0u8; 32];
            h.copy_from_slice(c);
            h
        })
        .collect()
}

// Root must not depend on input order.
fuzz_target!(|data: &[u8]| {
    let forward = leaves_from(data);
    let mut rotated = forward.clone();
    if !rotated.is_empty() {
        let k = data[0] as usize % rotated.len();
        rotated.rotate_left(k);
    }
    rotated.reverse();

    let n = forward.len();
    let a = merkle_root(&HashList::from_unsorted(forward));
    let b = merkle_root(&HashList::from_unsorted(rotated));
    if a != b {
        panic!("root depends on input order: {a:02x?} != {b:02x?}");
    }
    if a.is_empty() != (n == 0) {
        panic!("empty root for {n} leaves");
    }
});
