#![no_main]

use libfuzzer_sys::fuzz_target;
use utxoroot_core::{merkle_root, prove, verify_inclusion, verify_root, HashList};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let (head, body) = data.split_at(2);
    let leaves: HashList = body
        .chunks_exact(32)
        .map(|c| {
            let mut h = [0u8; 32];
            h.copy_from_slice(c);
            h
        })
        .collect();
    let root = merkle_root(&leaves);

    if leaves.is_empty() {
        if prove(&leaves, 0).is_some() {
            panic!("proof produced for empty list");
        }
        return;
    }
    let index = head[0] as usize % leaves.len();

    let Some(path) = prove(&leaves, index) else {
        panic!("no proof for in-range index {index} of {}", leaves.len());
    };
    if Some(verify_root(&leaves[index], &path)) != root.root() {
        panic!("proof for index {index} does not reach root");
    }
    if !verify_inclusion(&leaves[index], &path, &root) {
        panic!("verify_inclusion rejected honest proof");
    }
    if prove(&leaves, leaves.len()).is_some() {
        panic!("proof produced for out-of-range index");
    }

    let mut other = leaves[index];
    other[head[1] as usize % 32] ^= 0x01;
    if leaves.len() == 1 && verify_inclusion(&other, &path, &root) {
        panic!("altered singleton leaf verified");
    }
});
