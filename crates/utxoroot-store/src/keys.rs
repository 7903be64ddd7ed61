//! Canonical byte encoding and decoding for chainstate keys and values.
//!
//! All integers are little-endian.

use utxoroot_core::constants::{
    COIN_KEY_BYTES, COIN_RECORD_TAG, MAX_OUTPUTS_PER_RECORD, MAX_SCRIPT_BYTES,
};
use utxoroot_core::{CoinOutput, CoinRecord, Hash32, Reader, encode_compact_size, read_compact_size};

const SLOT_SPENT: u8 = 0x00;
const SLOT_LIVE: u8 = 0x01;

// ---------------------------------------------------------------------------
// Coin key: tag[1] || txid[32] = 33 bytes
// ---------------------------------------------------------------------------

pub fn encode_coin_key(txid: &Hash32) -> [u8; COIN_KEY_BYTES] {
    let mut buf = [0u8; COIN_KEY_BYTES];
    buf[0] = COIN_RECORD_TAG;
    buf[1..].copy_from_slice(txid);
    buf
}

/// `None` for anything that is not a coin key: wrong length or foreign tag.
pub fn decode_coin_key(data: &[u8]) -> Option<Hash32> {
    if data.len() != COIN_KEY_BYTES || data[0] != COIN_RECORD_TAG {
        return None;
    }
    let mut txid = [0u8; 32];
    txid.copy_from_slice(&data[1..]);
    Some(txid)
}

// ---------------------------------------------------------------------------
// Coin record value: height[8] || coinbase[1] || compact_size(n) || slot*
//   slot = 0x00                                          (spent)
//        | 0x01 || amount_i64[8] || compact_size(len) || script
// ---------------------------------------------------------------------------

pub fn encode_coin_record(rec: &CoinRecord) -> Vec<u8> {
    let mut buf = Vec::with_capacity(10 + rec.outputs.len() * 16);
    buf.extend_from_slice(&rec.height.to_le_bytes());
    buf.push(if rec.coinbase { 1 } else { 0 });
    encode_compact_size(rec.outputs.len() as u64, &mut buf);
    for slot in &rec.outputs {
        match slot {
            None => buf.push(SLOT_SPENT),
            Some(out) => {
                buf.push(SLOT_LIVE);
                buf.extend_from_slice(&out.amount.to_le_bytes());
                encode_compact_size(out.script.len() as u64, &mut buf);
                buf.extend_from_slice(&out.script);
            }
        }
    }
    buf
}

pub fn decode_coin_record(txid: Hash32, data: &[u8]) -> Result<CoinRecord, String> {
    let mut r = Reader::new(data);
    let height = r.read_u64_le().map_err(|e| format!("coin height: {e}"))?;
    let coinbase = match r.read_u8().map_err(|e| format!("coin flags: {e}"))? {
        0 => false,
        1 => true,
        v => return Err(format!("coin flags: invalid coinbase byte {v}")),
    };
    let (n, _) = read_compact_size(&mut r).map_err(|e| format!("coin output count: {e}"))?;
    if n > MAX_OUTPUTS_PER_RECORD {
        return Err(format!("coin output count {n} exceeds {MAX_OUTPUTS_PER_RECORD}"));
    }

    let mut outputs = Vec::with_capacity(n as usize);
    for i in 0..n {
        let tag = r.read_u8().map_err(|e| format!("coin slot {i}: {e}"))?;
        match tag {
            SLOT_SPENT => outputs.push(None),
            SLOT_LIVE => {
                let amount = r
                    .read_i64_le()
                    .map_err(|e| format!("coin slot {i} amount: {e}"))?;
                let (len, _) = read_compact_size(&mut r)
                    .map_err(|e| format!("coin slot {i} script len: {e}"))?;
                if len > MAX_SCRIPT_BYTES {
                    return Err(format!(
                        "coin slot {i}: script length {len} exceeds {MAX_SCRIPT_BYTES}"
                    ));
                }
                let script = r
                    .read_bytes(len as usize)
                    .map_err(|e| format!("coin slot {i} script: {e}"))?
                    .to_vec();
                outputs.push(Some(CoinOutput { amount, script }));
            }
            v => return Err(format!("coin slot {i}: invalid slot tag {v}")),
        }
    }

    if r.remaining() != 0 {
        return Err(format!("coin record: {} trailing bytes", r.remaining()));
    }

    Ok(CoinRecord {
        txid,
        height,
        coinbase,
        outputs,
    })
}

// ---------------------------------------------------------------------------
// Tip height value: height[8]
// ---------------------------------------------------------------------------

pub fn encode_tip_height(height: u64) -> [u8; 8] {
    height.to_le_bytes()
}

pub fn decode_tip_height(data: &[u8]) -> Result<u64, String> {
    let bytes: [u8; 8] = data
        .try_into()
        .map_err(|_| format!("tip height: expected 8 bytes, got {}", data.len()))?;
    Ok(u64::from_le_bytes(bytes))
}
