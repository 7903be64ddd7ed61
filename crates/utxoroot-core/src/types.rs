//! Value types shared by the snapshot, proof and claim paths.

pub type Hash32 = [u8; 32];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Outpoint {
    pub txid: Hash32,
    pub vout: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinOutput {
    pub amount: i64,
    pub script: Vec<u8>,
}

/// All outputs of one transaction as held under a single coin key.
///
/// A `None` slot is a spent or pruned output. Slots keep their position so
/// the slot index is the output index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinRecord {
    pub txid: Hash32,
    pub height: u64,
    pub coinbase: bool,
    pub outputs: Vec<Option<CoinOutput>>,
}

impl CoinRecord {
    /// Live outputs of this record, in output-index order.
    pub fn utxos(&self) -> impl Iterator<Item = UtxoRecord> + '_ {
        self.outputs.iter().enumerate().filter_map(move |(i, slot)| {
            slot.as_ref().map(|out| UtxoRecord {
                txid: self.txid,
                vout: i as u32,
                script: out.script.clone(),
                amount: out.amount,
                height: self.height,
            })
        })
    }

    pub fn output(&self, vout: u32) -> Option<&CoinOutput> {
        self.outputs.get(vout as usize).and_then(|slot| slot.as_ref())
    }

    pub fn is_pruned(&self) -> bool {
        self.outputs.iter().all(|slot| slot.is_none())
    }
}

/// One unspent output as read from the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UtxoRecord {
    pub txid: Hash32,
    pub vout: u32,
    pub script: Vec<u8>,
    pub amount: i64,
    pub height: u64,
}

impl UtxoRecord {
    pub fn outpoint(&self) -> Outpoint {
        Outpoint {
            txid: self.txid,
            vout: self.vout,
        }
    }

    pub fn is_spendable(&self) -> bool {
        self.amount > 0
    }
}
