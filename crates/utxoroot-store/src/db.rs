//! redb-backed chainstate for snapshotting.
//!
//! A single `chainstate` table holds every record kind, keyed by a one-byte
//! tag. Coin records live under `'c' || txid`; anything else (the tip height
//! record, or foreign record kinds) shares the keyspace and is skipped by
//! coin scans.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use tracing::debug;
use utxoroot_core::constants::TIP_HEIGHT_KEY;
use utxoroot_core::{CoinRecord, Hash32, Outpoint, SnapshotError, SnapshotWindow, UtxoSource};

use crate::keys::{
    decode_coin_key, decode_coin_record, decode_tip_height, encode_coin_key, encode_coin_record,
    encode_tip_height,
};

const CHAINSTATE_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("chainstate");

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct Store {
    db: Database,
}

impl Store {
    /// Open (or create) a redb database at `path`.
    pub fn open(path: &Path) -> Result<Self, String> {
        let db = Database::create(path).map_err(|e| format!("redb open: {e}"))?;
        let tx = db
            .begin_write()
            .map_err(|e| format!("redb begin_write: {e}"))?;
        tx.open_table(CHAINSTATE_TABLE)
            .map_err(|e| format!("create chainstate table: {e}"))?;
        tx.commit().map_err(|e| format!("redb commit: {e}"))?;
        Ok(Self { db })
    }

    /// Open a database that must already exist. Read-only callers use this so
    /// a mistyped path fails instead of yielding an empty chainstate.
    pub fn open_existing(path: &Path) -> Result<Self, String> {
        if !path.is_file() {
            return Err(format!("store not found: {}", path.display()));
        }
        Self::open(path)
    }

    /// Begin a redb write transaction. Caller stages mutations on the
    /// returned `WriteBatch`, then calls `commit()`.
    pub fn begin_write(&self) -> Result<WriteBatch, String> {
        let tx = self
            .db
            .begin_write()
            .map_err(|e| format!("begin_write: {e}"))?;
        Ok(WriteBatch { tx })
    }

    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, String> {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| format!("begin_read: {e}"))?;
        let table = tx
            .open_table(CHAINSTATE_TABLE)
            .map_err(|e| format!("open chainstate: {e}"))?;
        let value = table.get(key).map_err(|e| format!("get: {e}"))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    // ── Coins ───────────────────────────────────────────────────────────

    pub fn get_coin(&self, txid: &Hash32) -> Result<Option<CoinRecord>, String> {
        match self.get_raw(&encode_coin_key(txid))? {
            Some(bytes) => Ok(Some(decode_coin_record(*txid, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Iterate all records in key order, coin or not.
    /// Calls `f(key_bytes, value_bytes)` for each entry.
    pub fn iter_records<F>(&self, mut f: F) -> Result<(), String>
    where
        F: FnMut(&[u8], &[u8]),
    {
        let tx = self
            .db
            .begin_read()
            .map_err(|e| format!("begin_read: {e}"))?;
        let table = tx
            .open_table(CHAINSTATE_TABLE)
            .map_err(|e| format!("open chainstate: {e}"))?;
        let iter = table.iter().map_err(|e| format!("chainstate iter: {e}"))?;
        for result in iter {
            let (key_guard, val_guard) = result.map_err(|e| format!("chainstate next: {e}"))?;
            f(key_guard.value(), val_guard.value());
        }
        Ok(())
    }

    /// Visit every decodable coin record with at least one live output.
    /// Returns the number of coin-keyed records that failed to decode.
    pub fn scan_coins<F>(&self, mut f: F) -> Result<u64, String>
    where
        F: FnMut(CoinRecord),
    {
        let mut malformed = 0u64;
        self.iter_records(|key, value| {
            let Some(txid) = decode_coin_key(key) else {
                return;
            };
            match decode_coin_record(txid, value) {
                Ok(rec) if rec.is_pruned() => {}
                Ok(rec) => f(rec),
                Err(e) => {
                    malformed += 1;
                    debug!(txid = %hex::encode(txid), error = %e, "skip malformed coin record");
                }
            }
        })?;
        Ok(malformed)
    }

    /// First `limit` coin records plus the total number of coin records.
    pub fn dump(&self, limit: usize) -> Result<(Vec<CoinRecord>, u64), String> {
        let mut head = Vec::new();
        let mut count = 0u64;
        self.scan_coins(|rec| {
            count += 1;
            if head.len() < limit {
                head.push(rec);
            }
        })?;
        Ok((head, count))
    }

    // ── Tip ─────────────────────────────────────────────────────────────

    pub fn tip_height(&self) -> Result<Option<u64>, String> {
        match self.get_raw(TIP_HEIGHT_KEY)? {
            Some(bytes) => Ok(Some(decode_tip_height(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Window with explicit bounds where given; the upper bound otherwise
    /// defaults to the stored tip (or unbounded without one).
    pub fn snapshot_window(
        &self,
        height_min: Option<u64>,
        height_max: Option<u64>,
    ) -> Result<SnapshotWindow, SnapshotError> {
        let height_max = match height_max {
            Some(h) => h,
            None => self
                .tip_height()
                .map_err(SnapshotError::store)?
                .unwrap_or(u64::MAX),
        };
        SnapshotWindow::new(height_min.unwrap_or(0), height_max)
    }
}

impl UtxoSource for Store {
    fn scan(&self, visit: &mut dyn FnMut(CoinRecord)) -> Result<u64, SnapshotError> {
        self.scan_coins(visit).map_err(SnapshotError::store)
    }

    fn coin(&self, txid: &Hash32) -> Result<Option<CoinRecord>, SnapshotError> {
        let Some(bytes) = self
            .get_raw(&encode_coin_key(txid))
            .map_err(SnapshotError::store)?
        else {
            return Ok(None);
        };
        // An undecodable record is as good as absent for a point lookup.
        match decode_coin_record(*txid, &bytes) {
            Ok(rec) if rec.is_pruned() => Ok(None),
            Ok(rec) => Ok(Some(rec)),
            Err(e) => {
                debug!(txid = %hex::encode(txid), error = %e, "undecodable coin record");
                Ok(None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// WriteBatch — wraps a redb WriteTransaction for atomic multi-record writes
// ---------------------------------------------------------------------------

pub struct WriteBatch {
    tx: WriteTransaction,
}

impl WriteBatch {
    pub fn put_coin(&self, rec: &CoinRecord) -> Result<(), String> {
        let key = encode_coin_key(&rec.txid);
        let value = encode_coin_record(rec);
        self.put_raw(&key, &value)
    }

    pub fn delete_coin(&self, txid: &Hash32) -> Result<(), String> {
        let key = encode_coin_key(txid);
        let mut table = self
            .tx
            .open_table(CHAINSTATE_TABLE)
            .map_err(|e| format!("open chainstate: {e}"))?;
        table
            .remove(key.as_slice())
            .map_err(|e| format!("delete coin: {e}"))?;
        Ok(())
    }

    /// Mark one output spent. The record is removed once no live output
    /// remains. Returns false if the output was not unspent.
    pub fn spend_output(&self, outpoint: &Outpoint) -> Result<bool, String> {
        let key = encode_coin_key(&outpoint.txid);
        let mut table = self
            .tx
            .open_table(CHAINSTATE_TABLE)
            .map_err(|e| format!("open chainstate: {e}"))?;
        let current = match table
            .get(key.as_slice())
            .map_err(|e| format!("get coin: {e}"))?
        {
            Some(guard) => decode_coin_record(outpoint.txid, guard.value())?,
            None => return Ok(false),
        };

        let mut rec = current;
        let Some(slot) = rec.outputs.get_mut(outpoint.vout as usize) else {
            return Ok(false);
        };
        if slot.take().is_none() {
            return Ok(false);
        }

        if rec.is_pruned() {
            table
                .remove(key.as_slice())
                .map_err(|e| format!("delete coin: {e}"))?;
        } else {
            let value = encode_coin_record(&rec);
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(|e| format!("put coin: {e}"))?;
        }
        Ok(true)
    }

    /// Store an arbitrary record. Used for non-coin record kinds.
    pub fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), String> {
        let mut table = self
            .tx
            .open_table(CHAINSTATE_TABLE)
            .map_err(|e| format!("open chainstate: {e}"))?;
        table
            .insert(key, value)
            .map_err(|e| format!("put record: {e}"))?;
        Ok(())
    }

    pub fn put_tip_height(&self, height: u64) -> Result<(), String> {
        self.put_raw(TIP_HEIGHT_KEY, &encode_tip_height(height))
    }

    /// Commit the write batch atomically.
    pub fn commit(self) -> Result<(), String> {
        self.tx.commit().map_err(|e| format!("commit: {e}"))
    }
}
