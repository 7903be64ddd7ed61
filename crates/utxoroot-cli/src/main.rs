use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use utxoroot_core::{
    leaf_hash, merkle_root, verify_inclusion, ClaimBuilder, Hash32, HashList, ProofPath,
    ProofStep, Snapshot, SnapshotCollector, SnapshotRoot, UtxoSource,
};
use utxoroot_store::{SnapshotManifest, Store};
use utxoroot_wallet::io_utils::parse_hex32;
use utxoroot_wallet::{Keystore, StoreWallet};

const LOG_ENV: &str = "UTXOROOT_LOG";
const DEFAULT_DUMP_LIMIT: usize = 100;

#[derive(Deserialize, Default)]
#[serde(default)]
struct Request {
    op: String,
    txid: String,
    vout: u32,
    script_hex: String,
    amount: i64,
    leaves: Vec<String>,
    leaf: String,
    proof: Vec<ProofStepJson>,
    root: String,
    store_path: String,
    height_min: Option<u64>,
    height_max: Option<u64>,
    manifest_out: String,
    keystore_path: String,
    destination_hex: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq)]
struct ProofStepJson {
    sibling: String,
    sibling_is_left: bool,
}

#[derive(Serialize, Debug)]
struct ClaimJson {
    txid: String,
    vout: u32,
    script_hex: String,
    amount: i64,
    leaf: String,
    authorization: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    proof: Option<Vec<ProofStepJson>>,
}

#[derive(Serialize, Debug)]
struct SkippedJson {
    txid: String,
    vout: u32,
    reason: String,
}

#[derive(Serialize, Debug)]
struct OutputJson {
    vout: u32,
    amount: i64,
    script_hex: String,
}

#[derive(Serialize, Debug)]
struct RecordJson {
    txid: String,
    height: u64,
    coinbase: bool,
    outputs: Vec<OutputJson>,
}

#[derive(Serialize, Default, Debug)]
struct Response {
    ok: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    err: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    leaf: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    empty: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    leaf_count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    height_min: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    height_max: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    malformed_skipped: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    proof: Option<Vec<ProofStepJson>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    valid: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    claims: Option<Vec<ClaimJson>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    skipped: Option<Vec<SkippedJson>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<Vec<RecordJson>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<u64>,
}

impl Response {
    fn success() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    fn failure(err: String) -> Self {
        Self {
            ok: false,
            err: Some(err),
            ..Self::default()
        }
    }

    fn with_root(mut self, root: &SnapshotRoot) -> Self {
        self.root = Some(hex::encode(root.to_bytes()));
        self.empty = Some(root.is_empty());
        self
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_logging();
    let resp = match serde_json::from_reader::<_, Request>(std::io::stdin()) {
        Ok(req) => handle(&req).unwrap_or_else(Response::failure),
        Err(e) => Response::failure(format!("bad request: {e}")),
    };
    let _ = serde_json::to_writer(std::io::stdout(), &resp);
}

fn handle(req: &Request) -> Result<Response, String> {
    debug!(op = %req.op, "request");
    match req.op.as_str() {
        "leaf_hash" => op_leaf_hash(req),
        "merkle_root" => op_merkle_root(req),
        "snapshot_root" => op_snapshot_root(req),
        "proof" => op_proof(req),
        "verify" => op_verify(req),
        "claims" => op_claims(req),
        "dump" => op_dump(req),
        other => Err(format!("unknown op: {other}")),
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

fn decode_hex(name: &str, value: &str) -> Result<Vec<u8>, String> {
    hex::decode(value).map_err(|e| format!("{name}: {e}"))
}

fn proof_to_json(path: &ProofPath) -> Vec<ProofStepJson> {
    path.iter()
        .map(|step| ProofStepJson {
            sibling: hex::encode(step.sibling),
            sibling_is_left: step.sibling_is_left,
        })
        .collect()
}

fn proof_from_json(steps: &[ProofStepJson]) -> Result<ProofPath, String> {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            Ok(ProofStep {
                sibling: parse_hex32(&format!("proof[{i}].sibling"), &step.sibling)?,
                sibling_is_left: step.sibling_is_left,
            })
        })
        .collect()
}

fn open_store(req: &Request) -> Result<Store, String> {
    if req.store_path.is_empty() {
        return Err("store_path required".to_string());
    }
    Store::open_existing(Path::new(&req.store_path))
}

fn collect_snapshot(store: &Store, req: &Request) -> Result<Snapshot, String> {
    let window = store
        .snapshot_window(req.height_min, req.height_max)
        .map_err(|e| e.to_string())?;
    SnapshotCollector::new(store, window)
        .collect()
        .map_err(|e| e.to_string())
}

/// Leaf named by the request: an explicit `leaf`, or the output at `txid:vout`.
fn requested_leaf(store: &Store, req: &Request) -> Result<Hash32, String> {
    if !req.leaf.is_empty() {
        return parse_hex32("leaf", &req.leaf);
    }
    if req.txid.is_empty() {
        return Err("leaf or txid required".to_string());
    }
    let txid = parse_hex32("txid", &req.txid)?;
    let rec = store
        .coin(&txid)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("no unspent coin for txid {}", req.txid))?;
    let out = rec
        .output(req.vout)
        .ok_or_else(|| format!("output {}:{} not unspent", req.txid, req.vout))?;
    utxoroot_core::checked_leaf_hash(&txid, &out.script, out.amount)
        .ok_or_else(|| format!("output {}:{} has non-positive amount", req.txid, req.vout))
}

// ---------------------------------------------------------------------------
// Ops
// ---------------------------------------------------------------------------

fn op_leaf_hash(req: &Request) -> Result<Response, String> {
    let txid = parse_hex32("txid", &req.txid)?;
    let script = decode_hex("script_hex", &req.script_hex)?;
    Ok(Response {
        leaf: Some(hex::encode(leaf_hash(&txid, &script, req.amount))),
        ..Response::success()
    })
}

fn op_merkle_root(req: &Request) -> Result<Response, String> {
    let leaves = req
        .leaves
        .iter()
        .enumerate()
        .map(|(i, l)| parse_hex32(&format!("leaves[{i}]"), l))
        .collect::<Result<HashList, _>>()?;
    Ok(Response {
        leaf_count: Some(leaves.len()),
        ..Response::success()
    }
    .with_root(&merkle_root(&leaves)))
}

fn op_snapshot_root(req: &Request) -> Result<Response, String> {
    let store = open_store(req)?;
    let snapshot = collect_snapshot(&store, req)?;
    if !req.manifest_out.is_empty() {
        SnapshotManifest::from_snapshot(&snapshot).save_atomic(Path::new(&req.manifest_out))?;
    }
    Ok(Response {
        leaf_count: Some(snapshot.len()),
        height_min: Some(snapshot.window.height_min),
        height_max: Some(snapshot.window.height_max),
        malformed_skipped: Some(snapshot.stats.malformed_skipped),
        ..Response::success()
    }
    .with_root(&snapshot.root()))
}

fn op_proof(req: &Request) -> Result<Response, String> {
    let store = open_store(req)?;
    let leaf = requested_leaf(&store, req)?;
    let snapshot = collect_snapshot(&store, req)?;
    let (index, path) = snapshot
        .prove_leaf(&leaf)
        .ok_or_else(|| format!("leaf {} not in snapshot", hex::encode(leaf)))?;
    Ok(Response {
        leaf: Some(hex::encode(leaf)),
        index: Some(index),
        proof: Some(proof_to_json(&path)),
        leaf_count: Some(snapshot.len()),
        ..Response::success()
    }
    .with_root(&snapshot.root()))
}

fn op_verify(req: &Request) -> Result<Response, String> {
    let leaf = parse_hex32("leaf", &req.leaf)?;
    let path = proof_from_json(&req.proof)?;
    let root = if req.root.is_empty() {
        SnapshotRoot::Empty
    } else {
        SnapshotRoot::Root(parse_hex32("root", &req.root)?)
    };
    Ok(Response {
        valid: Some(verify_inclusion(&leaf, &path, &root)),
        ..Response::success()
    })
}

fn op_claims(req: &Request) -> Result<Response, String> {
    if req.keystore_path.is_empty() {
        return Err("keystore_path required".to_string());
    }
    let store = open_store(req)?;
    let keystore = Keystore::load(Path::new(&req.keystore_path))?;
    let snapshot = collect_snapshot(&store, req)?;

    let mut builder = ClaimBuilder::new(&keystore);
    if let Some(dest) = &req.destination_hex {
        builder = builder.with_destination(decode_hex("destination_hex", dest)?);
    }
    let wallet = StoreWallet::new(&store, &keystore).with_window(snapshot.window);
    let batch = builder
        .build_wallet_claims(&wallet)
        .map_err(|e| e.to_string())?;

    let claims = batch
        .claims
        .iter()
        .map(|c| ClaimJson {
            txid: hex::encode(c.txid),
            vout: c.vout,
            script_hex: hex::encode(&c.script),
            amount: c.amount,
            leaf: hex::encode(c.leaf),
            authorization: hex::encode(&c.authorization),
            proof: snapshot
                .prove_leaf(&c.leaf)
                .map(|(_, path)| proof_to_json(&path)),
        })
        .collect();
    let skipped = batch
        .skipped
        .iter()
        .map(|s| SkippedJson {
            txid: hex::encode(s.outpoint.txid),
            vout: s.outpoint.vout,
            reason: s.reason.clone(),
        })
        .collect();
    Ok(Response {
        claims: Some(claims),
        skipped: Some(skipped),
        leaf_count: Some(snapshot.len()),
        ..Response::success()
    }
    .with_root(&snapshot.root()))
}

fn op_dump(req: &Request) -> Result<Response, String> {
    let store = open_store(req)?;
    let (head, total) = store.dump(req.limit.unwrap_or(DEFAULT_DUMP_LIMIT))?;
    let records = head
        .iter()
        .map(|rec| RecordJson {
            txid: hex::encode(rec.txid),
            height: rec.height,
            coinbase: rec.coinbase,
            outputs: rec
                .utxos()
                .map(|u| OutputJson {
                    vout: u.vout,
                    amount: u.amount,
                    script_hex: hex::encode(&u.script),
                })
                .collect(),
        })
        .collect();
    Ok(Response {
        records: Some(records),
        total: Some(total),
        ..Response::success()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use utxoroot_core::{CoinOutput, CoinRecord};

    fn store_with_coins(dir: &tempfile::TempDir) -> String {
        let path = dir.path().join("chainstate.redb");
        let store = Store::open(&path).expect("open");
        let wb = store.begin_write().expect("begin");
        for (i, height) in [(1u8, 2u64), (2, 4), (3, 6)] {
            wb.put_coin(&CoinRecord {
                txid: [i; 32],
                height,
                coinbase: false,
                outputs: vec![Some(CoinOutput {
                    amount: 100 * i as i64,
                    script: vec![0x01, i],
                })],
            })
            .expect("put");
        }
        wb.put_tip_height(5).expect("tip");
        wb.commit().expect("commit");
        path.to_string_lossy().into_owned()
    }

    fn request(json: serde_json::Value) -> Request {
        serde_json::from_value(json).expect("request")
    }

    #[test]
    fn snapshot_window_defaults_to_tip() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = store_with_coins(&dir);
        let resp = handle(&request(serde_json::json!({
            "op": "snapshot_root",
            "store_path": store_path,
        })))
        .unwrap();
        assert!(resp.ok);
        assert_eq!(resp.leaf_count, Some(2));
        assert_eq!(resp.height_max, Some(5));
        assert_eq!(resp.empty, Some(false));
    }

    #[test]
    fn proof_by_txid_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = store_with_coins(&dir);
        let proved = handle(&request(serde_json::json!({
            "op": "proof",
            "store_path": store_path,
            "txid": hex::encode([2u8; 32]),
            "vout": 0,
            "height_max": 10,
        })))
        .unwrap();
        assert_eq!(proved.leaf_count, Some(3));
        let expected_leaf = leaf_hash(&[2u8; 32], &[0x01, 2], 200);
        assert_eq!(proved.leaf, Some(hex::encode(expected_leaf)));

        let mut verify = request(serde_json::json!({ "op": "verify" }));
        verify.leaf = proved.leaf.clone().unwrap();
        verify.proof = proved.proof.clone().unwrap();
        verify.root = proved.root.clone().unwrap();
        assert_eq!(handle(&verify).unwrap().valid, Some(true));

        verify.root = String::new();
        assert_eq!(handle(&verify).unwrap().valid, Some(false));
    }

    #[test]
    fn proof_outside_window_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = store_with_coins(&dir);
        let err = handle(&request(serde_json::json!({
            "op": "proof",
            "store_path": store_path,
            "txid": hex::encode([3u8; 32]),
        })))
        .unwrap_err();
        assert!(err.contains("not in snapshot"), "{err}");
    }

    #[test]
    fn merkle_root_of_no_leaves_is_empty() {
        let resp = handle(&request(serde_json::json!({ "op": "merkle_root" }))).unwrap();
        assert_eq!(resp.empty, Some(true));
        assert_eq!(resp.root, Some("00".repeat(32)));
    }

    #[test]
    fn dump_reports_total() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = store_with_coins(&dir);
        let resp = handle(&request(serde_json::json!({
            "op": "dump",
            "store_path": store_path,
            "limit": 1,
        })))
        .unwrap();
        assert_eq!(resp.total, Some(3));
        assert_eq!(resp.records.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn missing_store_is_an_error_not_an_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such.redb");
        let err = handle(&request(serde_json::json!({
            "op": "snapshot_root",
            "store_path": missing.to_string_lossy(),
        })))
        .unwrap_err();
        assert!(err.starts_with("store not found"), "{err}");
        assert!(!missing.exists());
    }

    #[test]
    fn unknown_op_is_rejected() {
        let err = handle(&request(serde_json::json!({ "op": "mine" }))).unwrap_err();
        assert_eq!(err, "unknown op: mine");
    }
}
