//! SNAPSHOT.json — published descriptor of one snapshot.
//!
//! Carries the window and root a destination verifier checks proofs and
//! claims against. Writes are atomic: write temp → fsync → rename.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use utxoroot_core::{Snapshot, SnapshotRoot};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotManifest {
    pub schema_version: u32,
    pub height_min: u64,
    pub height_max: u64,
    pub leaf_count: u64,
    /// All-zero for an empty snapshot; check `empty` rather than comparing.
    pub root_hex: String,
    pub empty: bool,
}

impl SnapshotManifest {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let root = snapshot.root();
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            height_min: snapshot.window.height_min,
            height_max: snapshot.window.height_max,
            leaf_count: snapshot.len() as u64,
            root_hex: hex::encode(root.to_bytes()),
            empty: root.is_empty(),
        }
    }

    pub fn root(&self) -> Result<SnapshotRoot, String> {
        if self.empty {
            return Ok(SnapshotRoot::Empty);
        }
        let bytes = hex::decode(&self.root_hex).map_err(|e| format!("root_hex: {e}"))?;
        let root: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| format!("root_hex: expected 32 bytes, got {}", b.len()))?;
        Ok(SnapshotRoot::Root(root))
    }

    /// Load manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let data = fs::read_to_string(path).map_err(|e| format!("read manifest: {e}"))?;
        let m: SnapshotManifest =
            serde_json::from_str(&data).map_err(|e| format!("parse manifest: {e}"))?;
        if m.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(format!(
                "manifest schema_version {} is newer than supported {}",
                m.schema_version, CURRENT_SCHEMA_VERSION,
            ));
        }
        Ok(m)
    }

    /// Atomically save manifest: write to temp file → fsync → rename.
    pub fn save_atomic(&self, path: &Path) -> Result<(), String> {
        let dir = match path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };

        let pid = std::process::id();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let tmp_path = dir.join(format!(".SNAPSHOT.json.tmp.{pid}.{nanos}"));

        let json =
            serde_json::to_string_pretty(self).map_err(|e| format!("serialize manifest: {e}"))?;

        let mut f = fs::File::create(&tmp_path).map_err(|e| format!("create manifest tmp: {e}"))?;
        f.write_all(json.as_bytes())
            .map_err(|e| format!("write manifest tmp: {e}"))?;
        f.sync_all()
            .map_err(|e| format!("fsync manifest tmp: {e}"))?;
        drop(f);

        fs::rename(&tmp_path, path).map_err(|e| format!("rename manifest: {e}"))?;

        // fsync parent directory for rename durability.
        if let Ok(dir_f) = fs::File::open(dir) {
            let _ = dir_f.sync_all();
        }

        Ok(())
    }
}
