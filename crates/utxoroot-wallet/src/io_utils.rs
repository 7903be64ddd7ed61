use std::fs;
use std::io::Write;
use std::path::Path;

pub fn parse_hex32(name: &str, value: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(value).map_err(|e| format!("{name}: {e}"))?;
    if bytes.len() != 32 {
        return Err(format!("{name}: expected 32 bytes, got {}", bytes.len()));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Write via temp file + rename; the file is created owner-only on unix.
pub fn write_file_0600(path: &Path, data: &[u8]) -> Result<(), String> {
    #[cfg(unix)]
    use std::os::unix::fs::OpenOptionsExt;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("create parent {}: {e}", parent.display()))?;
        }
    }
    let tmp_path = format!("{}.tmp.{}", path.display(), std::process::id());

    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        opts.mode(0o600);
    }
    let mut f = opts
        .open(&tmp_path)
        .map_err(|e| format!("write temp {tmp_path}: {e}"))?;
    f.write_all(data)
        .map_err(|e| format!("write temp {tmp_path}: {e}"))?;
    f.sync_all()
        .map_err(|e| format!("fsync temp {tmp_path}: {e}"))?;
    drop(f);

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        format!("rename temp {} -> {}: {e}", tmp_path, path.display())
    })
}
