use utxoroot_core::{ErrorCode, SignError, SnapshotError};

#[test]
fn error_code_as_str_covers_all_variants() {
    let cases: &[(ErrorCode, &str)] = &[
        (ErrorCode::SnapshotErrStore, "SNAPSHOT_ERR_STORE"),
        (ErrorCode::SnapshotErrParse, "SNAPSHOT_ERR_PARSE"),
        (ErrorCode::SnapshotErrWindow, "SNAPSHOT_ERR_WINDOW"),
        (ErrorCode::ClaimErrWallet, "CLAIM_ERR_WALLET"),
    ];
    for (code, want) in cases {
        assert_eq!(code.as_str(), *want);
    }
}

#[test]
fn snapshot_error_display() {
    let bare = SnapshotError::new(ErrorCode::SnapshotErrStore, "");
    assert_eq!(bare.to_string(), "SNAPSHOT_ERR_STORE");

    let with_msg = SnapshotError::parse("unexpected EOF (u8)");
    assert_eq!(with_msg.to_string(), "SNAPSHOT_ERR_PARSE: unexpected EOF (u8)");
    assert_eq!(with_msg.code, ErrorCode::SnapshotErrParse);

    let store = SnapshotError::store("open utxo: boom");
    assert_eq!(store.code, ErrorCode::SnapshotErrStore);
}

#[test]
fn sign_error_display() {
    assert_eq!(
        SignError::KeyUnavailable.to_string(),
        "private key not held for locking script"
    );
    assert_eq!(SignError::UnsupportedScript.to_string(), "unsupported locking script");
    assert_eq!(
        SignError::Failed("bad key".into()).to_string(),
        "signing failed: bad key"
    );
}
