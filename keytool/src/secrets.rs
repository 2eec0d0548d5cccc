//! # Server Secret Loading
//!
//! The one piece of configuration the gate needs: the server key. An inline
//! `--key`/`NSEC` wins over `--key-file`/`ROUTSTR_KEY_FILE`. Either may be
//! hex or `nsec1...`.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use routstr_auth::crypto::PrivateKey;

use crate::cli::KeySource;

/// Resolve the configured secret into a validated key.
pub fn load_key(source: &KeySource) -> Result<PrivateKey> {
    if let Some(secret) = source.key.as_deref() {
        tracing::debug!("loading server key from --key / NSEC");
        return PrivateKey::from_secret_str(secret).context("server key from NSEC is invalid");
    }
    if let Some(path) = source.key_file.as_deref() {
        return load_key_file(path);
    }
    bail!("no server key configured: pass --key, set NSEC, or set ROUTSTR_KEY_FILE")
}

/// Read a key file. Surrounding whitespace is ignored.
pub fn load_key_file(path: &Path) -> Result<PrivateKey> {
    tracing::debug!(path = %path.display(), "loading server key file");
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read key file {}", path.display()))?;
    PrivateKey::from_secret_str(&contents)
        .with_context(|| format!("key file {} does not hold a valid key", path.display()))
}

/// Write a fresh key as hex, readable by the owner only.
pub fn write_key_file(path: &Path, key: &PrivateKey, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "refusing to overwrite {} (pass --force to replace it)",
            path.display()
        );
    }
    fs::write(path, hex::encode(key.secret_bytes()))
        .with_context(|| format!("failed to write key file {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to restrict permissions on {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(key: Option<&str>, key_file: Option<&Path>) -> KeySource {
        KeySource {
            key: key.map(str::to_string),
            key_file: key_file.map(Path::to_path_buf),
        }
    }

    #[test]
    fn test_write_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.key");
        let key = PrivateKey::generate();
        write_key_file(&path, &key, false).unwrap();
        let loaded = load_key(&source(None, Some(&path))).unwrap();
        assert_eq!(loaded.public_key(), key.public_key());
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.key");
        write_key_file(&path, &PrivateKey::generate(), false).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.key");
        let first = PrivateKey::generate();
        write_key_file(&path, &first, false).unwrap();
        assert!(write_key_file(&path, &PrivateKey::generate(), false).is_err());
        // Original is intact.
        assert_eq!(load_key_file(&path).unwrap().public_key(), first.public_key());
        assert!(write_key_file(&path, &PrivateKey::generate(), true).is_ok());
    }

    #[test]
    fn test_inline_key_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.key");
        write_key_file(&path, &PrivateKey::generate(), false).unwrap();
        let inline = PrivateKey::generate();
        let loaded = load_key(&source(Some(&inline.to_nsec()), Some(&path))).unwrap();
        assert_eq!(loaded.public_key(), inline.public_key());
    }

    #[test]
    fn test_both_env_sources_set() {
        use crate::cli::{Commands, KeytoolCli};
        use clap::Parser;
        use routstr_auth::config::{SECRET_KEY_ENV, SECRET_KEY_FILE_ENV};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.key");
        write_key_file(&path, &PrivateKey::generate(), false).unwrap();
        let inline = PrivateKey::generate();

        // The only test in this crate that touches these variables.
        std::env::set_var(SECRET_KEY_ENV, hex::encode(inline.secret_bytes()));
        std::env::set_var(SECRET_KEY_FILE_ENV, &path);
        let parsed = KeytoolCli::try_parse_from(["routstr-keytool", "pubkey"]);
        std::env::remove_var(SECRET_KEY_ENV);
        std::env::remove_var(SECRET_KEY_FILE_ENV);

        let source = match parsed.unwrap().command {
            Commands::Pubkey(source) => source,
            other => panic!("unexpected command: {:?}", other),
        };
        assert_eq!(source.key_file.as_deref(), Some(path.as_path()));
        assert_eq!(load_key(&source).unwrap().public_key(), inline.public_key());
    }

    #[test]
    fn test_nsec_file_with_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nsec.txt");
        let key = PrivateKey::generate();
        fs::write(&path, format!("{}\n", key.to_nsec())).unwrap();
        assert_eq!(load_key_file(&path).unwrap().public_key(), key.public_key());
    }

    #[test]
    fn test_missing_configuration() {
        let err = load_key(&source(None, None)).unwrap_err();
        assert!(err.to_string().contains("no server key configured"));
    }

    #[test]
    fn test_invalid_inline_key() {
        assert!(load_key(&source(Some("00"), None)).is_err());
    }
}
